// crates/feed-archiver-sql/src/lib.rs
// ============================================================================
// Module: Feed Archiver SQL Library
// Description: Relational archive backend over Postgres.
// Purpose: Persist records as rows with lazy per-table provisioning.
// Dependencies: async-trait, feed-archiver-core, sqlx, tracing
// ============================================================================

//! ## Overview
//! This crate implements the relational [`feed_archiver_core::ArchiveBackend`]
//! over a Postgres connection pool. Each routing key derives a table name;
//! tables are created lazily on first sight with a key column sized to the
//! record's identifier kind, and each record becomes one `(id, data)` row.
//! Invariants:
//! - Duplicate identifiers are an expected conflict metered as such, never a
//!   write failure.
//! - Derived table names are always interpolated quoted, after the routing
//!   derivation has confirmed they are identifier-safe.
//!
//! Security posture: payloads are bound as parameters, never interpolated;
//! table names are the only spliced text and are pre-validated.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod archiver;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use archiver::SqlArchiver;
pub use archiver::SqlProvisioner;
