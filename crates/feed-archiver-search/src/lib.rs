// crates/feed-archiver-search/src/lib.rs
// ============================================================================
// Module: Feed Archiver Search Library
// Description: Document-index archive backend over HTTP.
// Purpose: Persist records as upserted documents in per-topic indices.
// Dependencies: async-trait, feed-archiver-core, reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! This crate implements the document-index
//! [`feed_archiver_core::ArchiveBackend`] against an Elasticsearch-compatible
//! HTTP API. Each routing key derives an index name from its first segment;
//! records are upserted by document id, so re-delivery is naturally
//! idempotent and there is no conflict branch.
//! Invariants:
//! - The identifier field is stripped from the document body; the document
//!   id addresses the record instead.
//! - Indexing failures are logged and dropped, never propagated.
//!
//! Security posture: index names and document ids are path segments built
//! from validated derivations and identifier renderings; payload bodies are
//! sent as opaque JSON.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod archiver;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use archiver::SearchArchiver;
pub use archiver::SearchConfig;
pub use archiver::SearchConfigError;
