// crates/feed-archiver-core/src/backend.rs
// ============================================================================
// Module: Archive Backend Interface
// Description: Polymorphic persistence seam for decoded records.
// Purpose: Let the dispatcher archive records without knowing the store.
// Dependencies: async-trait
// ============================================================================

//! ## Overview
//! An [`ArchiveBackend`] persists one decoded record into its destination.
//! The backend is selected once at startup and injected into the consumer as
//! a trait object; there is no process-global backend state.
//! Invariants:
//! - `archive` never propagates an error: per-record failures are consumed,
//!   logged, and optionally metered inside the backend.
//! - Re-archiving an identifier already present at its destination is an
//!   idempotent outcome, never a failure.
//!
//! Security posture: backends interpolate validated destination names only;
//! payload contents are passed through as opaque JSON.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;

use crate::record::Record;

// ============================================================================
// SECTION: Failure Policy
// ============================================================================

/// Named policy applied when a storage write fails for a reason other than a
/// duplicate identifier.
///
/// # Invariants
/// - `Drop` loses the record permanently from this pipeline's perspective:
///   log the failure, emit no metric, perform no retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteFailurePolicy {
    /// Log the failure and drop the record without retrying.
    #[default]
    Drop,
}

// ============================================================================
// SECTION: Backend Trait
// ============================================================================

/// Persists decoded records into their derived destinations.
#[async_trait]
pub trait ArchiveBackend: Send + Sync {
    /// Archives one record.
    ///
    /// Never returns an error: routing, provisioning, and write failures are
    /// handled per-record inside the backend according to its
    /// [`WriteFailurePolicy`] and the conflict classification rules of the
    /// concrete store.
    async fn archive(&self, record: &Record);
}
