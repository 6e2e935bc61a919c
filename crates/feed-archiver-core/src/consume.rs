// crates/feed-archiver-core/src/consume.rs
// ============================================================================
// Module: Decode-and-Archive Consumer
// Description: Callback handed one popped task per dispatcher cycle.
// Purpose: Decode the raw payload and hand the record to the backend.
// Dependencies: async-trait, thiserror, tracing
// ============================================================================

//! ## Overview
//! A [`Consumer`] receives each `(routing key, payload)` pair the dispatcher
//! pops from the queue. The production implementation,
//! [`ArchiveConsumer`], decodes the payload and forwards the record to the
//! injected [`ArchiveBackend`]. Per-record decode errors are swallowed here
//! (logged, record dropped); anything a consumer does propagate is treated
//! as fatal for the worker and triggers a supervised restart.
//! Invariants:
//! - A decode failure produces exactly one log event and zero writes.
//! - `ArchiveConsumer` never fails for record-shaped problems.
//!
//! Security posture: payloads are untrusted; decode logs identify the
//! routing key but do not echo full payload bytes at error level.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::error;

use crate::backend::ArchiveBackend;
use crate::dispatch::RawTask;
use crate::record::decode_record;

// ============================================================================
// SECTION: Consumer Errors
// ============================================================================

/// Errors a consumer considers fatal for its worker.
///
/// # Invariants
/// - Per-record decode and write failures never surface here.
#[derive(Debug, Error)]
pub enum ConsumeError {
    /// Consumer hit a non-record fault it cannot recover locally.
    #[error("consumer failure: {0}")]
    Fatal(String),
}

// ============================================================================
// SECTION: Consumer Trait
// ============================================================================

/// Callback invoked synchronously within a worker for each popped task.
#[async_trait]
pub trait Consumer: Send + Sync {
    /// Consumes one task.
    ///
    /// # Errors
    ///
    /// Returns [`ConsumeError`] only for faults that should end the worker
    /// and hand control to the dispatcher's restart supervision. Ordinary
    /// per-record errors must be handled internally.
    async fn consume(&self, task: RawTask) -> Result<(), ConsumeError>;
}

// ============================================================================
// SECTION: Archive Consumer
// ============================================================================

/// Production consumer: decode the payload, archive the record.
///
/// # Invariants
/// - Decode failures are logged once and dropped; no backend call is made.
pub struct ArchiveConsumer {
    /// Backend selected at startup.
    backend: Arc<dyn ArchiveBackend>,
}

impl ArchiveConsumer {
    /// Creates a consumer around the selected backend.
    #[must_use]
    pub fn new(backend: Arc<dyn ArchiveBackend>) -> Self {
        Self {
            backend,
        }
    }
}

#[async_trait]
impl Consumer for ArchiveConsumer {
    async fn consume(&self, task: RawTask) -> Result<(), ConsumeError> {
        match decode_record(&task.routing_key, task.payload.as_bytes()) {
            Ok(record) => {
                self.backend.archive(&record).await;
            }
            Err(err) => {
                error!(key = %task.routing_key, error = %err, "dropping undecodable record");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
