// crates/feed-archiver-core/src/registry.rs
// ============================================================================
// Module: Destination Registry
// Description: Concurrency-safe cache of provisioned destinations.
// Purpose: Provision destinations lazily and exactly-once per process.
// Dependencies: async-trait, thiserror, tokio
// ============================================================================

//! ## Overview
//! The [`DestinationRegistry`] remembers which destinations (tables or
//! indices) this process has already provisioned, so the common path of an
//! archive call is a read-lock membership check with no store interaction.
//! On first sight of a destination the registry invokes the injected
//! [`DestinationProvisioner`] under the write lock and records the name only
//! on success, so a failed provisioning attempt retries on the next record.
//! Invariants:
//! - Entries are recorded only after the provisioner returns success.
//! - Entries are never removed; the cache lives for the process lifetime.
//! - The check-then-create sequence is not globally atomic: two workers may
//!   both observe a missing entry and both invoke the idempotent create.
//!   The outcome is a harmless duplicate create-if-absent call.
//!
//! Security posture: destination names must already be validated by the
//! routing derivations before reaching the registry.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::record::IdentifierKind;

// ============================================================================
// SECTION: Provisioning Errors
// ============================================================================

/// Errors produced while provisioning a destination.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Backing store rejected or failed the create-if-absent operation.
    #[error("destination provisioning failed for {name}: {message}")]
    Store {
        /// Destination name being provisioned.
        name: String,
        /// Store-reported failure message.
        message: String,
    },
}

// ============================================================================
// SECTION: Provisioner Trait
// ============================================================================

/// Idempotent create-if-absent operation against a backing store.
#[async_trait]
pub trait DestinationProvisioner: Send + Sync {
    /// Ensures the storage object for `name` exists, sized for `kind`.
    ///
    /// Implementations must be idempotent: provisioning an existing
    /// destination is a successful no-op.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError`] when the create-if-absent operation fails.
    async fn provision(&self, name: &str, kind: IdentifierKind) -> Result<(), ProvisionError>;
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Process-lifetime cache of provisioned destination names.
///
/// # Invariants
/// - `provisioned` is mutated only while holding the write lock.
/// - A recorded name implies a completed successful provisioning call.
pub struct DestinationRegistry {
    /// Provisioner invoked on first sight of a destination.
    provisioner: Arc<dyn DestinationProvisioner>,
    /// Names of destinations already provisioned by this process.
    provisioned: RwLock<BTreeSet<String>>,
}

impl DestinationRegistry {
    /// Creates a registry around the provided provisioner.
    #[must_use]
    pub fn new(provisioner: Arc<dyn DestinationProvisioner>) -> Self {
        Self {
            provisioner,
            provisioned: RwLock::new(BTreeSet::new()),
        }
    }

    /// Ensures the destination is provisioned, creating it on first sight.
    ///
    /// The fast path is a shared-lock membership check. On a miss the write
    /// lock is taken, the idempotent create runs against the store, and the
    /// name is recorded on success only.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError`] when the provisioner fails; the name stays
    /// unrecorded so the next record for this destination retries.
    pub async fn ensure(&self, name: &str, kind: IdentifierKind) -> Result<(), ProvisionError> {
        {
            let provisioned = self.provisioned.read().await;
            if provisioned.contains(name) {
                return Ok(());
            }
        }
        let mut provisioned = self.provisioned.write().await;
        self.provisioner.provision(name, kind).await?;
        provisioned.insert(name.to_string());
        Ok(())
    }

    /// Returns true when the destination has already been provisioned.
    pub async fn contains(&self, name: &str) -> bool {
        self.provisioned.read().await.contains(name)
    }
}

#[cfg(test)]
mod tests;
