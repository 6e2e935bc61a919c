// crates/feed-archiver-core/src/registry/tests.rs
// ============================================================================
// Module: Destination Registry Unit Tests
// Description: Provision-once semantics and failure retry behavior.
// Purpose: Verify ensure/contains under sequential and concurrent callers.
// Dependencies: feed-archiver-core, tokio
// ============================================================================

//! ## Overview
//! Unit tests for [`DestinationRegistry`] covering the provision-once fast
//! path, retry after provisioning failure, and concurrent `ensure` calls.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only output and panic-based assertions are permitted."
)]

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;

use super::DestinationProvisioner;
use super::DestinationRegistry;
use super::ProvisionError;
use crate::record::IdentifierKind;

/// Provisioner that counts calls and optionally fails first.
struct CountingProvisioner {
    /// Number of provision calls observed.
    calls: AtomicUsize,
    /// When set, the next call fails and clears the flag.
    fail_next: AtomicBool,
}

impl CountingProvisioner {
    /// Creates a provisioner that always succeeds.
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_next: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl DestinationProvisioner for CountingProvisioner {
    async fn provision(&self, name: &str, _kind: IdentifierKind) -> Result<(), ProvisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ProvisionError::Store {
                name: name.to_string(),
                message: "simulated ddl failure".to_string(),
            });
        }
        Ok(())
    }
}

#[tokio::test]
async fn ensure_provisions_only_on_first_sight() {
    let provisioner = Arc::new(CountingProvisioner::new());
    let registry = DestinationRegistry::new(Arc::clone(&provisioner) as Arc<dyn DestinationProvisioner>);
    registry.ensure("shop_orders", IdentifierKind::Integer).await.unwrap();
    registry.ensure("shop_orders", IdentifierKind::Integer).await.unwrap();
    registry.ensure("shop_orders", IdentifierKind::Integer).await.unwrap();
    assert_eq!(provisioner.calls.load(Ordering::SeqCst), 1);
    assert!(registry.contains("shop_orders").await);
}

#[tokio::test]
async fn failed_provisioning_is_retried_on_next_record() {
    let provisioner = Arc::new(CountingProvisioner::new());
    provisioner.fail_next.store(true, Ordering::SeqCst);
    let registry = DestinationRegistry::new(Arc::clone(&provisioner) as Arc<dyn DestinationProvisioner>);
    let first = registry.ensure("news", IdentifierKind::Bytes).await;
    assert!(first.is_err());
    assert!(!registry.contains("news").await);
    registry.ensure("news", IdentifierKind::Bytes).await.unwrap();
    assert!(registry.contains("news").await);
    assert_eq!(provisioner.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn concurrent_ensure_results_in_one_recorded_destination() {
    let provisioner = Arc::new(CountingProvisioner::new());
    let registry = Arc::new(DestinationRegistry::new(Arc::clone(&provisioner) as Arc<dyn DestinationProvisioner>));
    let mut handles = Vec::new();
    for _ in 0 .. 8 {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            registry.ensure("concurrent", IdentifierKind::Integer).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }
    assert!(registry.contains("concurrent").await);
    // The write lock serializes provisioning, so later callers re-issue the
    // idempotent create at most once each; every call must have succeeded.
    assert!(provisioner.calls.load(Ordering::SeqCst) >= 1);
}

#[tokio::test]
async fn distinct_destinations_provision_independently() {
    let provisioner = Arc::new(CountingProvisioner::new());
    let registry = DestinationRegistry::new(Arc::clone(&provisioner) as Arc<dyn DestinationProvisioner>);
    registry.ensure("alpha", IdentifierKind::Integer).await.unwrap();
    registry.ensure("beta", IdentifierKind::Bytes).await.unwrap();
    assert_eq!(provisioner.calls.load(Ordering::SeqCst), 2);
    assert!(registry.contains("alpha").await);
    assert!(registry.contains("beta").await);
    assert!(!registry.contains("gamma").await);
}
