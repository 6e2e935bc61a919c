// crates/feed-archiver-core/src/consume/tests.rs
// ============================================================================
// Module: Archive Consumer Unit Tests
// Description: Decode-and-archive behavior for good and bad payloads.
// Purpose: Verify per-record errors never reach the backend or the worker.
// Dependencies: feed-archiver-core, tokio
// ============================================================================

//! ## Overview
//! Unit tests for [`ArchiveConsumer`]: decodable payloads reach the backend
//! exactly once, undecodable payloads are dropped without a backend call and
//! without a worker-fatal error.

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
use std::sync::Mutex;

use async_trait::async_trait;

use super::ArchiveConsumer;
use super::Consumer;
use crate::backend::ArchiveBackend;
use crate::dispatch::RawTask;
use crate::record::Record;

/// Backend that records every archived record.
#[derive(Default)]
struct RecordingBackend {
    /// Records received, in arrival order.
    archived: Mutex<Vec<Record>>,
}

#[async_trait]
impl ArchiveBackend for RecordingBackend {
    async fn archive(&self, record: &Record) {
        self.archived.lock().unwrap().push(record.clone());
    }
}

/// Builds a task for the given key and payload.
fn task(key: &str, payload: &str) -> RawTask {
    RawTask {
        routing_key: key.to_string(),
        payload: payload.to_string(),
    }
}

#[tokio::test]
async fn decodable_task_reaches_the_backend_once() {
    let backend = Arc::new(RecordingBackend::default());
    let consumer = ArchiveConsumer::new(Arc::clone(&backend) as Arc<dyn ArchiveBackend>);
    consumer
        .consume(task("shop.orders.created", r#"{"_id": 42, "name": "widget"}"#))
        .await
        .unwrap();
    let archived = backend.archived.lock().unwrap();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].routing_key, "shop.orders.created");
}

#[tokio::test]
async fn payload_without_identifier_is_dropped_without_backend_call() {
    let backend = Arc::new(RecordingBackend::default());
    let consumer = ArchiveConsumer::new(Arc::clone(&backend) as Arc<dyn ArchiveBackend>);
    let outcome = consumer.consume(task("any.key", r#"{"title": "no id"}"#)).await;
    assert!(outcome.is_ok());
    assert!(backend.archived.lock().unwrap().is_empty());
}

#[tokio::test]
async fn worker_continues_after_a_bad_record() {
    let backend = Arc::new(RecordingBackend::default());
    let consumer = ArchiveConsumer::new(Arc::clone(&backend) as Arc<dyn ArchiveBackend>);
    consumer.consume(task("a.b", "not json")).await.unwrap();
    consumer.consume(task("a.b", r#"{"_id": 1}"#)).await.unwrap();
    assert_eq!(backend.archived.lock().unwrap().len(), 1);
}
