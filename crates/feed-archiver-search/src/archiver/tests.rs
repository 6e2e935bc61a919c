// crates/feed-archiver-search/src/archiver/tests.rs
// ============================================================================
// Module: Search Archiver Unit Tests
// Description: URL construction, body shaping, and endpoint validation.
// Purpose: Verify the pure seams of the document upsert path.
// Dependencies: feed-archiver-core, feed-archiver-search, serde_json
// ============================================================================

//! ## Overview
//! Unit tests for the search backend's pure seams: endpoint validation, the
//! upsert URL layout, and identifier stripping from document bodies. The
//! full request/response cycle is covered by the stub-server integration
//! test.

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

use serde_json::json;

use feed_archiver_core::IdentifierValue;
use feed_archiver_core::MetricsSink;
use feed_archiver_core::NoopMetricsSink;
use feed_archiver_core::Record;
use feed_archiver_core::WriteFailurePolicy;

use super::SearchArchiver;
use super::SearchConfig;

/// Builds an archiver against a placeholder endpoint.
fn archiver(endpoint: &str) -> SearchArchiver {
    SearchArchiver::new(
        &SearchConfig::new(endpoint),
        Arc::new(NoopMetricsSink) as Arc<dyn MetricsSink>,
        WriteFailurePolicy::Drop,
    )
    .unwrap()
}

#[test]
fn a_relative_endpoint_is_rejected() {
    let config = SearchConfig::new("not-a-url");
    assert!(config.base_url().is_err());
}

#[test]
fn a_mailto_endpoint_is_rejected() {
    let config = SearchConfig::new("mailto:ops@example.com");
    assert!(config.base_url().is_err());
}

#[test]
fn the_upsert_url_addresses_the_document_with_refresh_disabled() {
    let url = archiver("http://127.0.0.1:9200").document_url("news-data", "abc");
    assert_eq!(url.as_str(), "http://127.0.0.1:9200/news-data/_doc/abc?refresh=false");
}

#[test]
fn document_ids_are_percent_encoded_into_one_segment() {
    let url = archiver("http://127.0.0.1:9200").document_url("news-data", "a/b");
    assert_eq!(url.as_str(), "http://127.0.0.1:9200/news-data/_doc/a%2Fb?refresh=false");
}

#[test]
fn the_identifier_field_is_stripped_from_the_body() {
    let record = Record {
        routing_key: "news.feed".to_string(),
        identifier: IdentifierValue::Bytes(b"abc".to_vec()),
        payload: json!({"_id": "abc", "headline": "hello"}),
    };
    let body = SearchArchiver::document_body(&record);
    assert_eq!(body, json!({"headline": "hello"}));
}
