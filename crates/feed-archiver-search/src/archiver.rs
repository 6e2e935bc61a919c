// crates/feed-archiver-search/src/archiver.rs
// ============================================================================
// Module: Search Archiver
// Description: Idempotent document upserts into derived indices.
// Purpose: Archive records into per-topic search indices over HTTP.
// Dependencies: async-trait, feed-archiver-core, reqwest, serde_json,
//               thiserror, tracing, url
// ============================================================================

//! ## Overview
//! [`SearchArchiver`] derives an index name from each record's routing key
//! and upserts the payload as a document addressed by the record identifier.
//! The identifier field is removed from the body before indexing, since the
//! document id carries it; per-request refresh is disabled so indexing cost
//! stays on the store's refresh cadence.
//! Invariants:
//! - Index auto-creation is left to the store; there is no provisioning
//!   step on this path.
//! - Transport failures and non-success statuses are logged and dropped
//!   without a metric; only successful upserts are metered.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::error;
use tracing::warn;
use url::Url;

use feed_archiver_core::ArchiveBackend;
use feed_archiver_core::MetricPoint;
use feed_archiver_core::MetricsSink;
use feed_archiver_core::RECORD_ID_FIELD;
use feed_archiver_core::Record;
use feed_archiver_core::WriteFailurePolicy;
use feed_archiver_core::index_destination;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for a [`SearchArchiver`].
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Base endpoint of the search store, e.g. `http://127.0.0.1:9200`.
    pub endpoint: String,
}

impl SearchConfig {
    /// Creates a configuration for the given endpoint.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    /// Parses and normalizes the endpoint into a base URL.
    ///
    /// # Errors
    ///
    /// Returns [`SearchConfigError`] when the endpoint is not an absolute
    /// HTTP URL that can carry path segments.
    pub fn base_url(&self) -> Result<Url, SearchConfigError> {
        let url = Url::parse(&self.endpoint)
            .map_err(|err| SearchConfigError::InvalidEndpoint(err.to_string()))?;
        if url.cannot_be_a_base() {
            return Err(SearchConfigError::InvalidEndpoint(
                "endpoint cannot carry path segments".to_string(),
            ));
        }
        Ok(url)
    }
}

/// Validation failures for [`SearchConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchConfigError {
    /// The endpoint was not a usable absolute URL.
    #[error("invalid search endpoint: {0}")]
    InvalidEndpoint(String),
}

// ============================================================================
// SECTION: Archiver
// ============================================================================

/// Document-index archive backend upserting one document per record.
pub struct SearchArchiver {
    /// HTTP client shared across requests.
    client: reqwest::Client,
    /// Validated base URL of the search store.
    base: Url,
    /// Sink for indexing metrics.
    metrics: Arc<dyn MetricsSink>,
    /// Policy applied to write failures. The drop policy is currently the
    /// only variant; it documents that failed upserts are lost.
    policy: WriteFailurePolicy,
}

impl SearchArchiver {
    /// Creates an archiver for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SearchConfigError`] when the endpoint does not parse into
    /// a base URL.
    pub fn new(
        config: &SearchConfig,
        metrics: Arc<dyn MetricsSink>,
        policy: WriteFailurePolicy,
    ) -> Result<Self, SearchConfigError> {
        Ok(Self {
            client: reqwest::Client::new(),
            base: config.base_url()?,
            metrics,
            policy,
        })
    }

    /// Builds the upsert URL for an index and document id.
    fn document_url(&self, index: &str, document_id: &str) -> Url {
        let mut url = self.base.clone();
        {
            // Base validation rejected cannot-be-a-base URLs at construction.
            let mut segments = url
                .path_segments_mut()
                .unwrap_or_else(|()| unreachable!("base url accepts path segments"));
            segments.pop_if_empty();
            segments.push(index);
            segments.push("_doc");
            segments.push(document_id);
        }
        url.set_query(Some("refresh=false"));
        url
    }

    /// Returns the document body: the payload with the identifier removed.
    fn document_body(record: &Record) -> Value {
        let mut body = record.payload.clone();
        if let Some(object) = body.as_object_mut() {
            object.remove(RECORD_ID_FIELD);
        }
        body
    }
}

#[async_trait]
impl ArchiveBackend for SearchArchiver {
    async fn archive(&self, record: &Record) {
        let index = match index_destination(&record.routing_key) {
            Ok(index) => index,
            Err(err) => {
                warn!(key = %record.routing_key, error = %err, "dropping record with underivable index");
                return;
            }
        };
        let document_id = record.identifier.document_id();
        let url = self.document_url(&index, &document_id);
        let body = Self::document_body(record);
        let response = match self.client.put(url).json(&body).send().await {
            Ok(response) => response,
            Err(err) => match self.policy {
                WriteFailurePolicy::Drop => {
                    error!(index, error = %err, "dropping record after transport failure");
                    return;
                }
            },
        };
        if !response.status().is_success() {
            match self.policy {
                WriteFailurePolicy::Drop => {
                    error!(index, status = %response.status(), "dropping record after rejected upsert");
                }
            }
            return;
        }
        self.metrics.record(MetricPoint::index_doc(&index));
    }
}

#[cfg(test)]
mod tests;
