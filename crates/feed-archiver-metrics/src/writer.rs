// crates/feed-archiver-metrics/src/writer.rs
// ============================================================================
// Module: Influx Metrics Writer
// Description: Bounded-channel sink with one batching writer task.
// Purpose: Flush metric batches to the /write endpoint without blocking.
// Dependencies: feed-archiver-core, reqwest, thiserror, tokio, tracing, url
// ============================================================================

//! ## Overview
//! [`InfluxMetricsSink`] is the producer half of a bounded channel and never
//! blocks: when the channel is full the newest point is dropped with a
//! warning. [`spawn_writer`] starts the single consumer task, which
//! accumulates points into a pending batch, flushes at the configured batch
//! size, and performs one final flush when every sink handle is dropped.
//! Invariants:
//! - Failed batch writes are logged and discarded; the writer keeps going.
//! - The writer task ends only after the final flush, so awaiting its handle
//!   on shutdown drains the channel.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::error;
use tracing::warn;
use url::Url;

use feed_archiver_core::MetricPoint;
use feed_archiver_core::MetricsSink;

use crate::line::encode_batch;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the batching metrics writer.
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    /// Base endpoint of the metrics store, e.g. `http://127.0.0.1:8086`.
    pub endpoint: String,
    /// Target database name.
    pub database: String,
    /// Pending-batch size that triggers a flush.
    pub batch_size: usize,
    /// Channel capacity between the sink and the writer task.
    pub capacity: usize,
}

impl InfluxConfig {
    /// Creates a configuration with the given batch size and a channel
    /// capacity of twice that size.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, database: impl Into<String>, batch_size: usize) -> Self {
        Self {
            endpoint: endpoint.into(),
            database: database.into(),
            batch_size,
            capacity: batch_size.saturating_mul(2).max(1),
        }
    }

    /// Builds the write URL carrying the database query parameter.
    ///
    /// # Errors
    ///
    /// Returns [`InfluxConfigError`] when the configuration is degenerate or
    /// the endpoint does not parse into a base URL.
    pub fn write_url(&self) -> Result<Url, InfluxConfigError> {
        if self.database.trim().is_empty() {
            return Err(InfluxConfigError::EmptyDatabase);
        }
        if self.batch_size == 0 {
            return Err(InfluxConfigError::ZeroBatchSize);
        }
        if self.capacity == 0 {
            return Err(InfluxConfigError::ZeroCapacity);
        }
        let base = Url::parse(&self.endpoint)
            .map_err(|err| InfluxConfigError::InvalidEndpoint(err.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(InfluxConfigError::InvalidEndpoint(
                "endpoint cannot carry path segments".to_string(),
            ));
        }
        let mut url = base
            .join("write")
            .map_err(|err| InfluxConfigError::InvalidEndpoint(err.to_string()))?;
        url.query_pairs_mut().append_pair("db", &self.database);
        Ok(url)
    }
}

/// Validation failures for [`InfluxConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InfluxConfigError {
    /// The endpoint was not a usable absolute URL.
    #[error("invalid metrics endpoint: {0}")]
    InvalidEndpoint(String),
    /// The database name was empty.
    #[error("metrics database must not be empty")]
    EmptyDatabase,
    /// A zero batch size would never flush.
    #[error("metrics batch size must be at least one")]
    ZeroBatchSize,
    /// A zero channel capacity would drop every point.
    #[error("metrics channel capacity must be at least one")]
    ZeroCapacity,
}

// ============================================================================
// SECTION: Sink
// ============================================================================

/// Non-blocking producer handle feeding the writer task.
#[derive(Clone)]
pub struct InfluxMetricsSink {
    /// Bounded channel into the writer task.
    sender: mpsc::Sender<MetricPoint>,
}

impl MetricsSink for InfluxMetricsSink {
    fn record(&self, point: MetricPoint) {
        match self.sender.try_send(point) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(point)) => {
                warn!(measurement = point.measurement, "metrics buffer full, dropping point");
            }
            Err(mpsc::error::TrySendError::Closed(point)) => {
                warn!(measurement = point.measurement, "metrics writer stopped, dropping point");
            }
        }
    }
}

// ============================================================================
// SECTION: Writer Task
// ============================================================================

/// Spawns the batching writer task and returns its sink handle.
///
/// The task ends after a final flush once every sink clone is dropped;
/// awaiting the returned handle on shutdown drains the channel.
///
/// # Errors
///
/// Returns [`InfluxConfigError`] when the configuration fails validation.
pub fn spawn_writer(
    config: &InfluxConfig,
) -> Result<(InfluxMetricsSink, JoinHandle<()>), InfluxConfigError> {
    let url = config.write_url()?;
    let (sender, receiver) = mpsc::channel(config.capacity);
    let batch_size = config.batch_size;
    let handle = tokio::spawn(run_writer(url, batch_size, receiver));
    Ok((InfluxMetricsSink { sender }, handle))
}

/// Drains the channel, flushing batches at the configured size.
async fn run_writer(url: Url, batch_size: usize, mut receiver: mpsc::Receiver<MetricPoint>) {
    let client = reqwest::Client::new();
    let mut pending: Vec<MetricPoint> = Vec::with_capacity(batch_size);
    while let Some(point) = receiver.recv().await {
        pending.push(point);
        if pending.len() >= batch_size {
            flush(&client, &url, &mut pending).await;
        }
    }
    if !pending.is_empty() {
        flush(&client, &url, &mut pending).await;
    }
}

/// Writes the pending batch and clears it regardless of the outcome.
async fn flush(client: &reqwest::Client, url: &Url, pending: &mut Vec<MetricPoint>) {
    let count = pending.len();
    let body = encode_batch(pending);
    pending.clear();
    match client.post(url.clone()).body(body).send().await {
        Ok(response) if response.status().is_success() => {
            debug!(count, "flushed metrics batch");
        }
        Ok(response) => {
            error!(count, status = %response.status(), "metrics store rejected batch, discarding");
        }
        Err(err) => {
            error!(count, error = %err, "failed to write metrics batch, discarding");
        }
    }
}
