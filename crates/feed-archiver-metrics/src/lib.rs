// crates/feed-archiver-metrics/src/lib.rs
// ============================================================================
// Module: Feed Archiver Metrics Library
// Description: Batching InfluxDB writer behind the metrics sink seam.
// Purpose: Ship operational metric points without backpressuring archival.
// Dependencies: feed-archiver-core, reqwest, thiserror, tokio, tracing, url
// ============================================================================

//! ## Overview
//! This crate ships [`feed_archiver_core::MetricPoint`]s to an InfluxDB
//! `/write` endpoint. The sink side is a bounded channel whose `record` never
//! blocks; a single background writer task accumulates points and flushes
//! them as line-protocol batches.
//! Invariants:
//! - A full channel drops the newest point with a warning; the archive path
//!   never stalls on metrics.
//! - A failed batch write is logged and discarded, never retried.
//! - Closing the sink triggers one final flush of the pending batch.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod line;
pub mod writer;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use line::encode_batch;
pub use line::encode_point;
pub use writer::InfluxConfig;
pub use writer::InfluxConfigError;
pub use writer::InfluxMetricsSink;
pub use writer::spawn_writer;
