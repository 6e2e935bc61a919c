// crates/feed-archiver-metrics/src/line.rs
// ============================================================================
// Module: Line Protocol Encoder
// Description: InfluxDB line-protocol rendering of metric points.
// Purpose: Serialize batches for the /write endpoint.
// Dependencies: feed-archiver-core
// ============================================================================

//! ## Overview
//! Renders [`MetricPoint`]s as InfluxDB line protocol:
//! `measurement,tag=value field=valuei 1234567890000000000`. Measurement,
//! tag, and field-key text is escaped per the protocol rules; integer fields
//! carry the `i` suffix and timestamps are nanoseconds since the epoch.
//! Invariants:
//! - Tag and field order follows the point's sorted key order, so encoding
//!   is deterministic.
//! - Points predating the epoch encode a zero timestamp.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use feed_archiver_core::MetricPoint;
use feed_archiver_core::MetricValue;

// ============================================================================
// SECTION: Encoding
// ============================================================================

/// Encodes one point as a single protocol line, without a trailing newline.
#[must_use]
pub fn encode_point(point: &MetricPoint) -> String {
    let mut line = escape_name(point.measurement);
    for (key, value) in &point.tags {
        line.push(',');
        line.push_str(&escape_name(key));
        line.push('=');
        line.push_str(&escape_name(value));
    }
    line.push(' ');
    let mut first = true;
    for (key, value) in &point.fields {
        if !first {
            line.push(',');
        }
        first = false;
        line.push_str(&escape_name(key));
        line.push('=');
        line.push_str(&encode_field(value));
    }
    line.push(' ');
    line.push_str(&epoch_nanos(point.timestamp).to_string());
    line
}

/// Encodes a batch as newline-separated protocol lines.
#[must_use]
pub fn encode_batch(points: &[MetricPoint]) -> String {
    let lines: Vec<String> = points.iter().map(encode_point).collect();
    lines.join("\n")
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Escapes measurement, tag, and field-key text.
fn escape_name(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

/// Renders one field value, suffixing integers with `i`.
fn encode_field(value: &MetricValue) -> String {
    match value {
        MetricValue::Integer(number) => format!("{number}i"),
        MetricValue::Float(number) => number.to_string(),
        MetricValue::Text(text) => {
            format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
        }
    }
}

/// Returns nanoseconds since the epoch, clamping pre-epoch times to zero.
fn epoch_nanos(timestamp: SystemTime) -> u128 {
    timestamp
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or(0)
}
