// crates/feed-archiver-core/src/metrics.rs
// ============================================================================
// Module: Metric Point Model and Sink Interface
// Description: Operational metric points emitted by the archive backends.
// Purpose: Provide a fire-and-forget metrics seam without hard dependencies.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Archive backends emit one [`MetricPoint`] per successful or conflicting
//! write. The [`MetricsSink`] seam is intentionally dependency-light so a
//! deployment without a metrics store runs with [`NoopMetricsSink`] and the
//! archive path is unchanged. Sinks must never block the caller: the
//! batching writer behind a real sink owns all buffering and flushing.
//! Invariants:
//! - Timestamps are wall-clock at emission time.
//! - `record` is non-blocking; a full buffer drops the point, never stalls.
//!
//! Security posture: tags are derived from validated destination names;
//! payload contents never enter a metric point.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::time::SystemTime;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Measurement name for successful relational inserts.
pub const MEASUREMENT_INSERT_ROW: &str = "insert_row";
/// Measurement name for duplicate-identifier conflicts.
pub const MEASUREMENT_UNIQUE_VIOLATION: &str = "unique_violation";
/// Measurement name for successful document indexing.
pub const MEASUREMENT_INDEX_DOC: &str = "index_doc";

// ============================================================================
// SECTION: Metric Point
// ============================================================================

/// Field value carried by a metric point.
///
/// # Invariants
/// - Variants are stable for line-protocol encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricValue {
    /// Signed integer field.
    Integer(i64),
    /// Floating point field.
    Float(f64),
    /// Text field.
    Text(String),
}

/// One operational metric point.
///
/// # Invariants
/// - `timestamp` is captured when the point is constructed.
/// - Tag and field keys are unique within a point.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    /// Measurement name.
    pub measurement: &'static str,
    /// Tag set (indexed dimensions).
    pub tags: BTreeMap<String, String>,
    /// Field set (measured values).
    pub fields: BTreeMap<String, MetricValue>,
    /// Wall-clock emission time.
    pub timestamp: SystemTime,
}

impl MetricPoint {
    /// Builds a point with one tag and one field.
    fn single(
        measurement: &'static str,
        tag_key: &str,
        tag_value: &str,
        field_key: &str,
        field_value: MetricValue,
    ) -> Self {
        let mut tags = BTreeMap::new();
        tags.insert(tag_key.to_string(), tag_value.to_string());
        let mut fields = BTreeMap::new();
        fields.insert(field_key.to_string(), field_value);
        Self {
            measurement,
            tags,
            fields,
            timestamp: SystemTime::now(),
        }
    }

    /// Point for a successful row insert, sized by serialized payload bytes.
    #[must_use]
    pub fn insert_row(table: &str, size: usize) -> Self {
        Self::single(
            MEASUREMENT_INSERT_ROW,
            "table",
            table,
            "size",
            MetricValue::Integer(saturating_i64(size)),
        )
    }

    /// Point for an expected duplicate-identifier conflict.
    #[must_use]
    pub fn unique_violation(table: &str, size: usize) -> Self {
        Self::single(
            MEASUREMENT_UNIQUE_VIOLATION,
            "table",
            table,
            "size",
            MetricValue::Integer(saturating_i64(size)),
        )
    }

    /// Point for a successfully indexed document.
    #[must_use]
    pub fn index_doc(index: &str) -> Self {
        Self::single(MEASUREMENT_INDEX_DOC, "index", index, "count", MetricValue::Integer(1))
    }
}

/// Converts a payload size to a field value without truncation surprises.
fn saturating_i64(size: usize) -> i64 {
    i64::try_from(size).unwrap_or(i64::MAX)
}

// ============================================================================
// SECTION: Sink Trait
// ============================================================================

/// Fire-and-forget sink for metric points.
pub trait MetricsSink: Send + Sync {
    /// Records a point without blocking the caller.
    fn record(&self, point: MetricPoint);
}

/// No-op sink used when no metrics store is configured.
///
/// # Invariants
/// - Points are intentionally discarded.
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn record(&self, _point: MetricPoint) {}
}
