// crates/feed-archiver-core/src/lib.rs
// ============================================================================
// Module: Feed Archiver Core Library
// Description: Record model, routing, registry, dispatch, and metric seams.
// Purpose: Define the archive pipeline and the traits its backends implement.
// Dependencies: async-trait, serde_json, thiserror, tokio, tracing
// ============================================================================

//! ## Overview
//! Feed Archiver Core defines the dispatch-and-archive pipeline: queued JSON
//! records are decoded, routed to a destination derived from their routing
//! key, and handed to an [`ArchiveBackend`] that persists them exactly once
//! per identifier. Concrete queue sources, storage backends, and metric sinks
//! live in sibling crates and plug into the traits defined here.
//! Invariants:
//! - A destination is provisioned before any write targeting it is attempted.
//! - Per-record failures are logged and dropped; they never stop a worker.
//! - Metric emission is fire-and-forget and never blocks the archive path.
//!
//! Security posture: routing keys and payloads arrive from an untrusted
//! message bus; derived destination names are validated before use.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod backend;
pub mod consume;
pub mod dispatch;
pub mod metrics;
pub mod record;
pub mod registry;
pub mod routing;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use backend::ArchiveBackend;
pub use backend::WriteFailurePolicy;
pub use consume::ArchiveConsumer;
pub use consume::ConsumeError;
pub use consume::Consumer;
pub use dispatch::Dispatcher;
pub use dispatch::DispatcherConfig;
pub use dispatch::DispatcherConfigError;
pub use dispatch::PopOutcome;
pub use dispatch::QueueError;
pub use dispatch::QueueSource;
pub use dispatch::RawTask;
pub use dispatch::Worker;
pub use dispatch::WorkerError;
pub use dispatch::WorkerStep;
pub use metrics::MetricPoint;
pub use metrics::MetricValue;
pub use metrics::MetricsSink;
pub use metrics::NoopMetricsSink;
pub use record::DecodeError;
pub use record::IdentifierKind;
pub use record::IdentifierValue;
pub use record::RECORD_ID_FIELD;
pub use record::Record;
pub use record::decode_record;
pub use registry::DestinationProvisioner;
pub use registry::DestinationRegistry;
pub use registry::ProvisionError;
pub use routing::RoutingError;
pub use routing::index_destination;
pub use routing::table_destination;
