// crates/feed-archiver-queue/src/lib.rs
// ============================================================================
// Module: Feed Archiver Queue Library
// Description: Redis-backed queue source with memoized key discovery.
// Purpose: Feed the dispatcher with bounded multi-key pops.
// Dependencies: feed-archiver-core, redis, thiserror, tokio, tracing
// ============================================================================

//! ## Overview
//! This crate implements the pipeline's [`feed_archiver_core::QueueSource`]
//! over Redis lists. Queue keys matching a configured pattern are discovered
//! with an incremental SCAN and memoized until invalidated; each pop is one
//! `BLPOP` across all discovered keys with a bounded timeout.
//! Invariants:
//! - A pop that returns no data or fails invalidates the key cache, so
//!   topology changes surface on the next cycle.
//! - The discovered key set is capped to bound the cost of each `BLPOP`.
//!
//! Security posture: key names and payloads come from a shared message bus
//! and are treated as untrusted input throughout.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod discovery;
pub mod source;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use discovery::DEFAULT_KEY_CAP;
pub use discovery::KeyDiscoveryCache;
pub use source::RedisQueueConfig;
pub use source::RedisQueueConfigError;
pub use source::RedisQueueSource;
