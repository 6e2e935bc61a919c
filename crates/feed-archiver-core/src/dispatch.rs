// crates/feed-archiver-core/src/dispatch.rs
// ============================================================================
// Module: Queue Dispatcher
// Description: Worker pool draining a queue source into a consumer.
// Purpose: Pull tasks with bounded pops and supervise worker lifetimes.
// Dependencies: async-trait, thiserror, tokio, tracing
// ============================================================================

//! ## Overview
//! The dispatcher runs a small fixed pool of workers. Each worker repeatedly
//! issues one bounded pop against the [`QueueSource`] and hands any returned
//! task to the [`Consumer`]. Pop timeouts loop immediately (the timeout
//! itself throttles retries); an empty key set or a queue error sleeps the
//! idle interval before retrying. A worker that ends with a fatal consumer
//! error is logged and respawned after a restart delay, so one poisoned
//! worker never stops unrelated queue consumption.
//! Invariants:
//! - Blocking is bounded: pops carry an explicit timeout inside the source.
//! - Workers share one source, one consumer, and one key set; worker count
//!   controls storage write concurrency, not queue fan-out.
//! - No ordering is guaranteed across workers, and none within a queue once
//!   multiple workers compete for the same key set.
//!
//! Security posture: task payloads are untrusted and passed opaquely to the
//! consumer; queue errors are recovered locally and never crash the process.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio::time::sleep;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::consume::ConsumeError;
use crate::consume::Consumer;

// ============================================================================
// SECTION: Queue Source
// ============================================================================

/// One raw task popped from a source queue.
///
/// # Invariants
/// - `routing_key` is the key of the queue the payload was popped from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawTask {
    /// Routing key of the source queue.
    pub routing_key: String,
    /// Raw message payload.
    pub payload: String,
}

/// Outcome of one bounded pop attempt.
///
/// # Invariants
/// - `Timeout` means keys were watched but none produced data in time.
/// - `NoQueues` means the discovered key set was empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopOutcome {
    /// A task was popped.
    Task(RawTask),
    /// The bounded pop timed out with no data.
    Timeout,
    /// No source queues are currently discovered.
    NoQueues,
}

/// Errors produced by a queue source.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - Queue errors are recovered locally by the worker loop.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Queue store I/O failure.
    #[error("queue i/o failure: {0}")]
    Io(String),
}

/// Source of raw tasks, typically backed by a set of message-bus queues.
///
/// Implementations own key discovery and its cache: a pop that observes "no
/// data" or an error must invalidate the cached key set so topology changes
/// are picked up on the next cycle.
#[async_trait]
pub trait QueueSource: Send + Sync {
    /// Issues one bounded pop across all currently discovered queues.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError`] on queue store I/O failures. Timeouts and an
    /// empty key set are ordinary [`PopOutcome`] values, not errors.
    async fn pop(&self) -> Result<PopOutcome, QueueError>;
}

// ============================================================================
// SECTION: Worker
// ============================================================================

/// Errors that end a worker and hand control to supervision.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The consumer reported a fatal, non-record fault.
    #[error("worker consumer failure: {0}")]
    Consumer(#[from] ConsumeError),
}

/// Observed result of one worker cycle.
///
/// # Invariants
/// - Variants are stable for tests and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStep {
    /// A task was popped and consumed.
    Consumed,
    /// The bounded pop timed out; the loop retries immediately.
    TimedOut,
    /// No queues were discovered; the loop slept the idle interval.
    Idle,
    /// The source failed; the loop logged, slept, and will retry.
    SourceError,
}

/// One dispatcher worker.
///
/// # Invariants
/// - `step` performs at most one pop and at most one consume call.
#[derive(Clone)]
pub struct Worker {
    /// Worker index used in logs.
    id: usize,
    /// Shared queue source.
    source: Arc<dyn QueueSource>,
    /// Shared decode-and-archive consumer.
    consumer: Arc<dyn Consumer>,
    /// Sleep applied when no queues exist or the source errors.
    idle_interval: Duration,
}

impl Worker {
    /// Creates a worker over the shared source and consumer.
    #[must_use]
    pub fn new(
        id: usize,
        source: Arc<dyn QueueSource>,
        consumer: Arc<dyn Consumer>,
        idle_interval: Duration,
    ) -> Self {
        Self {
            id,
            source,
            consumer,
            idle_interval,
        }
    }

    /// Runs one pop-and-consume cycle.
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError`] when the consumer reports a fatal fault;
    /// every queue-side condition is recovered locally.
    pub async fn step(&self) -> Result<WorkerStep, WorkerError> {
        match self.source.pop().await {
            Ok(PopOutcome::Task(task)) => {
                self.consumer.consume(task).await?;
                Ok(WorkerStep::Consumed)
            }
            Ok(PopOutcome::Timeout) => Ok(WorkerStep::TimedOut),
            Ok(PopOutcome::NoQueues) => {
                sleep(self.idle_interval).await;
                Ok(WorkerStep::Idle)
            }
            Err(err) => {
                warn!(worker = self.id, error = %err, "queue pop failed; retrying after idle interval");
                sleep(self.idle_interval).await;
                Ok(WorkerStep::SourceError)
            }
        }
    }

    /// Runs cycles until a fatal consumer error ends the worker.
    async fn run(self) -> WorkerError {
        loop {
            if let Err(err) = self.step().await {
                return err;
            }
        }
    }
}

// ============================================================================
// SECTION: Dispatcher
// ============================================================================

/// Dispatcher runtime configuration.
///
/// # Invariants
/// - `workers` must be greater than zero.
/// - `idle_interval` and `restart_delay` are interpreted as wall-clock
///   sleeps inside worker loops and supervision respectively.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Number of worker loops to run.
    pub workers: usize,
    /// Sleep between cycles when no queues exist or the source errors.
    pub idle_interval: Duration,
    /// Delay before respawning a fatally failed worker.
    pub restart_delay: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            idle_interval: Duration::from_secs(1),
            restart_delay: Duration::from_secs(1),
        }
    }
}

impl DispatcherConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DispatcherConfigError`] when a limit is out of range.
    pub const fn validate(&self) -> Result<(), DispatcherConfigError> {
        if self.workers == 0 {
            return Err(DispatcherConfigError::ZeroWorkers);
        }
        Ok(())
    }
}

/// Errors produced by dispatcher configuration validation.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatcherConfigError {
    /// Worker count must be greater than zero.
    #[error("dispatcher requires at least one worker")]
    ZeroWorkers,
}

/// Worker pool supervisor.
///
/// # Invariants
/// - Workers share one source and one consumer.
/// - A worker ending for any reason is respawned after the restart delay.
pub struct Dispatcher {
    /// Validated runtime configuration.
    config: DispatcherConfig,
    /// Shared queue source.
    source: Arc<dyn QueueSource>,
    /// Shared decode-and-archive consumer.
    consumer: Arc<dyn Consumer>,
}

impl Dispatcher {
    /// Creates a dispatcher after validating its configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DispatcherConfigError`] when the configuration is invalid.
    pub fn new(
        config: DispatcherConfig,
        source: Arc<dyn QueueSource>,
        consumer: Arc<dyn Consumer>,
    ) -> Result<Self, DispatcherConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            consumer,
        })
    }

    /// Builds the worker with the given index.
    fn worker(&self, id: usize) -> Worker {
        Worker::new(
            id,
            Arc::clone(&self.source),
            Arc::clone(&self.consumer),
            self.config.idle_interval,
        )
    }

    /// Runs the worker pool forever, respawning workers that end.
    ///
    /// This future never completes under normal operation; shutdown is
    /// process-level only.
    pub async fn run(&self) {
        let mut workers: JoinSet<WorkerError> = JoinSet::new();
        let mut assignments: BTreeMap<tokio::task::Id, usize> = BTreeMap::new();
        for id in 0 .. self.config.workers {
            let handle = workers.spawn(self.worker(id).run());
            assignments.insert(handle.id(), id);
        }
        info!(workers = self.config.workers, "dispatcher started");
        while let Some(ended) = workers.join_next_with_id().await {
            let id = match ended {
                Ok((task_id, err)) => {
                    let id = assignments.remove(&task_id).unwrap_or(0);
                    error!(worker = id, error = %err, "worker ended with fatal error; restarting");
                    id
                }
                Err(join_err) => {
                    let id = assignments.remove(&join_err.id()).unwrap_or(0);
                    error!(worker = id, error = %join_err, "worker task aborted; restarting");
                    id
                }
            };
            sleep(self.config.restart_delay).await;
            let handle = workers.spawn(self.worker(id).run());
            assignments.insert(handle.id(), id);
        }
    }
}
