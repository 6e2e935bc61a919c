// crates/feed-archiver-queue/src/source.rs
// ============================================================================
// Module: Redis Queue Source
// Description: Blocking multi-key pops over discovered queue keys.
// Purpose: Implement the dispatcher's queue source contract over Redis lists.
// Dependencies: async-trait, feed-archiver-core, redis, thiserror, tracing
// ============================================================================

//! ## Overview
//! [`RedisQueueSource`] implements [`QueueSource`] with one `BLPOP` per pop
//! across all discovered queue keys, bounded by the configured timeout. The
//! key set comes from a [`KeyDiscoveryCache`] that is invalidated whenever a
//! pop observes no data or fails, so queue topology changes surface on the
//! next cycle rather than requiring a restart.
//! Invariants:
//! - An empty discovered key set never issues a `BLPOP`.
//! - Timeouts, empty key sets, and transport errors all invalidate the
//!   discovery memo before returning.
//!
//! Security posture: the connection URL is operator-supplied configuration;
//! everything read from the bus is untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use async_trait::async_trait;
use redis::ConnectionInfo;
use redis::IntoConnectionInfo;
use redis::RedisError;
use redis::aio::ConnectionManager;
use thiserror::Error;
use tracing::debug;

use feed_archiver_core::PopOutcome;
use feed_archiver_core::QueueError;
use feed_archiver_core::QueueSource;
use feed_archiver_core::RawTask;

use crate::discovery::DEFAULT_KEY_CAP;
use crate::discovery::KeyDiscoveryCache;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for a [`RedisQueueSource`].
#[derive(Debug, Clone)]
pub struct RedisQueueConfig {
    /// Connection URL, e.g. `redis://127.0.0.1:6379`.
    pub url: String,
    /// Authentication password; overrides any credential in the URL.
    pub password: Option<String>,
    /// Pattern matched against queue key names during discovery.
    pub pattern: String,
    /// Seconds a `BLPOP` blocks before reporting a timeout.
    pub pop_timeout_secs: u64,
    /// Hard cap on the number of discovered keys per scan.
    pub key_cap: usize,
}

impl RedisQueueConfig {
    /// Creates a configuration with default timeout and key cap.
    #[must_use]
    pub fn new(url: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            password: None,
            pattern: pattern.into(),
            pop_timeout_secs: 1,
            key_cap: DEFAULT_KEY_CAP,
        }
    }

    /// Resolves the connection info, applying the password override.
    ///
    /// # Errors
    ///
    /// Returns [`RedisError`] when the URL does not parse.
    pub fn connection_info(&self) -> Result<ConnectionInfo, RedisError> {
        let mut info = self.url.as_str().into_connection_info()?;
        if let Some(password) = &self.password {
            info.redis.password = Some(password.clone());
        }
        Ok(info)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RedisQueueConfigError`] when a field is empty or zero.
    pub fn validate(&self) -> Result<(), RedisQueueConfigError> {
        if self.url.trim().is_empty() {
            return Err(RedisQueueConfigError::EmptyUrl);
        }
        if self.pattern.trim().is_empty() {
            return Err(RedisQueueConfigError::EmptyPattern);
        }
        if self.pop_timeout_secs == 0 {
            return Err(RedisQueueConfigError::ZeroPopTimeout);
        }
        if self.key_cap == 0 {
            return Err(RedisQueueConfigError::ZeroKeyCap);
        }
        Ok(())
    }
}

/// Validation failures for [`RedisQueueConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RedisQueueConfigError {
    /// The connection URL was empty.
    #[error("queue connection url must not be empty")]
    EmptyUrl,
    /// The discovery pattern was empty.
    #[error("queue key pattern must not be empty")]
    EmptyPattern,
    /// A zero pop timeout would block indefinitely.
    #[error("pop timeout must be at least one second")]
    ZeroPopTimeout,
    /// A zero key cap would discover nothing.
    #[error("key cap must be at least one")]
    ZeroKeyCap,
}

// ============================================================================
// SECTION: Source
// ============================================================================

/// Queue source popping records from Redis lists.
pub struct RedisQueueSource {
    /// Multiplexed connection shared by all workers.
    connection: ConnectionManager,
    /// Memoized key discovery.
    cache: KeyDiscoveryCache,
    /// Blocking pop timeout in seconds.
    pop_timeout_secs: u64,
}

impl RedisQueueSource {
    /// Validates the configuration and establishes the connection.
    ///
    /// # Errors
    ///
    /// Returns [`RedisQueueConfigError`] for invalid configuration wrapped
    /// in [`QueueError::Io`], or the transport error when the initial
    /// connection fails.
    pub async fn connect(config: RedisQueueConfig) -> Result<Self, QueueError> {
        config.validate().map_err(|err| QueueError::Io(err.to_string()))?;
        let info = config.connection_info().map_err(|err| QueueError::Io(err.to_string()))?;
        let client = redis::Client::open(info).map_err(|err| QueueError::Io(err.to_string()))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|err| QueueError::Io(err.to_string()))?;
        debug!(pattern = %config.pattern, "connected queue source");
        Ok(Self {
            connection,
            cache: KeyDiscoveryCache::new(config.pattern, config.key_cap),
            pop_timeout_secs: config.pop_timeout_secs,
        })
    }

    /// Issues one blocking pop across the given keys.
    async fn blocking_pop(
        &self,
        connection: &mut ConnectionManager,
        keys: &[String],
    ) -> Result<Option<(String, String)>, RedisError> {
        redis::cmd("BLPOP")
            .arg(keys)
            .arg(self.pop_timeout_secs)
            .query_async(connection)
            .await
    }
}

#[async_trait]
impl QueueSource for RedisQueueSource {
    async fn pop(&self) -> Result<PopOutcome, QueueError> {
        let mut connection = self.connection.clone();
        let keys = match self.cache.keys(&mut connection).await {
            Ok(keys) => keys,
            Err(err) => {
                self.cache.invalidate().await;
                return Err(QueueError::Io(err.to_string()));
            }
        };
        if keys.is_empty() {
            self.cache.invalidate().await;
            return Ok(PopOutcome::NoQueues);
        }
        match self.blocking_pop(&mut connection, &keys).await {
            Ok(Some((routing_key, payload))) => Ok(PopOutcome::Task(RawTask {
                routing_key,
                payload,
            })),
            Ok(None) => {
                self.cache.invalidate().await;
                Ok(PopOutcome::Timeout)
            }
            Err(err) => {
                self.cache.invalidate().await;
                Err(QueueError::Io(err.to_string()))
            }
        }
    }
}
