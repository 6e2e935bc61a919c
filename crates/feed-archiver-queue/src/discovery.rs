// crates/feed-archiver-queue/src/discovery.rs
// ============================================================================
// Module: Key Discovery Cache
// Description: Memoized SCAN of queue keys matching a pattern.
// Purpose: Avoid re-scanning the key space on every pop cycle.
// Dependencies: redis, tokio, tracing
// ============================================================================

//! ## Overview
//! The [`KeyDiscoveryCache`] enumerates queue keys matching the configured
//! pattern with an incremental SCAN cursor, accumulating matches until the
//! cursor completes or the hard cap is reached, and memoizes the result.
//! The dispatcher path invalidates the cache whenever a pop observes "no
//! data" or an error, which lets newly created queues appear and vanished
//! queues drop out without a scan on every cycle.
//! Invariants:
//! - `keys` scans at most once per invalidation.
//! - The returned sequence never exceeds the configured cap.
//! - Key order follows the store's own enumeration order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use redis::RedisError;
use redis::aio::ConnectionManager;
use tokio::sync::Mutex;
use tracing::debug;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default hard cap on the number of discovered keys.
pub const DEFAULT_KEY_CAP: usize = 30;
/// COUNT hint passed to each SCAN page.
const SCAN_COUNT: usize = 100;

// ============================================================================
// SECTION: Cache
// ============================================================================

/// Memoized set of queue keys matching a pattern.
///
/// # Invariants
/// - `cached` is `Some` only after a completed scan.
/// - Invalidation clears the memo; it never triggers a scan itself.
pub struct KeyDiscoveryCache {
    /// Pattern matched against queue key names.
    pattern: String,
    /// Hard cap on accumulated keys.
    cap: usize,
    /// Memoized scan result.
    cached: Mutex<Option<Vec<String>>>,
}

impl KeyDiscoveryCache {
    /// Creates a cache for the given pattern and key cap.
    #[must_use]
    pub fn new(pattern: impl Into<String>, cap: usize) -> Self {
        Self {
            pattern: pattern.into(),
            cap,
            cached: Mutex::new(None),
        }
    }

    /// Returns the matching keys, scanning only when the memo is empty.
    ///
    /// # Errors
    ///
    /// Returns [`RedisError`] when a SCAN page fails; the memo is left
    /// empty so the next call retries the scan.
    pub async fn keys(&self, connection: &mut ConnectionManager) -> Result<Vec<String>, RedisError> {
        let mut cached = self.cached.lock().await;
        if let Some(keys) = cached.as_ref() {
            return Ok(keys.clone());
        }
        let keys = self.scan(connection).await?;
        debug!(pattern = %self.pattern, count = keys.len(), "discovered queue keys");
        *cached = Some(keys.clone());
        Ok(keys)
    }

    /// Clears the memo so the next call re-discovers the key set.
    pub async fn invalidate(&self) {
        *self.cached.lock().await = None;
    }

    /// Runs the incremental scan until completion or the cap.
    async fn scan(&self, connection: &mut ConnectionManager) -> Result<Vec<String>, RedisError> {
        let mut keys: Vec<String> = Vec::new();
        let mut cursor: u64 = 0;
        loop {
            let (next, page): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&self.pattern)
                .arg("COUNT")
                .arg(SCAN_COUNT)
                .query_async(connection)
                .await?;
            let capped = accumulate_page(&mut keys, page, self.cap);
            if capped || next == 0 {
                return Ok(keys);
            }
            cursor = next;
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Appends a scan page to the accumulator, honoring the cap.
///
/// Returns true when the cap has been reached and scanning should stop.
fn accumulate_page(keys: &mut Vec<String>, page: Vec<String>, cap: usize) -> bool {
    for key in page {
        if keys.len() >= cap {
            return true;
        }
        keys.push(key);
    }
    keys.len() >= cap
}
