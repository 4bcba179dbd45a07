//! Token storage backends
//!
//! A [`TokenStore`] is a key/value cache with per-key expiry. The expiry
//! deadline is computed at store time as `now + ttl - refresh_margin`, so a
//! cached token always disappears from the store well before the platform
//! invalidates it. Entries are evicted lazily on read, never actively swept.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::config::TOKEN_REFRESH_MARGIN;

/// Key/value cache with per-key expiry.
///
/// Implementations must be safe under concurrent read/refresh from multiple
/// operations racing to use the same token. A backend whose `get` can fail
/// (e.g. a network cache) must report failures as absent rather than
/// propagate them; absence always triggers a fresh acquisition upstream.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Store `value` under `key` with an absolute expiry of
    /// `now + ttl - refresh_margin`.
    async fn set(&self, key: &str, value: &str, ttl: Duration);

    /// Return the value under `key` if it has not expired; expired entries
    /// are evicted and reported as absent.
    async fn get(&self, key: &str) -> Option<String>;
}

struct StoredToken {
    value: String,
    deadline: Instant,
}

/// In-process token store backed by a mutex-guarded map.
///
/// The single mutex makes each `set`/`get` pair atomic per key, which is all
/// the contention this store ever sees: token refresh happens roughly once
/// per ninety minutes.
pub struct MemoryStore {
    refresh_margin: Duration,
    entries: Mutex<HashMap<String, StoredToken>>,
}

impl MemoryStore {
    /// Create a store with the given refresh margin.
    pub fn new(refresh_margin: Duration) -> Self {
        Self {
            refresh_margin,
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(TOKEN_REFRESH_MARGIN)
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) {
        let effective = ttl.saturating_sub(self.refresh_margin);
        if effective.is_zero() {
            debug!(key, ttl_secs = ttl.as_secs(), "TTL within refresh margin, not caching");
            return;
        }
        let deadline = Instant::now() + effective;
        self.entries.lock().insert(
            key.to_string(),
            StoredToken {
                value: value.to_string(),
                deadline,
            },
        );
    }

    async fn get(&self, key: &str) -> Option<String> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.deadline > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                debug!(key, "Evicted expired token");
                None
            }
            None => None,
        }
    }
}
