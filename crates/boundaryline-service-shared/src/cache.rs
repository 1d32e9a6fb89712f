//! Read-through cache for serialized response bodies.
//!
//! Entries are keyed by request signature (path plus canonical query
//! string) and expire on a timer; the catalog is read-only once loaded, so
//! no invalidation hook exists. The cache tolerates stampedes: two requests
//! that miss concurrently both recompute and the second write wins.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Default entry lifetime.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Entry count beyond which expired entries are swept on insert.
const SWEEP_THRESHOLD: usize = 1024;

/// A cached serialized response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub content_type: String,
    pub body: String,
}

struct Entry {
    inserted: Instant,
    response: CachedResponse,
}

/// Time-expiring response cache keyed by request signature.
pub struct ResponseCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl ResponseCache {
    /// Create a cache with the given entry lifetime. A zero TTL disables
    /// caching entirely.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Fetch a live entry, dropping it if expired.
    pub fn get(&self, key: &str) -> Option<CachedResponse> {
        self.get_at(key, Instant::now())
    }

    /// Store a response under the request signature.
    pub fn put(&self, key: &str, response: CachedResponse) {
        self.put_at(key, response, Instant::now())
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<CachedResponse> {
        if self.ttl.is_zero() {
            return None;
        }

        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        match entries.get(key) {
            Some(entry) if now.duration_since(entry.inserted) < self.ttl => {
                Some(entry.response.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn put_at(&self, key: &str, response: CachedResponse, now: Instant) {
        if self.ttl.is_zero() {
            return;
        }

        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if entries.len() > SWEEP_THRESHOLD {
            let ttl = self.ttl;
            entries.retain(|_, e| now.duration_since(e.inserted) < ttl);
        }

        entries.insert(
            key.to_string(),
            Entry {
                inserted: now,
                response,
            },
        );
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("ttl", &self.ttl)
            .finish()
    }
}
