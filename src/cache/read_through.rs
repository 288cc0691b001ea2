//! Read-Through Cache Module
//!
//! Two-tier cache with stale-on-error fallback. A fresh local value wins; the
//! remote tier is consulted next; otherwise the caller's producer runs and its
//! result is written through. When the producer fails, an expired local value
//! is served marked as stale instead of failing the caller.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::cache::{CacheCounters, CacheStats, MemoryTable, RemoteStore};

// == Cached ==
/// A value returned by [`ReadThroughCache::with_cache`].
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub data: T,
    /// True when `data` is an expired value served because the refresh failed
    pub stale: bool,
}

impl<T> Cached<T> {
    fn fresh(data: T) -> Self {
        Self { data, stale: false }
    }

    fn stale(data: T) -> Self {
        Self { data, stale: true }
    }
}

// == Read-Through Cache ==
/// Process-wide cache shared by all request handlers.
///
/// Concurrent misses on the same key are not coalesced: each runs its own
/// producer and the last successful write wins.
pub struct ReadThroughCache {
    memory: RwLock<MemoryTable>,
    remote: Option<Arc<dyn RemoteStore>>,
    counters: CacheCounters,
}

impl ReadThroughCache {
    // == Constructors ==
    /// Creates a cache, optionally backed by a remote tier.
    pub fn new(remote: Option<Arc<dyn RemoteStore>>) -> Self {
        Self {
            memory: RwLock::new(MemoryTable::new()),
            remote,
            counters: CacheCounters::new(),
        }
    }

    /// Creates a cache with the local table only.
    pub fn memory_only() -> Self {
        Self::new(None)
    }

    /// Whether a remote tier is configured.
    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    // == With Cache ==
    /// Returns the value for `key`, producing and caching it when needed.
    ///
    /// `ttl_seconds` is expected to be positive; a zero ttl writes entries that
    /// are never served as fresh.
    ///
    /// # Errors
    /// Returns the producer's error only when it fails and no previous value
    /// exists for `key`.
    pub async fn with_cache<T, E, F, Fut>(
        &self,
        key: &str,
        ttl_seconds: u64,
        producer: F,
    ) -> Result<Cached<T>, E>
    where
        T: Serialize + DeserializeOwned,
        E: Display,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let fallback = {
            let memory = self.memory.read().await;
            match memory.get(key) {
                Some(entry) if !entry.is_expired() => {
                    if let Some(data) = self.decode::<T>(key, &entry.value) {
                        self.counters.record_memory_hit();
                        debug!(key, ttl_remaining_ms = entry.ttl_remaining_ms(), "cache hit (memory)");
                        return Ok(Cached::fresh(data));
                    }
                    None
                }
                Some(entry) => Some(entry.value.clone()),
                None => None,
            }
        };

        if let Some(data) = self.remote_get::<T>(key).await {
            self.counters.record_remote_hit();
            debug!(key, "cache hit (remote)");
            return Ok(Cached::fresh(data));
        }

        self.counters.record_miss();
        debug!(key, "cache miss");

        match producer().await {
            Ok(data) => {
                self.write_through(key, ttl_seconds, &data).await;
                Ok(Cached::fresh(data))
            }
            Err(err) => match fallback.and_then(|raw| self.decode::<T>(key, &raw)) {
                Some(data) => {
                    warn!(key, error = %err, "refresh failed, serving stale value");
                    Ok(Cached::stale(data))
                }
                None => Err(err),
            },
        }
    }

    // == Stats ==
    /// Returns a snapshot of the cache counters.
    pub async fn stats(&self) -> CacheStats {
        let entries = self.memory.read().await.len();
        self.counters.snapshot(entries)
    }

    /// Remote lookup; every failure degrades to a miss.
    async fn remote_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let remote = self.remote.as_ref()?;
        match remote.get(key).await {
            Ok(Some(raw)) => self.decode(key, &raw),
            Ok(None) => None,
            Err(e) => {
                self.counters.record_error();
                warn!(key, error = %e, "remote cache lookup failed");
                None
            }
        }
    }

    async fn write_through<T: Serialize>(&self, key: &str, ttl_seconds: u64, data: &T) {
        let serialized = match serde_json::to_string(data) {
            Ok(s) => s,
            Err(e) => {
                self.counters.record_error();
                warn!(key, error = %e, "value not cacheable");
                return;
            }
        };

        self.memory
            .write()
            .await
            .insert(key, serialized.clone(), ttl_seconds);
        self.counters.record_write();

        if let Some(remote) = &self.remote {
            if let Err(e) = remote.set_ex(key, ttl_seconds, &serialized).await {
                self.counters.record_error();
                warn!(key, error = %e, "remote cache write failed");
            }
        }
    }

    fn decode<T: DeserializeOwned>(&self, key: &str, raw: &str) -> Option<T> {
        match serde_json::from_str(raw) {
            Ok(data) => Some(data),
            Err(e) => {
                self.counters.record_error();
                warn!(key, error = %e, "cached value could not be decoded");
                None
            }
        }
    }

    #[cfg(test)]
    pub(crate) async fn seed(&self, key: &str, entry: crate::cache::CacheEntry) {
        self.memory.write().await.insert_entry(key, entry);
    }
}

impl std::fmt::Debug for ReadThroughCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadThroughCache")
            .field("remote", &self.remote.is_some())
            .field("counters", &self.counters)
            .finish()
    }
}
