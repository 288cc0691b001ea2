//! Cache Statistics Module
//!
//! Lock-free counters updated on the read/write path, and the serializable
//! snapshot reported by the health endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Point-in-time view of the cache counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Fresh values served from the in-process table
    pub memory_hits: u64,
    /// Values served from the remote tier
    pub remote_hits: u64,
    /// Lookups that found nothing usable in either tier
    pub misses: u64,
    /// Successful producer results written through
    pub writes: u64,
    /// Swallowed remote-tier or codec failures
    pub errors: u64,
    /// Current number of entries in the in-process table
    pub memory_entries: usize,
}

impl CacheStats {
    // == Hit Rate ==
    /// Returns hits / (hits + misses) across both tiers, or 0.0 with no traffic.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.memory_hits + self.remote_hits;
        let total = hits + self.misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }
}

// == Cache Counters ==
/// Shared counters behind [`CacheStats`].
#[derive(Debug, Default)]
pub struct CacheCounters {
    memory_hits: AtomicU64,
    remote_hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    errors: AtomicU64,
}

impl CacheCounters {
    /// Creates a new set of counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_memory_hit(&self) {
        self.memory_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_remote_hit(&self) {
        self.remote_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Reads every counter into a [`CacheStats`].
    pub fn snapshot(&self, memory_entries: usize) -> CacheStats {
        CacheStats {
            memory_hits: self.memory_hits.load(Ordering::Relaxed),
            remote_hits: self.remote_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            memory_entries,
        }
    }
}
