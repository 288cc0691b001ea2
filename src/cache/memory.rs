//! Memory Tier Module
//!
//! The process-local table: one entry per key, overwritten on every write,
//! never swept.

use std::collections::HashMap;

use crate::cache::CacheEntry;

// == Memory Table ==
/// In-process key/value table with per-entry expiry bookkeeping.
#[derive(Debug, Default)]
pub struct MemoryTable {
    entries: HashMap<String, CacheEntry>,
}

impl MemoryTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert ==
    /// Stores `value` under `key`, replacing any previous entry and resetting
    /// its expiry to now + `ttl_seconds`.
    pub fn insert(&mut self, key: &str, value: String, ttl_seconds: u64) {
        self.entries
            .insert(key.to_string(), CacheEntry::new(value, ttl_seconds));
    }

    /// Places a prebuilt entry, used to backdate writes in tests.
    #[cfg(test)]
    pub fn insert_entry(&mut self, key: &str, entry: CacheEntry) {
        self.entries.insert(key.to_string(), entry);
    }

    // == Get ==
    /// Returns the entry for `key` whether or not it has expired.
    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    // == Length ==
    /// Number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
