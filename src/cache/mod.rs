//! Cache Module
//!
//! Stale-tolerant two-tier read-through cache: an in-process table with
//! per-entry expiry in front of an optional shared remote store.

pub(crate) mod entry;
mod memory;
mod read_through;
mod remote;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use memory::MemoryTable;
pub use read_through::{Cached, ReadThroughCache};
pub use remote::{RemoteError, RemoteStore, UpstashStore};
pub use stats::{CacheCounters, CacheStats};
