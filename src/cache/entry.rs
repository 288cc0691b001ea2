//! Cache Entry Module
//!
//! Defines a single slot of the in-process table: a serialized value plus the
//! absolute instant after which it is no longer fresh.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A serialized value held in the local tier.
///
/// Expired entries are kept around on purpose: they are the fallback returned
/// when a refresh fails.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached value as JSON text
    pub value: String,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a new entry expiring `ttl_seconds` from now.
    ///
    /// # Arguments
    /// * `value` - The serialized value to store
    /// * `ttl_seconds` - Freshness window in seconds
    pub fn new(value: String, ttl_seconds: u64) -> Self {
        Self::written_at(value, ttl_seconds, current_timestamp_ms())
    }

    /// Creates an entry as if it had been written at `now_ms`.
    pub fn written_at(value: String, ttl_seconds: u64, now_ms: u64) -> Self {
        Self {
            value,
            expires_at: now_ms.saturating_add(ttl_seconds.saturating_mul(1000)),
        }
    }

    // == Is Expired ==
    /// Checks if the entry is past its freshness window.
    ///
    /// An entry is expired once the current time reaches `expires_at`, so a
    /// zero ttl yields an entry that is never served as fresh.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(current_timestamp_ms())
    }

    /// Same as [`is_expired`](Self::is_expired) against an explicit clock.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    // == Time To Live ==
    /// Returns remaining freshness in milliseconds, 0 once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        self.expires_at.saturating_sub(current_timestamp_ms())
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;
    use std::time::Duration;

    #[test]
    fn test_entry_creation() {
        let entry = CacheEntry::new("{\"trustScore\":71.2}".to_string(), 60);

        assert_eq!(entry.value, "{\"trustScore\":71.2}");
        assert!(!entry.is_expired());
    }

    #[test]
    fn test_expiry_is_write_time_plus_ttl() {
        let entry = CacheEntry::written_at("1".to_string(), 600, 1_000);
        assert_eq!(entry.expires_at, 601_000);
    }

    #[test]
    fn test_entry_expiration() {
        let entry = CacheEntry::new("value".to_string(), 1);

        assert!(!entry.is_expired());

        sleep(Duration::from_millis(1100));

        assert!(entry.is_expired());
    }

    #[test]
    fn test_ttl_remaining_ms() {
        let entry = CacheEntry::new("value".to_string(), 10);

        let remaining_ms = entry.ttl_remaining_ms();
        assert!(remaining_ms <= 10_000);
        assert!(remaining_ms >= 9_000);
    }

    #[test]
    fn test_ttl_remaining_expired() {
        let entry = CacheEntry::written_at("value".to_string(), 1, 0);
        assert_eq!(entry.ttl_remaining_ms(), 0);
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = CacheEntry::written_at("value".to_string(), 5, 10_000);

        assert!(!entry.is_expired_at(14_999));
        assert!(entry.is_expired_at(15_000), "Entry should be expired at boundary");
    }

    #[test]
    fn test_zero_ttl_is_never_fresh() {
        let entry = CacheEntry::new("value".to_string(), 0);
        assert!(entry.is_expired());
    }
}
