//! Property-Based Tests for Cache Module
//!
//! Drives the read-through cache with random sequences of lookups whose
//! producers either succeed or fail, and checks every result against a simple
//! model of the last successful write per key.

use proptest::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::cache::ReadThroughCache;

// == Strategies ==
/// Generates cache keys in the `{namespace}:{symbol}` shape
fn key_strategy() -> impl Strategy<Value = String> {
    ("(trust|news|social)", "[A-Z]{2,5}").prop_map(|(ns, sym)| format!("{}:{}.NS", ns, sym))
}

#[derive(Debug, Clone)]
struct Lookup {
    key: String,
    /// What the producer yields if it runs
    outcome: Result<u32, String>,
    /// 0 writes an entry that is immediately expired
    ttl: u64,
}

fn lookup_strategy() -> impl Strategy<Value = Lookup> {
    (
        key_strategy(),
        prop_oneof![
            3 => (0u32..1000).prop_map(Ok::<u32, String>),
            1 => "[a-z]{1,8}".prop_map(Err::<u32, String>),
        ],
        prop_oneof![Just(0u64), Just(300u64)],
    )
        .prop_map(|(key, outcome, ttl)| Lookup { key, outcome, ttl })
}

#[derive(Debug, Clone, Copy)]
struct ModelEntry {
    value: u32,
    fresh: bool,
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Every result matches the model: fresh hits skip the producer, failures
    // fall back to the last written value as stale, and only keys with no
    // write at all surface the producer's error.
    #[test]
    fn prop_with_cache_matches_model(ops in prop::collection::vec(lookup_strategy(), 1..60)) {
        let cache = ReadThroughCache::memory_only();
        let mut model: HashMap<String, ModelEntry> = HashMap::new();

        for op in ops {
            let outcome = op.outcome.clone();
            let result = tokio_test::block_on(
                cache.with_cache(&op.key, op.ttl, move || async move { outcome }),
            );

            match model.get(&op.key).copied() {
                Some(entry) if entry.fresh => {
                    let cached = result.expect("fresh hit never fails");
                    prop_assert_eq!(cached.data, entry.value);
                    prop_assert!(!cached.stale);
                }
                previous => match (&op.outcome, previous) {
                    (Ok(value), _) => {
                        let cached = result.expect("successful producer");
                        prop_assert_eq!(cached.data, *value);
                        prop_assert!(!cached.stale);
                        model.insert(op.key.clone(), ModelEntry { value: *value, fresh: op.ttl > 0 });
                    }
                    (Err(_), Some(entry)) => {
                        let cached = result.expect("stale fallback");
                        prop_assert_eq!(cached.data, entry.value);
                        prop_assert!(cached.stale);
                    }
                    (Err(message), None) => {
                        prop_assert_eq!(result.unwrap_err(), message.clone());
                    }
                },
            }
        }

        let stats = tokio_test::block_on(cache.stats());
        prop_assert_eq!(stats.memory_entries, model.len());
    }

    // The local table never holds more entries than distinct keys written.
    #[test]
    fn prop_entry_count_bounded_by_distinct_keys(
        writes in prop::collection::vec((key_strategy(), 0u32..100), 1..80)
    ) {
        let cache = ReadThroughCache::memory_only();
        let mut written = HashSet::new();

        for (key, value) in writes {
            tokio_test::block_on(
                cache.with_cache(&key, 0, move || async move { Ok::<_, String>(value) }),
            )
            .unwrap();
            written.insert(key);

            let stats = tokio_test::block_on(cache.stats());
            prop_assert!(stats.memory_entries <= written.len());
        }
    }

    // Without a remote tier every lookup is either a memory hit or a miss.
    #[test]
    fn prop_lookups_are_hits_or_misses(ops in prop::collection::vec(lookup_strategy(), 1..40)) {
        let cache = ReadThroughCache::memory_only();
        let total = ops.len() as u64;

        for op in ops {
            let outcome = op.outcome;
            let _ = tokio_test::block_on(
                cache.with_cache(&op.key, op.ttl, move || async move { outcome }),
            );
        }

        let stats = tokio_test::block_on(cache.stats());
        prop_assert_eq!(stats.memory_hits + stats.misses, total);
        prop_assert_eq!(stats.remote_hits, 0);
        prop_assert_eq!(stats.errors, 0);
    }
}
