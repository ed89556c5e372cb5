//! Stampede Instrumentation Module
//!
//! Process-wide counters for store queries, cache hits, and cache misses,
//! used to observationally verify that the coalescing read path is actually
//! protecting the backing store. The counters never gate behavior.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Stampede Metrics ==
/// Thread-safe counter service shared by every in-flight fetch.
///
/// Increments are atomic with respect to each other (lost updates are not
/// acceptable) but are not atomic with respect to the cache/lock/store calls
/// interleaved around them. A reset racing an in-flight fetch may attribute
/// that fetch's counts to either the pre- or post-reset window.
#[derive(Debug, Default)]
pub struct StampedeMetrics {
    store_queries: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

impl StampedeMetrics {
    // == Constructor ==
    /// Creates a new StampedeMetrics with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Store Query ==
    /// Increments the store-query counter.
    pub fn record_store_query(&self) {
        self.store_queries.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Cache Hit ==
    /// Increments the cache-hit counter.
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Cache Miss ==
    /// Increments the cache-miss counter.
    pub fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Returns the current counter values plus the herd verdict.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let store_queries = self.store_queries.load(Ordering::Relaxed);
        let cache_hits = self.cache_hits.load(Ordering::Relaxed);
        let cache_misses = self.cache_misses.load(Ordering::Relaxed);
        MetricsSnapshot::new(store_queries, cache_hits, cache_misses)
    }

    // == Reset ==
    /// Zeroes all three counters.
    pub fn reset(&self) {
        self.store_queries.store(0, Ordering::Relaxed);
        self.cache_hits.store(0, Ordering::Relaxed);
        self.cache_misses.store(0, Ordering::Relaxed);
    }
}

// == Metrics Snapshot ==
/// Point-in-time view of the stampede counters.
///
/// `herd_detected` is true when more store queries were issued than cache
/// misses occurred, a direct signal that duplicate queries leaked through
/// the coalescing path.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Number of queries issued to the backing store
    pub store_queries: u64,
    /// Number of fetches answered from the cache
    pub cache_hits: u64,
    /// Number of fetches that missed the cache
    pub cache_misses: u64,
    /// Whether herd leakage was observed
    pub herd_detected: bool,
    /// Human-readable verdict
    pub message: String,
}

impl MetricsSnapshot {
    fn new(store_queries: u64, cache_hits: u64, cache_misses: u64) -> Self {
        let herd_detected = store_queries > cache_misses;
        let message = if herd_detected {
            format!(
                "Thundering herd detected: {} store queries for {} cache miss(es)",
                store_queries, cache_misses
            )
        } else {
            "No thundering herd detected".to_string()
        };
        Self {
            store_queries,
            cache_hits,
            cache_misses,
            herd_detected,
            message,
        }
    }
}
