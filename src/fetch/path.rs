//! The cache-coalescing read path.
//!
//! One fetch walks: cache fast path, lock acquisition, double-checked cache
//! re-read, store query and cache fill. When the lock cannot be had, the
//! fetch waits out the presumed owner and re-checks the cache before falling
//! back to a direct store query. Across any burst of concurrent misses for
//! one id, at most a small constant number of store queries should result.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::kv::{entity_key, KeyValueCache};
use crate::lock::LockManager;
use crate::metrics::StampedeMetrics;
use crate::store::{Record, RecordStore};

// == Source ==
/// Provenance tag on every successful fetch, naming the code path that
/// produced the data. The string forms are part of the observable contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Fast-path cache hit
    Cache,
    /// Cache hit on the double-checked read after acquiring the lock
    CacheAfterLock,
    /// Store query under the lock
    Db,
    /// Cache hit on the re-read after the contended-path wait
    CacheAfterWait,
    /// Direct store query after lock acquisition failed and the wait expired
    DbNoLock,
}

// == Fetch Outcome ==
/// A fetched record tagged with its provenance.
#[derive(Debug, Clone, Serialize)]
pub struct FetchOutcome {
    pub source: Source,
    pub record: Record,
}

// == Fetch Config ==
/// Tunables of the read path. All three durations are part of the external
/// contract; none may be hard-coded in the path itself.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// TTL applied to every cache fill
    pub cache_ttl: Duration,
    /// Maximum lease hold time passed to the lock manager
    pub lock_max_hold: Duration,
    /// Fixed wait before the contended-path cache re-read
    pub contended_wait: Duration,
    /// Whether the contended path may query the store without a lease.
    /// Disabled, sustained lock-manager failure degrades to unavailability
    /// instead of an unprotected herd.
    pub unlocked_fallback: bool,
}

impl FetchConfig {
    /// Builds the path tunables from server configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            cache_ttl: config.cache_ttl(),
            lock_max_hold: config.lock_max_hold(),
            contended_wait: config.contended_wait(),
            unlocked_fallback: config.unlocked_fallback,
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

// == Coalesced Fetch ==
/// Orchestrates cache, lock manager, and store to answer "fetch record by
/// id" with at most effectively one store query per cache-miss episode.
pub struct CoalescedFetch {
    cache: Arc<dyn KeyValueCache>,
    locks: Arc<dyn LockManager>,
    store: Arc<dyn RecordStore>,
    metrics: Arc<StampedeMetrics>,
    config: FetchConfig,
}

impl CoalescedFetch {
    pub fn new(
        cache: Arc<dyn KeyValueCache>,
        locks: Arc<dyn LockManager>,
        store: Arc<dyn RecordStore>,
        metrics: Arc<StampedeMetrics>,
        config: FetchConfig,
    ) -> Self {
        Self {
            cache,
            locks,
            store,
            metrics,
            config,
        }
    }

    /// Shared instrumentation counters.
    pub fn metrics(&self) -> &Arc<StampedeMetrics> {
        &self.metrics
    }

    // == Fetch ==
    /// Fetches one record by its raw identifier string.
    ///
    /// Fails with `InvalidArgument` before touching any collaborator if the
    /// identifier does not parse, with `NotFound` if the store has no such
    /// row, and with `Internal` for any other collaborator failure. Lock
    /// contention is handled internally and never surfaces.
    pub async fn fetch(&self, raw_id: &str) -> Result<FetchOutcome> {
        let id: i64 = raw_id
            .parse()
            .map_err(|_| FetchError::InvalidArgument(raw_id.to_string()))?;

        let key = entity_key(id);

        // Fast path: never touches the lock or the store.
        if let Some(raw) = self.cache_read(id, &key, "fast path").await? {
            self.metrics.record_cache_hit();
            debug!(id, "cache hit");
            let record = self.decode(id, &raw)?;
            return Ok(FetchOutcome {
                source: Source::Cache,
                record,
            });
        }

        let lock_keys = vec![lock_key(id)];
        match self
            .locks
            .acquire(&lock_keys, self.config.lock_max_hold)
            .await
        {
            Ok(lease) => {
                debug!(id, "lock acquired");
                let result = self.fill_as_owner(id, &key).await;
                // Exactly one release per acquisition, on every exit path.
                // Losing a lease early is a performance concern, not a
                // correctness one, so a failed release never fails the fetch.
                if let Err(err) = self.locks.release(lease).await {
                    warn!(id, error = %err, "failed to release lock lease");
                } else {
                    debug!(id, "lock released");
                }
                result
            }
            Err(err) => {
                // Acquisition failure means some other fetch is presumed to
                // be filling the cache; a lock-manager outage lands here too.
                debug!(id, error = %err, "lock not acquired, entering contended path");
                self.fetch_contended(id, &key).await
            }
        }
    }

    // == Owner Path ==
    /// Holds the lease: double-check the cache, then query and fill.
    async fn fill_as_owner(&self, id: i64, key: &str) -> Result<FetchOutcome> {
        // Another holder may have filled the cache between the fast path
        // and our acquisition; its release happens-before our acquire.
        if let Some(raw) = self.cache_read(id, key, "double check").await? {
            self.metrics.record_cache_hit();
            debug!(id, "cache hit after lock");
            let record = self.decode(id, &raw)?;
            return Ok(FetchOutcome {
                source: Source::CacheAfterLock,
                record,
            });
        }

        self.metrics.record_cache_miss();
        self.metrics.record_store_query();
        info!(id, "cache miss, querying store");

        let record = self
            .store
            .find_by_id(id)
            .await
            .map_err(|err| self.internal(id, "store query", &err))?
            .ok_or(FetchError::NotFound(id))?;

        self.fill_cache(id, key, &record).await?;
        Ok(FetchOutcome {
            source: Source::Db,
            record,
        })
    }

    // == Contended Path ==
    /// Could not get the lease: wait for the presumed owner, re-check, and
    /// only then fall back to the store.
    async fn fetch_contended(&self, id: i64, key: &str) -> Result<FetchOutcome> {
        self.metrics.record_cache_miss();
        tokio::time::sleep(self.config.contended_wait).await;

        if let Some(raw) = self.cache_read(id, key, "contended recheck").await? {
            debug!(id, "cache hit after wait");
            let record = self.decode(id, &raw)?;
            return Ok(FetchOutcome {
                source: Source::CacheAfterWait,
                record,
            });
        }

        if !self.config.unlocked_fallback {
            error!(id, "cache still empty after contended wait, lockless fallback disabled");
            return Err(FetchError::Internal(format!(
                "record {} temporarily unavailable",
                id
            )));
        }

        // The owner failed, was slow, or never existed. Querying without the
        // lease trades strict throttling for availability.
        self.metrics.record_store_query();
        info!(id, "cache still empty after wait, querying store without lock");

        let record = self
            .store
            .find_by_id(id)
            .await
            .map_err(|err| self.internal(id, "lockless store query", &err))?
            .ok_or(FetchError::NotFound(id))?;

        self.fill_cache(id, key, &record).await?;
        Ok(FetchOutcome {
            source: Source::DbNoLock,
            record,
        })
    }

    // == Helpers ==
    async fn cache_read(&self, id: i64, key: &str, phase: &str) -> Result<Option<String>> {
        self.cache
            .get(key)
            .await
            .map_err(|err| self.internal(id, phase, &err))
    }

    async fn fill_cache(&self, id: i64, key: &str, record: &Record) -> Result<()> {
        let snapshot = serde_json::to_string(record)
            .map_err(|err| self.internal(id, "snapshot encode", &err))?;
        self.cache
            .set_with_expiry(key, snapshot, self.config.cache_ttl)
            .await
            .map_err(|err| self.internal(id, "cache fill", &err))
    }

    fn decode(&self, id: i64, raw: &str) -> Result<Record> {
        serde_json::from_str(raw).map_err(|err| self.internal(id, "snapshot decode", &err))
    }

    fn internal(&self, id: i64, phase: &str, err: &dyn std::fmt::Display) -> FetchError {
        error!(id, phase, error = %err, "fetch failed");
        FetchError::Internal(format!("{} failed for record {}", phase, id))
    }
}

/// Lock key scoping the lease to one record.
fn lock_key(id: i64) -> String {
    format!("lock:{}", entity_key(id))
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::{KvError, MemoryCache};
    use crate::lock::{Lease, LockConfig, LockError, MemoryLockManager};
    use crate::store::{MemoryStore, StoreError};
    use async_trait::async_trait;

    fn test_config() -> FetchConfig {
        FetchConfig {
            cache_ttl: Duration::from_secs(30),
            lock_max_hold: Duration::from_millis(5000),
            contended_wait: Duration::from_millis(20),
            unlocked_fallback: true,
        }
    }

    fn test_fetch() -> CoalescedFetch {
        CoalescedFetch::new(
            Arc::new(MemoryCache::new()),
            Arc::new(MemoryLockManager::new(LockConfig {
                retry_count: 2,
                retry_delay: Duration::from_millis(10),
                retry_jitter: Duration::from_millis(5),
            })),
            Arc::new(MemoryStore::seeded(10)),
            Arc::new(StampedeMetrics::new()),
            test_config(),
        )
    }

    // Collaborators that fail the test if the path touches them.
    struct UnreachableCache;
    struct UnreachableLocks;
    struct UnreachableStore;

    #[async_trait]
    impl KeyValueCache for UnreachableCache {
        async fn get(&self, _key: &str) -> std::result::Result<Option<String>, KvError> {
            panic!("cache must not be consulted");
        }
        async fn set_with_expiry(
            &self,
            _key: &str,
            _value: String,
            _ttl: Duration,
        ) -> std::result::Result<(), KvError> {
            panic!("cache must not be written");
        }
        async fn delete(&self, _key: &str) -> std::result::Result<u64, KvError> {
            panic!("cache must not be touched");
        }
    }

    #[async_trait]
    impl LockManager for UnreachableLocks {
        async fn acquire(
            &self,
            _keys: &[String],
            _max_hold: Duration,
        ) -> std::result::Result<Lease, LockError> {
            panic!("lock manager must not be consulted");
        }
        async fn release(&self, _lease: Lease) -> std::result::Result<(), LockError> {
            panic!("lock manager must not be touched");
        }
    }

    #[async_trait]
    impl RecordStore for UnreachableStore {
        async fn find_by_id(&self, _id: i64) -> std::result::Result<Option<Record>, StoreError> {
            panic!("store must not be queried");
        }
        async fn find_all(&self) -> std::result::Result<Vec<Record>, StoreError> {
            panic!("store must not be queried");
        }
    }

    /// Lock manager that is never available, as during a backend outage.
    struct DownLocks;

    #[async_trait]
    impl LockManager for DownLocks {
        async fn acquire(
            &self,
            keys: &[String],
            _max_hold: Duration,
        ) -> std::result::Result<Lease, LockError> {
            Err(LockError::Unavailable(keys.join(",")))
        }
        async fn release(&self, _lease: Lease) -> std::result::Result<(), LockError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_invalid_id_touches_no_collaborator() {
        let fetch = CoalescedFetch::new(
            Arc::new(UnreachableCache),
            Arc::new(UnreachableLocks),
            Arc::new(UnreachableStore),
            Arc::new(StampedeMetrics::new()),
            test_config(),
        );

        let result = fetch.fetch("abc").await;
        assert!(matches!(result, Err(FetchError::InvalidArgument(_))));

        let snap = fetch.metrics().snapshot();
        assert_eq!(snap.store_queries, 0);
        assert_eq!(snap.cache_hits, 0);
        assert_eq!(snap.cache_misses, 0);
    }

    #[tokio::test]
    async fn test_cold_fetch_queries_store_once() {
        let fetch = test_fetch();

        let outcome = fetch.fetch("1").await.unwrap();
        assert_eq!(outcome.source, Source::Db);
        assert_eq!(outcome.record.id, 1);
        assert_eq!(outcome.record.name, "Record 1");

        let snap = fetch.metrics().snapshot();
        assert_eq!(snap.store_queries, 1);
        assert_eq!(snap.cache_misses, 1);
        assert_eq!(snap.cache_hits, 0);
        assert!(!snap.herd_detected);
    }

    #[tokio::test]
    async fn test_warm_fetch_hits_cache() {
        let fetch = test_fetch();

        fetch.fetch("1").await.unwrap();
        let outcome = fetch.fetch("1").await.unwrap();
        assert_eq!(outcome.source, Source::Cache);

        let snap = fetch.metrics().snapshot();
        assert_eq!(snap.cache_hits, 1);
        assert_eq!(snap.store_queries, 1);
    }

    #[tokio::test]
    async fn test_warm_fetch_round_trips_record() {
        let fetch = test_fetch();

        let filled = fetch.fetch("3").await.unwrap();
        let cached = fetch.fetch("3").await.unwrap();
        assert_eq!(cached.record, filled.record);
    }

    #[tokio::test]
    async fn test_absent_id_is_not_found_and_not_cached() {
        let cache = Arc::new(MemoryCache::new());
        let locks = Arc::new(MemoryLockManager::new(LockConfig::default()));
        let fetch = CoalescedFetch::new(
            cache.clone(),
            locks.clone(),
            Arc::new(MemoryStore::seeded(10)),
            Arc::new(StampedeMetrics::new()),
            test_config(),
        );

        let result = fetch.fetch("999999").await;
        assert!(matches!(result, Err(FetchError::NotFound(999999))));
        assert_eq!(cache.get("entity:999999").await.unwrap(), None);

        // The lease was released on the error path: a fresh acquisition
        // succeeds without waiting out the hold time.
        let lease = locks
            .acquire(&[lock_key(999999)], Duration::from_secs(5))
            .await
            .unwrap();
        locks.release(lease).await.unwrap();
    }

    #[tokio::test]
    async fn test_contended_path_finds_entry_after_wait() {
        let cache = Arc::new(MemoryCache::new());
        let store = Arc::new(MemoryStore::seeded(10));
        let record = store.find_by_id(2).await.unwrap().unwrap();
        let mut config = test_config();
        config.contended_wait = Duration::from_millis(60);
        let fetch = CoalescedFetch::new(
            cache.clone(),
            Arc::new(DownLocks),
            store,
            Arc::new(StampedeMetrics::new()),
            config,
        );

        // A second task fills the cache during the contended wait, standing
        // in for the presumed owner finishing its fill.
        let filler = {
            let cache = cache.clone();
            let snapshot = serde_json::to_string(&record).unwrap();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                cache
                    .set_with_expiry("entity:2", snapshot, Duration::from_secs(30))
                    .await
                    .unwrap();
            })
        };

        let outcome = fetch.fetch("2").await.unwrap();
        filler.await.unwrap();

        assert_eq!(outcome.source, Source::CacheAfterWait);
        assert_eq!(outcome.record, record);

        let snap = fetch.metrics().snapshot();
        assert_eq!(snap.store_queries, 0);
        assert_eq!(snap.cache_misses, 1);
    }

    #[tokio::test]
    async fn test_contended_path_falls_back_to_store() {
        let fetch = CoalescedFetch::new(
            Arc::new(MemoryCache::new()),
            Arc::new(DownLocks),
            Arc::new(MemoryStore::seeded(10)),
            Arc::new(StampedeMetrics::new()),
            test_config(),
        );

        let outcome = fetch.fetch("2").await.unwrap();
        assert_eq!(outcome.source, Source::DbNoLock);

        let snap = fetch.metrics().snapshot();
        assert_eq!(snap.store_queries, 1);
        assert_eq!(snap.cache_misses, 1);
    }

    #[tokio::test]
    async fn test_contended_path_without_fallback_fails() {
        let mut config = test_config();
        config.unlocked_fallback = false;

        let fetch = CoalescedFetch::new(
            Arc::new(MemoryCache::new()),
            Arc::new(DownLocks),
            Arc::new(MemoryStore::seeded(10)),
            Arc::new(StampedeMetrics::new()),
            config,
        );

        let result = fetch.fetch("2").await;
        assert!(matches!(result, Err(FetchError::Internal(_))));
        assert_eq!(fetch.metrics().snapshot().store_queries, 0);
    }

    #[tokio::test]
    async fn test_source_serializes_to_contract_strings() {
        let tags = [
            (Source::Cache, "\"cache\""),
            (Source::CacheAfterLock, "\"cache_after_lock\""),
            (Source::Db, "\"db\""),
            (Source::CacheAfterWait, "\"cache_after_wait\""),
            (Source::DbNoLock, "\"db_no_lock\""),
        ];
        for (source, expected) in tags {
            assert_eq!(serde_json::to_string(&source).unwrap(), expected);
        }
    }
}
