//! In-process record store.
//!
//! Holds a fixed set of records seeded at startup. An optional per-query
//! latency can be injected so tests and demos can widen the window in which
//! concurrent misses pile up; production wiring injects none.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::{Record, RecordStore, StoreError};

// == Memory Store ==
#[derive(Debug)]
pub struct MemoryStore {
    records: HashMap<i64, Record>,
    query_latency: Option<Duration>,
}

impl MemoryStore {
    /// Creates a store holding the given records.
    pub fn new(records: Vec<Record>) -> Self {
        Self {
            records: records.into_iter().map(|r| (r.id, r)).collect(),
            query_latency: None,
        }
    }

    /// Creates a store seeded with `count` records with ids `1..=count`.
    pub fn seeded(count: i64) -> Self {
        let now = Utc::now();
        let records = (1..=count)
            .map(|id| Record {
                id,
                name: format!("Record {}", id),
                created_at: now,
            })
            .collect();
        Self::new(records)
    }

    /// Injects a fixed latency into every query. Test harness only.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.query_latency = Some(latency);
        self
    }

    async fn simulate_latency(&self) {
        if let Some(latency) = self.query_latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Record>, StoreError> {
        self.simulate_latency().await;
        Ok(self.records.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<Record>, StoreError> {
        self.simulate_latency().await;
        let mut all: Vec<Record> = self.records.values().cloned().collect();
        all.sort_by_key(|r| r.id);
        Ok(all)
    }
}
