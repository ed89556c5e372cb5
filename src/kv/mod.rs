//! Key-Value Cache Module
//!
//! The cache collaborator consumed by the read path: serialized record
//! snapshots keyed by identifier, with a time-to-live. The trait keeps the
//! path independent of the backend; [`MemoryCache`] is the in-process
//! implementation used in production wiring and tests alike.

mod memory;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryCache;

// == Key Helpers ==
/// Cache key for a record snapshot.
pub fn entity_key(id: i64) -> String {
    format!("entity:{}", id)
}

// == Cache Error ==
/// Failure reported by a cache backend.
#[derive(Error, Debug)]
pub enum KvError {
    /// The backend rejected or failed the operation
    #[error("cache backend error: {0}")]
    Backend(String),
}

// == Key-Value Cache Trait ==
/// Contract for the shared key-value cache.
///
/// All methods suspend; the cache is a single shared resource read and
/// written freely by any number of concurrent fetches.
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    /// Returns the value stored under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<String>, KvError>;

    /// Stores `value` under `key`, expiring after `ttl`.
    async fn set_with_expiry(&self, key: &str, value: String, ttl: Duration)
        -> Result<(), KvError>;

    /// Removes `key`, returning how many entries were removed (0 or 1).
    async fn delete(&self, key: &str) -> Result<u64, KvError>;
}
