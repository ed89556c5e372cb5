//! Backing Record Store Module
//!
//! Source of truth for record data. The read path only ever needs
//! lookup-by-identifier; bulk listing exists for the unprotected list
//! endpoint.

mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::MemoryStore;

// == Record ==
/// An identified record as stored in the backing store.
///
/// Immutable on the read path; cached snapshots are serialized copies of
/// this struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

// == Store Error ==
/// Failure reported by the backing store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend rejected or failed the query
    #[error("store backend error: {0}")]
    Backend(String),
}

// == Record Store Trait ==
/// Contract for the backing record store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Looks up a single record, `None` if no such row exists.
    async fn find_by_id(&self, id: i64) -> Result<Option<Record>, StoreError>;

    /// Returns every record. Used only by the bulk list endpoint.
    async fn find_all(&self) -> Result<Vec<Record>, StoreError>;
}
