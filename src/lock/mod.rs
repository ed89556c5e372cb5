//! Lock Manager Module
//!
//! Identifier-scoped, time-bounded mutual exclusion around cache fills. The
//! trait mirrors a distributed lock service (acquire a lease on a set of
//! keys with a maximum hold time, release it later); [`MemoryLockManager`]
//! is the single-process implementation.

mod memory;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::MemoryLockManager;

// == Lock Config ==
/// Acquisition retry budget, applied inside the lock manager.
///
/// A failed attempt is retried up to `retry_count` times, sleeping
/// `retry_delay` plus up to `retry_jitter` of random spread between attempts.
#[derive(Debug, Clone)]
pub struct LockConfig {
    pub retry_count: u32,
    pub retry_delay: Duration,
    pub retry_jitter: Duration,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            retry_count: 3,
            retry_delay: Duration::from_millis(200),
            retry_jitter: Duration::from_millis(100),
        }
    }
}

// == Lease ==
/// Exclusive ownership token for a set of lock keys.
///
/// At most one live lease exists per key at any instant. The token ties a
/// release back to the acquisition that created it, so a stale holder cannot
/// release a successor's lease.
#[derive(Debug)]
pub struct Lease {
    keys: Vec<String>,
    token: u64,
}

impl Lease {
    pub fn new(keys: Vec<String>, token: u64) -> Self {
        Self { keys, token }
    }

    /// Keys covered by this lease.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Token tying this lease to the acquisition that created it.
    pub fn token(&self) -> u64 {
        self.token
    }
}

// == Lock Error ==
/// Failure reported by a lock manager.
#[derive(Error, Debug)]
pub enum LockError {
    /// The lease could not be acquired within the retry budget
    #[error("lock unavailable for {0}")]
    Unavailable(String),

    /// The backend rejected or failed the operation
    #[error("lock backend error: {0}")]
    Backend(String),
}

// == Lock Manager Trait ==
/// Contract for the distributed-style lock manager.
///
/// Releasing a lease for key X happens-before any later acquisition of X;
/// that ordering is what makes a double-checked cache read after acquisition
/// meaningful.
#[async_trait]
pub trait LockManager: Send + Sync {
    /// Acquires a lease over `keys`, valid for at most `max_hold`.
    ///
    /// Best-effort: retries internally per the manager's budget, then fails
    /// with [`LockError::Unavailable`].
    async fn acquire(&self, keys: &[String], max_hold: Duration) -> Result<Lease, LockError>;

    /// Releases a lease. Safe to call on an already-expired lease.
    async fn release(&self, lease: Lease) -> Result<(), LockError>;
}
