//! In-process lock manager with keyed, expiring leases.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::debug;

use super::{Lease, LockConfig, LockError, LockManager};

// == Held Lease ==
#[derive(Debug)]
struct HeldLease {
    token: u64,
    expires_at: Instant,
}

// == Memory Lock Manager ==
/// Lease table shared by all fetches in one process.
///
/// An expired lease no longer blocks acquisition: a crashed or slow holder
/// loses the key once its hold time elapses, the same way a TTL-based
/// distributed lock would reclaim it.
#[derive(Debug, Default)]
pub struct MemoryLockManager {
    config: LockConfig,
    leases: Mutex<HashMap<String, HeldLease>>,
    next_token: AtomicU64,
}

impl MemoryLockManager {
    /// Creates a lock manager with the given retry budget.
    pub fn new(config: LockConfig) -> Self {
        Self {
            config,
            leases: Mutex::new(HashMap::new()),
            next_token: AtomicU64::new(1),
        }
    }

    /// Single all-or-nothing acquisition attempt over `keys`.
    async fn try_acquire(&self, keys: &[String], max_hold: Duration) -> Option<Lease> {
        let now = Instant::now();
        let mut leases = self.leases.lock().await;

        let blocked = keys
            .iter()
            .any(|key| matches!(leases.get(key), Some(held) if held.expires_at > now));
        if blocked {
            return None;
        }

        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        for key in keys {
            leases.insert(
                key.clone(),
                HeldLease {
                    token,
                    expires_at: now + max_hold,
                },
            );
        }
        Some(Lease::new(keys.to_vec(), token))
    }
}

#[async_trait]
impl LockManager for MemoryLockManager {
    async fn acquire(&self, keys: &[String], max_hold: Duration) -> Result<Lease, LockError> {
        let attempts = self.config.retry_count + 1;
        for attempt in 0..attempts {
            if let Some(lease) = self.try_acquire(keys, max_hold).await {
                return Ok(lease);
            }
            if attempt + 1 < attempts {
                let jitter_ms = self.config.retry_jitter.as_millis() as u64;
                let jitter = if jitter_ms > 0 {
                    Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
                } else {
                    Duration::ZERO
                };
                debug!(attempt, "lock busy, backing off before retry");
                tokio::time::sleep(self.config.retry_delay + jitter).await;
            }
        }
        Err(LockError::Unavailable(keys.join(",")))
    }

    async fn release(&self, lease: Lease) -> Result<(), LockError> {
        let mut leases = self.leases.lock().await;
        for key in lease.keys() {
            // Only the acquiring token may release; an expired-and-stolen
            // key belongs to its new holder.
            if matches!(leases.get(key), Some(held) if held.token == lease.token()) {
                leases.remove(key);
            }
        }
        Ok(())
    }
}
