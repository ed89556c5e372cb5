//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::time::Duration;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
/// The cache TTL, lease hold time, and contended-path wait are part of the
/// service's external contract and must never be hard-coded elsewhere.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Cache entry TTL in seconds
    pub cache_ttl_secs: u64,
    /// Maximum lock lease hold time in milliseconds
    pub lock_max_hold_ms: u64,
    /// Fixed wait on the contended path in milliseconds
    pub contended_wait_ms: u64,
    /// Lock acquisition retry budget
    pub lock_retry_count: u32,
    /// Base delay between lock acquisition retries in milliseconds
    pub lock_retry_delay_ms: u64,
    /// Maximum random jitter added to each retry delay in milliseconds
    pub lock_retry_jitter_ms: u64,
    /// Whether the contended path may query the store without a lease
    pub unlocked_fallback: bool,
    /// Number of records seeded into the in-process store at startup
    pub seed_records: i64,
    /// Expired-entry sweeper interval in seconds
    pub sweep_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 4005)
    /// - `CACHE_TTL` - Cache TTL in seconds (default: 30)
    /// - `LOCK_MAX_HOLD_MS` - Lease max hold in ms (default: 5000)
    /// - `CONTENDED_WAIT_MS` - Contended-path wait in ms (default: 150)
    /// - `LOCK_RETRY_COUNT` - Lock acquisition retries (default: 3)
    /// - `LOCK_RETRY_DELAY_MS` - Base retry delay in ms (default: 200)
    /// - `LOCK_RETRY_JITTER_MS` - Max retry jitter in ms (default: 100)
    /// - `UNLOCKED_FALLBACK` - Allow lockless store fallback (default: true)
    /// - `SEED_RECORDS` - Records seeded at startup (default: 1000)
    /// - `SWEEP_INTERVAL` - Sweeper frequency in seconds (default: 5)
    pub fn from_env() -> Self {
        Self {
            server_port: env_or("SERVER_PORT", 4005),
            cache_ttl_secs: env_or("CACHE_TTL", 30),
            lock_max_hold_ms: env_or("LOCK_MAX_HOLD_MS", 5000),
            contended_wait_ms: env_or("CONTENDED_WAIT_MS", 150),
            lock_retry_count: env_or("LOCK_RETRY_COUNT", 3),
            lock_retry_delay_ms: env_or("LOCK_RETRY_DELAY_MS", 200),
            lock_retry_jitter_ms: env_or("LOCK_RETRY_JITTER_MS", 100),
            unlocked_fallback: env_or("UNLOCKED_FALLBACK", true),
            seed_records: env_or("SEED_RECORDS", 1000),
            sweep_interval: env_or("SWEEP_INTERVAL", 5),
        }
    }

    /// Cache TTL as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Lease max hold as a Duration.
    pub fn lock_max_hold(&self) -> Duration {
        Duration::from_millis(self.lock_max_hold_ms)
    }

    /// Contended-path wait as a Duration.
    pub fn contended_wait(&self) -> Duration {
        Duration::from_millis(self.contended_wait_ms)
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 4005,
            cache_ttl_secs: 30,
            lock_max_hold_ms: 5000,
            contended_wait_ms: 150,
            lock_retry_count: 3,
            lock_retry_delay_ms: 200,
            lock_retry_jitter_ms: 100,
            unlocked_fallback: true,
            seed_records: 1000,
            sweep_interval: 5,
        }
    }
}
