//! Stampede Guard - A read-through cache service with thundering-herd protection
//!
//! Serves single-record lookups through a cache-coalescing read path: cache
//! fast path, lock-guarded fill with a double-checked re-read, and a bounded
//! wait-and-retry fallback when the lock cannot be acquired. Process-wide
//! counters expose whether the protection is actually working.

pub mod api;
pub mod config;
pub mod error;
pub mod fetch;
pub mod kv;
pub mod lock;
pub mod metrics;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use tasks::spawn_sweeper_task;
