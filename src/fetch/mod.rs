//! Cache-Coalescing Fetch Module
//!
//! The core of the service: a read-through fetch path that answers
//! single-record lookups while keeping concurrent cache misses from
//! stampeding the backing store.

mod path;

pub use path::{CoalescedFetch, FetchConfig, FetchOutcome, Source};
