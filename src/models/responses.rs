//! Response DTOs for the fetch service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::fetch::{FetchOutcome, Source};
use crate::store::Record;

/// Response body for the fetch operation (GET /records/:id)
///
/// `source` names the code path that produced the data; its string values
/// are part of the observable contract.
#[derive(Debug, Clone, Serialize)]
pub struct FetchResponse {
    /// Provenance of the returned data
    pub source: Source,
    /// The fetched record
    pub data: Record,
}

impl From<FetchOutcome> for FetchResponse {
    fn from(outcome: FetchOutcome) -> Self {
        Self {
            source: outcome.source,
            data: outcome.record,
        }
    }
}

/// Response body for the counter reset (POST /stats/reset)
#[derive(Debug, Clone, Serialize)]
pub struct ResetResponse {
    /// Acknowledgement message
    pub message: String,
}

impl ResetResponse {
    /// Creates the reset acknowledgement.
    pub fn new() -> Self {
        Self {
            message: "Stats reset".to_string(),
        }
    }
}

impl Default for ResetResponse {
    fn default() -> Self {
        Self::new()
    }
}

/// Response body for cache invalidation (DELETE /cache/records/:id)
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    /// Outcome message
    pub message: String,
}

impl InvalidateResponse {
    /// Message for a removed entry.
    pub fn cleared(id: i64) -> Self {
        Self {
            message: format!("Cache cleared for record {}", id),
        }
    }

    /// Message when no entry existed.
    pub fn missing(id: i64) -> Self {
        Self {
            message: format!("No cache entry for record {}", id),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
