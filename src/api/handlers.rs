//! API Handlers
//!
//! HTTP request handlers for each fetch service endpoint. The handlers are
//! thin I/O wrappers; all stampede-relevant logic lives in
//! [`crate::fetch::CoalescedFetch`].

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info};

use crate::error::{FetchError, Result};
use crate::fetch::CoalescedFetch;
use crate::kv::{entity_key, KeyValueCache};
use crate::metrics::{MetricsSnapshot, StampedeMetrics};
use crate::models::{FetchResponse, HealthResponse, InvalidateResponse, ResetResponse};
use crate::store::{Record, RecordStore};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The cache-coalescing read path
    pub fetch: Arc<CoalescedFetch>,
    /// Shared cache, addressed directly only by the invalidation endpoint
    pub cache: Arc<dyn KeyValueCache>,
    /// Backing store, addressed directly only by the list endpoint
    pub store: Arc<dyn RecordStore>,
    /// Process-wide stampede counters
    pub metrics: Arc<StampedeMetrics>,
}

impl AppState {
    /// Wires the read path over the given collaborators.
    pub fn new(
        cache: Arc<dyn KeyValueCache>,
        locks: Arc<dyn crate::lock::LockManager>,
        store: Arc<dyn RecordStore>,
        config: crate::fetch::FetchConfig,
    ) -> Self {
        let metrics = Arc::new(StampedeMetrics::new());
        let fetch = Arc::new(CoalescedFetch::new(
            cache.clone(),
            locks,
            store.clone(),
            metrics.clone(),
            config,
        ));
        Self {
            fetch,
            cache,
            store,
            metrics,
        }
    }
}

/// Handler for GET /records/:id
///
/// Fetches one record through the coalescing path and tags the response
/// with its provenance.
pub async fn get_record_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<FetchResponse>> {
    let outcome = state.fetch.fetch(&id).await?;
    Ok(Json(FetchResponse::from(outcome)))
}

/// Handler for GET /records
///
/// Plain bulk read, deliberately outside the coalescing path.
pub async fn list_records_handler(State(state): State<AppState>) -> Result<Json<Vec<Record>>> {
    let records = state.store.find_all().await.map_err(|err| {
        error!(error = %err, "bulk list failed");
        FetchError::Internal("record listing failed".to_string())
    })?;
    Ok(Json(records))
}

/// Handler for DELETE /cache/records/:id
///
/// Removes one cached snapshot. 404 when no entry existed.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response> {
    let id: i64 = id
        .parse()
        .map_err(|_| FetchError::InvalidArgument(id.clone()))?;

    let removed = state.cache.delete(&entity_key(id)).await.map_err(|err| {
        error!(id, error = %err, "cache invalidation failed");
        FetchError::Internal(format!("cache invalidation failed for record {}", id))
    })?;

    if removed > 0 {
        info!(id, "cache entry invalidated");
        Ok(Json(InvalidateResponse::cleared(id)).into_response())
    } else {
        Ok((StatusCode::NOT_FOUND, Json(InvalidateResponse::missing(id))).into_response())
    }
}

/// Handler for GET /stats
///
/// Returns the stampede counters plus the herd verdict.
pub async fn stats_handler(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

/// Handler for POST /stats/reset
///
/// Zeroes all three counters.
pub async fn reset_stats_handler(State(state): State<AppState>) -> Json<ResetResponse> {
    state.metrics.reset();
    info!("stampede counters reset");
    Json(ResetResponse::new())
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
