//! API Module
//!
//! HTTP handlers and routing for the fetch service REST API.
//!
//! # Endpoints
//! - `GET /records` - List all records (unprotected bulk read)
//! - `GET /records/:id` - Fetch one record through the coalescing path
//! - `DELETE /cache/records/:id` - Invalidate one cached entry
//! - `GET /stats` - Stampede counters and herd verdict
//! - `POST /stats/reset` - Zero the counters
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
