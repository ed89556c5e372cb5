//! Response models for the fetch service API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing HTTP response bodies. There are no request bodies: every
//! endpoint takes its input from the path.

pub mod responses;

// Re-export commonly used types
pub use responses::{FetchResponse, HealthResponse, InvalidateResponse, ResetResponse};
