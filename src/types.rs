//! Response types for the F1 API.

use serde::Serialize;
use serde_json::Value;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: u16,
    pub error: String,
    /// Message string, or a list of `{loc, msg, type}` for validation failures
    pub detail: Value,
    pub path: String,
    pub timestamp: String,
}
