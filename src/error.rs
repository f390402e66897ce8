//! API errors and the JSON error envelope.
//!
//! Handlers return [`ApiError`]; its response carries an [`ErrorBody`]
//! extension that [`error_envelope`] turns into the final JSON body once the
//! request path is known.

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use thiserror::Error;

use crate::standings::StandingsError;
use crate::types::ErrorResponse;

/// Error type for API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource or route does not exist
    #[error("{0}")]
    NotFound(String),

    /// Request parameter missing or out of bounds
    #[error("Invalid {location} parameter {field}: {message}")]
    Validation {
        location: &'static str,
        field: String,
        kind: &'static str,
        message: String,
    },

    /// Storage or other unexpected failure
    #[error("Internal error: {0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn missing(field: impl Into<String>) -> Self {
        ApiError::Validation {
            location: "query",
            field: field.into(),
            kind: "missing",
            message: "Field required".to_string(),
        }
    }

    pub fn invalid(
        location: &'static str,
        field: impl Into<String>,
        kind: &'static str,
        message: impl Into<String>,
    ) -> Self {
        ApiError::Validation {
            location,
            field: field.into(),
            kind,
            message: message.into(),
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error label reported in the envelope
    pub fn label(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "HTTPException",
            ApiError::Validation { .. } => "ValidationError",
            ApiError::Internal(_) => "InternalServerError",
        }
    }

    fn detail(&self) -> Value {
        match self {
            ApiError::NotFound(msg) => Value::String(msg.clone()),
            ApiError::Validation {
                location,
                field,
                kind,
                message,
            } => json!([{
                "loc": [location, field],
                "msg": message,
                "type": kind,
            }]),
            // Never leak internals to the caller
            ApiError::Internal(_) => Value::String("An unexpected error occurred.".to_string()),
        }
    }
}

impl From<StandingsError> for ApiError {
    fn from(err: StandingsError) -> Self {
        match err {
            StandingsError::SeasonNotFound(year) => {
                ApiError::NotFound(format!("Season {} not found", year))
            }
            StandingsError::Store(e) => ApiError::Internal(e),
        }
    }
}

/// Error details waiting for the envelope middleware
#[derive(Debug, Clone)]
pub struct ErrorBody {
    pub error: &'static str,
    pub detail: Value,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            ApiError::Internal(e) => tracing::error!(error = ?e, "Request failed"),
            other => tracing::debug!(error = %other, "Request rejected"),
        }

        let mut response = status.into_response();
        response.extensions_mut().insert(ErrorBody {
            error: self.label(),
            detail: self.detail(),
        });
        response
    }
}

/// Render error responses as `{status, error, detail, path, timestamp}`.
///
/// Errors raised outside the handlers (method mismatch, extractor
/// rejections) carry no [`ErrorBody`] and are reported as `HTTPException`
/// with the status reason as detail.
pub async fn error_envelope(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let mut response = next.run(req).await;
    let status = response.status();

    let body = match response.extensions_mut().remove::<ErrorBody>() {
        Some(body) => body,
        None if status.is_client_error() || status.is_server_error() => ErrorBody {
            error: "HTTPException",
            detail: Value::String(status.canonical_reason().unwrap_or("Error").to_string()),
        },
        None => return response,
    };

    let envelope = ErrorResponse {
        status: status.as_u16(),
        error: body.error.to_string(),
        detail: body.detail,
        path,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
    };

    // Keep headers such as `Allow`; the body and its type are replaced.
    let (parts, _) = response.into_parts();
    let mut enveloped = (status, Json(envelope)).into_response();
    for (name, value) in parts.headers.iter() {
        if *name != header::CONTENT_TYPE && *name != header::CONTENT_LENGTH {
            enveloped.headers_mut().append(name.clone(), value.clone());
        }
    }
    enveloped
}
