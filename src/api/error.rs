//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::fhir::client::FetchError;
use crate::safety::types::SafetyError;

/// Structured error response body for the dashboard client.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Upstream timeout")]
    UpstreamTimeout,
    #[error("Upstream failure: {0}")]
    Upstream(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::BadRequest(detail) => {
                (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone())
            }
            ApiError::NotFound(detail) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone())
            }
            ApiError::UpstreamTimeout => (
                StatusCode::GATEWAY_TIMEOUT,
                "UPSTREAM_TIMEOUT",
                "Record store did not respond in time; the request is safe to retry"
                    .to_string(),
            ),
            ApiError::Upstream(detail) => {
                tracing::error!(detail, "Upstream record fetch failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM",
                    "Record store request failed".to_string(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };

        (status, Json(body)).into_response()
    }
}

impl From<SafetyError> for ApiError {
    fn from(err: SafetyError) -> Self {
        match err {
            SafetyError::InvalidInput(detail) => ApiError::BadRequest(detail),
            SafetyError::PatientNotFound(id) => {
                ApiError::NotFound(format!("Patient not found: {id}"))
            }
            SafetyError::UpstreamTimeout => ApiError::UpstreamTimeout,
            SafetyError::Upstream(detail) => ApiError::Upstream(detail),
            err @ (SafetyError::ReferenceDataLoad(_, _)
            | SafetyError::ReferenceDataParse(_, _)) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<FetchError> for ApiError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::PatientNotFound(id) => {
                ApiError::NotFound(format!("Patient not found: {id}"))
            }
            FetchError::Timeout(_) => ApiError::UpstreamTimeout,
            other => ApiError::Upstream(other.to_string()),
        }
    }
}
