//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::assessment::AssessmentError;
use crate::upload::UploadError;

/// Structured error response body.
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
    #[error("No file uploaded")]
    NoFile,
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("Model API error: {0}")]
    Upstream(String),
    #[error("Model API timed out: {0}")]
    UpstreamTimeout(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::NoFile => (
                StatusCode::BAD_REQUEST,
                "NO_FILE",
                "No file uploaded".to_string(),
            ),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail),
            ApiError::PayloadTooLarge(detail) => {
                (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE", detail)
            }
            ApiError::UnsupportedMediaType(detail) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA_TYPE",
                detail,
            ),
            ApiError::Upstream(detail) => {
                tracing::warn!(detail, "Model API error");
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", detail)
            }
            ApiError::UpstreamTimeout(detail) => {
                tracing::warn!(detail, "Model API timeout");
                (StatusCode::GATEWAY_TIMEOUT, "UPSTREAM_TIMEOUT", detail)
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

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::MissingFile => ApiError::NoFile,
            UploadError::Empty => ApiError::BadRequest(err.to_string()),
            UploadError::TooLarge { .. } => ApiError::PayloadTooLarge(err.to_string()),
            UploadError::UnsupportedType(_) => ApiError::UnsupportedMediaType(err.to_string()),
        }
    }
}

impl From<AssessmentError> for ApiError {
    fn from(err: AssessmentError) -> Self {
        match err {
            AssessmentError::EmptyDocument => ApiError::BadRequest(err.to_string()),
            AssessmentError::Timeout(_) => ApiError::UpstreamTimeout(err.to_string()),
            AssessmentError::Upstream { message, .. } => ApiError::Upstream(message),
            AssessmentError::Connection(_) | AssessmentError::MalformedResponse(_) => {
                ApiError::Upstream(err.to_string())
            }
            AssessmentError::HttpClient(_) => ApiError::Internal(err.to_string()),
        }
    }
}
