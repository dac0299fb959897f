//! HTTP error responses
//!
//! Every failing handler returns an [`ApiError`], rendered as
//! `{"error": "<detail>"}` with the status taken from the error category.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::{Error, ErrorCategory, TubelensErrorTrait};

/// Error body returned to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// An error on its way out of a handler
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: message.into(),
                detail: None,
                kind: None,
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Map a domain error to a response
    ///
    /// Client errors keep their own message. Server errors are prefixed with
    /// `context` (e.g. "Error analyzing video") and, when `debug` is set,
    /// carry the error chain and variant name.
    pub fn from_error(context: &str, err: Error, debug: bool) -> Self {
        match err.category() {
            ErrorCategory::Validation => Self::bad_request(err.user_message()),
            ErrorCategory::NotFound => Self::not_found(err.user_message()),
            ErrorCategory::Unavailable => {
                tracing::warn!(error = %err, "{context}: backing service unavailable");
                Self::unavailable(err.user_message())
            }
            _ => {
                tracing::error!(error = %err, kind = err.kind(), "{context}");
                let mut api = Self::internal(format!("{context}: {err}"));
                if debug {
                    api.body.detail = Some(format!("{err:?}"));
                    api.body.kind = Some(err.kind().to_string());
                }
                api
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.body.error)
    }
}

/// Handler result
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::{ValidationError, YouTubeError};

    #[test]
    fn test_validation_maps_to_400() {
        let err = ApiError::from_error(
            "Error analyzing video",
            ValidationError::InvalidVideoId("abc".into()).into(),
            false,
        );
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body.error, "Invalid video ID format: abc");
    }

    #[test]
    fn test_missing_key_maps_to_503() {
        let err = ApiError::from_error("Error analyzing channel", YouTubeError::MissingApiKey.into(), false);
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_internal_prefix_and_debug_detail() {
        let err = ApiError::from_error("Error comparing videos", Error::other("boom"), false);
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.body.error, "Error comparing videos: boom");
        assert!(err.body.detail.is_none());

        let err = ApiError::from_error("Error comparing videos", Error::other("boom"), true);
        assert_eq!(err.body.kind.as_deref(), Some("Error"));
        assert!(err.body.detail.is_some());
    }

    #[test]
    fn test_body_serialization_skips_empty_fields() {
        let json = serde_json::to_value(ApiError::not_found("gone").body).unwrap();
        assert_eq!(json, serde_json::json!({"error": "gone"}));
    }
}
