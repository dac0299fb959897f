//! Error types for the tubelens service
//!
//! This module defines the domain-specific error types used throughout the
//! application. They are folded into [`crate::error::Error`] at module
//! boundaries.

use thiserror::Error;

/// Errors that can occur while talking to the YouTube Data API
#[derive(Error, Debug)]
pub enum YouTubeError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// No API key configured
    #[error("YouTube API key is not configured")]
    MissingApiKey,

    /// Daily quota exhausted
    #[error("YouTube API quota exceeded")]
    QuotaExceeded,

    /// Non-success response from the API
    #[error("YouTube API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// Errors raised when request input fails validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid video ID format: {0}")]
    InvalidVideoId(String),

    #[error("Invalid channel ID format: {0}")]
    InvalidChannelId(String),

    #[error("Invalid country code: {0}")]
    InvalidCountry(String),

    #[error("Invalid category ID: {0}")]
    InvalidCategory(String),

    #[error("Invalid session ID format")]
    InvalidSessionId,

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },

    #[error("Must compare between {min} and {max} items, got {got}")]
    ComparisonSize { min: usize, max: usize, got: usize },

    #[error("Duplicate IDs are not allowed")]
    DuplicateIds,

    #[error("{0}")]
    Other(String),
}

/// Errors returned by inference backends
#[derive(Error, Debug)]
pub enum ModelError {
    /// HTTP request to an inference server failed
    #[error("Inference request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Inference server answered with a non-success status
    #[error("Inference server returned status {0}")]
    Status(u16),

    /// Response did not match the expected contract
    #[error("Unexpected inference response: {0}")]
    InvalidResponse(String),

    /// No backend configured for this model
    #[error("Model not available: {0}")]
    Unavailable(String),
}

/// Errors that can occur while building CSV exports
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Malformed export data: {0}")]
    Malformed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl YouTubeError {
    /// Whether the caller should see this as "service not available"
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::MissingApiKey | Self::QuotaExceeded)
    }
}
