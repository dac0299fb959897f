//! Unified error handling for the tubelens crate
//!
//! This module provides a unified error type that consolidates all domain-specific
//! errors into a single `Error` enum, while maintaining the ability to use
//! domain-specific errors when needed.
//!
//! # Architecture
//!
//! - [`TubelensErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors, mapped onto HTTP status codes
//! - [`Error`] - Unified error enum wrapping all domain-specific errors
//!
//! # Usage
//!
//! ```rust,ignore
//! use tubelens::error::{Error, TubelensErrorTrait};
//!
//! fn report(err: &Error) -> u16 {
//!     err.category().status_code()
//! }
//! ```

use std::io;
use thiserror::Error;

pub use crate::utils::error::{ExportError, ModelError, ValidationError, YouTubeError};

/// Common trait for all tubelens error types
pub trait TubelensErrorTrait: std::error::Error {
    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;

    /// Message safe to show to API clients
    fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Upstream API or transport errors
    Network,
    /// Bad client input
    Validation,
    /// Requested resource does not exist
    NotFound,
    /// A required backing service is not configured or exhausted
    Unavailable,
    /// Inference backend errors
    Model,
    /// Configuration errors
    Config,
    /// Anything else
    Internal,
}

impl ErrorCategory {
    /// HTTP status code used when this category reaches the API surface
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::NotFound => 404,
            Self::Unavailable => 503,
            Self::Network | Self::Model | Self::Config | Self::Internal => 500,
        }
    }

    /// Short human readable name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Unavailable => "unavailable",
            Self::Model => "model",
            Self::Config => "config",
            Self::Internal => "internal",
        }
    }
}

/// Unified error type for the tubelens crate
#[derive(Error, Debug)]
pub enum Error {
    /// YouTube Data API errors
    #[error("YouTube error: {0}")]
    YouTube(#[from] YouTubeError),

    /// Input validation errors
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// Inference backend errors
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    /// CSV export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Resource lookup failed
    #[error("{0}")]
    NotFound(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl TubelensErrorTrait for Error {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::YouTube(e) if e.is_unavailable() => ErrorCategory::Unavailable,
            Self::YouTube(_) => ErrorCategory::Network,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Model(ModelError::Unavailable(_)) => ErrorCategory::Unavailable,
            Self::Model(_) => ErrorCategory::Model,
            Self::NotFound(_) => ErrorCategory::NotFound,
            Self::Config(_) => ErrorCategory::Config,
            Self::Export(_) | Self::Io(_) | Self::Json(_) | Self::Other { .. } => {
                ErrorCategory::Internal
            }
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::YouTube(YouTubeError::MissingApiKey) => {
                "YouTube service not available. Check YOUTUBE_API_KEY.".to_string()
            }
            Self::Model(ModelError::Unavailable(name)) => {
                format!("{name} service not available.")
            }
            other => other.to_string(),
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a not-found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Short name of the variant, reported alongside 500s in debug mode
    pub fn kind(&self) -> &'static str {
        match self {
            Self::YouTube(_) => "YouTubeError",
            Self::Validation(_) => "ValidationError",
            Self::Model(_) => "ModelError",
            Self::Export(_) => "ExportError",
            Self::NotFound(_) => "NotFound",
            Self::Io(_) => "IoError",
            Self::Json(_) => "JsonError",
            Self::Config(_) => "ConfigError",
            Self::Other { .. } => "Error",
        }
    }
}

// Conversion from anyhow::Error
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other {
            context: err.to_string(),
            source: None,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
