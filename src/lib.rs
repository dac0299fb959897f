//! tubelens - YouTube channel, video and trending analytics
//!
//! An HTTP API that fetches data from the YouTube Data API v3, runs comments
//! through sentiment, toxicity and keyword models, and returns aggregated
//! analytics. Results are cached per client session in memory.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`youtube`] - YouTube Data API client
//! - [`models`] - Core data structures and types
//! - [`analytics`] - Engagement, growth, trending and comparison arithmetic
//! - [`nlp`] - Sentiment, toxicity and keyword services with pluggable backends
//! - [`session`] - Expiring in-memory session cache
//! - [`validation`] - Request input validation and reference tables
//! - [`export`] - Multi-sheet CSV export
//! - [`api`] - axum routes and server lifecycle
//! - [`metrics`] - Prometheus metrics
//! - [`utils`] - Common utilities and helpers
//!
//! # Example
//!
//! ```no_run
//! use tubelens::api::ApiServer;
//! use tubelens::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let server = ApiServer::new(config)?;
//!     server.start().await?;
//!     Ok(())
//! }
//! ```

pub mod analytics;
pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod metrics;
pub mod models;
pub mod nlp;
pub mod session;
pub mod utils;
pub mod validation;
pub mod youtube;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::api::{ApiServer, AppState};
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result, TubelensErrorTrait};
    pub use crate::models::{ChannelData, CommentData, VideoData};
    pub use crate::session::SessionStore;
    pub use crate::youtube::YouTubeClient;
}

// Direct re-exports for convenience
pub use models::{ChannelData, CommentData, VideoData};
