//! Configuration management for tubelens
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

/// Default YouTube Data API v3 endpoint
pub const DEFAULT_YOUTUBE_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// Application name reported by the root and health endpoints
pub const APP_NAME: &str = "YouTube Analytics App";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// YouTube Data API configuration
    pub youtube: YouTubeConfig,

    /// HTTP server configuration
    pub server: ServerConfig,

    /// Session storage configuration
    pub session: SessionConfig,

    /// Inference backend configuration
    pub models: ModelsConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// YouTube client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct YouTubeConfig {
    /// API key; empty means the YouTube client is unavailable
    #[serde(default)]
    pub api_key: String,

    /// API base URL
    pub base_url: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Upper bound on comments fetched per video
    pub max_comments_per_video: usize,

    /// Upper bound on videos fetched per channel
    pub max_videos_per_channel: usize,

    /// Upper bound on trending videos fetched
    pub max_trending_videos: usize,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    pub bind_address: SocketAddr,

    /// Origins allowed by CORS
    pub allowed_origins: Vec<String>,

    /// Include error details in 500 responses
    pub debug: bool,

    /// Emit request spans through `TraceLayer`
    pub enable_request_logging: bool,
}

/// Session storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session lifetime in seconds, measured from creation
    pub timeout_secs: u64,

    /// Minimum interval between expiry sweeps in seconds
    pub sweep_interval_secs: u64,
}

/// Inference backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Text-classification server used for toxicity scoring
    pub toxicity_endpoint: Option<String>,

    /// Sentence-embedding server used for keyword extraction
    pub embedding_endpoint: Option<String>,

    /// Inference request timeout in seconds
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_origins() -> Vec<String> {
    [
        "http://localhost:3000",
        "http://localhost:5173",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:5173",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let bind_address = match env_opt("TUBELENS_BIND_ADDRESS") {
            Some(addr) => addr
                .parse()
                .with_context(|| format!("Invalid TUBELENS_BIND_ADDRESS: {addr}"))?,
            None => defaults.server.bind_address,
        };

        let allowed_origins = env_opt("ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.server.allowed_origins);

        Ok(Self {
            youtube: YouTubeConfig {
                api_key: env_opt("YOUTUBE_API_KEY").unwrap_or_default(),
                base_url: env_opt("YOUTUBE_API_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_YOUTUBE_BASE_URL.to_string()),
                request_timeout_secs: env_parse("YOUTUBE_REQUEST_TIMEOUT", 30),
                max_comments_per_video: env_parse("MAX_COMMENTS_PER_VIDEO", 500),
                max_videos_per_channel: env_parse("MAX_VIDEOS_PER_CHANNEL", 50),
                max_trending_videos: env_parse("MAX_TRENDING_VIDEOS", 50),
            },
            server: ServerConfig {
                bind_address,
                allowed_origins,
                debug: env_bool("DEBUG", false),
                enable_request_logging: env_bool("TUBELENS_REQUEST_LOGGING", true),
            },
            session: SessionConfig {
                timeout_secs: env_parse("SESSION_TIMEOUT", 3600),
                sweep_interval_secs: env_parse("SESSION_SWEEP_INTERVAL", 300),
            },
            models: ModelsConfig {
                toxicity_endpoint: env_opt("TOXICITY_ENDPOINT"),
                embedding_endpoint: env_opt("EMBEDDING_ENDPOINT"),
                timeout_secs: env_parse("MODEL_TIMEOUT", 30),
            },
            logging: LoggingConfig {
                level: env_opt("LOG_LEVEL").unwrap_or_else(|| String::from("info")),
                format: env_opt("LOG_FORMAT").unwrap_or_else(|| String::from("text")),
            },
        })
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.youtube.base_url.trim().is_empty() {
            anyhow::bail!("youtube.base_url must not be empty");
        }

        if self.youtube.request_timeout_secs == 0 {
            anyhow::bail!("youtube.request_timeout_secs must be greater than 0");
        }

        if !(1..=500).contains(&self.youtube.max_comments_per_video) {
            anyhow::bail!("youtube.max_comments_per_video must be between 1 and 500");
        }

        if !(1..=50).contains(&self.youtube.max_videos_per_channel) {
            anyhow::bail!("youtube.max_videos_per_channel must be between 1 and 50");
        }

        if !(1..=50).contains(&self.youtube.max_trending_videos) {
            anyhow::bail!("youtube.max_trending_videos must be between 1 and 50");
        }

        if self.session.timeout_secs == 0 {
            anyhow::bail!("session.timeout_secs must be greater than 0");
        }

        if self.session.sweep_interval_secs == 0 {
            anyhow::bail!("session.sweep_interval_secs must be greater than 0");
        }

        if self.models.timeout_secs == 0 {
            anyhow::bail!("models.timeout_secs must be greater than 0");
        }

        Ok(())
    }

    /// Whether a YouTube API key has been configured
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        !self.youtube.api_key.trim().is_empty()
    }

    /// Get YouTube request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.youtube.request_timeout_secs)
    }

    /// Get session lifetime as Duration
    #[must_use]
    pub fn session_timeout(&self) -> Duration {
        Duration::from_secs(self.session.timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            youtube: YouTubeConfig {
                api_key: String::new(),
                base_url: DEFAULT_YOUTUBE_BASE_URL.to_string(),
                request_timeout_secs: 30,
                max_comments_per_video: 500,
                max_videos_per_channel: 50,
                max_trending_videos: 50,
            },
            server: ServerConfig {
                bind_address: SocketAddr::from(([0, 0, 0, 0], 8000)),
                allowed_origins: default_origins(),
                debug: false,
                enable_request_logging: true,
            },
            session: SessionConfig {
                timeout_secs: 3600,
                sweep_interval_secs: 300,
            },
            models: ModelsConfig {
                toxicity_endpoint: None,
                embedding_endpoint: None,
                timeout_secs: 30,
            },
            logging: LoggingConfig {
                level: String::from("info"),
                format: String::from("text"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert!(!config.has_api_key());
    }

    #[test]
    fn test_invalid_comment_limit() {
        let mut config = Config::default();
        config.youtube.max_comments_per_video = 0;
        assert!(config.validate().is_err());

        config.youtube.max_comments_per_video = 501;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_session_timeout_rejected() {
        let mut config = Config::default();
        config.session.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_conversion() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.session_timeout(), Duration::from_secs(3600));
    }

    #[test]
    fn test_default_origins() {
        let config = Config::default();
        assert_eq!(config.server.allowed_origins.len(), 4);
        assert!(config
            .server
            .allowed_origins
            .contains(&"http://localhost:5173".to_string()));
    }
}
