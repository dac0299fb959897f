//! HTTP server: shared state, router assembly and lifecycle
//!
//! The server owns the YouTube client, the NLP services and the session
//! store. A background task sweeps expired sessions; all sessions are
//! dropped when the server shuts down.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{MatchedPath, Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use thiserror::Error;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::error::{ApiError, ApiResult};
use super::{channel, comparison, health, session, trending, video};
use crate::config::{Config, APP_NAME};
use crate::error::Error;
use crate::metrics;
use crate::nlp::{
    Embedder, HttpEmbedder, HttpToxicityModel, KeywordService, SentimentService, ToxicityModel,
    ToxicityService,
};
use crate::session::SessionStore;
use crate::validation::validate_session_id;
use crate::youtube::YouTubeClient;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: Arc<Config>,

    /// YouTube Data API client
    pub youtube: Arc<YouTubeClient>,

    /// Comment sentiment scoring
    pub sentiment: Arc<SentimentService>,

    /// Comment toxicity scoring
    pub toxicity: Arc<ToxicityService>,

    /// Keyword extraction
    pub keywords: Arc<KeywordService>,

    /// Per-client analysis cache
    pub sessions: SessionStore,

    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Build services from configuration
    ///
    /// Model endpoints that are not configured leave the matching service on
    /// its local fallback.
    pub fn from_config(config: Config) -> Result<Self, ServerError> {
        let youtube = YouTubeClient::from_config(&config.youtube)
            .map_err(|e| ServerError::Init(e.to_string()))?;

        let model_timeout = Duration::from_secs(config.models.timeout_secs);

        let toxicity_model: Option<Arc<dyn ToxicityModel>> = match &config.models.toxicity_endpoint {
            Some(endpoint) => Some(Arc::new(
                HttpToxicityModel::new(endpoint.clone(), model_timeout)
                    .map_err(|e| ServerError::Init(e.to_string()))?,
            )),
            None => None,
        };

        let embedder: Option<Arc<dyn Embedder>> = match &config.models.embedding_endpoint {
            Some(endpoint) => Some(Arc::new(
                HttpEmbedder::new(endpoint.clone(), model_timeout)
                    .map_err(|e| ServerError::Init(e.to_string()))?,
            )),
            None => None,
        };

        let sessions = SessionStore::from_config(&config.session);

        Ok(Self {
            youtube: Arc::new(youtube),
            sentiment: Arc::new(SentimentService::default()),
            toxicity: Arc::new(ToxicityService::new(toxicity_model)),
            keywords: Arc::new(KeywordService::new(embedder)),
            sessions,
            start_time: Instant::now(),
            config: Arc::new(config),
        })
    }

    /// Turn a domain error into a response, prefixing 500s with `context`
    pub fn fail(&self, context: &str, err: impl Into<Error>) -> ApiError {
        ApiError::from_error(context, err.into(), self.config.server.debug)
    }

    /// Use the caller's session, or open a new one
    pub async fn session_for(&self, session_id: Option<String>) -> ApiResult<String> {
        match session_id.filter(|s| !s.is_empty()) {
            Some(id) => {
                validate_session_id(&id).map_err(|e| ApiError::bad_request(e.to_string()))?;
                Ok(id)
            }
            None => Ok(self.sessions.create_session().await),
        }
    }

    /// Cached value for `key`, if the caller supplied a live session
    pub async fn cached(&self, session_id: Option<&str>, key: &str) -> Option<Value> {
        let id = session_id.filter(|s| !s.is_empty())?;
        let value = self.sessions.get_data(id, key).await;
        if value.is_some() {
            tracing::debug!(session_id = %id, key, "Serving cached analysis");
        }
        value
    }

    /// Store a freshly computed response and stamp it with its session id
    pub async fn store_response(&self, session_id: &str, key: &str, mut body: Value) -> Value {
        if let Value::Object(map) = &mut body {
            map.insert("session_id".to_string(), Value::String(session_id.to_string()));
        }
        self.sessions.store_data(session_id, key, body.clone()).await;
        body
    }
}

// ============================================================================
// API Server
// ============================================================================

/// HTTP API server
pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    /// Create a new server
    pub fn new(config: Config) -> Result<Self, ServerError> {
        config
            .validate()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        if !config.has_api_key() {
            tracing::warn!("YOUTUBE_API_KEY is not set; YouTube endpoints will return 503");
        }

        if let Err(e) = metrics::init_metrics() {
            tracing::warn!(error = %e, "Metrics disabled");
        }

        Ok(Self {
            state: AppState::from_config(config)?,
        })
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes and layers
    pub fn build_router(&self) -> Router {
        let config = &self.state.config.server;
        let mut router = create_router(self.state.clone()).layer(cors_layer(&config.allowed_origins));

        if config.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Start the server
    pub async fn start(&self) -> Result<(), ServerError> {
        self.start_with_shutdown(std::future::pending()).await
    }

    /// Start with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.state.config.server.bind_address;

        tracing::info!(
            app = APP_NAME,
            version = env!("CARGO_PKG_VERSION"),
            "Starting API server on {}",
            addr
        );

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(e.to_string()))?;

        let sweeper = self.start_background_tasks();

        let served = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::Serve(e.to_string()));

        sweeper.abort();
        self.state.sessions.clear_all().await;
        tracing::info!("API server shutdown complete");

        served
    }

    /// Periodic session expiry
    fn start_background_tasks(&self) -> tokio::task::JoinHandle<()> {
        let sessions = self.state.sessions.clone();
        let every = Duration::from_secs(self.state.config.session.sweep_interval_secs);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await;
            loop {
                interval.tick().await;
                sessions.sweep_expired().await;
            }
        })
    }
}

// ============================================================================
// Router
// ============================================================================

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .merge(health::routes())
        .merge(session::routes())
        .merge(channel::routes())
        .merge(video::routes())
        .merge(trending::routes())
        .merge(comparison::routes());

    Router::new()
        .route("/", get(root))
        .route("/metrics", get(metrics_endpoint))
        .nest("/api", api)
        .route_layer(middleware::from_fn(track_requests))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

async fn track_requests(request: Request, next: Next) -> Response {
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |p| p.as_str().to_string());
    let started = Instant::now();

    let response = next.run(request).await;

    metrics::record_api_request(
        &endpoint,
        response.status().as_u16(),
        started.elapsed().as_secs_f64(),
    );
    response
}

async fn root(State(state): State<AppState>) -> Json<Value> {
    let docs = if state.config.server.debug {
        "/docs"
    } else {
        "Documentation disabled in production"
    };
    Json(json!({
        "message": format!("Welcome to {APP_NAME}"),
        "version": env!("CARGO_PKG_VERSION"),
        "docs": docs,
    }))
}

async fn metrics_endpoint() -> Response {
    if !metrics::metrics_initialized() {
        return (StatusCode::SERVICE_UNAVAILABLE, "Metrics not initialized").into_response();
    }
    match metrics::encode_metrics() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

// ============================================================================
// Server Errors
// ============================================================================

/// Server errors
#[derive(Error, Debug, Clone)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization error: {0}")]
    Init(String),

    #[error("Failed to bind: {0}")]
    Bind(String),

    #[error("Server error: {0}")]
    Serve(String),
}
