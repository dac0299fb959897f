//! Liveness and dependency status

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use super::server::AppState;
use crate::config::APP_NAME;
use crate::nlp::ModelStatus;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub app: String,
    pub version: String,
    /// `configured` or `missing`
    pub youtube_api: String,
    pub session_count: usize,
    pub uptime_secs: u64,
    pub nlp_models: ModelStatus,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}

/// Health check endpoint
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let youtube_api = if state.youtube.is_configured() {
        "configured"
    } else {
        "missing"
    };

    Json(HealthResponse {
        status: "healthy".to_string(),
        app: APP_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        youtube_api: youtube_api.to_string(),
        session_count: state.sessions.active_count().await,
        uptime_secs: state.start_time.elapsed().as_secs(),
        nlp_models: ModelStatus {
            sentiment: state.sentiment.backend().to_string(),
            toxicity: state.toxicity.backend().to_string(),
            keywords: state.keywords.backend().to_string(),
        },
    })
}
