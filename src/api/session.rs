//! Session management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use super::error::{ApiError, ApiResult};
use super::server::AppState;
use crate::metrics;
use crate::session::{SessionInfo, SessionStats};

#[derive(Debug, Serialize)]
pub struct CreatedSession {
    pub session_id: String,
    pub expires_in_secs: i64,
}

#[derive(Debug, Serialize)]
pub struct DeletedSession {
    pub session_id: String,
    pub deleted: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/session", post(create_session))
        .route("/session/{session_id}", get(get_session).delete(delete_session))
        .route("/sessions/stats", get(session_stats))
}

async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<CreatedSession>) {
    let session_id = state.sessions.create_session().await;
    metrics::set_active_sessions(state.sessions.active_count().await);

    (
        StatusCode::CREATED,
        Json(CreatedSession {
            session_id,
            expires_in_secs: state.sessions.timeout().num_seconds(),
        }),
    )
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionInfo>> {
    state
        .sessions
        .session_info(&session_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Session not found: {session_id}")))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<DeletedSession>> {
    if !state.sessions.delete_session(&session_id).await {
        return Err(ApiError::not_found(format!("Session not found: {session_id}")));
    }
    metrics::set_active_sessions(state.sessions.active_count().await);
    tracing::info!(session_id = %session_id, "Session deleted");

    Ok(Json(DeletedSession {
        session_id,
        deleted: true,
    }))
}

async fn session_stats(State(state): State<AppState>) -> Json<SessionStats> {
    Json(state.sessions.stats().await)
}
