//! Side-by-side channel and video comparison endpoints

use axum::{
    extract::{Query, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::csv_attachment;
use super::error::{ApiError, ApiResult};
use super::server::AppState;
use crate::analytics::{compare_channels, compare_videos, ChannelComparison, VideoComparison};
use crate::export;
use crate::models::{ChannelData, VideoData};
use crate::validation::{validate_channel_ids, validate_video_ids};

/// `{prefix}_{ids sorted and joined by "_"}`
pub fn comparison_key(prefix: &str, ids: &[String]) -> String {
    let mut sorted: Vec<&str> = ids.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    format!("{prefix}_{}", sorted.join("_"))
}

fn split_ids(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct ChannelComparisonRequest {
    pub channel_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct VideoComparisonRequest {
    pub video_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChannelExportQuery {
    pub channel_ids: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VideoExportQuery {
    pub video_ids: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChannelComparisonResponse {
    channels: Vec<ChannelData>,
    #[serde(flatten)]
    comparison: ChannelComparison,
}

#[derive(Debug, Serialize)]
struct VideoComparisonResponse {
    videos: Vec<VideoData>,
    #[serde(flatten)]
    comparison: VideoComparison,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/compare/channels", post(compare_channel_list))
        .route("/compare/videos", post(compare_video_list))
        .route("/compare/channels/export", get(export_channel_comparison))
        .route("/compare/videos/export", get(export_video_comparison))
}

async fn compare_channel_list(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    Json(request): Json<ChannelComparisonRequest>,
) -> ApiResult<Json<Value>> {
    const CONTEXT: &str = "Error comparing channels";

    validate_channel_ids(&request.channel_ids).map_err(|e| state.fail(CONTEXT, e))?;
    let session_id = state.session_for(query.session_id).await?;
    let key = comparison_key("channel_comparison", &request.channel_ids);
    if let Some(cached) = state.cached(Some(&session_id), &key).await {
        return Ok(Json(cached));
    }

    tracing::info!(channels = request.channel_ids.len(), "Comparing channels");

    let fetched = try_join_all(
        request
            .channel_ids
            .iter()
            .map(|id| state.youtube.get_channel_info(id)),
    )
    .await
    .map_err(|e| state.fail(CONTEXT, e))?;

    let mut channels = Vec::with_capacity(fetched.len());
    for (id, channel) in request.channel_ids.iter().zip(fetched) {
        channels.push(channel.ok_or_else(|| ApiError::not_found(format!("Channel not found: {id}")))?);
    }

    let response = ChannelComparisonResponse {
        comparison: compare_channels(&channels, Utc::now()),
        channels,
    };
    let body = serde_json::to_value(&response).map_err(|e| state.fail(CONTEXT, e))?;
    Ok(Json(state.store_response(&session_id, &key, body).await))
}

async fn compare_video_list(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
    Json(request): Json<VideoComparisonRequest>,
) -> ApiResult<Json<Value>> {
    const CONTEXT: &str = "Error comparing videos";

    validate_video_ids(&request.video_ids).map_err(|e| state.fail(CONTEXT, e))?;
    let session_id = state.session_for(query.session_id).await?;
    let key = comparison_key("video_comparison", &request.video_ids);
    if let Some(cached) = state.cached(Some(&session_id), &key).await {
        return Ok(Json(cached));
    }

    tracing::info!(videos = request.video_ids.len(), "Comparing videos");

    let fetched = try_join_all(
        request
            .video_ids
            .iter()
            .map(|id| state.youtube.get_video_info(id)),
    )
    .await
    .map_err(|e| state.fail(CONTEXT, e))?;

    let mut videos = Vec::with_capacity(fetched.len());
    for (id, video) in request.video_ids.iter().zip(fetched) {
        videos.push(video.ok_or_else(|| ApiError::not_found(format!("Video not found: {id}")))?);
    }

    let response = VideoComparisonResponse {
        comparison: compare_videos(&videos, Utc::now()),
        videos,
    };
    let body = serde_json::to_value(&response).map_err(|e| state.fail(CONTEXT, e))?;
    Ok(Json(state.store_response(&session_id, &key, body).await))
}

async fn export_channel_comparison(
    State(state): State<AppState>,
    Query(query): Query<ChannelExportQuery>,
) -> ApiResult<Response> {
    let key = comparison_key("channel_comparison", &split_ids(&query.channel_ids));
    let data = state
        .cached(query.session_id.as_deref(), &key)
        .await
        .ok_or_else(|| {
            ApiError::not_found(
                "Channel comparison data not found in session. Please run comparison first.",
            )
        })?;

    let export = export::export_channel_comparison(&data, Utc::now())
        .map_err(|e| state.fail("Error exporting channel comparison", e))?;
    Ok(csv_attachment(export))
}

async fn export_video_comparison(
    State(state): State<AppState>,
    Query(query): Query<VideoExportQuery>,
) -> ApiResult<Response> {
    let key = comparison_key("video_comparison", &split_ids(&query.video_ids));
    let data = state
        .cached(query.session_id.as_deref(), &key)
        .await
        .ok_or_else(|| {
            ApiError::not_found(
                "Video comparison data not found in session. Please run comparison first.",
            )
        })?;

    let export = export::export_video_comparison(&data, Utc::now())
        .map_err(|e| state.fail("Error exporting video comparison", e))?;
    Ok(csv_attachment(export))
}
