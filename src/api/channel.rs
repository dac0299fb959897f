//! Channel analysis endpoints

use axum::{
    extract::{Path, Query, State},
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::{ApiError, ApiResult};
use super::server::AppState;
use super::{csv_attachment, default_true};
use crate::analytics::{
    engagement_rate, growth_trends, parse_duration, top_keywords, upload_frequency, VideoSummary,
};
use crate::export;
use crate::models::{ChannelSearchResult, KeywordData, VideoData};
use crate::nlp::keywords::ExtractedKeyword;
use crate::validation::{validate_channel_id, validate_channel_name, validate_max_videos};

const TOP_KEYWORDS_LIMIT: usize = 30;
const CHANNEL_KEYWORDS: usize = 20;
const TRENDING_TITLE_KEYWORDS: usize = 15;

fn cache_key(channel_id: &str) -> String {
    format!("channel_analysis_{channel_id}")
}

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ChannelQuery {
    #[serde(default = "default_true")]
    pub include_videos: bool,
    #[serde(default = "default_max_videos")]
    pub max_videos: u32,
    #[serde(default = "default_true")]
    pub include_keywords: bool,
    pub session_id: Option<String>,
}

fn default_max_videos() -> u32 {
    50
}

#[derive(Debug, Deserialize)]
pub struct VideosQuery {
    #[serde(default = "default_video_results")]
    pub max_results: i64,
}

fn default_video_results() -> i64 {
    50
}

#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub name: String,
    #[serde(default = "default_search_results")]
    pub max_results: i64,
}

fn default_search_results() -> i64 {
    10
}

/// A recent upload in a channel analysis
#[derive(Debug, Clone, Serialize)]
pub struct RecentVideo {
    pub id: String,
    pub title: String,
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub duration: String,
    pub duration_formatted: String,
    pub duration_seconds: u64,
    pub tags: Vec<String>,
    pub engagement_rate: f64,
}

impl From<&VideoData> for RecentVideo {
    fn from(video: &VideoData) -> Self {
        let duration = parse_duration(&video.duration);
        Self {
            id: video.id.clone(),
            title: video.title.clone(),
            published_at: video.published_at,
            view_count: video.view_count,
            like_count: video.like_count,
            comment_count: video.comment_count,
            duration: video.duration.clone(),
            duration_formatted: duration.formatted,
            duration_seconds: duration.seconds,
            tags: video.tags.clone(),
            engagement_rate: engagement_rate(video.view_count, video.like_count, video.comment_count)
                .total_engagement_rate,
        }
    }
}

/// Keyword entry merged from word counts and title extraction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedKeyword {
    pub keyword: String,
    pub count: u64,
    pub relevance_score: f64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_strength: Option<String>,
}

impl From<KeywordData> for RankedKeyword {
    fn from(k: KeywordData) -> Self {
        Self {
            keyword: k.keyword,
            count: k.count,
            relevance_score: 1.0,
            kind: k.kind,
            trend_strength: None,
        }
    }
}

impl From<ExtractedKeyword> for RankedKeyword {
    fn from(k: ExtractedKeyword) -> Self {
        Self {
            keyword: k.keyword,
            count: k.occurrence_count.unwrap_or(0) as u64,
            relevance_score: k.relevance_score,
            kind: k.kind,
            trend_strength: k.trend_strength,
        }
    }
}

/// Highest relevance first, then highest count
pub fn rank_keywords(mut keywords: Vec<RankedKeyword>, limit: usize) -> Vec<RankedKeyword> {
    keywords.sort_by(|a, b| {
        b.relevance_score
            .total_cmp(&a.relevance_score)
            .then(b.count.cmp(&a.count))
    });
    keywords.truncate(limit);
    keywords
}

#[derive(Debug, Serialize)]
pub struct ChannelAnalysis {
    pub channel_info: Value,
    pub growth_data: Value,
    pub upload_frequency: Value,
    pub top_keywords: Vec<RankedKeyword>,
    pub recent_videos: Vec<RecentVideo>,
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/channel/search", get(search_channels))
        .route("/channel/{channel_id}", get(analyze_channel))
        .route("/channel/{channel_id}/videos", get(channel_videos))
        .route("/channel/{channel_id}/growth", get(channel_growth))
        .route("/channel/{channel_id}/export", get(export_channel))
}

async fn analyze_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(query): Query<ChannelQuery>,
) -> ApiResult<Json<Value>> {
    const CONTEXT: &str = "Error analyzing channel";

    validate_channel_id(&channel_id).map_err(|e| state.fail(CONTEXT, e))?;
    let max_videos = validate_max_videos(query.max_videos).map_err(|e| state.fail(CONTEXT, e))?;
    let max_videos = (max_videos as usize).min(state.config.youtube.max_videos_per_channel);

    let session_id = state.session_for(query.session_id).await?;
    let key = cache_key(&channel_id);
    if let Some(cached) = state.cached(Some(&session_id), &key).await {
        return Ok(Json(cached));
    }

    tracing::info!(channel_id = %channel_id, max_videos, "Analyzing channel");

    let channel = state
        .youtube
        .get_channel_info(&channel_id)
        .await
        .map_err(|e| state.fail(CONTEXT, e))?
        .ok_or_else(|| ApiError::not_found(format!("Channel not found: {channel_id}")))?;

    let mut analysis = ChannelAnalysis {
        channel_info: serde_json::to_value(&channel).map_err(|e| state.fail(CONTEXT, e))?,
        growth_data: json!([]),
        upload_frequency: json!({}),
        top_keywords: Vec::new(),
        recent_videos: Vec::new(),
    };

    if query.include_videos {
        let videos = state
            .youtube
            .get_channel_videos(&channel_id, max_videos)
            .await
            .map_err(|e| state.fail(CONTEXT, e))?;

        if !videos.is_empty() {
            analysis.recent_videos = videos.iter().map(RecentVideo::from).collect();
            analysis.growth_data =
                serde_json::to_value(growth_trends(&videos)).map_err(|e| state.fail(CONTEXT, e))?;
            analysis.upload_frequency = serde_json::to_value(upload_frequency(&videos))
                .map_err(|e| state.fail(CONTEXT, e))?;

            if query.include_keywords {
                let mut keywords: Vec<RankedKeyword> =
                    top_keywords(&videos, &channel.description, CHANNEL_KEYWORDS)
                        .into_iter()
                        .map(RankedKeyword::from)
                        .collect();

                let titles: Vec<String> = videos.iter().map(|v| v.title.clone()).collect();
                keywords.extend(
                    state
                        .keywords
                        .extract_trending(&titles, TRENDING_TITLE_KEYWORDS)
                        .await
                        .into_iter()
                        .map(RankedKeyword::from),
                );
                analysis.top_keywords = rank_keywords(keywords, TOP_KEYWORDS_LIMIT);
            }
        }
    }

    let body = serde_json::to_value(&analysis).map_err(|e| state.fail(CONTEXT, e))?;
    Ok(Json(state.store_response(&session_id, &key, body).await))
}

async fn channel_videos(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(query): Query<VideosQuery>,
) -> ApiResult<Json<Value>> {
    const CONTEXT: &str = "Error fetching channel videos";

    if validate_channel_id(&channel_id).is_err() {
        return Err(ApiError::bad_request("Invalid channel ID format"));
    }
    let max_results = query.max_results.clamp(1, 50) as usize;

    let videos = state
        .youtube
        .get_channel_videos(&channel_id, max_results)
        .await
        .map_err(|e| state.fail(CONTEXT, e))?;

    if videos.is_empty() {
        return Err(ApiError::not_found(
            "No videos found for this channel or channel does not exist",
        ));
    }

    let summaries: Vec<VideoSummary> = videos.iter().map(VideoSummary::from).collect();
    Ok(Json(json!({
        "channel_id": channel_id,
        "total_videos": summaries.len(),
        "videos": summaries,
        "fetched_at": Utc::now(),
    })))
}

async fn channel_growth(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<Value>> {
    let growth = state
        .cached(query.session_id.as_deref(), &cache_key(&channel_id))
        .await
        .and_then(|cached| cached.get("growth_data").cloned())
        .ok_or_else(|| {
            ApiError::not_found("Growth data not found. Please run channel analysis first.")
        })?;

    Ok(Json(json!({
        "channel_id": channel_id,
        "growth_data": growth,
        "data_source": "session_cache",
    })))
}

async fn export_channel(
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Response> {
    let data = state
        .cached(query.session_id.as_deref(), &cache_key(&channel_id))
        .await
        .ok_or_else(|| {
            ApiError::not_found(
                "Channel analysis data not found in session. Please run analysis first.",
            )
        })?;

    let export = export::export_channel_analysis(&data, Utc::now())
        .map_err(|e| state.fail("Error exporting channel analysis", e))?;
    Ok(csv_attachment(export))
}

async fn search_channels(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<Value>> {
    const CONTEXT: &str = "Error searching channels";

    let name = validate_channel_name(&query.name).map_err(|e| state.fail(CONTEXT, e))?;
    let max_results = query.max_results.clamp(1, 50) as usize;

    let results: Vec<ChannelSearchResult> = state
        .youtube
        .search_channels(&name, max_results)
        .await
        .map_err(|e| state.fail(CONTEXT, e))?;

    Ok(Json(json!({
        "query": name,
        "total_results": results.len(),
        "results": results,
    })))
}
