//! Video analysis endpoints

use std::collections::HashSet;

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
use crate::analytics::{engagement_metrics, performance_insights, EngagementMetrics, PerformanceInsights};
use crate::export;
use crate::models::{CommentData, VideoData};
use crate::nlp::keywords::ExtractedKeyword;
use crate::nlp::sentiment::{
    self, LabelCounts, LabelPercentages, SentimentAnalysis, SentimentLabel, SentimentScores,
};
use crate::nlp::toxicity::{self, ToxicityAnalysis};
use crate::validation::{validate_max_comments, validate_video_id};

const COMMENT_KEYWORDS_PER_COMMENT: usize = 3;
const COMMENT_KEYWORDS: usize = 20;
const TITLE_KEYWORDS: usize = 10;
const DESCRIPTION_KEYWORDS: usize = 15;
const COMBINED_KEYWORDS: usize = 25;

fn analysis_key(video_id: &str) -> String {
    format!("video_analysis_{video_id}")
}

// ============================================================================
// Request / Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct VideoQuery {
    #[serde(default = "default_true")]
    pub include_comments: bool,
    #[serde(default = "default_max_comments")]
    pub max_comments: u32,
    #[serde(default = "default_true")]
    pub include_sentiment: bool,
    #[serde(default = "default_true")]
    pub include_keywords: bool,
    #[serde(default = "default_true")]
    pub include_toxicity: bool,
    pub session_id: Option<String>,
}

fn default_max_comments() -> u32 {
    500
}

#[derive(Debug, Deserialize)]
pub struct CommentsQuery {
    #[serde(default = "default_comment_page")]
    pub max_comments: i64,
}

fn default_comment_page() -> i64 {
    100
}

/// Query for the sentiment and toxicity sub-analyses
#[derive(Debug, Deserialize)]
pub struct CommentAnalysisQuery {
    #[serde(default = "default_max_comments")]
    pub max_comments: u32,
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct KeywordsQuery {
    #[serde(default = "default_true")]
    pub include_comments: bool,
    #[serde(default = "default_max_comments")]
    pub max_comments: u32,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub session_id: Option<String>,
}

/// Comment-level results inside a video analysis
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommentAnalysis {
    pub total_comments: u64,
    pub analyzed_comments: usize,
    pub sentiment_scores: Option<SentimentScores>,
    pub sentiment_distribution: Option<LabelCounts>,
    pub keywords: Vec<ExtractedKeyword>,
    pub toxicity_analysis: Option<ToxicityAnalysis>,
    pub sentiment_analysis: Option<SentimentAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_sentiment: Option<SentimentLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_strength: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub polarization_index: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentiment_percentages: Option<LabelPercentages>,
}

#[derive(Debug, Serialize)]
pub struct VideoAnalysis {
    pub video_info: VideoData,
    pub engagement_metrics: EngagementMetrics,
    pub comment_analysis: CommentAnalysis,
    pub performance_insights: PerformanceInsights,
}

/// A comment as listed by `/video/{id}/comments`
#[derive(Debug, Clone, Serialize)]
pub struct CommentListing {
    pub id: String,
    pub text: String,
    pub author: String,
    pub published_at: Option<DateTime<Utc>>,
    pub like_count: u64,
    pub reply_count: u64,
    pub text_length: usize,
    pub has_replies: bool,
}

impl From<CommentData> for CommentListing {
    fn from(c: CommentData) -> Self {
        Self {
            text_length: c.text.chars().count(),
            has_replies: c.reply_count > 0,
            id: c.id,
            text: c.text,
            author: c.author,
            published_at: c.published_at,
            like_count: c.like_count,
            reply_count: c.reply_count,
        }
    }
}

/// Deduplicate by keyword keeping the most relevant entry
pub fn combine_keywords(all: Vec<ExtractedKeyword>, limit: usize) -> Vec<ExtractedKeyword> {
    let mut sorted = all;
    sorted.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

    let mut seen = HashSet::new();
    sorted
        .into_iter()
        .filter(|k| seen.insert(k.keyword.clone()))
        .take(limit)
        .collect()
}

fn non_empty(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| match v {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    })
}

// ============================================================================
// Routes
// ============================================================================

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/video/{video_id}", get(analyze_video))
        .route("/video/{video_id}/comments", get(video_comments))
        .route("/video/{video_id}/sentiment", get(video_sentiment))
        .route("/video/{video_id}/toxicity", get(video_toxicity))
        .route("/video/{video_id}/keywords", get(video_keywords))
        .route("/video/{video_id}/export", get(export_video))
}

async fn analyze_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(query): Query<VideoQuery>,
) -> ApiResult<Json<Value>> {
    const CONTEXT: &str = "Error analyzing video";

    validate_video_id(&video_id).map_err(|e| state.fail(CONTEXT, e))?;
    let max_comments = validate_max_comments(query.max_comments).map_err(|e| state.fail(CONTEXT, e))?;
    let max_comments = (max_comments as usize).min(state.config.youtube.max_comments_per_video);

    let session_id = state.session_for(query.session_id).await?;
    let key = analysis_key(&video_id);
    if let Some(cached) = state.cached(Some(&session_id), &key).await {
        return Ok(Json(cached));
    }

    tracing::info!(video_id = %video_id, max_comments, "Analyzing video");

    let video = state
        .youtube
        .get_video_info(&video_id)
        .await
        .map_err(|e| state.fail(CONTEXT, e))?
        .ok_or_else(|| ApiError::not_found(format!("Video not found: {video_id}")))?;

    let mut comment_analysis = CommentAnalysis {
        total_comments: video.comment_count,
        ..Default::default()
    };

    if query.include_comments && video.comment_count > 0 {
        let comments = state
            .youtube
            .get_video_comments(&video_id, max_comments)
            .await
            .map_err(|e| state.fail(CONTEXT, e))?;
        tracing::debug!(video_id = %video_id, fetched = comments.len(), "Fetched comments");

        if !comments.is_empty() {
            comment_analysis.analyzed_comments = comments.len();

            if query.include_sentiment {
                let scored = state
                    .sentiment
                    .score_comments(&comments)
                    .await
                    .map_err(|e| state.fail(CONTEXT, e))?;
                let summary = sentiment::metrics(&scored);

                comment_analysis.sentiment_scores = Some(summary.sentiment_scores);
                comment_analysis.sentiment_distribution = Some(summary.sentiment_distribution);
                comment_analysis.overall_sentiment = Some(summary.overall_sentiment);
                comment_analysis.sentiment_strength = Some(summary.sentiment_strength);
                comment_analysis.polarization_index = Some(summary.polarization_index);
                comment_analysis.sentiment_percentages = Some(summary.sentiment_percentages);
                comment_analysis.sentiment_analysis = Some(sentiment::analysis(&scored));
            }

            if query.include_keywords {
                comment_analysis.keywords = state
                    .keywords
                    .extract_from_comments(&comments, COMMENT_KEYWORDS_PER_COMMENT, COMMENT_KEYWORDS)
                    .await;
            }

            if query.include_toxicity {
                let scored = state.toxicity.score_comments(&comments).await;
                comment_analysis.toxicity_analysis = Some(toxicity::analysis(&scored));
            }
        }
    }

    let analysis = VideoAnalysis {
        engagement_metrics: engagement_metrics(&video),
        performance_insights: performance_insights(&video),
        video_info: video,
        comment_analysis,
    };

    let body = serde_json::to_value(&analysis).map_err(|e| state.fail(CONTEXT, e))?;
    Ok(Json(state.store_response(&session_id, &key, body).await))
}

async fn video_comments(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(query): Query<CommentsQuery>,
) -> ApiResult<Json<Value>> {
    if validate_video_id(&video_id).is_err() {
        return Err(ApiError::bad_request("Invalid video ID format"));
    }
    let max_comments = query.max_comments.clamp(1, 500) as usize;

    let comments = state
        .youtube
        .get_video_comments(&video_id, max_comments)
        .await
        .map_err(|e| state.fail("Error fetching comments", e))?;

    if comments.is_empty() {
        return Ok(Json(json!({
            "video_id": video_id,
            "comments": [],
            "total_fetched": 0,
            "message": "No comments found or comments are disabled for this video",
        })));
    }

    let listing: Vec<CommentListing> = comments.into_iter().map(CommentListing::from).collect();
    Ok(Json(json!({
        "video_id": video_id,
        "total_fetched": listing.len(),
        "comments": listing,
        "max_requested": max_comments,
    })))
}

async fn fetch_comments(
    state: &AppState,
    context: &str,
    video_id: &str,
    max_comments: u32,
) -> ApiResult<Vec<CommentData>> {
    validate_video_id(video_id).map_err(|e| state.fail(context, e))?;
    let max_comments = validate_max_comments(max_comments).map_err(|e| state.fail(context, e))?;
    state
        .youtube
        .get_video_comments(video_id, max_comments as usize)
        .await
        .map_err(|e| state.fail(context, e))
}

async fn video_sentiment(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(query): Query<CommentAnalysisQuery>,
) -> ApiResult<Json<Value>> {
    const CONTEXT: &str = "Error analyzing sentiment";
    let session = query.session_id.as_deref();

    if let Some(cached) = state.cached(session, &format!("video_sentiment_{video_id}")).await {
        return Ok(Json(cached));
    }
    if let Some(cached) = state.cached(session, &analysis_key(&video_id)).await {
        if let Some(found) = non_empty(cached.pointer("/comment_analysis/sentiment_analysis")) {
            return Ok(Json(json!({
                "video_id": video_id,
                "sentiment_analysis": found,
                "data_source": "session_cache",
            })));
        }
    }

    let comments = fetch_comments(&state, CONTEXT, &video_id, query.max_comments).await?;
    if comments.is_empty() {
        return Ok(Json(json!({
            "video_id": video_id,
            "sentiment_analysis": {},
            "message": "No comments available for sentiment analysis",
        })));
    }

    let scored = state
        .sentiment
        .score_comments(&comments)
        .await
        .map_err(|e| state.fail(CONTEXT, e))?;
    let summary = sentiment::metrics(&scored);

    let body = json!({
        "video_id": video_id,
        "sentiment_analysis": sentiment::analysis(&scored),
        "sentiment_scores": summary.sentiment_scores,
        "sentiment_distribution": summary.sentiment_distribution,
        "overall_sentiment": summary.overall_sentiment,
        "sentiment_strength": summary.sentiment_strength,
        "polarization_index": summary.polarization_index,
        "sentiment_percentages": summary.sentiment_percentages,
        "sentiment_trends": sentiment::trends(&scored),
        "sentiment_by_engagement": sentiment::by_engagement(&scored),
        "analyzed_comments": comments.len(),
    });

    match query.session_id {
        Some(id) => {
            let id = state.session_for(Some(id)).await?;
            let key = format!("video_sentiment_{video_id}");
            Ok(Json(state.store_response(&id, &key, body).await))
        }
        None => Ok(Json(body)),
    }
}

async fn video_toxicity(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(query): Query<CommentAnalysisQuery>,
) -> ApiResult<Json<Value>> {
    const CONTEXT: &str = "Error analyzing toxicity";
    let session = query.session_id.as_deref();

    if let Some(cached) = state.cached(session, &format!("video_toxicity_{video_id}")).await {
        return Ok(Json(cached));
    }
    if let Some(cached) = state.cached(session, &analysis_key(&video_id)).await {
        if let Some(found) = non_empty(cached.pointer("/comment_analysis/toxicity_analysis")) {
            return Ok(Json(json!({
                "video_id": video_id,
                "toxicity_analysis": found,
                "data_source": "session_cache",
            })));
        }
    }

    let comments = fetch_comments(&state, CONTEXT, &video_id, query.max_comments).await?;
    if comments.is_empty() {
        return Ok(Json(json!({
            "video_id": video_id,
            "toxicity_analysis": {},
            "message": "No comments available for toxicity analysis",
        })));
    }

    let scored = state.toxicity.score_comments(&comments).await;
    let body = json!({
        "video_id": video_id,
        "toxicity_analysis": toxicity::analysis(&scored),
        "toxicity_trends": toxicity::trends(&scored),
        "toxicity_by_engagement": toxicity::by_engagement(&scored),
        "analyzed_comments": comments.len(),
    });

    match query.session_id {
        Some(id) => {
            let id = state.session_for(Some(id)).await?;
            let key = format!("video_toxicity_{video_id}");
            Ok(Json(state.store_response(&id, &key, body).await))
        }
        None => Ok(Json(body)),
    }
}

async fn video_keywords(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(query): Query<KeywordsQuery>,
) -> ApiResult<Json<Value>> {
    const CONTEXT: &str = "Error extracting keywords";

    validate_video_id(&video_id).map_err(|e| state.fail(CONTEXT, e))?;
    let video = state
        .youtube
        .get_video_info(&video_id)
        .await
        .map_err(|e| state.fail(CONTEXT, e))?
        .ok_or_else(|| ApiError::not_found(format!("Video not found: {video_id}")))?;

    let title_keywords = if video.title.is_empty() {
        Vec::new()
    } else {
        state.keywords.extract_from_text(&video.title, TITLE_KEYWORDS).await
    };

    let description_keywords = if video.description.is_empty() {
        Vec::new()
    } else {
        state
            .keywords
            .extract_from_text(&video.description, DESCRIPTION_KEYWORDS)
            .await
    };

    let mut comment_keywords = Vec::new();
    if query.include_comments {
        let comments = fetch_comments(&state, CONTEXT, &video_id, query.max_comments).await?;
        if !comments.is_empty() {
            comment_keywords = state
                .keywords
                .extract_from_comments(&comments, COMMENT_KEYWORDS_PER_COMMENT, COMMENT_KEYWORDS)
                .await;
        }
    }

    let combined = combine_keywords(
        title_keywords
            .iter()
            .chain(&description_keywords)
            .chain(&comment_keywords)
            .cloned()
            .collect(),
        COMBINED_KEYWORDS,
    );

    Ok(Json(json!({
        "video_id": video_id,
        "title_keywords": title_keywords,
        "description_keywords": description_keywords,
        "comment_keywords": comment_keywords,
        "combined_keywords": combined,
    })))
}

async fn export_video(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    let data = state
        .cached(query.session_id.as_deref(), &analysis_key(&video_id))
        .await
        .ok_or_else(|| {
            ApiError::not_found("Video analysis data not found in session. Please run analysis first.")
        })?;

    let export = export::export_video_analysis(&data, Utc::now())
        .map_err(|e| state.fail("Error exporting video analysis", e))?;
    Ok(csv_attachment(export))
}
