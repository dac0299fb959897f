//! Trending chart endpoints

use axum::{
    extract::{Query, State},
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::csv_attachment;
use super::error::{ApiError, ApiResult};
use super::server::AppState;
use crate::analytics::trending::VELOCITY_TOP_N;
use crate::analytics::{
    category_distribution, trending_stats, velocity_entries, TrendingVideo, VelocityEntry,
};
use crate::export;
use crate::validation::categories::{countries, sorted_categories};
use crate::validation::{validate_category, validate_country, validate_max_results, DEFAULT_COUNTRY};

/// Cache key shared by the trending list, velocity and stats endpoints
pub fn cache_key(country: &str, category_id: Option<&str>, max_results: u32) -> String {
    format!("trending_{country}_{}_{max_results}", category_id.unwrap_or("all"))
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

fn default_max_results() -> u32 {
    50
}

fn default_top_n() -> i64 {
    VELOCITY_TOP_N as i64
}

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    #[serde(default = "default_country")]
    pub country: String,
    pub category_id: Option<String>,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VelocityQuery {
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_top_n")]
    pub top_n: i64,
    pub session_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    #[serde(default = "default_country")]
    pub country: String,
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TrendingAnalysis {
    pub videos: Vec<TrendingVideo>,
    pub country: String,
    pub category_filter: Option<String>,
    pub velocity_data: Vec<VelocityEntry>,
    pub category_distribution: std::collections::BTreeMap<String, usize>,
    pub total_videos: usize,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/trending", get(trending_videos))
        .route("/trending/categories", get(list_categories))
        .route("/trending/countries", get(list_countries))
        .route("/trending/velocity", get(trending_velocity))
        .route("/trending/stats", get(trending_stats_handler))
        .route("/trending/export", get(export_trending))
}

struct Validated {
    country: String,
    category_id: Option<String>,
    max_results: u32,
}

fn validate_query(state: &AppState, context: &str, query: &TrendingQuery) -> ApiResult<Validated> {
    let country = validate_country(&query.country).map_err(|e| state.fail(context, e))?;
    let category_id = match query.category_id.as_deref().filter(|c| !c.is_empty()) {
        Some(id) => {
            validate_category(id).map_err(|e| state.fail(context, e))?;
            Some(id.to_string())
        }
        None => None,
    };
    let max_results = validate_max_results(query.max_results).map_err(|e| state.fail(context, e))?;

    Ok(Validated {
        country,
        category_id,
        max_results,
    })
}

async fn trending_videos(
    State(state): State<AppState>,
    Query(query): Query<TrendingQuery>,
) -> ApiResult<Json<Value>> {
    const CONTEXT: &str = "Error fetching trending videos";

    let valid = validate_query(&state, CONTEXT, &query)?;
    let session_id = state.session_for(query.session_id).await?;
    let key = cache_key(&valid.country, valid.category_id.as_deref(), valid.max_results);
    if let Some(cached) = state.cached(Some(&session_id), &key).await {
        return Ok(Json(cached));
    }

    tracing::info!(
        country = %valid.country,
        category = valid.category_id.as_deref().unwrap_or("all"),
        "Fetching trending videos"
    );

    let fetch_limit = (valid.max_results as usize).min(state.config.youtube.max_trending_videos);
    let videos = state
        .youtube
        .get_trending_videos(&valid.country, valid.category_id.as_deref(), fetch_limit)
        .await
        .map_err(|e| state.fail(CONTEXT, e))?;

    if videos.is_empty() {
        return Err(ApiError::not_found(format!(
            "No trending videos found for country {}",
            valid.country
        )));
    }

    let analysis = TrendingAnalysis {
        velocity_data: velocity_entries(&videos, Utc::now(), VELOCITY_TOP_N),
        category_distribution: category_distribution(&videos),
        total_videos: videos.len(),
        videos: videos.iter().map(TrendingVideo::from).collect(),
        country: valid.country,
        category_filter: valid.category_id,
    };

    let body = serde_json::to_value(&analysis).map_err(|e| state.fail(CONTEXT, e))?;
    Ok(Json(state.store_response(&session_id, &key, body).await))
}

async fn list_categories() -> Json<Value> {
    let categories = sorted_categories();
    Json(json!({
        "total_categories": categories.len(),
        "categories": categories,
    }))
}

async fn list_countries() -> Json<Value> {
    let countries = countries();
    Json(json!({
        "total_countries": countries.len(),
        "countries": countries,
        "default_country": DEFAULT_COUNTRY,
    }))
}

/// The unfiltered 50-video list cached by `/trending`
async fn default_listing(state: &AppState, country: &str, session_id: Option<&str>) -> Option<Value> {
    let country = country.trim().to_uppercase();
    state
        .cached(session_id, &cache_key(&country, None, default_max_results()))
        .await
}

async fn trending_velocity(
    State(state): State<AppState>,
    Query(query): Query<VelocityQuery>,
) -> ApiResult<Json<Value>> {
    let top_n = query.top_n.clamp(1, 50) as usize;

    let velocity = default_listing(&state, &query.country, query.session_id.as_deref())
        .await
        .and_then(|cached| cached.get("velocity_data").and_then(Value::as_array).cloned())
        .ok_or_else(|| {
            ApiError::not_found("Velocity data not found. Please fetch trending videos first.")
        })?;

    Ok(Json(json!({
        "country": query.country,
        "velocity_data": velocity.into_iter().take(top_n).collect::<Vec<_>>(),
        "data_source": "session_cache",
    })))
}

async fn trending_stats_handler(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> ApiResult<Json<Value>> {
    let cached = default_listing(&state, &query.country, query.session_id.as_deref())
        .await
        .filter(|c| c.get("videos").is_some())
        .ok_or_else(|| {
            ApiError::not_found("Trending data not found. Please fetch trending videos first.")
        })?;

    let videos: Vec<TrendingVideo> = serde_json::from_value(cached["videos"].clone())
        .map_err(|e| state.fail("Error calculating trending stats", e))?;

    let mut body = serde_json::to_value(trending_stats(&videos))
        .map_err(|e| state.fail("Error calculating trending stats", e))?;
    if let Value::Object(map) = &mut body {
        map.insert(
            "category_distribution".to_string(),
            cached.get("category_distribution").cloned().unwrap_or(Value::Null),
        );
        map.insert("country".to_string(), Value::String(query.country));
        map.insert("data_source".to_string(), json!("session_cache"));
    }
    Ok(Json(body))
}

async fn export_trending(
    State(state): State<AppState>,
    Query(query): Query<TrendingQuery>,
) -> ApiResult<Response> {
    const CONTEXT: &str = "Error exporting trending analysis";

    let valid = validate_query(&state, CONTEXT, &query)?;
    let key = cache_key(&valid.country, valid.category_id.as_deref(), valid.max_results);
    let data = state
        .cached(query.session_id.as_deref(), &key)
        .await
        .ok_or_else(|| {
            ApiError::not_found(
                "Trending analysis data not found in session. Please run analysis first.",
            )
        })?;

    let export = export::export_trending_analysis(&data, Utc::now()).map_err(|e| state.fail(CONTEXT, e))?;
    Ok(csv_attachment(export))
}
