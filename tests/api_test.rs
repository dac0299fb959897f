//! End-to-end API tests
//!
//! Requests run through the full router in-process; YouTube is a wiremock
//! server mounted by `common::mock_youtube`.

mod common;

use axum::http::{Method, StatusCode};
use common::{get, send, send_raw, test_config, test_router, CHANNEL_ID, SECOND_VIDEO_ID, VIDEO_ID};
use serde_json::json;
use tubelens::config::Config;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ============================================================================
// Service endpoints
// ============================================================================

#[tokio::test]
async fn test_root_and_health() {
    let router = test_router(test_config("http://127.0.0.1:9"));

    let (status, body) = get(&router, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Welcome to YouTube Analytics App");
    assert_eq!(body["docs"], "Documentation disabled in production");

    let (status, body) = get(&router, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["youtube_api"], "configured");
    assert_eq!(body["session_count"], 0);
    assert!(body["nlp_models"]["sentiment"].is_string());
}

#[tokio::test]
async fn test_health_reports_missing_key() {
    let router = test_router(Config::default());
    let (status, body) = get(&router, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["youtube_api"], "missing");
}

#[tokio::test]
async fn test_missing_api_key_is_unavailable() {
    let router = test_router(Config::default());
    let (status, body) = get(&router, &format!("/api/video/{VIDEO_ID}")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let router = test_router(test_config("http://127.0.0.1:9"));
    let _ = get(&router, "/api/health").await;

    let (status, bytes) = send_raw(&router, Method::GET, "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.contains("tubelens_api_requests_total"));
}

// ============================================================================
// Sessions
// ============================================================================

#[tokio::test]
async fn test_session_lifecycle() {
    let router = test_router(test_config("http://127.0.0.1:9"));

    let (status, created) = send(&router, Method::POST, "/api/session", None).await;
    assert_eq!(status, StatusCode::CREATED);
    let session_id = created["session_id"].as_str().unwrap().to_string();
    assert_eq!(created["expires_in_secs"], 3600);

    let (status, info) = get(&router, &format!("/api/session/{session_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["data_count"], 0);

    let (_, stats) = get(&router, "/api/sessions/stats").await;
    assert_eq!(stats["active_sessions"], 1);

    let (status, _) = send(&router, Method::DELETE, &format!("/api/session/{session_id}"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get(&router, &format!("/api/session/{session_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_session_id_rejected() {
    let router = test_router(test_config("http://127.0.0.1:9"));
    let (status, _) = get(&router, &format!("/api/video/{VIDEO_ID}?session_id=not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_invalid_identifiers_are_bad_requests() {
    let router = test_router(test_config("http://127.0.0.1:9"));

    let (status, body) = get(&router, "/api/video/short").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("video ID"));

    let (status, body) = get(&router, "/api/channel/bad%20id!/videos").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid channel ID format");

    let (status, _) = get(&router, "/api/trending?country=USA").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&router, &format!("/api/video/{VIDEO_ID}?max_comments=900")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_compare_requires_two_ids() {
    let router = test_router(test_config("http://127.0.0.1:9"));
    let (status, _) = send(
        &router,
        Method::POST,
        "/api/compare/videos",
        Some(json!({"video_ids": [VIDEO_ID]})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Channel flow
// ============================================================================

#[tokio::test]
async fn test_channel_analysis_then_growth_and_export() {
    let youtube = common::mock_youtube().await;
    let router = test_router(test_config(&youtube.uri()));

    let (status, analysis) = get(&router, &format!("/api/channel/{CHANNEL_ID}")).await;
    assert_eq!(status, StatusCode::OK, "{analysis}");
    assert_eq!(analysis["channel_info"]["subscriber_count"], 250_000);
    assert_eq!(analysis["recent_videos"].as_array().unwrap().len(), 2);
    assert_eq!(analysis["upload_frequency"]["heatmap_data"].as_array().unwrap().len(), 168);
    assert!(!analysis["top_keywords"].as_array().unwrap().is_empty());
    let session_id = analysis["session_id"].as_str().unwrap().to_string();

    let (status, growth) = get(
        &router,
        &format!("/api/channel/{CHANNEL_ID}/growth?session_id={session_id}"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(growth["data_source"], "session_cache");

    let (status, bytes) = send_raw(
        &router,
        Method::GET,
        &format!("/api/channel/{CHANNEL_ID}/export?session_id={session_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let csv = String::from_utf8(bytes).unwrap();
    assert!(csv.starts_with("Sheet,"));
    assert!(csv.contains("Channel_Info"));
    assert!(csv.contains("Rust Dev"));
}

#[tokio::test]
async fn test_cached_channel_analysis_is_reused() {
    let youtube = common::mock_youtube().await;
    let router = test_router(test_config(&youtube.uri()));

    let (_, first) = get(&router, &format!("/api/channel/{CHANNEL_ID}")).await;
    let session_id = first["session_id"].as_str().unwrap();
    let calls_before = youtube.received_requests().await.unwrap().len();

    let (status, second) = get(
        &router,
        &format!("/api/channel/{CHANNEL_ID}?session_id={session_id}"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["session_id"], session_id);
    assert_eq!(youtube.received_requests().await.unwrap().len(), calls_before);
}

#[tokio::test]
async fn test_growth_without_analysis_is_not_found() {
    let router = test_router(test_config("http://127.0.0.1:9"));
    let (status, body) = get(&router, &format!("/api/channel/{CHANNEL_ID}/growth")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Growth data not found. Please run channel analysis first.");
}

#[tokio::test]
async fn test_channel_videos_and_search() {
    let youtube = common::mock_youtube().await;
    let router = test_router(test_config(&youtube.uri()));

    let (status, body) = get(&router, &format!("/api/channel/{CHANNEL_ID}/videos?max_results=500")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_videos"], 2);
    assert!(body["fetched_at"].is_string());

    let (status, body) = get(&router, "/api/channel/search?name=rust%20dev").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_results"], 1);
    assert_eq!(body["results"][0]["channel_id"], CHANNEL_ID);
}

// ============================================================================
// Video flow
// ============================================================================

#[tokio::test]
async fn test_video_analysis_with_comments() {
    let youtube = common::mock_youtube().await;
    let router = test_router(test_config(&youtube.uri()));

    let (status, body) = get(&router, &format!("/api/video/{VIDEO_ID}")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["video_info"]["id"], VIDEO_ID);

    let comments = &body["comment_analysis"];
    assert_eq!(comments["total_comments"], 4);
    assert_eq!(comments["analyzed_comments"], 4);
    assert!(comments["sentiment_scores"].is_object());
    assert!(comments["toxicity_analysis"].is_object());
    assert!(comments["overall_sentiment"].is_string());

    let session_id = body["session_id"].as_str().unwrap();
    let (status, sentiment) = get(
        &router,
        &format!("/api/video/{VIDEO_ID}/sentiment?session_id={session_id}"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sentiment["data_source"], "session_cache");

    let (status, bytes) = send_raw(
        &router,
        Method::GET,
        &format!("/api/video/{VIDEO_ID}/export?session_id={session_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let csv = String::from_utf8(bytes).unwrap();
    assert!(csv.contains("Video_Info"));
    assert!(csv.contains("Toxicity_Analysis"));
}

#[tokio::test]
async fn test_video_without_comments_skips_comment_fetch() {
    let youtube = common::mock_youtube().await;
    let router = test_router(test_config(&youtube.uri()));

    let (status, body) = get(&router, &format!("/api/video/{SECOND_VIDEO_ID}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["comment_analysis"]["analyzed_comments"], 0);
    assert!(body["comment_analysis"]["sentiment_scores"].is_null());

    let comment_calls = youtube
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.url.path() == "/commentThreads")
        .count();
    assert_eq!(comment_calls, 0);
}

#[tokio::test]
async fn test_video_comments_listing() {
    let youtube = common::mock_youtube().await;
    let router = test_router(test_config(&youtube.uri()));

    let (status, body) = get(&router, &format!("/api/video/{VIDEO_ID}/comments?max_comments=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_fetched"], 2);
    assert_eq!(body["comments"][0]["has_replies"], true);
}

#[tokio::test]
async fn test_standalone_toxicity() {
    let youtube = common::mock_youtube().await;
    let router = test_router(test_config(&youtube.uri()));

    let (status, body) = get(&router, &format!("/api/video/{VIDEO_ID}/toxicity")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["analyzed_comments"], 4);
    assert_eq!(body["toxicity_analysis"]["total_comments_analyzed"], 4);
    assert!(body.get("session_id").is_none());
}

#[tokio::test]
async fn test_export_without_session_data_is_not_found() {
    let router = test_router(test_config("http://127.0.0.1:9"));
    let (status, body) = get(&router, &format!("/api/video/{VIDEO_ID}/export")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["error"],
        "Video analysis data not found in session. Please run analysis first."
    );
}

// ============================================================================
// Trending flow
// ============================================================================

#[tokio::test]
async fn test_trending_then_velocity_and_stats() {
    let youtube = common::mock_youtube().await;
    let router = test_router(test_config(&youtube.uri()));

    let (status, body) = get(&router, "/api/trending?country=us").await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["country"], "US");
    assert_eq!(body["total_videos"], 2);
    assert_eq!(body["category_distribution"]["Science & Technology"], 2);
    let session_id = body["session_id"].as_str().unwrap();

    let (status, velocity) = get(
        &router,
        &format!("/api/trending/velocity?country=us&top_n=1&session_id={session_id}"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(velocity["velocity_data"].as_array().unwrap().len(), 1);

    let (status, stats) = get(&router, &format!("/api/trending/stats?session_id={session_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["data_source"], "session_cache");
    assert_eq!(stats["total_videos"], 2);
}

#[tokio::test]
async fn test_trending_reference_tables() {
    let router = test_router(test_config("http://127.0.0.1:9"));

    let (status, body) = get(&router, "/api/trending/categories").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["total_categories"].as_u64().unwrap() > 10);

    let (_, body) = get(&router, "/api/trending/countries").await;
    assert_eq!(body["default_country"], "US");
}

// ============================================================================
// Comparison flow
// ============================================================================

#[tokio::test]
async fn test_video_comparison_and_export() {
    let youtube = common::mock_youtube().await;
    let router = test_router(test_config(&youtube.uri()));

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/compare/videos",
        Some(json!({"video_ids": [SECOND_VIDEO_ID, VIDEO_ID]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["videos"].as_array().unwrap().len(), 2);
    assert!(body["comparison_metrics"].is_object());
    let session_id = body["session_id"].as_str().unwrap();

    // Export keys are order independent
    let (status, bytes) = send_raw(
        &router,
        Method::GET,
        &format!("/api/compare/videos/export?video_ids={VIDEO_ID},{SECOND_VIDEO_ID}&session_id={session_id}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(bytes).unwrap().contains("Insights"));
}

#[tokio::test]
async fn test_comparison_with_unknown_channel() {
    let youtube = common::mock_youtube().await;
    let unknown = "UCaaaaaaaaaaaaaaaaaaaaaa";
    Mock::given(method("GET"))
        .and(path("/channels"))
        .and(query_param("id", unknown))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&youtube)
        .await;
    let router = test_router(test_config(&youtube.uri()));

    let (status, body) = send(
        &router,
        Method::POST,
        "/api/compare/channels",
        Some(json!({"channel_ids": [CHANNEL_ID, unknown]})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], format!("Channel not found: {unknown}"));
}

#[tokio::test]
async fn test_quota_exceeded_is_unavailable() {
    let youtube = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"message": "quota", "errors": [{"reason": "quotaExceeded"}]}
        })))
        .mount(&youtube)
        .await;
    let router = test_router(test_config(&youtube.uri()));

    let (status, _) = get(&router, &format!("/api/video/{VIDEO_ID}")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
