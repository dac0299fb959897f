//! Integration tests for YouTubeClient using wiremock
//!
//! These tests validate request shaping, pagination and error mapping
//! against a mock Data API.

mod common;

use std::time::Duration;

use serde_json::json;
use tokio_test::{assert_err, assert_ok};
use tubelens::utils::error::YouTubeError;
use tubelens::youtube::YouTubeClient;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{comment_item, CHANNEL_ID, SECOND_VIDEO_ID, VIDEO_ID};

fn client(server: &MockServer) -> YouTubeClient {
    YouTubeClient::with_base_url("test-key", &server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_channel_info_parses_statistics() {
    let server = common::mock_youtube().await;

    let channel = assert_ok!(client(&server).get_channel_info(CHANNEL_ID).await).unwrap();
    assert_eq!(channel.id, CHANNEL_ID);
    assert_eq!(channel.title, "Rust Dev");
    assert_eq!(channel.subscriber_count, 250_000);
    assert_eq!(channel.thumbnail_url, "https://img.example/high.jpg");
}

#[tokio::test]
async fn test_handle_uses_for_handle_selector() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels"))
        .and(query_param("forHandle", "@rustdev"))
        .and(query_param("key", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [common::channel_item(CHANNEL_ID, "Rust Dev", 10)]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let channel = assert_ok!(client(&server).get_channel_info("@rustdev").await);
    assert!(channel.is_some());
}

#[tokio::test]
async fn test_unknown_channel_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/channels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"items": []})))
        .mount(&server)
        .await;

    let channel = assert_ok!(client(&server).get_channel_info(CHANNEL_ID).await);
    assert!(channel.is_none());
}

#[tokio::test]
async fn test_channel_videos_via_uploads_playlist() {
    let server = common::mock_youtube().await;

    let videos = assert_ok!(client(&server).get_channel_videos(CHANNEL_ID, 10).await);
    let ids: Vec<&str> = videos.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, [VIDEO_ID, SECOND_VIDEO_ID]);
    assert_eq!(videos[0].duration, "PT12M30S");
    assert_eq!(videos[0].like_count, 6_000);
}

#[tokio::test]
async fn test_comments_follow_page_tokens() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/commentThreads"))
        .and(query_param("pageToken", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [comment_item("c3", "third", 0, "2024-03-02T00:00:00Z")]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/commentThreads"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                comment_item("c1", "first", 1, "2024-03-01T00:00:00Z"),
                comment_item("c2", "second", 2, "2024-03-01T01:00:00Z")
            ],
            "nextPageToken": "page-2"
        })))
        .mount(&server)
        .await;

    let comments = assert_ok!(client(&server).get_video_comments(VIDEO_ID, 10).await);
    let texts: Vec<&str> = comments.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, ["first", "second", "third"]);
    assert_eq!(comments[0].reply_count, 1);
}

#[tokio::test]
async fn test_comments_disabled_yields_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/commentThreads"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"message": "comments disabled", "errors": [{"reason": "commentsDisabled"}]}
        })))
        .mount(&server)
        .await;

    let comments = assert_ok!(client(&server).get_video_comments(VIDEO_ID, 10).await);
    assert!(comments.is_empty());
}

#[tokio::test]
async fn test_quota_exceeded_maps_to_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"message": "quota", "errors": [{"reason": "quotaExceeded"}]}
        })))
        .mount(&server)
        .await;

    let err = assert_err!(client(&server).get_video_info(VIDEO_ID).await);
    assert!(matches!(err, YouTubeError::QuotaExceeded));
}

#[tokio::test]
async fn test_server_error_carries_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = assert_err!(client(&server).get_trending_videos("US", None, 10).await);
    assert!(matches!(err, YouTubeError::Api { status: 500, .. }));
}

#[tokio::test]
async fn test_missing_key_makes_no_request() {
    let server = MockServer::start().await;
    let client = YouTubeClient::with_base_url("", &server.uri(), Duration::from_secs(5)).unwrap();

    assert!(!client.is_configured());
    let err = assert_err!(client.get_video_info(VIDEO_ID).await);
    assert!(matches!(err, YouTubeError::MissingApiKey));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_trending_passes_category_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/videos"))
        .and(query_param("chart", "mostPopular"))
        .and(query_param("regionCode", "GB"))
        .and(query_param("videoCategoryId", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [common::video_item(VIDEO_ID, "Song", "2024-03-01T00:00:00Z", 10, 0)]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let videos = assert_ok!(client(&server).get_trending_videos("GB", Some("10"), 25).await);
    assert_eq!(videos.len(), 1);
}

#[tokio::test]
async fn test_search_channels() {
    let server = common::mock_youtube().await;

    let results = assert_ok!(client(&server).search_channels("rust", 5).await);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].channel_id, CHANNEL_ID);
    assert_eq!(results[0].title, "Rust Dev");
}
