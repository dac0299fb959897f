//! Common test utilities
//!
//! A wiremock server standing in for the YouTube Data API, plus helpers to
//! drive the router in-process.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use tubelens::api::ApiServer;
use tubelens::config::Config;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const CHANNEL_ID: &str = "UC_x5XG1OV2P6uZZ5FSM9Ttw";
pub const UPLOADS_PLAYLIST: &str = "UU_x5XG1OV2P6uZZ5FSM9Ttw";
pub const VIDEO_ID: &str = "dQw4w9WgXcQ";
pub const SECOND_VIDEO_ID: &str = "9bZkp7q19f0";

/// Config pointing at `base_url` with a dummy key
pub fn test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.youtube.api_key = "test-key".to_string();
    config.youtube.base_url = base_url.to_string();
    config.youtube.request_timeout_secs = 5;
    config.server.enable_request_logging = false;
    config
}

/// Router built exactly as the server would build it
pub fn test_router(config: Config) -> Router {
    ApiServer::new(config)
        .expect("valid test config")
        .build_router()
}

/// Send a request and decode the JSON body
pub async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = send_raw(router, method, uri, body).await;
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, json)
}

/// Send a request and return the raw body
pub async fn send_raw(
    router: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Vec<u8>) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

pub async fn get(router: &Router, uri: &str) -> (StatusCode, Value) {
    send(router, Method::GET, uri, None).await
}

// ============================================================================
// YouTube fixtures
// ============================================================================

pub fn channel_item(id: &str, title: &str, subscribers: u64) -> Value {
    json!({
        "id": id,
        "snippet": {
            "title": title,
            "description": "Rust programming tutorials and systems engineering talks",
            "customUrl": "@rustdev",
            "publishedAt": "2015-05-15T00:00:00Z",
            "country": "US",
            "thumbnails": {"high": {"url": "https://img.example/high.jpg"}}
        },
        "statistics": {
            "viewCount": (subscribers * 40).to_string(),
            "subscriberCount": subscribers.to_string(),
            "videoCount": "120"
        },
        "contentDetails": {"relatedPlaylists": {"uploads": UPLOADS_PLAYLIST}}
    })
}

pub fn video_item(id: &str, title: &str, published_at: &str, views: u64, comments: u64) -> Value {
    json!({
        "id": id,
        "snippet": {
            "title": title,
            "description": "Learn async rust with tokio and axum in this tutorial",
            "publishedAt": published_at,
            "channelId": CHANNEL_ID,
            "channelTitle": "Rust Dev",
            "tags": ["rust", "async", "tokio"],
            "categoryId": "28",
            "thumbnails": {"medium": {"url": "https://img.example/medium.jpg"}}
        },
        "statistics": {
            "viewCount": views.to_string(),
            "likeCount": (views / 20).to_string(),
            "commentCount": comments.to_string()
        },
        "contentDetails": {"duration": "PT12M30S"}
    })
}

pub fn comment_item(id: &str, text: &str, likes: u64, published_at: &str) -> Value {
    json!({
        "id": id,
        "snippet": {
            "topLevelComment": {
                "id": id,
                "snippet": {
                    "textDisplay": text,
                    "authorDisplayName": format!("viewer-{id}"),
                    "publishedAt": published_at,
                    "likeCount": likes
                }
            },
            "totalReplyCount": 1
        }
    })
}

pub fn sample_comments() -> Value {
    json!({
        "items": [
            comment_item("c1", "This is an amazing tutorial, I love it!", 12, "2024-03-01T10:00:00Z"),
            comment_item("c2", "Great explanation of async rust, thanks", 5, "2024-03-01T11:00:00Z"),
            comment_item("c3", "Terrible audio, I hate the music", 0, "2024-03-02T09:00:00Z"),
            comment_item("c4", "The tokio runtime section was helpful", 3, "2024-03-03T08:00:00Z")
        ]
    })
}

async fn mount_json(server: &MockServer, resource: &str, params: &[(&str, &str)], body: Value) {
    let mut mock = Mock::given(method("GET")).and(path(format!("/{resource}")));
    for (key, value) in params {
        mock = mock.and(query_param(*key, *value));
    }
    mock.respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount channel, uploads, video, comment, trending and search responses
pub async fn mock_youtube() -> MockServer {
    let server = MockServer::start().await;

    mount_json(
        &server,
        "channels",
        &[("id", CHANNEL_ID)],
        json!({"items": [channel_item(CHANNEL_ID, "Rust Dev", 250_000)]}),
    )
    .await;

    mount_json(
        &server,
        "playlistItems",
        &[("playlistId", UPLOADS_PLAYLIST)],
        json!({
            "items": [
                {"snippet": {"resourceId": {"videoId": VIDEO_ID}}},
                {"snippet": {"resourceId": {"videoId": SECOND_VIDEO_ID}}}
            ]
        }),
    )
    .await;

    mount_json(
        &server,
        "videos",
        &[("id", &format!("{VIDEO_ID},{SECOND_VIDEO_ID}"))],
        json!({
            "items": [
                video_item(VIDEO_ID, "Async Rust with Tokio", "2024-02-28T15:00:00Z", 120_000, 4),
                video_item(SECOND_VIDEO_ID, "Building APIs with Axum", "2024-02-14T15:00:00Z", 80_000, 0)
            ]
        }),
    )
    .await;

    mount_json(
        &server,
        "videos",
        &[("id", VIDEO_ID)],
        json!({"items": [video_item(VIDEO_ID, "Async Rust with Tokio", "2024-02-28T15:00:00Z", 120_000, 4)]}),
    )
    .await;

    mount_json(
        &server,
        "videos",
        &[("id", SECOND_VIDEO_ID)],
        json!({"items": [video_item(SECOND_VIDEO_ID, "Building APIs with Axum", "2024-02-14T15:00:00Z", 80_000, 0)]}),
    )
    .await;

    mount_json(&server, "commentThreads", &[("videoId", VIDEO_ID)], sample_comments()).await;

    mount_json(
        &server,
        "videos",
        &[("chart", "mostPopular"), ("regionCode", "US")],
        json!({
            "items": [
                video_item(VIDEO_ID, "Async Rust with Tokio", "2024-02-28T15:00:00Z", 120_000, 4),
                video_item(SECOND_VIDEO_ID, "Building APIs with Axum", "2024-02-14T15:00:00Z", 80_000, 0)
            ]
        }),
    )
    .await;

    mount_json(
        &server,
        "search",
        &[("type", "channel")],
        json!({
            "items": [{
                "id": {"kind": "youtube#channel", "channelId": CHANNEL_ID},
                "snippet": {"title": "Rust Dev", "description": "tutorials", "thumbnails": {}}
            }]
        }),
    )
    .await;

    server
}
