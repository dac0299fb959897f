//! Wire types for the YouTube Data API v3
//!
//! Only the fields tubelens reads are modelled. Statistics counts arrive as
//! JSON strings; [`de_count`] accepts strings or numbers and falls back to 0.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use crate::models::{ChannelData, ChannelSearchResult, CommentData, VideoData};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub error: ApiErrorDetail,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub errors: Vec<ApiErrorReason>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorReason {
    #[serde(default)]
    pub reason: String,
}

impl ApiErrorBody {
    pub fn has_reason(&self, reason: &str) -> bool {
        self.error.errors.iter().any(|e| e.reason == reason)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Thumbnail {
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct Thumbnails {
    pub high: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub default: Option<Thumbnail>,
}

impl Thumbnails {
    fn best(&self) -> String {
        self.high
            .as_ref()
            .or(self.medium.as_ref())
            .or(self.default.as_ref())
            .map(|t| t.url.clone())
            .unwrap_or_default()
    }
}

fn de_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Text(String),
        Number(u64),
        Other(serde_json::Value),
    }

    Ok(match Count::deserialize(deserializer)? {
        Count::Text(s) => s.trim().parse().unwrap_or(0),
        Count::Number(n) => n,
        Count::Other(_) => 0,
    })
}

fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    raw.and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

// ============================================================================
// Channels
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelItem {
    pub id: String,
    #[serde(default)]
    pub snippet: ChannelSnippet,
    #[serde(default)]
    pub statistics: ChannelStatistics,
    #[serde(default)]
    pub content_details: Option<ChannelContentDetails>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub custom_url: Option<String>,
    pub published_at: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatistics {
    #[serde(default, deserialize_with = "de_count")]
    pub view_count: u64,
    #[serde(default, deserialize_with = "de_count")]
    pub subscriber_count: u64,
    #[serde(default, deserialize_with = "de_count")]
    pub video_count: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelContentDetails {
    #[serde(default)]
    pub related_playlists: RelatedPlaylists,
}

#[derive(Debug, Default, Deserialize)]
pub struct RelatedPlaylists {
    pub uploads: Option<String>,
}

impl From<ChannelItem> for ChannelData {
    fn from(item: ChannelItem) -> Self {
        let published_at = parse_timestamp(item.snippet.published_at.as_deref());
        let thumbnail_url = item.snippet.thumbnails.best();
        Self {
            id: item.id,
            title: item.snippet.title,
            description: item.snippet.description,
            custom_url: item.snippet.custom_url,
            published_at,
            country: item.snippet.country,
            view_count: item.statistics.view_count,
            subscriber_count: item.statistics.subscriber_count,
            video_count: item.statistics.video_count,
            thumbnail_url,
        }
    }
}

// ============================================================================
// Playlist items
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PlaylistItem {
    #[serde(default)]
    pub snippet: PlaylistItemSnippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemSnippet {
    #[serde(default)]
    pub resource_id: ResourceId,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    pub video_id: Option<String>,
}

// ============================================================================
// Videos
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub id: String,
    #[serde(default)]
    pub snippet: VideoSnippet,
    #[serde(default)]
    pub statistics: VideoStatistics,
    #[serde(default)]
    pub content_details: VideoContentDetails,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub published_at: Option<String>,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub thumbnails: Thumbnails,
    #[serde(default)]
    pub category_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    #[serde(default, deserialize_with = "de_count")]
    pub view_count: u64,
    #[serde(default, deserialize_with = "de_count")]
    pub like_count: u64,
    #[serde(default, deserialize_with = "de_count")]
    pub comment_count: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct VideoContentDetails {
    #[serde(default)]
    pub duration: String,
}

impl From<VideoItem> for VideoData {
    fn from(item: VideoItem) -> Self {
        let published_at = parse_timestamp(item.snippet.published_at.as_deref());
        let thumbnail_url = item.snippet.thumbnails.best();
        Self {
            id: item.id,
            title: item.snippet.title,
            description: item.snippet.description,
            published_at,
            channel_id: item.snippet.channel_id,
            channel_title: item.snippet.channel_title,
            duration: item.content_details.duration,
            view_count: item.statistics.view_count,
            like_count: item.statistics.like_count,
            comment_count: item.statistics.comment_count,
            tags: item.snippet.tags,
            thumbnail_url,
            category_id: item.snippet.category_id,
        }
    }
}

// ============================================================================
// Comment threads
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CommentThreadItem {
    pub id: String,
    #[serde(default)]
    pub snippet: CommentThreadSnippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadSnippet {
    #[serde(default)]
    pub top_level_comment: TopLevelComment,
    #[serde(default, deserialize_with = "de_count")]
    pub total_reply_count: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct TopLevelComment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub snippet: CommentSnippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSnippet {
    #[serde(default)]
    pub text_display: String,
    #[serde(default)]
    pub author_display_name: String,
    pub published_at: Option<String>,
    #[serde(default, deserialize_with = "de_count")]
    pub like_count: u64,
}

impl From<CommentThreadItem> for CommentData {
    fn from(item: CommentThreadItem) -> Self {
        let comment = item.snippet.top_level_comment;
        let id = if comment.id.is_empty() {
            item.id
        } else {
            comment.id
        };
        Self {
            id,
            published_at: parse_timestamp(comment.snippet.published_at.as_deref()),
            text: comment.snippet.text_display,
            author: comment.snippet.author_display_name,
            like_count: comment.snippet.like_count,
            reply_count: item.snippet.total_reply_count,
        }
    }
}

// ============================================================================
// Search
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub id: SearchId,
    #[serde(default)]
    pub snippet: SearchSnippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchId {
    pub channel_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnails: Thumbnails,
}

impl SearchItem {
    pub fn into_result(self) -> Option<ChannelSearchResult> {
        let channel_id = self.id.channel_id?;
        Some(ChannelSearchResult {
            channel_id,
            thumbnail_url: self.snippet.thumbnails.best(),
            title: self.snippet.title,
            description: self.snippet.description,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_channel_counts_parse_from_strings() {
        let item: ChannelItem = serde_json::from_value(json!({
            "id": "UC_x5XG1OV2P6uZZ5FSM9Ttw",
            "snippet": {
                "title": "Google for Developers",
                "description": "dev",
                "publishedAt": "2007-08-23T00:34:43Z",
                "thumbnails": {"default": {"url": "https://img/default.jpg"}}
            },
            "statistics": {"viewCount": "1234", "subscriberCount": "56", "videoCount": "oops"}
        }))
        .unwrap();

        let channel = ChannelData::from(item);
        assert_eq!(channel.view_count, 1234);
        assert_eq!(channel.subscriber_count, 56);
        assert_eq!(channel.video_count, 0);
        assert_eq!(channel.thumbnail_url, "https://img/default.jpg");
        assert!(channel.published_at.is_some());
    }

    #[test]
    fn test_video_missing_statistics_default_to_zero() {
        let item: VideoItem = serde_json::from_value(json!({
            "id": "dQw4w9WgXcQ",
            "snippet": {"title": "t", "publishedAt": "2009-10-25T06:57:33Z"},
            "contentDetails": {"duration": "PT3M33S"}
        }))
        .unwrap();

        let video = VideoData::from(item);
        assert_eq!(video.like_count, 0);
        assert_eq!(video.duration, "PT3M33S");
        assert!(video.tags.is_empty());
    }

    #[test]
    fn test_comment_thread_conversion() {
        let item: CommentThreadItem = serde_json::from_value(json!({
            "id": "thread1",
            "snippet": {
                "topLevelComment": {
                    "id": "c1",
                    "snippet": {
                        "textDisplay": "Great video",
                        "authorDisplayName": "viewer",
                        "publishedAt": "2024-01-02T03:04:05Z",
                        "likeCount": 7
                    }
                },
                "totalReplyCount": 2
            }
        }))
        .unwrap();

        let comment = CommentData::from(item);
        assert_eq!(comment.id, "c1");
        assert_eq!(comment.like_count, 7);
        assert_eq!(comment.reply_count, 2);
    }

    #[test]
    fn test_error_body_reason() {
        let body: ApiErrorBody = serde_json::from_value(json!({
            "error": {"code": 403, "message": "quota", "errors": [{"reason": "quotaExceeded"}]}
        }))
        .unwrap();
        assert!(body.has_reason("quotaExceeded"));
        assert!(!body.has_reason("commentsDisabled"));
    }
}
