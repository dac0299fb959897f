//! YouTube Data API v3 client
//!
//! A thin client over the handful of resources tubelens reads:
//! - `channels` for channel metadata and the uploads playlist
//! - `playlistItems` + `videos` for a channel's recent uploads
//! - `commentThreads` for top-level comments
//! - `videos?chart=mostPopular` for trending videos
//! - `search?type=channel` for channel lookup by name
//!
//! Every call is a single GET. Failures surface as [`YouTubeError`].

pub mod types;

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

use crate::config::{YouTubeConfig, DEFAULT_YOUTUBE_BASE_URL};
use crate::metrics;
use crate::models::{ChannelData, ChannelSearchResult, CommentData, VideoData};
use crate::utils::error::YouTubeError;

use types::{
    ApiErrorBody, ChannelItem, CommentThreadItem, ListResponse, PlaylistItem, SearchItem,
    VideoItem,
};

/// Maximum page size accepted by list endpoints
const MAX_PAGE_SIZE: usize = 50;

/// Maximum page size accepted by `commentThreads`
const MAX_COMMENT_PAGE_SIZE: usize = 100;

/// YouTube Data API client
#[derive(Clone)]
pub struct YouTubeClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl std::fmt::Debug for YouTubeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YouTubeClient")
            .field("base_url", &self.base_url)
            .field("configured", &self.is_configured())
            .finish()
    }
}

impl YouTubeClient {
    /// Create a client against the public API endpoint
    ///
    /// # Errors
    ///
    /// Returns `YouTubeError::Http` if the HTTP client cannot be created
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, YouTubeError> {
        Self::with_base_url(api_key, DEFAULT_YOUTUBE_BASE_URL, timeout)
    }

    /// Create a client with a custom base URL, used for mock servers in tests
    ///
    /// # Errors
    ///
    /// Returns `YouTubeError::Http` if the HTTP client cannot be created
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, YouTubeError> {
        let client = Client::builder().timeout(timeout).gzip(true).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns `YouTubeError::Http` if the HTTP client cannot be created
    pub fn from_config(config: &YouTubeConfig) -> Result<Self, YouTubeError> {
        Self::with_base_url(
            config.api_key.clone(),
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Whether an API key is present
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Fetch channel metadata and statistics
    ///
    /// Accepts a `UC…` channel ID, an `@handle`, or a legacy username.
    /// Returns `Ok(None)` when the API knows no such channel.
    pub async fn get_channel_info(
        &self,
        channel_id: &str,
    ) -> Result<Option<ChannelData>, YouTubeError> {
        let (selector, value) = channel_selector(channel_id);
        let response: ListResponse<ChannelItem> = self
            .get_json(
                "channels",
                &[("part", "snippet,statistics".to_string()), (selector, value)],
            )
            .await?;

        Ok(response.items.into_iter().next().map(ChannelData::from))
    }

    /// Fetch up to `max_results` of a channel's most recent uploads
    pub async fn get_channel_videos(
        &self,
        channel_id: &str,
        max_results: usize,
    ) -> Result<Vec<VideoData>, YouTubeError> {
        let Some(uploads) = self.uploads_playlist(channel_id).await? else {
            tracing::debug!(channel_id, "No uploads playlist for channel");
            return Ok(Vec::new());
        };

        let mut videos = Vec::new();
        let mut page_token: Option<String> = None;

        while videos.len() < max_results {
            let remaining = max_results - videos.len();
            let mut params = vec![
                ("part", "snippet".to_string()),
                ("playlistId", uploads.clone()),
                ("maxResults", remaining.min(MAX_PAGE_SIZE).to_string()),
            ];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }

            let page: ListResponse<PlaylistItem> = self.get_json("playlistItems", &params).await?;

            let ids: Vec<String> = page
                .items
                .into_iter()
                .filter_map(|item| item.snippet.resource_id.video_id)
                .collect();

            if !ids.is_empty() {
                videos.extend(self.get_videos_by_ids(&ids).await?);
            }

            match page.next_page_token {
                Some(token) if !ids.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        videos.truncate(max_results);
        tracing::debug!(channel_id, count = videos.len(), "Fetched channel videos");
        Ok(videos)
    }

    /// Fetch a single video's metadata and statistics
    pub async fn get_video_info(&self, video_id: &str) -> Result<Option<VideoData>, YouTubeError> {
        let mut videos = self.get_videos_by_ids(&[video_id.to_string()]).await?;
        Ok(if videos.is_empty() {
            None
        } else {
            Some(videos.remove(0))
        })
    }

    /// Fetch up to `max_results` top-level comments ordered by relevance
    ///
    /// Videos with comments disabled yield an empty list.
    pub async fn get_video_comments(
        &self,
        video_id: &str,
        max_results: usize,
    ) -> Result<Vec<CommentData>, YouTubeError> {
        let mut comments = Vec::new();
        let mut page_token: Option<String> = None;

        while comments.len() < max_results {
            let remaining = max_results - comments.len();
            let mut params = vec![
                ("part", "snippet".to_string()),
                ("videoId", video_id.to_string()),
                ("maxResults", remaining.min(MAX_COMMENT_PAGE_SIZE).to_string()),
                ("order", "relevance".to_string()),
            ];
            if let Some(token) = &page_token {
                params.push(("pageToken", token.clone()));
            }

            let page: ListResponse<CommentThreadItem> =
                match self.get_json("commentThreads", &params).await {
                    Ok(page) => page,
                    Err(YouTubeError::Api { status: 403, message }) => {
                        tracing::info!(video_id, %message, "Comments unavailable for video");
                        break;
                    }
                    Err(e) => return Err(e),
                };

            let fetched = page.items.len();
            comments.extend(page.items.into_iter().map(CommentData::from));

            match page.next_page_token {
                Some(token) if fetched > 0 => page_token = Some(token),
                _ => break,
            }
        }

        comments.truncate(max_results);
        Ok(comments)
    }

    /// Fetch the most popular videos for a region, optionally within a category
    pub async fn get_trending_videos(
        &self,
        region_code: &str,
        category_id: Option<&str>,
        max_results: usize,
    ) -> Result<Vec<VideoData>, YouTubeError> {
        let mut params = vec![
            ("part", "snippet,statistics,contentDetails".to_string()),
            ("chart", "mostPopular".to_string()),
            ("regionCode", region_code.to_string()),
            ("maxResults", max_results.clamp(1, MAX_PAGE_SIZE).to_string()),
        ];
        if let Some(category) = category_id {
            params.push(("videoCategoryId", category.to_string()));
        }

        let response: ListResponse<VideoItem> = self.get_json("videos", &params).await?;
        Ok(response.items.into_iter().map(VideoData::from).collect())
    }

    /// Look up channels by display name
    pub async fn search_channels(
        &self,
        name: &str,
        max_results: usize,
    ) -> Result<Vec<ChannelSearchResult>, YouTubeError> {
        let response: ListResponse<SearchItem> = self
            .get_json(
                "search",
                &[
                    ("part", "snippet".to_string()),
                    ("type", "channel".to_string()),
                    ("q", name.to_string()),
                    ("maxResults", max_results.clamp(1, MAX_PAGE_SIZE).to_string()),
                ],
            )
            .await?;

        Ok(response
            .items
            .into_iter()
            .filter_map(SearchItem::into_result)
            .collect())
    }

    async fn uploads_playlist(&self, channel_id: &str) -> Result<Option<String>, YouTubeError> {
        let (selector, value) = channel_selector(channel_id);
        let response: ListResponse<ChannelItem> = self
            .get_json(
                "channels",
                &[("part", "contentDetails".to_string()), (selector, value)],
            )
            .await?;

        Ok(response
            .items
            .into_iter()
            .next()
            .and_then(|c| c.content_details)
            .and_then(|d| d.related_playlists.uploads))
    }

    async fn get_videos_by_ids(&self, ids: &[String]) -> Result<Vec<VideoData>, YouTubeError> {
        let response: ListResponse<VideoItem> = self
            .get_json(
                "videos",
                &[
                    ("part", "snippet,statistics,contentDetails".to_string()),
                    ("id", ids.join(",")),
                ],
            )
            .await?;

        Ok(response.items.into_iter().map(VideoData::from).collect())
    }

    fn build_url(&self, resource: &str, params: &[(&str, String)]) -> Result<Url, YouTubeError> {
        let raw = format!("{}/{resource}", self.base_url);
        let mut url = Url::parse(&raw).map_err(|e| YouTubeError::InvalidUrl(format!("{raw}: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, value);
            }
            query.append_pair("key", &self.api_key);
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        params: &[(&str, String)],
    ) -> Result<T, YouTubeError> {
        if !self.is_configured() {
            return Err(YouTubeError::MissingApiKey);
        }

        let url = self.build_url(resource, params)?;
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_youtube_call(resource, "error");
                return Err(YouTubeError::Http(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            metrics::record_youtube_call(resource, "success");
            let bytes = response.bytes().await?;
            return serde_json::from_slice(&bytes)
                .map_err(|e| YouTubeError::Decode(format!("{resource}: {e}")));
        }

        metrics::record_youtube_call(resource, "error");
        let body: ApiErrorBody = response.json().await.unwrap_or_default();
        tracing::warn!(
            resource,
            status = status.as_u16(),
            message = %body.error.message,
            "YouTube API request failed"
        );

        if status.as_u16() == 403 && body.has_reason("quotaExceeded") {
            return Err(YouTubeError::QuotaExceeded);
        }

        Err(YouTubeError::Api {
            status: status.as_u16(),
            message: if body.error.message.is_empty() {
                status.canonical_reason().unwrap_or("unknown error").to_string()
            } else {
                body.error.message
            },
        })
    }
}

/// Choose the `channels` query parameter for a channel identifier
fn channel_selector(channel_id: &str) -> (&'static str, String) {
    let id = channel_id.trim();
    if id.starts_with('@') {
        ("forHandle", id.to_string())
    } else if id.starts_with("UC") && id.len() == 24 {
        ("id", id.to_string())
    } else {
        ("forUsername", id.to_string())
    }
}
