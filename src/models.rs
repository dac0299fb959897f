//! Core data models for tubelens
//!
//! Records produced by the YouTube client and consumed by the analytics and
//! NLP layers.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Channel metadata and statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelData {
    pub id: String,
    pub title: String,
    pub description: String,
    pub custom_url: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub country: Option<String>,
    pub view_count: u64,
    pub subscriber_count: u64,
    pub video_count: u64,
    pub thumbnail_url: String,
}

impl ChannelData {
    /// Days since the channel was created, 0 when unknown
    #[must_use]
    pub fn age_days(&self, now: DateTime<Utc>) -> i64 {
        self.published_at
            .map(|p| (now - p).num_days().max(0))
            .unwrap_or(0)
    }
}

/// Video metadata and statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoData {
    pub id: String,
    pub title: String,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
    pub channel_id: String,
    pub channel_title: String,
    /// ISO-8601 duration as returned by the API, e.g. `PT4M13S`
    pub duration: String,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub tags: Vec<String>,
    pub thumbnail_url: String,
    pub category_id: String,
}

/// A top-level comment on a video
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentData {
    pub id: String,
    pub text: String,
    pub author: String,
    pub published_at: Option<DateTime<Utc>>,
    pub like_count: u64,
    pub reply_count: u64,
}

/// Result of a channel search by name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelSearchResult {
    pub channel_id: String,
    pub title: String,
    pub description: String,
    pub thumbnail_url: String,
}

// ============================================================================
// Analytics records
// ============================================================================

/// One month of a channel's upload history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthData {
    /// First day of the month
    pub date: NaiveDate,
    pub cumulative_views: u64,
    /// Videos published up to and including this month
    pub video_count: u64,
    pub monthly_views: u64,
}

/// A keyword with its frequency across a channel's content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordData {
    pub keyword: String,
    pub count: u64,
    #[serde(rename = "type")]
    pub kind: String,
    pub relevance_score: f64,
    pub percentage: f64,
}

/// Upload count for one weekday/hour slot (Monday = 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapCell {
    pub day: u32,
    pub hour: u32,
    pub count: u32,
}

/// Aggregate upload cadence numbers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadStats {
    pub most_active_day: Option<u32>,
    pub most_active_day_name: Option<String>,
    pub most_active_hour: Option<u32>,
    pub avg_uploads_per_week: f64,
    pub total_uploads: usize,
}

/// Upload cadence of a channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadFrequencyData {
    pub average_days_between_uploads: Option<f64>,
    pub last_upload_date: Option<NaiveDate>,
    pub next_expected_upload_date: Option<NaiveDate>,
    pub heatmap_data: Vec<HeatmapCell>,
    pub stats: UploadStats,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_channel_age_days() {
        let channel = ChannelData {
            published_at: Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        let now = Utc.with_ymd_and_hms(2020, 1, 11, 12, 0, 0).unwrap();
        assert_eq!(channel.age_days(now), 10);
    }

    #[test]
    fn test_channel_age_unknown() {
        let channel = ChannelData::default();
        assert_eq!(channel.age_days(Utc::now()), 0);
    }

    #[test]
    fn test_video_serializes_timestamp_as_rfc3339() {
        let video = VideoData {
            id: "dQw4w9WgXcQ".into(),
            published_at: Some(Utc.with_ymd_and_hms(2021, 5, 4, 3, 2, 1).unwrap()),
            ..Default::default()
        };
        let json = serde_json::to_value(&video).unwrap();
        assert_eq!(json["published_at"], "2021-05-04T03:02:01Z");
    }
}
