//! Trending chart analysis: view velocity, category mix and distribution stats

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::engagement::view_velocity;
use super::stats::{percentiles, PercentileStats};
use super::video::VideoSummary;
use crate::models::VideoData;
use crate::utils::truncate_text;
use crate::validation::category_name;

/// Velocity entries kept in a trending analysis
pub const VELOCITY_TOP_N: usize = 20;

/// A trending video with its category resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingVideo {
    #[serde(flatten)]
    pub summary: VideoSummary,
    pub category_name: Option<String>,
}

impl From<&VideoData> for TrendingVideo {
    fn from(video: &VideoData) -> Self {
        Self {
            summary: VideoSummary::from(video),
            category_name: category_name(&video.category_id).map(String::from),
        }
    }
}

/// How fast a trending video is accumulating views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityEntry {
    pub video_id: String,
    pub title: String,
    pub views_per_hour: f64,
    pub views_per_day: f64,
    pub hours_since_publish: f64,
    pub total_views: u64,
}

/// Distribution summary over a trending list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingStats {
    pub total_videos: usize,
    pub view_stats: PercentileStats,
    pub like_stats: PercentileStats,
    pub comment_stats: PercentileStats,
    pub engagement_stats: PercentileStats,
    pub duration_stats: PercentileStats,
}

/// Velocity for every dated video, fastest first, capped at `top_n`
pub fn velocity_entries(videos: &[VideoData], now: DateTime<Utc>, top_n: usize) -> Vec<VelocityEntry> {
    let mut entries: Vec<VelocityEntry> = videos
        .iter()
        .filter(|v| v.published_at.is_some())
        .map(|v| {
            let velocity = view_velocity(v.view_count, v.published_at, now);
            VelocityEntry {
                video_id: v.id.clone(),
                title: truncate_text(&v.title, 50),
                views_per_hour: velocity.views_per_hour,
                views_per_day: velocity.views_per_day,
                hours_since_publish: velocity.hours_since_publish,
                total_views: v.view_count,
            }
        })
        .collect();

    entries.sort_by(|a, b| b.views_per_hour.total_cmp(&a.views_per_hour));
    entries.truncate(top_n);
    entries
}

/// Video count per category name; unknown ids become `Category <id>`
pub fn category_distribution(videos: &[VideoData]) -> BTreeMap<String, usize> {
    let mut out = BTreeMap::new();
    for video in videos {
        let name = category_name(&video.category_id)
            .map(String::from)
            .unwrap_or_else(|| format!("Category {}", video.category_id));
        *out.entry(name).or_insert(0) += 1;
    }
    out
}

/// Percentile summaries over views, likes, comments, engagement and length
pub fn trending_stats(videos: &[TrendingVideo]) -> TrendingStats {
    let series = |f: fn(&VideoSummary) -> f64| -> Vec<f64> {
        videos.iter().map(|v| f(&v.summary)).collect()
    };

    TrendingStats {
        total_videos: videos.len(),
        view_stats: percentiles(&series(|s| s.view_count as f64)),
        like_stats: percentiles(&series(|s| s.like_count as f64)),
        comment_stats: percentiles(&series(|s| s.comment_count as f64)),
        engagement_stats: percentiles(&series(|s| s.engagement_rate)),
        duration_stats: percentiles(&series(|s| s.duration_seconds as f64)),
    }
}
