//! Per-video engagement metrics and performance insights

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::duration::{categorize_video_length, parse_duration};
use super::engagement::{engagement_rate, format_large_number};
use crate::models::VideoData;
use crate::utils::round_to;

/// Engagement ratios for a single video
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub engagement_rate: f64,
    pub like_rate: f64,
    pub comment_rate: f64,
    pub like_to_view_ratio: f64,
    pub comment_to_view_ratio: f64,
}

/// Score, level and advice derived from a video's engagement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceInsights {
    pub performance_score: f64,
    pub category: String,
    pub recommendations: Vec<String>,
    pub duration_category: String,
    pub engagement_level: String,
}

/// Flattened video record used in channel, trending and comparison lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub id: String,
    pub title: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub view_count_formatted: String,
    pub like_count_formatted: String,
    pub comment_count_formatted: String,
    pub duration: String,
    pub duration_formatted: String,
    pub duration_seconds: u64,
    pub duration_category: String,
    pub tags: Vec<String>,
    pub category_id: String,
    pub thumbnail_url: String,
    pub engagement_rate: f64,
}

impl From<&VideoData> for VideoSummary {
    fn from(video: &VideoData) -> Self {
        let duration = parse_duration(&video.duration);
        Self {
            id: video.id.clone(),
            title: video.title.clone(),
            channel_id: video.channel_id.clone(),
            channel_title: video.channel_title.clone(),
            published_at: video.published_at,
            view_count: video.view_count,
            like_count: video.like_count,
            comment_count: video.comment_count,
            view_count_formatted: format_large_number(video.view_count as f64),
            like_count_formatted: format_large_number(video.like_count as f64),
            comment_count_formatted: format_large_number(video.comment_count as f64),
            duration: video.duration.clone(),
            duration_formatted: duration.formatted,
            duration_seconds: duration.seconds,
            duration_category: categorize_video_length(duration.seconds).to_string(),
            tags: video.tags.clone(),
            category_id: video.category_id.clone(),
            thumbnail_url: video.thumbnail_url.clone(),
            engagement_rate: engagement_rate(video.view_count, video.like_count, video.comment_count)
                .total_engagement_rate,
        }
    }
}

/// Engagement ratios; all zero when the video has no views
pub fn engagement_metrics(video: &VideoData) -> EngagementMetrics {
    if video.view_count == 0 {
        return EngagementMetrics::default();
    }
    let rates = engagement_rate(video.view_count, video.like_count, video.comment_count);
    let views = video.view_count as f64;
    EngagementMetrics {
        engagement_rate: rates.total_engagement_rate,
        like_rate: rates.like_rate,
        comment_rate: rates.comment_rate,
        like_to_view_ratio: round_to(video.like_count as f64 / views, 6),
        comment_to_view_ratio: round_to(video.comment_count as f64 / views, 6),
    }
}

fn engagement_level(views: u64, rate: f64) -> &'static str {
    if views == 0 {
        return "No Data";
    }
    match rate {
        r if r >= 5.0 => "Very High",
        r if r >= 2.0 => "High",
        r if r >= 1.0 => "Moderate",
        r if r >= 0.5 => "Low",
        _ => "Very Low",
    }
}

fn recommendations(rate: f64, minutes: f64, video: &VideoData) -> Vec<String> {
    let views = video.view_count as f64;
    let mut out = Vec::new();

    if rate < 1.0 {
        out.push("Consider improving thumbnail and title to increase click-through rate");
    }
    if rate < 2.0 {
        out.push("Add more call-to-actions to encourage likes and comments");
    }
    if (video.comment_count as f64) < views * 0.01 {
        out.push("Ask engaging questions to encourage viewer comments");
    }
    if minutes > 20.0 && rate < 3.0 {
        out.push("Consider shorter content format for better retention");
    }
    if minutes < 2.0 && video.view_count > 1000 {
        out.push("Longer content might provide more value and retention");
    }
    if (video.like_count as f64) < views * 0.02 {
        out.push("Remind viewers to like the video if they found it helpful");
    }
    if out.is_empty() {
        out.push("Great performance! Keep up the good work");
    }

    out.into_iter().map(String::from).collect()
}

/// Score the video from its engagement rate and suggest improvements
pub fn performance_insights(video: &VideoData) -> PerformanceInsights {
    let duration = parse_duration(&video.duration);
    let rate =
        (video.like_count + video.comment_count) as f64 / video.view_count.max(1) as f64 * 100.0;

    let (score, category) = if rate >= 5.0 {
        (90.0 + (rate - 5.0).min(10.0), "Excellent")
    } else if rate >= 2.0 {
        (70.0 + (rate - 2.0) * 6.67, "Good")
    } else if rate >= 1.0 {
        (50.0 + (rate - 1.0) * 20.0, "Average")
    } else {
        (rate * 50.0, "Poor")
    };

    PerformanceInsights {
        performance_score: round_to(score, 1),
        category: category.to_string(),
        recommendations: recommendations(rate, duration.minutes_f64(), video),
        duration_category: categorize_video_length(duration.seconds).to_string(),
        engagement_level: engagement_level(video.view_count, rate).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(views: u64, likes: u64, comments: u64, duration: &str) -> VideoData {
        VideoData {
            view_count: views,
            like_count: likes,
            comment_count: comments,
            duration: duration.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_engagement_metrics() {
        let m = engagement_metrics(&video(10_000, 400, 100, "PT5M"));
        assert_eq!(m.engagement_rate, 5.0);
        assert_eq!(m.like_rate, 4.0);
        assert_eq!(m.comment_rate, 1.0);
        assert_eq!(m.like_to_view_ratio, 0.04);
        assert_eq!(m.comment_to_view_ratio, 0.01);
    }

    #[test]
    fn test_engagement_metrics_zero_views() {
        assert_eq!(engagement_metrics(&video(0, 3, 3, "")), EngagementMetrics::default());
    }

    #[test]
    fn test_performance_excellent() {
        let p = performance_insights(&video(1_000, 60, 10, "PT10M"));
        assert_eq!(p.category, "Excellent");
        assert_eq!(p.performance_score, 92.0);
        assert_eq!(p.engagement_level, "Very High");
        assert_eq!(p.duration_category, "Medium (5-15 min)");
        assert_eq!(p.recommendations, vec!["Great performance! Keep up the good work"]);
    }

    #[test]
    fn test_performance_poor_recommendations() {
        let p = performance_insights(&video(100_000, 100, 10, "PT45M"));
        assert_eq!(p.category, "Poor");
        assert_eq!(p.engagement_level, "Very Low");
        assert_eq!(p.duration_category, "Extended (30+ min)");
        assert_eq!(p.recommendations.len(), 5);
        assert!(p.recommendations[0].starts_with("Consider improving thumbnail"));
    }

    #[test]
    fn test_performance_no_views() {
        let p = performance_insights(&video(0, 0, 0, "PT30S"));
        assert_eq!(p.engagement_level, "No Data");
        assert_eq!(p.performance_score, 0.0);
    }

    #[test]
    fn test_video_summary_formats_counts() {
        let summary = VideoSummary::from(&video(1_500_000, 2_000, 10, "PT1H"));
        assert_eq!(summary.view_count_formatted, "1.5M");
        assert_eq!(summary.duration_formatted, "1:00:00");
        assert_eq!(summary.duration_category, "Extended (30+ min)");
    }
}
