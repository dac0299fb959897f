//! Side-by-side comparison of channels or videos
//!
//! Metrics are parallel vectors indexed like the input slice. Rankings order
//! each metric descending; equal values keep their input order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::duration::parse_duration;
use super::engagement::{engagement_rate, format_large_number};
use crate::models::{ChannelData, VideoData};

/// Insights kept per comparison
const MAX_INSIGHTS: usize = 5;

/// Position of one item within a metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    pub rank: usize,
    pub id: String,
    pub name: String,
    pub value: f64,
    pub formatted_value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelComparisonMetrics {
    pub subscriber_counts: Vec<u64>,
    pub view_counts: Vec<u64>,
    pub video_counts: Vec<u64>,
    pub avg_views_per_video: Vec<f64>,
    pub channel_age_days: Vec<i64>,
}

impl ChannelComparisonMetrics {
    /// Metric name and values as floats, in presentation order
    pub fn series(&self) -> Vec<(&'static str, Vec<f64>)> {
        let f = |v: &[u64]| v.iter().map(|&x| x as f64).collect::<Vec<f64>>();
        vec![
            ("subscriber_counts", f(&self.subscriber_counts)),
            ("view_counts", f(&self.view_counts)),
            ("video_counts", f(&self.video_counts)),
            ("avg_views_per_video", self.avg_views_per_video.clone()),
            (
                "channel_age_days",
                self.channel_age_days.iter().map(|&d| d as f64).collect(),
            ),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelComparison {
    pub comparison_metrics: ChannelComparisonMetrics,
    pub rankings: BTreeMap<String, Vec<RankEntry>>,
    pub insights: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoComparisonMetrics {
    pub view_counts: Vec<u64>,
    pub like_counts: Vec<u64>,
    pub comment_counts: Vec<u64>,
    pub engagement_rates: Vec<f64>,
    pub duration_seconds: Vec<u64>,
    pub age_hours: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementComparison {
    pub like_rates: Vec<f64>,
    pub comment_rates: Vec<f64>,
    pub views_per_hour: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoComparison {
    pub comparison_metrics: VideoComparisonMetrics,
    pub engagement_comparison: EngagementComparison,
    pub insights: Vec<String>,
}

/// Index of the first maximum
fn argmax(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, bv)) if bv >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Index of the first minimum
fn argmin(values: &[f64]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &v)| match best {
            Some((_, bv)) if bv <= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Rank items by value, highest first
pub fn rank(values: &[f64], ids: &[(&str, &str)]) -> Vec<RankEntry> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    order
        .into_iter()
        .enumerate()
        .map(|(pos, idx)| RankEntry {
            rank: pos + 1,
            id: ids[idx].0.to_string(),
            name: ids[idx].1.to_string(),
            value: values[idx],
            formatted_value: format_large_number(values[idx]),
        })
        .collect()
}

// ============================================================================
// Channels
// ============================================================================

/// Compare channel statistics, rank each metric and summarise the leaders
pub fn compare_channels(channels: &[ChannelData], now: DateTime<Utc>) -> ChannelComparison {
    let metrics = ChannelComparisonMetrics {
        subscriber_counts: channels.iter().map(|c| c.subscriber_count).collect(),
        view_counts: channels.iter().map(|c| c.view_count).collect(),
        video_counts: channels.iter().map(|c| c.video_count).collect(),
        avg_views_per_video: channels
            .iter()
            .map(|c| c.view_count as f64 / c.video_count.max(1) as f64)
            .collect(),
        channel_age_days: channels.iter().map(|c| c.age_days(now)).collect(),
    };

    let ids: Vec<(&str, &str)> = channels
        .iter()
        .map(|c| (c.id.as_str(), c.title.as_str()))
        .collect();

    let rankings: BTreeMap<String, Vec<RankEntry>> = metrics
        .series()
        .into_iter()
        .map(|(name, values)| (name.to_string(), rank(&values, &ids)))
        .collect();

    let insights = channel_insights(channels, &metrics, &rankings);

    ChannelComparison {
        comparison_metrics: metrics,
        rankings,
        insights,
    }
}

fn channel_insights(
    channels: &[ChannelData],
    metrics: &ChannelComparisonMetrics,
    rankings: &BTreeMap<String, Vec<RankEntry>>,
) -> Vec<String> {
    let mut insights = Vec::new();
    let leader = |metric: &str| rankings.get(metric).and_then(|r| r.first());

    let top_subs = leader("subscriber_counts");
    if let Some(top) = top_subs {
        insights.push(format!(
            "{} leads with {} subscribers",
            top.name, top.formatted_value
        ));
    }
    if let Some(top) = leader("view_counts") {
        if top_subs.map(|s| &s.id) != Some(&top.id) {
            insights.push(format!(
                "{} has the most total views with {}",
                top.name, top.formatted_value
            ));
        }
    }
    if let Some(top) = leader("avg_views_per_video") {
        insights.push(format!(
            "{} has the highest average views per video ({})",
            top.name, top.formatted_value
        ));
    }

    let ages: Vec<f64> = metrics.channel_age_days.iter().map(|&d| d as f64).collect();
    if let (Some(oldest), Some(newest)) = (argmax(&ages), argmin(&ages)) {
        if channels[oldest].id != channels[newest].id {
            insights.push(format!(
                "{} is the oldest channel ({} years old)",
                channels[oldest].title,
                metrics.channel_age_days[oldest] / 365
            ));
            insights.push(format!(
                "{} is the newest channel ({} years old)",
                channels[newest].title,
                metrics.channel_age_days[newest] / 365
            ));
        }
    }

    if channels.len() >= 2 {
        let growth: Vec<(usize, f64)> = channels
            .iter()
            .zip(&metrics.channel_age_days)
            .enumerate()
            .filter(|(_, (_, &age))| age > 0)
            .map(|(i, (c, &age))| (i, c.subscriber_count as f64 / age as f64))
            .collect();
        let rates: Vec<f64> = growth.iter().map(|(_, r)| *r).collect();
        if let Some(best) = argmax(&rates) {
            insights.push(format!(
                "{} has the fastest subscriber growth rate",
                channels[growth[best].0].title
            ));
        }
    }

    insights.truncate(MAX_INSIGHTS);
    insights
}

// ============================================================================
// Videos
// ============================================================================

/// Compare video statistics and summarise the standouts
pub fn compare_videos(videos: &[VideoData], now: DateTime<Utc>) -> VideoComparison {
    let mut metrics = VideoComparisonMetrics::default();
    let mut engagement = EngagementComparison::default();

    for video in videos {
        let rates = engagement_rate(video.view_count, video.like_count, video.comment_count);
        let age_hours = video
            .published_at
            .map(|p| (now - p).num_seconds() as f64 / 3600.0)
            .unwrap_or(0.0);

        metrics.view_counts.push(video.view_count);
        metrics.like_counts.push(video.like_count);
        metrics.comment_counts.push(video.comment_count);
        metrics.engagement_rates.push(rates.total_engagement_rate);
        metrics
            .duration_seconds
            .push(parse_duration(&video.duration).seconds);
        metrics.age_hours.push(age_hours);

        engagement.like_rates.push(rates.like_rate);
        engagement.comment_rates.push(rates.comment_rate);
        engagement
            .views_per_hour
            .push(video.view_count as f64 / age_hours.max(1.0));
    }

    let insights = video_insights(videos, &metrics, &engagement);

    VideoComparison {
        comparison_metrics: metrics,
        engagement_comparison: engagement,
        insights,
    }
}

fn video_insights(
    videos: &[VideoData],
    metrics: &VideoComparisonMetrics,
    engagement: &EngagementComparison,
) -> Vec<String> {
    let mut insights = Vec::new();
    // insight titles always carry the ellipsis, even when short
    let title = |i: usize| format!("{}...", videos[i].title.chars().take(50).collect::<String>());

    let views: Vec<f64> = metrics.view_counts.iter().map(|&v| v as f64).collect();
    let top_views = argmax(&views);
    if let Some(i) = top_views {
        insights.push(format!(
            "'{}' has the most views ({})",
            title(i),
            format_large_number(views[i])
        ));
    }

    if let Some(i) = argmax(&metrics.engagement_rates) {
        if Some(i) != top_views {
            insights.push(format!(
                "'{}' has the highest engagement rate ({:.2}%)",
                title(i),
                metrics.engagement_rates[i]
            ));
        }
    }

    if let Some(i) = argmax(&engagement.views_per_hour) {
        insights.push(format!(
            "'{}' has the highest view velocity ({} views/hour)",
            title(i),
            format_large_number(engagement.views_per_hour[i])
        ));
    }

    let durations: Vec<f64> = metrics.duration_seconds.iter().map(|&d| d as f64).collect();
    if let (Some(longest), Some(shortest)) = (argmax(&durations), argmin(&durations)) {
        if longest != shortest {
            insights.push(format!(
                "Duration varies from {} to {}",
                parse_duration(&videos[shortest].duration).formatted,
                parse_duration(&videos[longest].duration).formatted
            ));
        }
    }

    if let Some(i) = argmax(&engagement.like_rates) {
        insights.push(format!(
            "'{}' has the best like-to-view ratio ({:.3}%)",
            title(i),
            engagement.like_rates[i]
        ));
    }

    insights.truncate(MAX_INSIGHTS);
    insights
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn channel(id: &str, subs: u64, views: u64, videos: u64, years: i64, now: DateTime<Utc>) -> ChannelData {
        ChannelData {
            id: id.to_string(),
            title: format!("Channel {id}"),
            subscriber_count: subs,
            view_count: views,
            video_count: videos,
            published_at: Some(now - Duration::days(365 * years)),
            ..Default::default()
        }
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let ranks = rank(&[5.0, 9.0, 5.0], &[("a", "A"), ("b", "B"), ("c", "C")]);
        let ids: Vec<&str> = ranks.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        assert_eq!(ranks[0].rank, 1);
        assert_eq!(ranks[2].rank, 3);
    }

    #[test]
    fn test_compare_channels() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let channels = vec![
            channel("a", 2_000_000, 10_000_000, 100, 10, now),
            channel("b", 500_000, 50_000_000, 1_000, 2, now),
        ];
        let cmp = compare_channels(&channels, now);

        assert_eq!(cmp.comparison_metrics.avg_views_per_video, vec![100_000.0, 50_000.0]);
        assert_eq!(cmp.rankings["view_counts"][0].id, "b");
        assert_eq!(
            cmp.insights,
            vec![
                "Channel a leads with 2.0M subscribers",
                "Channel b has the most total views with 50.0M",
                "Channel a has the highest average views per video (100.0K)",
                "Channel a is the oldest channel (10 years old)",
                "Channel b is the newest channel (2 years old)",
            ]
        );
    }

    #[test]
    fn test_compare_channels_unknown_age() {
        let now = Utc::now();
        let mut channels = vec![channel("a", 10, 10, 1, 1, now), channel("b", 20, 5, 0, 1, now)];
        channels[1].published_at = None;
        let cmp = compare_channels(&channels, now);
        assert_eq!(cmp.comparison_metrics.channel_age_days[1], 0);
        assert_eq!(cmp.comparison_metrics.avg_views_per_video[1], 5.0);
    }

    #[test]
    fn test_compare_videos() {
        let now = Utc::now();
        let videos = vec![
            VideoData {
                id: "a".into(),
                title: "A".repeat(60),
                view_count: 10_000,
                like_count: 100,
                comment_count: 0,
                duration: "PT10M".into(),
                published_at: Some(now - Duration::hours(10)),
                ..Default::default()
            },
            VideoData {
                id: "b".into(),
                title: "Short title".into(),
                view_count: 1_000,
                like_count: 100,
                comment_count: 10,
                duration: "PT45S".into(),
                published_at: Some(now - Duration::hours(1)),
                ..Default::default()
            },
        ];
        let cmp = compare_videos(&videos, now);

        assert_eq!(cmp.comparison_metrics.duration_seconds, vec![600, 45]);
        assert_eq!(cmp.engagement_comparison.views_per_hour, vec![1_000.0, 1_000.0]);
        assert!(cmp.insights[0].starts_with(&format!("'{}...'", "A".repeat(50))));
        assert_eq!(cmp.insights[1], "'Short title...' has the highest engagement rate (11.00%)");
        assert!(cmp.insights.contains(&"Duration varies from 0:45 to 10:00".to_string()));
        assert_eq!(cmp.insights.len(), 5);
    }
}
