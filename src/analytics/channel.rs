//! Channel-level analytics: monthly growth, upload cadence and keywords
//!
//! All functions operate on videos already fetched from the API; nothing here
//! performs I/O.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::OnceLock;

use crate::models::{GrowthData, HeatmapCell, KeywordData, UploadFrequencyData, UploadStats, VideoData};
use crate::utils::{round_to, word_tokens};

/// Weekday names indexed from Monday
pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

const CHANNEL_STOP_WORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "for", "nor", "on", "at", "by", "from", "in", "into",
    "with", "as", "of", "to", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "do", "does", "did", "not", "no", "yes", "it", "its", "me", "my", "you", "your", "he",
    "she", "his", "her", "we", "our", "they", "their", "this", "that", "these", "those", "can",
    "will", "would", "should", "could", "get", "go", "just", "like", "make", "see", "know",
    "time", "up", "down", "out", "about", "what", "where", "when", "why", "how", "through",
    "during", "before", "after", "above", "below", "off", "over", "under", "again", "further",
    "then", "once", "here", "there", "all", "any", "both", "each", "few", "more", "most",
    "other", "some", "such", "only", "own", "same", "so", "than", "too", "very", "s", "t",
    "don", "now", "i", "m", "re", "ve", "d", "ll", "youtu", "com", "www",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static STOP_WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    STOP_WORDS.get_or_init(|| CHANNEL_STOP_WORDS.iter().copied().collect())
}

// ============================================================================
// Growth trends
// ============================================================================

/// Monthly view totals with running cumulative counts
///
/// Videos without a publish date are skipped. Months are emitted in
/// ascending order.
pub fn growth_trends(videos: &[VideoData]) -> Vec<GrowthData> {
    let mut monthly: BTreeMap<(i32, u32), (u64, u64)> = BTreeMap::new();

    for video in videos {
        let Some(published) = video.published_at else {
            continue;
        };
        let entry = monthly
            .entry((published.year(), published.month()))
            .or_default();
        entry.0 += video.view_count;
        entry.1 += 1;
    }

    let mut cumulative_views = 0;
    let mut cumulative_videos = 0;

    monthly
        .into_iter()
        .filter_map(|((year, month), (views, count))| {
            cumulative_views += views;
            cumulative_videos += count;
            Some(GrowthData {
                date: NaiveDate::from_ymd_opt(year, month, 1)?,
                cumulative_views,
                video_count: cumulative_videos,
                monthly_views: views,
            })
        })
        .collect()
}

// ============================================================================
// Upload frequency
// ============================================================================

/// Most frequent value; ties resolve to the smallest
fn mode(values: impl Iterator<Item = u32>) -> Option<u32> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(v).or_default() += 1;
    }
    counts
        .into_iter()
        .fold(None, |best: Option<(u32, usize)>, (v, c)| match best {
            Some((_, bc)) if bc >= c => best,
            _ => Some((v, c)),
        })
        .map(|(v, _)| v)
}

/// Weekday/hour heatmap and cadence statistics
///
/// The heatmap always has 7 × 24 cells. With no dated videos the dates are
/// `None` and the stats are zero.
pub fn upload_frequency(videos: &[VideoData]) -> UploadFrequencyData {
    let mut timestamps: Vec<DateTime<Utc>> =
        videos.iter().filter_map(|v| v.published_at).collect();
    timestamps.sort();

    let mut grid = [[0u32; 24]; 7];
    for ts in &timestamps {
        grid[ts.weekday().num_days_from_monday() as usize][ts.hour() as usize] += 1;
    }
    let heatmap_data = (0..7u32)
        .flat_map(|day| {
            (0..24u32).map(move |hour| (day, hour))
        })
        .map(|(day, hour)| HeatmapCell {
            day,
            hour,
            count: grid[day as usize][hour as usize],
        })
        .collect();

    let (Some(&first), Some(&last)) = (timestamps.first(), timestamps.last()) else {
        return UploadFrequencyData {
            heatmap_data,
            ..Default::default()
        };
    };

    let days: BTreeSet<NaiveDate> = timestamps.iter().map(|t| t.date_naive()).collect();
    let days: Vec<NaiveDate> = days.into_iter().collect();
    let gaps: Vec<i64> = days.windows(2).map(|w| (w[1] - w[0]).num_days()).collect();

    let average_days = if gaps.is_empty() {
        0.0
    } else {
        gaps.iter().sum::<i64>() as f64 / gaps.len() as f64
    };
    let average_days_between_uploads = (average_days > 0.0).then(|| round_to(average_days, 2));

    let next_expected_upload_date = average_days_between_uploads.map(|_| {
        let offset = Duration::seconds((average_days * 86_400.0).round() as i64);
        (last + offset).date_naive()
    });

    let span_secs = (last - first).num_seconds();
    let avg_uploads_per_week = if span_secs > 0 {
        round_to(
            timestamps.len() as f64 / (span_secs as f64 / (7.0 * 24.0 * 3600.0)),
            2,
        )
    } else {
        0.0
    };

    let most_active_day = mode(timestamps.iter().map(|t| t.weekday().num_days_from_monday()));

    UploadFrequencyData {
        average_days_between_uploads,
        last_upload_date: Some(last.date_naive()),
        next_expected_upload_date,
        heatmap_data,
        stats: UploadStats {
            most_active_day,
            most_active_day_name: most_active_day.map(|d| DAY_NAMES[d as usize].to_string()),
            most_active_hour: mode(timestamps.iter().map(|t| t.hour())),
            avg_uploads_per_week,
            total_uploads: timestamps.len(),
        },
    }
}

// ============================================================================
// Keywords
// ============================================================================

/// Most frequent content words across titles, descriptions, tags and the
/// channel description
///
/// `percentage` is the share of videos whose title or description contains
/// the keyword, or which carry it as an exact tag.
pub fn top_keywords(
    videos: &[VideoData],
    channel_description: &str,
    limit: usize,
) -> Vec<KeywordData> {
    if videos.is_empty() && channel_description.is_empty() {
        return Vec::new();
    }

    let stop = stop_words();
    let mut counts: HashMap<String, u64> = HashMap::new();
    let mut first_seen: HashMap<String, usize> = HashMap::new();

    let texts = videos
        .iter()
        .flat_map(|v| {
            [v.title.as_str(), v.description.as_str()]
                .into_iter()
                .chain(v.tags.iter().map(String::as_str))
        })
        .chain(std::iter::once(channel_description));

    for text in texts {
        for word in word_tokens(text) {
            if word.chars().count() <= 2 || stop.contains(word.as_str()) {
                continue;
            }
            let order = first_seen.len();
            first_seen.entry(word.clone()).or_insert(order);
            *counts.entry(word).or_default() += 1;
        }
    }

    let mut ranked: Vec<(String, u64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| first_seen[&a.0].cmp(&first_seen[&b.0])));
    ranked.truncate(limit);

    let lowered: Vec<(String, String, Vec<String>)> = videos
        .iter()
        .map(|v| {
            (
                v.title.to_lowercase(),
                v.description.to_lowercase(),
                v.tags.iter().map(|t| t.to_lowercase()).collect(),
            )
        })
        .collect();

    ranked
        .into_iter()
        .map(|(keyword, count)| {
            let containing = lowered
                .iter()
                .filter(|(title, desc, tags)| {
                    title.contains(&keyword)
                        || desc.contains(&keyword)
                        || tags.iter().any(|t| *t == keyword)
                })
                .count();
            let percentage = if videos.is_empty() {
                0.0
            } else {
                round_to(containing as f64 / videos.len() as f64 * 100.0, 2)
            };
            KeywordData {
                keyword,
                count,
                kind: "general".to_string(),
                relevance_score: 1.0,
                percentage,
            }
        })
        .collect()
}
