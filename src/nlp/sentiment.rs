//! Comment sentiment scoring and aggregation

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};

use regex::Regex;

use super::{LexiconSentimentModel, ModelResult, PolarityScores, SentimentModel};
use crate::metrics;
use crate::models::CommentData;
use crate::utils::error::ModelError;
use crate::utils::{normalize_whitespace, round_to, strip_urls};

/// Comments kept per label in the top lists
pub const TOP_COMMENTS_LIMIT: usize = 5;

/// Likes above which a comment counts as high engagement
pub const HIGH_ENGAGEMENT_LIKES: u64 = 5;

const POSITIVE_THRESHOLD: f64 = 0.05;
const NEGATIVE_THRESHOLD: f64 = -0.05;

/// Sentiment class derived from a compound score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    #[must_use]
    pub fn from_compound(compound: f64) -> Self {
        if compound >= POSITIVE_THRESHOLD {
            Self::Positive
        } else if compound <= NEGATIVE_THRESHOLD {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

/// Per-comment sentiment result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentSentiment {
    pub comment_id: String,
    pub text: String,
    pub author: String,
    pub published_at: Option<DateTime<Utc>>,
    pub like_count: u64,
    pub reply_count: u64,
    pub sentiment_score: f64,
    pub sentiment_label: SentimentLabel,
    pub positive_score: f64,
    pub negative_score: f64,
    pub neutral_score: f64,
}

/// Detailed per-comment analysis with the top comments of each class
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentAnalysis {
    pub all_comments_sentiment: Vec<CommentSentiment>,
    pub top_positive_comments: Vec<CommentSentiment>,
    pub top_neutral_comments: Vec<CommentSentiment>,
    pub top_negative_comments: Vec<CommentSentiment>,
    pub total_comments_analyzed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
    pub compound: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCounts {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
}

impl LabelCounts {
    fn tally<'a>(labels: impl IntoIterator<Item = &'a SentimentLabel>) -> Self {
        let mut counts = Self::default();
        for label in labels {
            match label {
                SentimentLabel::Positive => counts.positive += 1,
                SentimentLabel::Negative => counts.negative += 1,
                SentimentLabel::Neutral => counts.neutral += 1,
            }
        }
        counts
    }

    fn total(&self) -> usize {
        self.positive + self.negative + self.neutral
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelPercentages {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

/// Aggregate sentiment over a set of comments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentMetrics {
    pub total_comments_analyzed: usize,
    pub sentiment_scores: SentimentScores,
    pub sentiment_distribution: LabelCounts,
    pub sentiment_percentages: LabelPercentages,
    pub overall_sentiment: SentimentLabel,
    pub sentiment_strength: String,
    pub polarization_index: f64,
}

/// One time window of the sentiment trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentTrendPoint {
    /// Mean publish time of the window, Unix seconds
    pub timestamp: i64,
    pub positive_ratio: f64,
    pub negative_ratio: f64,
    pub neutral_ratio: f64,
    pub avg_compound_score: f64,
    pub comment_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementSentiment {
    pub count: usize,
    pub sentiment_distribution: LabelCounts,
    pub avg_compound_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentByEngagement {
    pub high_engagement: EngagementSentiment,
    pub low_engagement: EngagementSentiment,
}

/// Single-text analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSentiment {
    pub text: String,
    pub cleaned_text: String,
    pub scores: PolarityScores,
    pub sentiment: SentimentLabel,
    pub confidence: f64,
}

/// Scores comments with a [`SentimentModel`]
#[derive(Clone)]
pub struct SentimentService {
    model: Arc<dyn SentimentModel>,
}

impl std::fmt::Debug for SentimentService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SentimentService")
            .field("model", &self.model.name())
            .finish()
    }
}

impl Default for SentimentService {
    fn default() -> Self {
        Self::new(Arc::new(LexiconSentimentModel::new()))
    }
}

impl SentimentService {
    pub fn new(model: Arc<dyn SentimentModel>) -> Self {
        tracing::info!(model = model.name(), "Sentiment service initialized");
        Self { model }
    }

    pub fn backend(&self) -> &str {
        self.model.name()
    }

    /// Score every comment; scores are rounded to 4 places
    pub async fn score_comments(&self, comments: &[CommentData]) -> ModelResult<Vec<CommentSentiment>> {
        let scored = try_join_all(comments.iter().map(|comment| async move {
            let scores = self.model.polarity_scores(&clean_text(&comment.text)).await?;
            Ok::<_, ModelError>(CommentSentiment {
                comment_id: comment.id.clone(),
                text: comment.text.clone(),
                author: comment.author.clone(),
                published_at: comment.published_at,
                like_count: comment.like_count,
                reply_count: comment.reply_count,
                sentiment_score: round_to(scores.compound, 4),
                sentiment_label: SentimentLabel::from_compound(scores.compound),
                positive_score: round_to(scores.pos, 4),
                negative_score: round_to(scores.neg, 4),
                neutral_score: round_to(scores.neu, 4),
            })
        }))
        .await?;

        metrics::record_model_inference("sentiment", self.model.name(), scored.len());
        tracing::debug!(count = scored.len(), "Scored comment sentiment");
        Ok(scored)
    }

    pub async fn analyze_text(&self, text: &str) -> ModelResult<TextSentiment> {
        let cleaned_text = clean_text(text);
        let scores = self.model.polarity_scores(&cleaned_text).await?;
        Ok(TextSentiment {
            text: text.to_string(),
            cleaned_text,
            scores,
            sentiment: SentimentLabel::from_compound(scores.compound),
            confidence: scores.compound.abs(),
        })
    }
}

// ============================================================================
// Text cleaning
// ============================================================================

/// Strip URLs, collapse whitespace, squash repeated `!`/`?`, and cap
/// character runs at two ("sooooo" becomes "soo")
pub fn clean_text(text: &str) -> String {
    static EXCLAIM_RE: OnceLock<Regex> = OnceLock::new();
    static QUESTION_RE: OnceLock<Regex> = OnceLock::new();
    let exclaim = EXCLAIM_RE.get_or_init(|| Regex::new(r"!{2,}").expect("Invalid regex pattern"));
    let question = QUESTION_RE.get_or_init(|| Regex::new(r"\?{2,}").expect("Invalid regex pattern"));

    let text = normalize_whitespace(&strip_urls(text));
    let text = exclaim.replace_all(&text, "!");
    let text = question.replace_all(&text, "?");
    cap_repeats(&text, 2).trim().to_string()
}

fn cap_repeats(text: &str, max_run: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev: Option<char> = None;
    let mut run = 0;
    for c in text.chars() {
        if Some(c) == prev {
            run += 1;
        } else {
            prev = Some(c);
            run = 1;
        }
        if run <= max_run {
            out.push(c);
        }
    }
    out
}

// ============================================================================
// Aggregation
// ============================================================================

/// Top comments of each class plus the full per-comment list
pub fn analysis(scored: &[CommentSentiment]) -> SentimentAnalysis {
    let of = |label: SentimentLabel| -> Vec<CommentSentiment> {
        scored
            .iter()
            .filter(|c| c.sentiment_label == label)
            .cloned()
            .collect()
    };

    let mut positive = of(SentimentLabel::Positive);
    positive.sort_by(|a, b| b.sentiment_score.total_cmp(&a.sentiment_score));
    positive.truncate(TOP_COMMENTS_LIMIT);

    // closest to zero first
    let mut neutral = of(SentimentLabel::Neutral);
    neutral.sort_by(|a, b| a.sentiment_score.abs().total_cmp(&b.sentiment_score.abs()));
    neutral.truncate(TOP_COMMENTS_LIMIT);

    let mut negative = of(SentimentLabel::Negative);
    negative.sort_by(|a, b| a.sentiment_score.total_cmp(&b.sentiment_score));
    negative.truncate(TOP_COMMENTS_LIMIT);

    SentimentAnalysis {
        all_comments_sentiment: scored.to_vec(),
        top_positive_comments: positive,
        top_neutral_comments: neutral,
        top_negative_comments: negative,
        total_comments_analyzed: scored.len(),
    }
}

/// Averages, distribution, strength and polarization
pub fn metrics(scored: &[CommentSentiment]) -> SentimentMetrics {
    metrics_over(scored.iter())
}

fn metrics_over<'a>(scored: impl Iterator<Item = &'a CommentSentiment> + Clone) -> SentimentMetrics {
    let n = scored.clone().count();
    if n == 0 {
        return SentimentMetrics {
            total_comments_analyzed: 0,
            sentiment_scores: SentimentScores::default(),
            sentiment_distribution: LabelCounts::default(),
            sentiment_percentages: LabelPercentages::default(),
            overall_sentiment: SentimentLabel::Neutral,
            sentiment_strength: "Neutral".to_string(),
            polarization_index: 0.0,
        };
    }

    let len = n as f64;
    let avg = |f: fn(&CommentSentiment) -> f64| round_to(scored.clone().map(f).sum::<f64>() / len, 4);
    let scores = SentimentScores {
        positive: avg(|c| c.positive_score),
        negative: avg(|c| c.negative_score),
        neutral: avg(|c| c.neutral_score),
        compound: avg(|c| c.sentiment_score),
    };

    let counts = LabelCounts::tally(scored.map(|c| &c.sentiment_label));
    let pct = |count: usize| round_to(count as f64 / len * 100.0, 2);

    SentimentMetrics {
        total_comments_analyzed: n,
        sentiment_scores: scores,
        sentiment_distribution: counts,
        sentiment_percentages: LabelPercentages {
            positive: pct(counts.positive),
            negative: pct(counts.negative),
            neutral: pct(counts.neutral),
        },
        overall_sentiment: SentimentLabel::from_compound(scores.compound),
        sentiment_strength: sentiment_strength(scores.compound.abs()).to_string(),
        polarization_index: polarization(&counts),
    }
}

pub fn sentiment_strength(abs_compound: f64) -> &'static str {
    if abs_compound >= 0.6 {
        "Strong"
    } else if abs_compound >= 0.3 {
        "Moderate"
    } else if abs_compound >= 0.1 {
        "Weak"
    } else {
        "Neutral"
    }
}

/// `(pos + neg) * (1 - neu)` over label ratios, 0..=1
fn polarization(counts: &LabelCounts) -> f64 {
    let total = counts.total();
    if total == 0 {
        return 0.0;
    }
    let t = total as f64;
    let pos = counts.positive as f64 / t;
    let neg = counts.negative as f64 / t;
    let neu = counts.neutral as f64 / t;
    round_to((pos + neg) * (1.0 - neu), 3)
}

/// Sentiment over time in roughly ten windows
pub fn trends(scored: &[CommentSentiment]) -> Vec<SentimentTrendPoint> {
    if scored.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&CommentSentiment> = scored.iter().collect();
    sorted.sort_by_key(|c| c.published_at);

    let window = (sorted.len() / 10).max(1);
    sorted
        .chunks(window)
        .map(|chunk| {
            let m = metrics_over(chunk.iter().copied());
            SentimentTrendPoint {
                timestamp: mean_timestamp(chunk.iter().map(|c| c.published_at)),
                positive_ratio: m.sentiment_percentages.positive,
                negative_ratio: m.sentiment_percentages.negative,
                neutral_ratio: m.sentiment_percentages.neutral,
                avg_compound_score: m.sentiment_scores.compound,
                comment_count: chunk.len(),
            }
        })
        .collect()
}

/// Mean Unix timestamp over the dated entries, 0 when none are dated
pub(crate) fn mean_timestamp(dates: impl Iterator<Item = Option<DateTime<Utc>>>) -> i64 {
    let stamps: Vec<i64> = dates.flatten().map(|d| d.timestamp()).collect();
    if stamps.is_empty() {
        0
    } else {
        (stamps.iter().map(|&s| s as f64).sum::<f64>() / stamps.len() as f64) as i64
    }
}

/// High (likes > 5) versus low engagement; `None` for no comments
pub fn by_engagement(scored: &[CommentSentiment]) -> Option<SentimentByEngagement> {
    if scored.is_empty() {
        return None;
    }

    let group = |high: bool| {
        let members = scored
            .iter()
            .filter(move |c| (c.like_count > HIGH_ENGAGEMENT_LIKES) == high);
        let m = metrics_over(members);
        EngagementSentiment {
            count: m.total_comments_analyzed,
            sentiment_distribution: m.sentiment_distribution,
            avg_compound_score: m.sentiment_scores.compound,
        }
    };

    Some(SentimentByEngagement {
        high_engagement: group(true),
        low_engagement: group(false),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn comment(id: &str, text: &str, likes: u64, minutes: i64) -> CommentData {
        CommentData {
            id: id.to_string(),
            text: text.to_string(),
            author: "viewer".to_string(),
            published_at: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minutes)),
            like_count: likes,
            reply_count: 0,
        }
    }

    fn sample() -> Vec<CommentData> {
        vec![
            comment("a", "I love this video, amazing work!", 10, 0),
            comment("b", "This is terrible and boring", 0, 1),
            comment("c", "Uploaded on Tuesday", 2, 2),
            comment("d", "Great editing", 7, 3),
        ]
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("sooooo   good!!!! https://x.io/a"), "soo good!");
        assert_eq!(clean_text("what???"), "what?");
    }

    #[test]
    fn test_label_thresholds() {
        assert_eq!(SentimentLabel::from_compound(0.05), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_compound(-0.05), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_compound(0.049), SentimentLabel::Neutral);
    }

    #[tokio::test]
    async fn test_analysis_top_lists() {
        let service = SentimentService::default();
        let scored = service.score_comments(&sample()).await.unwrap();
        let result = analysis(&scored);

        assert_eq!(result.total_comments_analyzed, 4);
        assert_eq!(result.top_positive_comments.len(), 2);
        assert_eq!(result.top_negative_comments[0].comment_id, "b");
        assert_eq!(result.top_neutral_comments[0].comment_id, "c");
        let first = &result.top_positive_comments;
        assert!(first[0].sentiment_score >= first[1].sentiment_score);
    }

    #[tokio::test]
    async fn test_metrics() {
        let service = SentimentService::default();
        let scored = service.score_comments(&sample()).await.unwrap();
        let m = metrics(&scored);

        assert_eq!(m.sentiment_distribution.positive, 2);
        assert_eq!(m.sentiment_distribution.negative, 1);
        assert_eq!(m.sentiment_distribution.neutral, 1);
        assert_eq!(m.sentiment_percentages.positive, 50.0);
        // (0.5 + 0.25) * (1 - 0.25)
        assert_eq!(m.polarization_index, 0.563);
    }

    #[test]
    fn test_metrics_empty() {
        let m = metrics(&[]);
        assert_eq!(m.total_comments_analyzed, 0);
        assert_eq!(m.overall_sentiment, SentimentLabel::Neutral);
        assert_eq!(m.sentiment_strength, "Neutral");
    }

    #[test]
    fn test_strength_bands() {
        assert_eq!(sentiment_strength(0.6), "Strong");
        assert_eq!(sentiment_strength(0.3), "Moderate");
        assert_eq!(sentiment_strength(0.1), "Weak");
        assert_eq!(sentiment_strength(0.09), "Neutral");
    }

    #[tokio::test]
    async fn test_trends_windows() {
        let comments: Vec<CommentData> = (0..25)
            .map(|i| comment(&i.to_string(), "good stuff", 0, 24 - i))
            .collect();
        let scored = SentimentService::default().score_comments(&comments).await.unwrap();
        let points = trends(&scored);

        // window of 2 over 25 comments
        assert_eq!(points.len(), 13);
        assert_eq!(points.last().unwrap().comment_count, 1);
        assert!(points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert_eq!(points[0].positive_ratio, 100.0);
    }

    #[tokio::test]
    async fn test_by_engagement() {
        let scored = SentimentService::default().score_comments(&sample()).await.unwrap();
        let groups = by_engagement(&scored).unwrap();
        assert_eq!(groups.high_engagement.count, 2);
        assert_eq!(groups.low_engagement.count, 2);
        assert_eq!(groups.high_engagement.sentiment_distribution.positive, 2);
        assert!(by_engagement(&[]).is_none());
    }

    #[tokio::test]
    async fn test_analyze_text() {
        let result = SentimentService::default().analyze_text("awful!!!").await.unwrap();
        assert_eq!(result.cleaned_text, "awful!");
        assert_eq!(result.sentiment, SentimentLabel::Negative);
        assert_eq!(result.confidence, result.scores.compound.abs());
    }
}
