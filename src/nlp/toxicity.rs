//! Toxicity detection for comments
//!
//! Uses a text-classification server when one is configured and falls back
//! to weighted keyword rules when it is absent or a call fails.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use super::sentiment::{mean_timestamp, HIGH_ENGAGEMENT_LIKES};
use super::{LabelScore, ModelResult, ToxicityModel};
use crate::metrics;
use crate::models::CommentData;
use crate::utils::error::ModelError;
use crate::utils::{normalize_whitespace, round_to, strip_urls, truncate_text};

/// Classifier score above which a comment is toxic
pub const TRANSFORMER_THRESHOLD: f64 = 0.6;

/// Rule score above which a comment is toxic
pub const RULE_BASED_THRESHOLD: f64 = 0.65;

const MOST_TOXIC_LIMIT: usize = 5;
const TOXIC_LABELS: &[&str] = &["TOXIC", "TOXICITY", "LABEL_1", "1"];

const HATE_SPEECH: &[&str] = &["hate", "nazi", "racist", "homophobic", "sexist", "bigot", "supremacy"];
const HARASSMENT: &[&str] = &[
    "kill yourself", "kys", "die", "loser", "pathetic", "worthless", "ugly", "stupid", "idiot", "dumb",
    "clown",
];
const PROFANITY: &[&str] = &["damn", "hell", "crap", "ass", "bitch", "fuck", "shit", "piss", "cunt", "wanker"];
const THREATS: &[&str] = &["threat", "hurt", "violence", "attack", "destroy", "bomb", "shoot", "murder", "harm"];
const SPAM: &[&str] = &["subscribe", "follow", "check out", "visit my", "free money", "giveaway", "link in bio"];

/// Kind of toxicity detected in a comment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToxicityType {
    HateSpeech,
    Threats,
    Harassment,
    Aggressive,
    Profanity,
    Spam,
    GeneralToxicity,
}

impl ToxicityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HateSpeech => "hate_speech",
            Self::Threats => "threats",
            Self::Harassment => "harassment",
            Self::Aggressive => "aggressive",
            Self::Profanity => "profanity",
            Self::Spam => "spam",
            Self::GeneralToxicity => "general_toxicity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    Transformer,
    RuleBased,
}

/// Toxicity verdict for one comment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentToxicity {
    pub comment_id: String,
    pub text: String,
    pub author: String,
    pub like_count: u64,
    pub published_at: Option<DateTime<Utc>>,
    pub is_toxic: bool,
    pub toxicity_score: f64,
    pub toxicity_type: Option<ToxicityType>,
    pub detection_method: DetectionMethod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToxicComment {
    pub comment_id: String,
    /// First 100 characters
    pub text: String,
    pub author: String,
    pub toxicity_score: f64,
    pub toxicity_type: Option<ToxicityType>,
    pub like_count: u64,
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToxicityLevels {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    pub score: f64,
    pub level: String,
    pub description: String,
}

/// Aggregate toxicity over a comment set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToxicityAnalysis {
    pub total_comments_analyzed: usize,
    pub toxic_comments_count: usize,
    pub toxicity_rate: f64,
    pub avg_toxicity_score: f64,
    pub toxicity_levels: ToxicityLevels,
    pub toxicity_type_distribution: BTreeMap<String, usize>,
    pub most_toxic_comments: Vec<ToxicComment>,
    pub community_health_score: HealthScore,
    pub detection_method: Option<DetectionMethod>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToxicityTrendPoint {
    pub timestamp: i64,
    pub toxicity_rate: f64,
    pub avg_toxicity_score: f64,
    pub toxic_count: usize,
    pub comment_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementToxicity {
    pub count: usize,
    pub toxic_count: usize,
    pub toxicity_rate: f64,
    pub avg_toxicity_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToxicityByEngagement {
    pub high_engagement: EngagementToxicity,
    pub low_engagement: EngagementToxicity,
}

// ============================================================================
// HTTP classifier
// ============================================================================

/// Client for a text-classification inference server
///
/// Sends `{"inputs": [...]}` and accepts either one `{label, score}` per
/// input or a list of them per input.
pub struct HttpToxicityModel {
    client: Client,
    endpoint: String,
}

impl HttpToxicityModel {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> ModelResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a [String],
}

fn parse_labels(value: Value) -> ModelResult<Vec<LabelScore>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| {
                serde_json::from_value(item).map_err(|e| ModelError::InvalidResponse(e.to_string()))
            })
            .collect(),
        obj @ Value::Object(_) => serde_json::from_value(obj)
            .map(|l| vec![l])
            .map_err(|e| ModelError::InvalidResponse(e.to_string())),
        other => Err(ModelError::InvalidResponse(format!("unexpected entry: {other}"))),
    }
}

#[async_trait]
impl ToxicityModel for HttpToxicityModel {
    fn name(&self) -> &str {
        "transformer"
    }

    async fn classify_batch(&self, texts: &[String]) -> ModelResult<Vec<Vec<LabelScore>>> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ClassifyRequest { inputs: texts })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ModelError::Status(response.status().as_u16()));
        }

        let body: Value = response.json().await?;
        let Value::Array(entries) = body else {
            return Err(ModelError::InvalidResponse("expected a JSON array".to_string()));
        };
        if entries.len() != texts.len() {
            return Err(ModelError::InvalidResponse(format!(
                "expected {} results, got {}",
                texts.len(),
                entries.len()
            )));
        }

        entries.into_iter().map(parse_labels).collect()
    }
}

// ============================================================================
// Service
// ============================================================================

/// Toxicity scoring with a rule-based fallback
#[derive(Clone, Default)]
pub struct ToxicityService {
    model: Option<Arc<dyn ToxicityModel>>,
}

impl std::fmt::Debug for ToxicityService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToxicityService")
            .field("backend", &self.backend())
            .finish()
    }
}

impl ToxicityService {
    pub fn new(model: Option<Arc<dyn ToxicityModel>>) -> Self {
        match &model {
            Some(m) => tracing::info!(
                model = m.name(),
                threshold = TRANSFORMER_THRESHOLD,
                "Toxicity service initialized"
            ),
            None => tracing::warn!(
                threshold = RULE_BASED_THRESHOLD,
                "No toxicity model configured, using rule-based detection"
            ),
        }
        Self { model }
    }

    pub fn rule_based() -> Self {
        Self { model: None }
    }

    pub fn backend(&self) -> &str {
        self.model.as_ref().map_or("rule_based", |m| m.name())
    }

    /// Score every comment; classifier failures degrade to rules
    pub async fn score_comments(&self, comments: &[CommentData]) -> Vec<CommentToxicity> {
        let texts: Vec<String> = comments.iter().map(|c| clean_text(&c.text)).collect();

        let verdicts: Vec<Verdict> = match &self.model {
            Some(model) if !texts.is_empty() => match model.classify_batch(&texts).await {
                Ok(batch) if batch.len() == texts.len() => batch
                    .iter()
                    .zip(&texts)
                    .map(|(labels, text)| transformer_verdict(labels, text).unwrap_or_else(|| rule_verdict(text)))
                    .collect(),
                Ok(batch) => {
                    tracing::warn!(
                        expected = texts.len(),
                        got = batch.len(),
                        "Toxicity model returned a mismatched batch, falling back to rules"
                    );
                    texts.iter().map(|t| rule_verdict(t)).collect()
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Toxicity model failed, falling back to rules");
                    texts.iter().map(|t| rule_verdict(t)).collect()
                }
            },
            _ => texts.iter().map(|t| rule_verdict(t)).collect(),
        };

        let by_model = verdicts
            .iter()
            .filter(|v| v.method == DetectionMethod::Transformer)
            .count();
        metrics::record_model_inference("toxicity", "transformer", by_model);
        metrics::record_model_inference("toxicity", "rule_based", verdicts.len() - by_model);

        comments.iter().zip(verdicts).map(|(c, v)| v.into_record(c)).collect()
    }

    /// Score a single text
    pub async fn detect(&self, text: &str) -> CommentToxicity {
        let comment = CommentData {
            text: text.to_string(),
            ..Default::default()
        };
        self.score_comments(std::slice::from_ref(&comment))
            .await
            .pop()
            .unwrap_or_else(|| rule_verdict(&clean_text(text)).into_record(&comment))
    }
}

struct Verdict {
    is_toxic: bool,
    score: f64,
    kind: Option<ToxicityType>,
    method: DetectionMethod,
}

impl Verdict {
    fn into_record(self, c: &CommentData) -> CommentToxicity {
        CommentToxicity {
            comment_id: c.id.clone(),
            text: c.text.clone(),
            author: c.author.clone(),
            like_count: c.like_count,
            published_at: c.published_at,
            is_toxic: self.is_toxic,
            toxicity_score: self.score,
            toxicity_type: self.kind,
            detection_method: self.method,
        }
    }
}

fn clean_text(text: &str) -> String {
    normalize_whitespace(&strip_urls(text)).trim().to_string()
}

fn is_toxic_label(label: &str) -> bool {
    let upper = label.to_uppercase();
    TOXIC_LABELS.contains(&upper.as_str())
}

/// Prefer the toxic label; otherwise invert the top label's confidence
fn transformer_verdict(labels: &[LabelScore], text: &str) -> Option<Verdict> {
    let entry = labels
        .iter()
        .find(|l| is_toxic_label(&l.label))
        .or_else(|| labels.first())?;

    let score = if is_toxic_label(&entry.label) {
        entry.score
    } else {
        1.0 - entry.score
    };
    let is_toxic = score > TRANSFORMER_THRESHOLD;

    Some(Verdict {
        is_toxic,
        score: round_to(score, 4),
        kind: is_toxic.then(|| classify_type(text)),
        method: DetectionMethod::Transformer,
    })
}

fn caps_ratio(text: &str) -> f64 {
    let len = text.chars().count();
    if len == 0 {
        return 0.0;
    }
    text.chars().filter(|c| c.is_uppercase()).count() as f64 / len as f64
}

fn is_shouting(text: &str) -> bool {
    text.chars().count() > 10 && caps_ratio(text) > 0.7
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Weighted keyword rules
fn rule_verdict(text: &str) -> Verdict {
    let lower = text.to_lowercase();
    let mut score = 0.0;
    let mut kinds: Vec<ToxicityType> = Vec::new();

    let categories: [(ToxicityType, &[&str], f64); 5] = [
        (ToxicityType::HateSpeech, HATE_SPEECH, 0.3),
        (ToxicityType::Harassment, HARASSMENT, 0.15),
        (ToxicityType::Profanity, PROFANITY, 0.05),
        (ToxicityType::Threats, THREATS, 0.3),
        (ToxicityType::Spam, SPAM, 0.01),
    ];

    for (kind, keywords, weight) in categories {
        for keyword in keywords {
            if lower.contains(keyword) {
                score += weight;
                if !kinds.contains(&kind) {
                    kinds.push(kind);
                }
            }
        }
    }

    // mixed-case shouting; all-caps text is left alone
    let has_lower = text.chars().any(char::is_lowercase);
    if is_shouting(text) && has_lower {
        score += 0.05;
        if !kinds.contains(&ToxicityType::Aggressive) {
            kinds.push(ToxicityType::Aggressive);
        }
    }

    if text.matches('!').count() > 3 || text.matches('?').count() > 3 || text.matches('.').count() > 5 {
        score += 0.02;
    }

    let score: f64 = score.min(1.0);
    Verdict {
        is_toxic: score > RULE_BASED_THRESHOLD,
        score: round_to(score, 4),
        kind: kinds.first().copied(),
        method: DetectionMethod::RuleBased,
    }
}

/// First matching type in severity order
pub fn classify_type(text: &str) -> ToxicityType {
    let lower = text.to_lowercase();
    if contains_any(&lower, &["hate", "racist", "nazi", "homophobic", "bigot", "supremacy"]) {
        ToxicityType::HateSpeech
    } else if contains_any(&lower, &["kill", "die", "hurt", "threat", "bomb", "shoot", "murder", "harm"]) {
        ToxicityType::Threats
    } else if contains_any(&lower, &["stupid", "idiot", "loser", "pathetic", "ugly", "dumb", "clown"]) {
        ToxicityType::Harassment
    } else if is_shouting(text) {
        ToxicityType::Aggressive
    } else if contains_any(&lower, &["ass", "bitch", "fuck", "shit", "piss", "cunt", "wanker"]) {
        ToxicityType::Profanity
    } else if contains_any(&lower, SPAM) {
        ToxicityType::Spam
    } else {
        ToxicityType::GeneralToxicity
    }
}

// ============================================================================
// Aggregation
// ============================================================================

/// Rates, levels, type mix, worst comments and community health
pub fn analysis(scored: &[CommentToxicity]) -> ToxicityAnalysis {
    if scored.is_empty() {
        return ToxicityAnalysis {
            total_comments_analyzed: 0,
            toxic_comments_count: 0,
            toxicity_rate: 0.0,
            avg_toxicity_score: 0.0,
            toxicity_levels: ToxicityLevels::default(),
            toxicity_type_distribution: BTreeMap::new(),
            most_toxic_comments: Vec::new(),
            community_health_score: HealthScore {
                score: 100.0,
                level: "Excellent".to_string(),
                description: "No data available for analysis".to_string(),
            },
            detection_method: None,
        };
    }

    let toxic: Vec<&CommentToxicity> = scored.iter().filter(|c| c.is_toxic).collect();
    let rate = toxic.len() as f64 / scored.len() as f64 * 100.0;
    let avg = scored.iter().map(|c| c.toxicity_score).sum::<f64>() / scored.len() as f64;

    let mut levels = ToxicityLevels::default();
    let mut types: BTreeMap<String, usize> = BTreeMap::new();
    for c in &toxic {
        if c.toxicity_score > 0.7 {
            levels.high += 1;
        } else if c.toxicity_score >= 0.4 {
            levels.medium += 1;
        } else {
            levels.low += 1;
        }
        if let Some(kind) = c.toxicity_type {
            *types.entry(kind.as_str().to_string()).or_insert(0) += 1;
        }
    }

    let mut worst = toxic.clone();
    worst.sort_by(|a, b| b.toxicity_score.total_cmp(&a.toxicity_score));
    let most_toxic_comments = worst
        .into_iter()
        .take(MOST_TOXIC_LIMIT)
        .map(|c| ToxicComment {
            comment_id: c.comment_id.clone(),
            text: truncate_text(&c.text, 100),
            author: c.author.clone(),
            toxicity_score: c.toxicity_score,
            toxicity_type: c.toxicity_type,
            like_count: c.like_count,
            published_at: c.published_at,
        })
        .collect();

    let method = if scored.iter().any(|c| c.detection_method == DetectionMethod::Transformer) {
        DetectionMethod::Transformer
    } else {
        DetectionMethod::RuleBased
    };

    ToxicityAnalysis {
        total_comments_analyzed: scored.len(),
        toxic_comments_count: toxic.len(),
        toxicity_rate: round_to(rate, 2),
        avg_toxicity_score: round_to(avg, 4),
        toxicity_levels: levels,
        toxicity_type_distribution: types,
        most_toxic_comments,
        community_health_score: health_score(rate, avg),
        detection_method: Some(method),
    }
}

/// `100 - rate*2 - avg*50`, clamped to 0..=100
pub fn health_score(toxicity_rate: f64, avg_score: f64) -> HealthScore {
    let score = (100.0 - toxicity_rate * 2.0 - avg_score * 50.0).clamp(0.0, 100.0);
    let (level, description) = if score >= 80.0 {
        ("Excellent", "Very healthy community with minimal toxic content")
    } else if score >= 60.0 {
        ("Good", "Generally positive community with occasional toxic comments")
    } else if score >= 40.0 {
        ("Moderate", "Mixed community with some concerning toxic content")
    } else if score >= 20.0 {
        ("Poor", "Community with significant toxicity issues")
    } else {
        ("Very Poor", "Highly toxic community requiring immediate attention")
    };

    HealthScore {
        score: round_to(score, 1),
        level: level.to_string(),
        description: description.to_string(),
    }
}

fn summarize<'a>(items: impl Iterator<Item = &'a CommentToxicity>) -> (usize, usize, f64, f64) {
    let (mut n, mut toxic, mut sum) = (0usize, 0usize, 0.0);
    for c in items {
        n += 1;
        sum += c.toxicity_score;
        if c.is_toxic {
            toxic += 1;
        }
    }
    if n == 0 {
        return (0, 0, 0.0, 0.0);
    }
    let rate = round_to(toxic as f64 / n as f64 * 100.0, 2);
    (n, toxic, rate, round_to(sum / n as f64, 4))
}

/// Toxicity over time in roughly ten windows
pub fn trends(scored: &[CommentToxicity]) -> Vec<ToxicityTrendPoint> {
    if scored.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&CommentToxicity> = scored.iter().collect();
    sorted.sort_by_key(|c| c.published_at);

    let window = (sorted.len() / 10).max(1);
    sorted
        .chunks(window)
        .map(|chunk| {
            let (n, toxic, rate, avg) = summarize(chunk.iter().copied());
            ToxicityTrendPoint {
                timestamp: mean_timestamp(chunk.iter().map(|c| c.published_at)),
                toxicity_rate: rate,
                avg_toxicity_score: avg,
                toxic_count: toxic,
                comment_count: n,
            }
        })
        .collect()
}

/// High (likes > 5) versus low engagement; `None` for no comments
pub fn by_engagement(scored: &[CommentToxicity]) -> Option<ToxicityByEngagement> {
    if scored.is_empty() {
        return None;
    }

    let group = |high: bool| {
        let (count, toxic_count, toxicity_rate, avg_toxicity_score) =
            summarize(scored.iter().filter(|c| (c.like_count > HIGH_ENGAGEMENT_LIKES) == high));
        EngagementToxicity {
            count,
            toxic_count,
            toxicity_rate,
            avg_toxicity_score,
        }
    };

    Some(ToxicityByEngagement {
        high_engagement: group(true),
        low_engagement: group(false),
    })
}
