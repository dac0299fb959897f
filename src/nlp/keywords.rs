//! Keyword extraction
//!
//! With a sentence embedder configured, candidates (1- and 2-word phrases)
//! are ranked by cosine similarity to the whole document. Without one, or
//! when the embedder fails, word frequency is used instead.

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use super::sentiment::CommentSentiment;
use super::{Embedder, ModelResult};
use crate::metrics;
use crate::models::CommentData;
use crate::utils::error::ModelError;
use crate::utils::{normalize_whitespace, round_to, strip_urls};

/// Shortest cleaned text worth embedding
const MIN_TEXT_LEN: usize = 10;

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "don", "down", "during", "each",
    "even", "ever", "every", "few", "for", "from", "further", "get", "got", "had", "has", "have",
    "having", "he", "her", "here", "hers", "him", "his", "how", "i", "if", "in", "into", "is", "it",
    "its", "itself", "just", "like", "made", "make", "many", "may", "me", "might", "more", "most",
    "much", "must", "my", "no", "nor", "not", "now", "of", "off", "on", "once", "one", "only",
    "or", "other", "our", "ours", "out", "over", "own", "really", "s", "same", "she", "should",
    "so", "some", "still", "such", "t", "than", "that", "the", "their", "theirs", "them", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "us", "very", "was", "way", "we", "well", "were", "what", "when", "where", "which", "while",
    "who", "whom", "why", "will", "with", "would", "you", "your", "yours",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// A ranked keyword; optional fields depend on the extraction path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedKeyword {
    pub keyword: String,
    pub relevance_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurrence_count: Option<usize>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ngram_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trend_strength: Option<String>,
}

impl ExtractedKeyword {
    fn new(keyword: impl Into<String>, relevance_score: f64, kind: &str) -> Self {
        Self {
            keyword: keyword.into(),
            relevance_score,
            occurrence_count: None,
            kind: kind.to_string(),
            ngram_size: None,
            trend_strength: None,
        }
    }
}

/// How a keyword's comments lean
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordSentiment {
    pub avg_sentiment_compound: f64,
    pub comment_count: usize,
    pub sentiment_std_dev: f64,
}

// ============================================================================
// HTTP embedder
// ============================================================================

/// Client for a sentence-embedding server exposing `/embed/batch`
pub struct HttpEmbedder {
    client: Client,
    server_url: String,
}

impl HttpEmbedder {
    pub fn new(server_url: impl Into<String>, timeout: Duration) -> ModelResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            server_url: server_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    texts: &'a [String],
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn name(&self) -> &str {
        "sentence_embeddings"
    }

    async fn embed_batch(&self, texts: &[String]) -> ModelResult<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(format!("{}/embed/batch", self.server_url))
            .json(&BatchEmbedRequest { texts })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ModelError::Status(response.status().as_u16()));
        }

        let batch: BatchEmbedResponse = response.json().await?;
        if batch.embeddings.len() != texts.len() {
            return Err(ModelError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                batch.embeddings.len()
            )));
        }
        Ok(batch.embeddings)
    }
}

// ============================================================================
// Service
// ============================================================================

#[derive(Clone, Default)]
pub struct KeywordService {
    embedder: Option<Arc<dyn Embedder>>,
}

impl std::fmt::Debug for KeywordService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeywordService")
            .field("backend", &self.backend())
            .finish()
    }
}

impl KeywordService {
    pub fn new(embedder: Option<Arc<dyn Embedder>>) -> Self {
        match &embedder {
            Some(e) => tracing::info!(embedder = e.name(), "Keyword service initialized"),
            None => tracing::warn!("No embedder configured, keywords use frequency analysis"),
        }
        Self { embedder }
    }

    pub fn frequency_only() -> Self {
        Self { embedder: None }
    }

    pub fn backend(&self) -> &str {
        self.embedder.as_ref().map_or("frequency", |e| e.name())
    }

    /// Keywords per comment, merged across comments
    ///
    /// Sorted by how many comments contain the keyword, then by mean score.
    pub async fn extract_from_comments(
        &self,
        comments: &[CommentData],
        top_k_per_comment: usize,
        overall_top_k: usize,
    ) -> Vec<ExtractedKeyword> {
        if comments.is_empty() {
            return Vec::new();
        }
        let Some(embedder) = &self.embedder else {
            let texts: Vec<&str> = comments.iter().map(|c| c.text.as_str()).collect();
            return frequency_keywords(&texts, overall_top_k);
        };

        let cleaned: Vec<String> = comments.iter().map(|c| clean_text(&c.text).to_lowercase()).collect();
        let mut order: Vec<String> = Vec::new();
        let mut scores: HashMap<String, Vec<f64>> = HashMap::new();

        for text in cleaned.iter().filter(|t| t.len() >= MIN_TEXT_LEN) {
            match rank_candidates(embedder.as_ref(), text, top_k_per_comment).await {
                Ok(ranked) => {
                    for (keyword, score) in ranked {
                        if !scores.contains_key(&keyword) {
                            order.push(keyword.clone());
                        }
                        scores.entry(keyword).or_default().push(score);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Embedding keyword extraction failed, using frequency analysis");
                    let texts: Vec<&str> = comments.iter().map(|c| c.text.as_str()).collect();
                    return frequency_keywords(&texts, overall_top_k);
                }
            }
        }

        let mut keywords: Vec<ExtractedKeyword> = order
            .into_iter()
            .map(|keyword| {
                let kw_scores = &scores[&keyword];
                let avg = kw_scores.iter().sum::<f64>() / kw_scores.len() as f64;
                let occurrences = cleaned.iter().filter(|t| t.contains(keyword.as_str())).count();
                let ngram = keyword.split_whitespace().count();
                ExtractedKeyword {
                    occurrence_count: Some(occurrences),
                    ngram_size: Some(ngram),
                    ..ExtractedKeyword::new(keyword, round_to(avg, 4), "extracted_from_comments")
                }
            })
            .collect();

        keywords.sort_by(|a, b| {
            b.occurrence_count
                .cmp(&a.occurrence_count)
                .then(b.relevance_score.total_cmp(&a.relevance_score))
        });
        keywords.truncate(overall_top_k);

        tracing::debug!(count = keywords.len(), "Aggregated comment keywords");
        keywords
    }

    /// Keywords from one text such as a title or description
    pub async fn extract_from_text(&self, text: &str, top_k: usize) -> Vec<ExtractedKeyword> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        let Some(embedder) = &self.embedder else {
            return frequency_keywords(&[text], top_k);
        };

        let cleaned = clean_text(text).to_lowercase();
        if cleaned.len() < MIN_TEXT_LEN {
            return Vec::new();
        }

        match rank_candidates(embedder.as_ref(), &cleaned, top_k).await {
            Ok(ranked) => ranked
                .into_iter()
                .map(|(kw, score)| ExtractedKeyword::new(kw, score, "title_description"))
                .collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Embedding keyword extraction failed, using frequency analysis");
                frequency_keywords(&[text], top_k)
            }
        }
    }

    /// Keywords shared across many video titles
    pub async fn extract_trending(&self, titles: &[String], top_k: usize) -> Vec<ExtractedKeyword> {
        if titles.is_empty() {
            return Vec::new();
        }
        let title_refs: Vec<&str> = titles.iter().map(String::as_str).collect();

        let Some(embedder) = &self.embedder else {
            return with_trend_strength(frequency_keywords(&title_refs, top_k), titles.len());
        };

        let combined = titles
            .iter()
            .map(|t| clean_text(t))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        if combined.trim().len() < MIN_TEXT_LEN {
            return Vec::new();
        }

        match rank_candidates(embedder.as_ref(), &combined, top_k).await {
            Ok(ranked) => {
                let lowered: Vec<String> = titles.iter().map(|t| t.to_lowercase()).collect();
                let mut keywords: Vec<ExtractedKeyword> = ranked
                    .into_iter()
                    .map(|(kw, score)| {
                        let count = lowered.iter().filter(|t| t.contains(kw.as_str())).count();
                        ExtractedKeyword {
                            occurrence_count: Some(count),
                            trend_strength: Some(trend_strength(count, titles.len()).to_string()),
                            ..ExtractedKeyword::new(kw, score, "trending")
                        }
                    })
                    .collect();
                keywords.sort_by(|a, b| {
                    b.occurrence_count
                        .cmp(&a.occurrence_count)
                        .then(b.relevance_score.total_cmp(&a.relevance_score))
                });
                keywords
            }
            Err(e) => {
                tracing::warn!(error = %e, "Embedding keyword extraction failed, using frequency analysis");
                with_trend_strength(frequency_keywords(&title_refs, top_k), titles.len())
            }
        }
    }
}

fn with_trend_strength(mut keywords: Vec<ExtractedKeyword>, total: usize) -> Vec<ExtractedKeyword> {
    for kw in &mut keywords {
        let count = kw.occurrence_count.unwrap_or(0);
        kw.trend_strength = Some(trend_strength(count, total).to_string());
    }
    keywords
}

/// Mean and spread of sentiment across comments mentioning each keyword
pub fn keyword_sentiment_correlation(
    keywords: &[String],
    scored: &[CommentSentiment],
) -> BTreeMap<String, KeywordSentiment> {
    let mut out = BTreeMap::new();
    if keywords.is_empty() || scored.is_empty() {
        return out;
    }

    let lowered: Vec<String> = scored.iter().map(|c| c.text.to_lowercase()).collect();
    for keyword in keywords {
        let needle = keyword.to_lowercase();
        let values: Vec<f64> = scored
            .iter()
            .zip(&lowered)
            .filter(|(_, text)| text.contains(needle.as_str()))
            .map(|(c, _)| c.sentiment_score)
            .collect();
        if values.is_empty() {
            continue;
        }

        let std_dev = if values.len() > 1 {
            round_to(values.iter().population_std_dev(), 4)
        } else {
            0.0
        };
        out.insert(
            keyword.clone(),
            KeywordSentiment {
                avg_sentiment_compound: round_to(values.iter().mean(), 4),
                comment_count: values.len(),
                sentiment_std_dev: std_dev,
            },
        );
    }
    out
}

pub fn trend_strength(occurrences: usize, total: usize) -> &'static str {
    if total == 0 {
        return "N/A";
    }
    let ratio = occurrences as f64 / total as f64;
    if ratio >= 0.3 {
        "Very Strong"
    } else if ratio >= 0.2 {
        "Strong"
    } else if ratio >= 0.1 {
        "Moderate"
    } else if ratio >= 0.05 {
        "Weak"
    } else {
        "Very Weak"
    }
}

// ============================================================================
// Extraction internals
// ============================================================================

/// Drop URLs and punctuation, keep words longer than two characters
pub fn clean_text(text: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let re = NON_ALNUM.get_or_init(|| Regex::new(r"[^a-zA-Z0-9\s]").expect("Invalid regex pattern"));

    let stripped = strip_urls(text);
    let spaced = re.replace_all(&stripped, " ");
    normalize_whitespace(&spaced)
        .split_whitespace()
        .filter(|w| w.len() > 2)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Unigrams and bigrams over the non-stop words, first-seen order
fn candidates(cleaned: &str) -> Vec<String> {
    let stops = stop_words();
    let words: Vec<&str> = cleaned
        .split_whitespace()
        .filter(|w| !stops.contains(w))
        .collect();

    let mut seen = HashSet::new();
    let mut out = Vec::new();
    let grams = words
        .iter()
        .map(|w| (*w).to_string())
        .chain(words.windows(2).map(|pair| pair.join(" ")));
    for gram in grams {
        if seen.insert(gram.clone()) {
            out.push(gram);
        }
    }
    out
}

fn cosine(a: &[f32], b: &[f32]) -> f64 {
    let (mut dot, mut na, mut nb) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na.sqrt() * nb.sqrt())
    }
}

/// Embed the document with its candidates and keep the `top_n` closest
async fn rank_candidates(embedder: &dyn Embedder, doc: &str, top_n: usize) -> ModelResult<Vec<(String, f64)>> {
    let cands = candidates(doc);
    if cands.is_empty() {
        return Ok(Vec::new());
    }

    let mut batch = Vec::with_capacity(cands.len() + 1);
    batch.push(doc.to_string());
    batch.extend(cands.iter().cloned());

    let embeddings = embedder.embed_batch(&batch).await?;
    metrics::record_model_inference("keywords", embedder.name(), 1);
    let Some((doc_vec, cand_vecs)) = embeddings.split_first() else {
        return Err(ModelError::InvalidResponse("empty embedding batch".to_string()));
    };

    let mut ranked: Vec<(String, f64)> = cands
        .into_iter()
        .zip(cand_vecs)
        .map(|(c, v)| (c, round_to(cosine(doc_vec, v), 4)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked.truncate(top_n);
    Ok(ranked)
}

/// Most frequent words across the texts
fn frequency_keywords(texts: &[&str], top_k: usize) -> Vec<ExtractedKeyword> {
    let stops = stop_words();
    let combined = texts.iter().map(|t| clean_text(t)).collect::<Vec<_>>().join(" ").to_lowercase();
    let words: Vec<&str> = combined
        .split_whitespace()
        .filter(|w| w.len() > 3 && !stops.contains(w))
        .collect();
    if words.is_empty() {
        return Vec::new();
    }

    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for &w in &words {
        let c = counts.entry(w).or_insert(0);
        if *c == 0 {
            order.push(w);
        }
        *c += 1;
    }
    // stable: ties keep first-seen order
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));

    metrics::record_model_inference("keywords", "frequency", texts.len());
    let total = words.len() as f64;
    order
        .into_iter()
        .take(top_k)
        .map(|w| ExtractedKeyword {
            occurrence_count: Some(counts[w]),
            ..ExtractedKeyword::new(w, round_to(counts[w] as f64 / total, 4), "frequency_based")
        })
        .collect()
}
