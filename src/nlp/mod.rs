//! NLP model seams and the services built on them
//!
//! Models are black boxes behind three traits:
//! - [`SentimentModel`] scores polarity (in-process lexicon by default)
//! - [`ToxicityModel`] classifies text against a text-classification server
//! - [`Embedder`] embeds texts through a sentence-embedding server
//!
//! The services clean input, call the model, and reshape results. Toxicity
//! and keyword extraction fall back to rule-based paths when their backend is
//! not configured or fails.

pub mod keywords;
pub mod lexicon;
pub mod sentiment;
pub mod toxicity;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::error::ModelError;

pub use keywords::{HttpEmbedder, KeywordService};
pub use lexicon::LexiconSentimentModel;
pub use sentiment::SentimentService;
pub use toxicity::{HttpToxicityModel, ToxicityService};

/// Result type for model calls
pub type ModelResult<T> = Result<T, ModelError>;

/// VADER-style polarity scores
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PolarityScores {
    pub neg: f64,
    pub neu: f64,
    pub pos: f64,
    pub compound: f64,
}

/// One label/score pair from a classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// Sentiment scorer
#[async_trait]
pub trait SentimentModel: Send + Sync {
    /// Backend name reported by health checks
    fn name(&self) -> &str;

    async fn polarity_scores(&self, text: &str) -> ModelResult<PolarityScores>;
}

/// Toxicity classifier
#[async_trait]
pub trait ToxicityModel: Send + Sync {
    fn name(&self) -> &str;

    /// Classify a batch; one label list per input text
    async fn classify_batch(&self, texts: &[String]) -> ModelResult<Vec<Vec<LabelScore>>>;
}

/// Sentence embedder
#[async_trait]
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    async fn embed_batch(&self, texts: &[String]) -> ModelResult<Vec<Vec<f32>>>;
}

/// Which backend each service is using
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelStatus {
    pub sentiment: String,
    pub toxicity: String,
    pub keywords: String,
}
