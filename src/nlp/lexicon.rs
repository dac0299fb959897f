//! Rule-based sentiment scoring with a valence lexicon
//!
//! Follows the VADER heuristics: per-token valence from the lexicon, booster
//! words, negation within a three-token window, the "but" contrast shift,
//! ALL-CAPS emphasis, and exclamation/question amplification. The summed
//! valence is normalised into a compound score in `[-1, 1]`.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::OnceLock;

use super::{ModelResult, PolarityScores, SentimentModel};
use crate::utils::round_to;

const B_INCR: f64 = 0.293;
const B_DECR: f64 = -0.293;
const C_INCR: f64 = 0.733;
const N_SCALAR: f64 = -0.74;
const NORMALIZE_ALPHA: f64 = 15.0;

/// Mean valence ratings, -4 (most negative) to +4 (most positive)
const LEXICON: &[(&str, f64)] = &[
    // positive
    ("good", 1.9),
    ("great", 3.1),
    ("love", 3.2),
    ("loved", 2.9),
    ("loves", 2.7),
    ("lovely", 2.8),
    ("like", 2.0),
    ("liked", 1.8),
    ("likes", 1.8),
    ("amazing", 2.8),
    ("awesome", 3.1),
    ("best", 3.2),
    ("better", 1.9),
    ("beautiful", 2.9),
    ("brilliant", 2.8),
    ("cool", 1.3),
    ("cute", 2.0),
    ("enjoy", 2.2),
    ("enjoyed", 2.3),
    ("excellent", 2.7),
    ("excited", 1.4),
    ("exciting", 2.2),
    ("fantastic", 2.6),
    ("fav", 2.0),
    ("favorite", 2.0),
    ("favourite", 2.0),
    ("fine", 0.8),
    ("fun", 2.3),
    ("funny", 1.9),
    ("glad", 2.0),
    ("genius", 1.9),
    ("happy", 2.7),
    ("helpful", 1.8),
    ("hilarious", 1.7),
    ("incredible", 2.4),
    ("inspiring", 2.4),
    ("interesting", 1.7),
    ("legend", 1.8),
    ("legendary", 2.2),
    ("lol", 2.9),
    ("lmao", 2.0),
    ("masterpiece", 3.1),
    ("nice", 1.8),
    ("perfect", 2.7),
    ("pleased", 1.9),
    ("recommend", 1.5),
    ("respect", 2.1),
    ("smart", 1.7),
    ("super", 2.9),
    ("support", 1.7),
    ("sweet", 2.0),
    ("thank", 1.5),
    ("thanks", 1.9),
    ("useful", 1.9),
    ("win", 2.8),
    ("wonderful", 2.7),
    ("wow", 2.8),
    ("yay", 2.4),
    ("yes", 1.7),
    ("agree", 1.5),
    ("appreciate", 1.7),
    ("appreciated", 2.3),
    ("blessed", 2.9),
    ("calm", 1.3),
    ("clear", 1.6),
    ("congrats", 2.4),
    ("congratulations", 2.9),
    ("creative", 1.9),
    ("easy", 1.9),
    ("epic", 2.5),
    ("free", 2.3),
    ("friendly", 2.2),
    ("gorgeous", 3.0),
    ("haha", 2.0),
    ("hahaha", 2.6),
    ("hope", 1.9),
    ("hopefully", 1.7),
    ("impressive", 2.3),
    ("joy", 2.8),
    ("kind", 2.4),
    ("laugh", 2.6),
    ("laughing", 2.2),
    ("peace", 2.5),
    ("proud", 2.1),
    ("relax", 1.9),
    ("safe", 1.9),
    ("solid", 1.6),
    ("success", 2.7),
    ("successful", 2.8),
    ("talented", 2.3),
    ("top", 0.8),
    ("true", 1.8),
    ("underrated", 0.9),
    ("winner", 2.8),
    ("worth", 0.9),
    (":)", 2.0),
    (":-)", 2.2),
    (":d", 2.9),
    ("<3", 1.9),
    ("xd", 2.2),
    // negative
    ("bad", -2.5),
    ("worse", -2.1),
    ("worst", -3.1),
    ("hate", -2.7),
    ("hated", -3.2),
    ("hates", -1.9),
    ("awful", -2.0),
    ("terrible", -2.1),
    ("horrible", -2.5),
    ("boring", -1.3),
    ("bored", -1.1),
    ("annoying", -1.7),
    ("angry", -2.3),
    ("sad", -2.1),
    ("disappointed", -1.9),
    ("disappointing", -2.2),
    ("disgusting", -2.4),
    ("dumb", -2.3),
    ("fail", -2.5),
    ("failed", -2.3),
    ("fake", -2.1),
    ("garbage", -2.1),
    ("idiot", -2.3),
    ("lame", -1.8),
    ("lie", -1.6),
    ("lies", -1.8),
    ("lost", -1.3),
    ("mess", -1.5),
    ("pathetic", -2.7),
    ("poor", -2.1),
    ("problem", -1.7),
    ("ridiculous", -1.5),
    ("sucks", -1.5),
    ("scam", -2.4),
    ("stupid", -2.4),
    ("trash", -1.5),
    ("ugly", -2.3),
    ("useless", -1.8),
    ("waste", -1.8),
    ("wasted", -2.2),
    ("wrong", -2.1),
    ("abuse", -3.2),
    ("afraid", -2.0),
    ("attack", -2.1),
    ("broken", -2.1),
    ("clickbait", -1.6),
    ("cringe", -1.8),
    ("cry", -2.1),
    ("crying", -2.1),
    ("damn", -1.7),
    ("dead", -3.3),
    ("die", -2.9),
    ("dislike", -1.6),
    ("evil", -3.4),
    ("fear", -2.2),
    ("hurt", -2.4),
    ("kill", -3.7),
    ("loser", -2.4),
    ("miss", -0.6),
    ("pain", -2.3),
    ("racist", -3.1),
    ("scared", -1.9),
    ("shame", -2.1),
    ("sick", -2.3),
    ("sorry", -0.3),
    ("toxic", -2.3),
    ("unfortunately", -1.4),
    ("upset", -1.6),
    ("weak", -1.9),
    ("weird", -0.7),
    ("worried", -1.2),
    ("wtf", -2.8),
    ("no", -1.2),
    (":(", -1.9),
    (":-(", -1.9),
];

const NEGATIONS: &[&str] = &[
    "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt", "ain't", "aren't",
    "can't", "couldn't", "daren't", "didn't", "doesn't", "dont", "hadnt", "hasnt", "havent",
    "isnt", "mightnt", "mustnt", "neither", "don't", "hadn't", "hasn't", "haven't", "isn't",
    "mightn't", "mustn't", "neednt", "needn't", "never", "none", "nope", "nor", "not", "nothing",
    "nowhere", "oughtnt", "shant", "shouldnt", "uhuh", "wasnt", "werent", "oughtn't", "shan't",
    "shouldn't", "uh-uh", "wasn't", "weren't", "without", "wont", "wouldnt", "won't", "wouldn't",
    "rarely", "seldom", "despite",
];

const BOOSTERS_UP: &[&str] = &[
    "absolutely", "amazingly", "awfully", "completely", "considerably", "decidedly", "deeply",
    "effing", "enormously", "entirely", "especially", "exceptionally", "extremely",
    "fabulously", "flipping", "flippin", "fricking", "frickin", "frigging", "friggin", "fully",
    "fucking", "greatly", "hella", "highly", "hugely", "incredibly", "intensely", "majorly",
    "more", "most", "particularly", "purely", "quite", "really", "remarkably", "so",
    "substantially", "thoroughly", "totally", "tremendously", "uber", "unbelievably",
    "unusually", "utterly", "very",
];

const BOOSTERS_DOWN: &[&str] = &[
    "almost", "barely", "hardly", "kinda", "kindof", "kind-of", "less", "little", "marginally",
    "occasionally", "partly", "scarcely", "slightly", "somewhat", "sorta", "sortof", "sort-of",
];

fn lexicon() -> &'static HashMap<&'static str, f64> {
    static MAP: OnceLock<HashMap<&'static str, f64>> = OnceLock::new();
    MAP.get_or_init(|| LEXICON.iter().copied().collect())
}

fn booster(word: &str) -> Option<f64> {
    if BOOSTERS_UP.contains(&word) {
        Some(B_INCR)
    } else if BOOSTERS_DOWN.contains(&word) {
        Some(B_DECR)
    } else {
        None
    }
}

fn is_negated(word: &str) -> bool {
    NEGATIONS.contains(&word) || word.contains("n't")
}

fn is_all_caps(word: &str) -> bool {
    word.chars().any(char::is_alphabetic)
        && !word.chars().any(char::is_lowercase)
}

/// Whitespace tokens with edge punctuation stripped; emoticons survive
fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|raw| {
            let stripped = raw.trim_matches(|c: char| c.is_ascii_punctuation());
            if stripped.chars().count() <= 2 {
                raw.to_string()
            } else {
                stripped.to_string()
            }
        })
        .filter(|t| t.chars().count() > 1)
        .collect()
}

fn normalize(score: f64) -> f64 {
    (score / (score * score + NORMALIZE_ALPHA).sqrt()).clamp(-1.0, 1.0)
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(4) as f64 * 0.292;
    let questions = match text.matches('?').count() {
        0 | 1 => 0.0,
        n @ 2..=3 => n as f64 * 0.18,
        _ => 0.96,
    };
    exclamations + questions
}

/// In-process lexicon sentiment model
#[derive(Debug, Clone, Copy, Default)]
pub struct LexiconSentimentModel;

impl LexiconSentimentModel {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Score text synchronously
    pub fn score(&self, text: &str) -> PolarityScores {
        let tokens = tokenize(text);
        let lower: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
        let caps = tokens.iter().filter(|t| is_all_caps(t)).count();
        let cap_diff = caps > 0 && caps < tokens.len();
        let lex = lexicon();

        let mut sentiments: Vec<f64> = Vec::with_capacity(tokens.len());

        for (i, word) in lower.iter().enumerate() {
            if booster(word).is_some()
                || (word == "kind" && lower.get(i + 1).is_some_and(|n| n == "of"))
            {
                sentiments.push(0.0);
                continue;
            }

            let Some(&base) = lex.get(word.as_str()) else {
                sentiments.push(0.0);
                continue;
            };

            let mut valence = base;
            if cap_diff && is_all_caps(&tokens[i]) {
                valence += if valence > 0.0 { C_INCR } else { -C_INCR };
            }

            for start in 0..3usize {
                if i <= start {
                    break;
                }
                let prev = &lower[i - (start + 1)];
                if lex.contains_key(prev.as_str()) {
                    continue;
                }

                let mut scalar = booster(prev).map_or(0.0, |b| if valence < 0.0 { -b } else { b });
                if scalar != 0.0 && cap_diff && is_all_caps(&tokens[i - (start + 1)]) {
                    scalar += if valence > 0.0 { C_INCR } else { -C_INCR };
                }
                scalar *= [1.0, 0.95, 0.9][start];
                valence += scalar;

                valence = negation_check(valence, &lower, start, i);
            }

            valence = least_check(valence, &lower, i, lex);
            sentiments.push(valence);
        }

        but_check(&lower, &mut sentiments);
        score_valence(&sentiments, text)
    }
}

fn negation_check(valence: f64, words: &[String], start: usize, i: usize) -> f64 {
    let so_this = |w: &str| w == "so" || w == "this";
    match start {
        0 if is_negated(&words[i - 1]) => valence * N_SCALAR,
        1 => {
            if words[i - 2] == "never" && so_this(&words[i - 1]) {
                valence * 1.25
            } else if words[i - 2] == "without" && words[i - 1] == "doubt" {
                valence
            } else if is_negated(&words[i - 2]) {
                valence * N_SCALAR
            } else {
                valence
            }
        }
        2 => {
            if words[i - 3] == "never" && (so_this(&words[i - 2]) || so_this(&words[i - 1])) {
                valence * 1.25
            } else if words[i - 3] == "without" && (words[i - 2] == "doubt" || words[i - 1] == "doubt")
            {
                valence
            } else if is_negated(&words[i - 3]) {
                valence * N_SCALAR
            } else {
                valence
            }
        }
        _ => valence,
    }
}

fn least_check(valence: f64, words: &[String], i: usize, lex: &HashMap<&str, f64>) -> f64 {
    if i == 0 || words[i - 1] != "least" || lex.contains_key("least") {
        return valence;
    }
    if i > 1 && (words[i - 2] == "at" || words[i - 2] == "very") {
        valence
    } else {
        valence * N_SCALAR
    }
}

/// Halve sentiment before "but", amplify it after
fn but_check(words: &[String], sentiments: &mut [f64]) {
    let Some(pivot) = words.iter().position(|w| w == "but") else {
        return;
    };
    for (idx, s) in sentiments.iter_mut().enumerate() {
        if idx < pivot {
            *s *= 0.5;
        } else if idx > pivot {
            *s *= 1.5;
        }
    }
}

fn score_valence(sentiments: &[f64], text: &str) -> PolarityScores {
    if sentiments.is_empty() {
        return PolarityScores::default();
    }

    let emphasis = punctuation_emphasis(text);
    let mut sum: f64 = sentiments.iter().sum();
    if sum > 0.0 {
        sum += emphasis;
    } else if sum < 0.0 {
        sum -= emphasis;
    }
    let compound = normalize(sum);

    let mut pos_sum = 0.0;
    let mut neg_sum = 0.0;
    let mut neu_count = 0.0;
    for &s in sentiments {
        if s > 0.0 {
            pos_sum += s + 1.0;
        } else if s < 0.0 {
            neg_sum += s - 1.0;
        } else {
            neu_count += 1.0;
        }
    }

    if pos_sum > neg_sum.abs() {
        pos_sum += emphasis;
    } else if pos_sum < neg_sum.abs() {
        neg_sum -= emphasis;
    }

    let total = pos_sum + neg_sum.abs() + neu_count;
    if total == 0.0 {
        return PolarityScores::default();
    }

    PolarityScores {
        neg: round_to((neg_sum / total).abs(), 3),
        neu: round_to((neu_count / total).abs(), 3),
        pos: round_to((pos_sum / total).abs(), 3),
        compound: round_to(compound, 4),
    }
}

#[async_trait]
impl SentimentModel for LexiconSentimentModel {
    fn name(&self) -> &str {
        "lexicon"
    }

    async fn polarity_scores(&self, text: &str) -> ModelResult<PolarityScores> {
        Ok(self.score(text))
    }
}
