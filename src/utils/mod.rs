//! Common utilities and helper functions
//!
//! This module provides shared utilities used across the application.

pub mod error;

use regex::Regex;
use std::sync::OnceLock;

/// Normalize whitespace in text
pub fn normalize_whitespace(text: &str) -> String {
    static WHITESPACE_RE: OnceLock<Regex> = OnceLock::new();

    let re = WHITESPACE_RE.get_or_init(|| Regex::new(r"\s+").expect("Invalid regex pattern"));

    re.replace_all(text.trim(), " ").to_string()
}

/// Remove http(s) URLs from text
pub fn strip_urls(text: &str) -> String {
    static URL_RE: OnceLock<Regex> = OnceLock::new();

    let re = URL_RE.get_or_init(|| Regex::new(r"https?://\S+").expect("Invalid regex pattern"));

    re.replace_all(text, "").to_string()
}

/// Lowercased word tokens (`\w+` runs)
pub fn word_tokens(text: &str) -> Vec<String> {
    static WORD_RE: OnceLock<Regex> = OnceLock::new();

    let re = WORD_RE.get_or_init(|| Regex::new(r"\b\w+\b").expect("Invalid regex pattern"));

    re.find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Truncate text to `max_chars` characters, appending `...` when cut
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{truncated}...")
    }
}

/// Round to a fixed number of decimal places
#[must_use]
pub fn round_to(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Sanitize filename by removing invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    static INVALID_CHARS: OnceLock<Regex> = OnceLock::new();

    let re =
        INVALID_CHARS.get_or_init(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("Invalid regex pattern"));

    re.replace_all(filename, "_").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(normalize_whitespace("  hello   world  "), "hello world");
        assert_eq!(normalize_whitespace("hello\n\nworld"), "hello world");
    }

    #[test]
    fn test_strip_urls() {
        assert_eq!(
            normalize_whitespace(&strip_urls("watch https://youtu.be/abc now")),
            "watch now"
        );
    }

    #[test]
    fn test_word_tokens() {
        assert_eq!(word_tokens("Rust, RUST! rust_lang"), vec!["rust", "rust", "rust_lang"]);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("file<name>.csv"), "file_name_.csv");
        assert_eq!(sanitize_filename("channel_analysis.csv"), "channel_analysis.csv");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("very long text here", 10), "very long ...");
        assert_eq!(truncate_text("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.23456, 2), 1.23);
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(f64::NAN, 2), 0.0);
    }
}
