//! Request input validation
//!
//! Identifier shape checks and numeric limits applied by the API handlers
//! before any upstream call is made.

pub mod categories;

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::utils::error::ValidationError;
use crate::utils::normalize_whitespace;

pub use categories::{category_name, is_known_category, DEFAULT_COUNTRY};

/// Upper bound for `max_videos`
pub const MAX_VIDEOS: u32 = 50;

/// Upper bound for `max_comments`
pub const MAX_COMMENTS: u32 = 500;

/// Comparison list size bounds
pub const MIN_COMPARE: usize = 2;
pub const MAX_COMPARE: usize = 5;

/// Maximum length kept by [`sanitize_text_input`]
pub const MAX_TEXT_INPUT: usize = 1000;

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("Invalid regex pattern"))
}

// ============================================================================
// Identifier checks
// ============================================================================

/// 11 characters of `[A-Za-z0-9_-]`
pub fn is_valid_video_id(id: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(&RE, r"^[A-Za-z0-9_-]{11}$").is_match(id)
}

/// Canonical `UC…` id, `@handle`, or legacy custom name
pub fn is_valid_channel_id(id: &str) -> bool {
    static CANONICAL: OnceLock<Regex> = OnceLock::new();
    static HANDLE: OnceLock<Regex> = OnceLock::new();
    static CUSTOM: OnceLock<Regex> = OnceLock::new();

    if id.is_empty() {
        return false;
    }
    let len = id.chars().count();

    if id.starts_with("UC") && len == 24 {
        return regex(&CANONICAL, r"^UC[A-Za-z0-9_-]{22}$").is_match(id);
    }
    if id.starts_with('@') {
        return (4..=101).contains(&len) && regex(&HANDLE, r"^@[A-Za-z0-9._-]+$").is_match(id);
    }
    (3..=100).contains(&len) && regex(&CUSTOM, r"^[A-Za-z0-9._-]+$").is_match(id)
}

/// Standard, uploads, likes or favourites playlist id
pub fn is_valid_playlist_id(id: &str) -> bool {
    static STANDARD: OnceLock<Regex> = OnceLock::new();
    static SYSTEM: OnceLock<Regex> = OnceLock::new();

    regex(&STANDARD, r"^PL[A-Za-z0-9_-]{32}$").is_match(id)
        || regex(&SYSTEM, r"^(UU|LL|FL)[A-Za-z0-9_-]{22}$").is_match(id)
}

/// Lowercase hyphenated UUID
pub fn is_valid_session_id(id: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    regex(
        &RE,
        r"^[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$",
    )
    .is_match(id)
}

// ============================================================================
// Request validators
// ============================================================================

pub fn validate_video_id(id: &str) -> Result<(), ValidationError> {
    if is_valid_video_id(id) {
        Ok(())
    } else {
        Err(ValidationError::InvalidVideoId(id.to_string()))
    }
}

pub fn validate_channel_id(id: &str) -> Result<(), ValidationError> {
    if is_valid_channel_id(id) {
        Ok(())
    } else {
        Err(ValidationError::InvalidChannelId(id.to_string()))
    }
}

pub fn validate_session_id(id: &str) -> Result<(), ValidationError> {
    if is_valid_session_id(id) {
        Ok(())
    } else {
        Err(ValidationError::InvalidSessionId)
    }
}

fn validate_range(field: &'static str, value: u32, max: u32) -> Result<u32, ValidationError> {
    if (1..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ValidationError::OutOfRange {
            field,
            min: 1,
            max: i64::from(max),
        })
    }
}

pub fn validate_max_videos(value: u32) -> Result<u32, ValidationError> {
    validate_range("max_videos", value, MAX_VIDEOS)
}

pub fn validate_max_comments(value: u32) -> Result<u32, ValidationError> {
    validate_range("max_comments", value, MAX_COMMENTS)
}

pub fn validate_max_results(value: u32) -> Result<u32, ValidationError> {
    validate_range("max_results", value, MAX_VIDEOS)
}

/// Two-letter region code, returned uppercased
pub fn validate_country(code: &str) -> Result<String, ValidationError> {
    static RE: OnceLock<Regex> = OnceLock::new();

    let upper = code.trim().to_uppercase();
    if regex(&RE, r"^[A-Z]{2}$").is_match(&upper) {
        Ok(upper)
    } else {
        Err(ValidationError::InvalidCountry(code.to_string()))
    }
}

/// Numeric category id in 1..=44
pub fn validate_category(id: &str) -> Result<(), ValidationError> {
    let in_range = !id.is_empty()
        && id.chars().all(|c| c.is_ascii_digit())
        && id.parse::<u32>().is_ok_and(|n| (1..=44).contains(&n));
    if in_range {
        Ok(())
    } else {
        Err(ValidationError::InvalidCategory(id.to_string()))
    }
}

fn validate_id_list(
    ids: &[String],
    check: fn(&str) -> Result<(), ValidationError>,
) -> Result<(), ValidationError> {
    if !(MIN_COMPARE..=MAX_COMPARE).contains(&ids.len()) {
        return Err(ValidationError::ComparisonSize {
            min: MIN_COMPARE,
            max: MAX_COMPARE,
            got: ids.len(),
        });
    }
    let unique: HashSet<&String> = ids.iter().collect();
    if unique.len() != ids.len() {
        return Err(ValidationError::DuplicateIds);
    }
    ids.iter().try_for_each(|id| check(id))
}

/// 2 to 5 distinct valid channel ids
pub fn validate_channel_ids(ids: &[String]) -> Result<(), ValidationError> {
    validate_id_list(ids, validate_channel_id)
}

/// 2 to 5 distinct valid video ids
pub fn validate_video_ids(ids: &[String]) -> Result<(), ValidationError> {
    validate_id_list(ids, validate_video_id)
}

/// Channel name used for search: 2 to 100 characters after trimming
pub fn validate_channel_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if (2..=100).contains(&len) && !trimmed.chars().any(char::is_control) {
        Ok(trimmed.to_string())
    } else {
        Err(ValidationError::Other(
            "Channel name must be between 2 and 100 characters".to_string(),
        ))
    }
}

/// Strip markup-ish and control characters, cap length, collapse whitespace
pub fn sanitize_text_input(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | '"' | '\''))
        .filter(|c| !c.is_control() || c.is_whitespace())
        .take(MAX_TEXT_INPUT)
        .collect();
    normalize_whitespace(&stripped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_video_ids() {
        assert!(is_valid_video_id("dQw4w9WgXcQ"));
        assert!(is_valid_video_id("a-b_c-d_e-f"));
        assert!(!is_valid_video_id("short"));
        assert!(!is_valid_video_id("dQw4w9WgXcQ!"));
        assert!(!is_valid_video_id("dQw4w9WgXc!"));
    }

    #[test]
    fn test_channel_ids() {
        assert!(is_valid_channel_id("UC_x5XG1OV2P6uZZ5FSM9Ttw"));
        assert!(is_valid_channel_id("@GoogleDevelopers"));
        assert!(is_valid_channel_id("GoogleDevelopers"));
        assert!(!is_valid_channel_id("@ab"));
        assert!(!is_valid_channel_id("ab"));
        assert!(!is_valid_channel_id("has space"));
        assert!(!is_valid_channel_id(""));
    }

    #[test]
    fn test_playlist_ids() {
        assert!(is_valid_playlist_id(&format!("PL{}", "a".repeat(32))));
        assert!(is_valid_playlist_id(&format!("UU{}", "b".repeat(22))));
        assert!(!is_valid_playlist_id(&format!("XX{}", "b".repeat(22))));
    }

    #[test]
    fn test_session_ids() {
        assert!(is_valid_session_id("123e4567-e89b-12d3-a456-426614174000"));
        assert!(!is_valid_session_id("123E4567-E89B-12D3-A456-426614174000"));
        assert!(validate_session_id("nope").is_err());
    }

    #[test]
    fn test_limits() {
        assert_eq!(validate_max_videos(50), Ok(50));
        assert!(validate_max_videos(0).is_err());
        assert!(validate_max_comments(501).is_err());
        assert_eq!(validate_max_comments(1), Ok(1));
    }

    #[test]
    fn test_country_and_category() {
        assert_eq!(validate_country("gb").unwrap(), "GB");
        assert!(validate_country("USA").is_err());
        assert!(validate_category("10").is_ok());
        assert!(validate_category("45").is_err());
        assert!(validate_category("abc").is_err());
        assert!(validate_category("").is_err());
    }

    #[test]
    fn test_comparison_lists() {
        let ids = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert!(validate_video_ids(&ids(&["dQw4w9WgXcQ", "9bZkp7q19f0"])).is_ok());
        assert_eq!(
            validate_video_ids(&ids(&["dQw4w9WgXcQ"])),
            Err(ValidationError::ComparisonSize { min: 2, max: 5, got: 1 })
        );
        assert_eq!(
            validate_video_ids(&ids(&["dQw4w9WgXcQ", "dQw4w9WgXcQ"])),
            Err(ValidationError::DuplicateIds)
        );
        assert!(validate_channel_ids(&ids(&["@one_channel", "bad id"])).is_err());
    }

    #[test]
    fn test_sanitize_text_input() {
        assert_eq!(sanitize_text_input("  <b>hi</b>\n\tthere "), "bhi/b there");
        assert_eq!(sanitize_text_input(&"x".repeat(2000)).len(), MAX_TEXT_INPUT);
    }

    proptest! {
        #[test]
        fn prop_generated_video_ids_are_valid(id in "[A-Za-z0-9_-]{11}") {
            prop_assert!(is_valid_video_id(&id));
        }

        #[test]
        fn prop_wrong_length_video_ids_are_invalid(id in "[A-Za-z0-9_-]{0,10}|[A-Za-z0-9_-]{12,20}") {
            prop_assert!(!is_valid_video_id(&id));
        }

        #[test]
        fn prop_sanitized_text_is_bounded(text in ".{0,1500}") {
            let out = sanitize_text_input(&text);
            prop_assert!(out.chars().count() <= MAX_TEXT_INPUT);
            prop_assert!(!out.contains('<') && !out.contains('>'));
        }
    }
}
