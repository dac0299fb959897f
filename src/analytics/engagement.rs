//! Engagement, velocity and growth arithmetic shared by the analyses

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::utils::round_to;

/// Per-view engagement rates, in percent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EngagementRates {
    pub total_engagement_rate: f64,
    pub like_rate: f64,
    pub comment_rate: f64,
}

/// Compute engagement rates; all zero when there are no views
#[must_use]
pub fn engagement_rate(views: u64, likes: u64, comments: u64) -> EngagementRates {
    if views == 0 {
        return EngagementRates::default();
    }
    let v = views as f64;
    EngagementRates {
        total_engagement_rate: round_to((likes + comments) as f64 / v * 100.0, 4),
        like_rate: round_to(likes as f64 / v * 100.0, 4),
        comment_rate: round_to(comments as f64 / v * 100.0, 4),
    }
}

/// View accumulation speed since publication
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewVelocity {
    pub views_per_hour: f64,
    pub views_per_day: f64,
    pub hours_since_publish: f64,
}

/// Views per hour and day; elapsed time is floored at one hour
#[must_use]
pub fn view_velocity(
    views: u64,
    published_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ViewVelocity {
    let Some(published) = published_at else {
        return ViewVelocity::default();
    };
    let hours = ((now - published).num_seconds() as f64 / 3600.0).max(1.0);
    let per_hour = views as f64 / hours;
    ViewVelocity {
        views_per_hour: round_to(per_hour, 2),
        views_per_day: round_to(per_hour * 24.0, 2),
        hours_since_publish: round_to(hours, 2),
    }
}

/// Relative change between two values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrowthRate {
    /// Fractional change; `None` when growing from zero
    pub growth_rate: Option<f64>,
    pub growth_percentage: Option<f64>,
    pub growth_description: String,
}

/// Growth from `previous` to `current` with a qualitative label
#[must_use]
pub fn growth_rate(current: f64, previous: f64) -> GrowthRate {
    if previous == 0.0 {
        return if current > 0.0 {
            GrowthRate {
                growth_rate: None,
                growth_percentage: None,
                growth_description: "New/Infinite Growth".to_string(),
            }
        } else {
            GrowthRate {
                growth_rate: Some(0.0),
                growth_percentage: Some(0.0),
                growth_description: "No Change".to_string(),
            }
        };
    }

    let rate = (current - previous) / previous;
    let pct = rate * 100.0;
    let description = if pct > 100.0 {
        "Explosive Growth"
    } else if pct > 50.0 {
        "Very High Growth"
    } else if pct > 20.0 {
        "High Growth"
    } else if pct > 5.0 {
        "Moderate Growth"
    } else if pct > 0.0 {
        "Slow Growth"
    } else if pct == 0.0 {
        "No Change"
    } else if pct > -5.0 {
        "Slight Decline"
    } else if pct > -20.0 {
        "Moderate Decline"
    } else {
        "Significant Decline"
    };

    GrowthRate {
        growth_rate: Some(round_to(rate, 4)),
        growth_percentage: Some(round_to(pct, 2)),
        growth_description: description.to_string(),
    }
}

/// Compact count: `1.2B`, `3.4M`, `5.6K` or the plain integer
pub fn format_large_number(value: f64) -> String {
    if value >= 1_000_000_000.0 {
        format!("{:.1}B", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("{:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1}K", value / 1_000.0)
    } else {
        format!("{}", value.trunc() as i64)
    }
}

/// Lowercased `#hashtags` found in text
pub fn extract_hashtags(text: &str) -> Vec<String> {
    static HASHTAG_RE: OnceLock<Regex> = OnceLock::new();

    let re = HASHTAG_RE.get_or_init(|| Regex::new(r"#\w+").expect("Invalid regex pattern"));

    re.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_engagement_rate() {
        let rates = engagement_rate(1000, 50, 10);
        assert_eq!(rates.total_engagement_rate, 6.0);
        assert_eq!(rates.like_rate, 5.0);
        assert_eq!(rates.comment_rate, 1.0);
    }

    #[test]
    fn test_engagement_rate_zero_views() {
        assert_eq!(engagement_rate(0, 5, 5), EngagementRates::default());
    }

    #[test]
    fn test_view_velocity_floors_at_one_hour() {
        let now = Utc::now();
        let v = view_velocity(600, Some(now - Duration::minutes(10)), now);
        assert_eq!(v.hours_since_publish, 1.0);
        assert_eq!(v.views_per_hour, 600.0);
        assert_eq!(v.views_per_day, 14_400.0);
    }

    #[test]
    fn test_view_velocity_unknown_publish_date() {
        assert_eq!(view_velocity(10, None, Utc::now()), ViewVelocity::default());
    }

    #[test]
    fn test_growth_rate_labels() {
        assert_eq!(growth_rate(300.0, 100.0).growth_description, "Explosive Growth");
        assert_eq!(growth_rate(110.0, 100.0).growth_description, "Moderate Growth");
        assert_eq!(growth_rate(100.0, 100.0).growth_description, "No Change");
        assert_eq!(growth_rate(97.0, 100.0).growth_description, "Slight Decline");
        assert_eq!(growth_rate(50.0, 100.0).growth_description, "Significant Decline");
        assert_eq!(growth_rate(5.0, 0.0).growth_rate, None);
        assert_eq!(growth_rate(0.0, 0.0).growth_description, "No Change");
    }

    #[test]
    fn test_format_large_number() {
        assert_eq!(format_large_number(999.0), "999");
        assert_eq!(format_large_number(1_500.0), "1.5K");
        assert_eq!(format_large_number(2_340_000.0), "2.3M");
        assert_eq!(format_large_number(7_000_000_000.0), "7.0B");
    }

    #[test]
    fn test_extract_hashtags() {
        assert_eq!(
            extract_hashtags("Loving #Rust and #tokio!"),
            vec!["#rust".to_string(), "#tokio".to_string()]
        );
    }
}
