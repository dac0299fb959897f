//! ISO-8601 video durations

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Parsed duration in several presentations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationInfo {
    pub seconds: u64,
    /// `H:MM:SS` when at least an hour long, otherwise `M:SS`
    pub formatted: String,
    /// `1h 2m 3s`, `4m 5s` or `6s`
    pub readable: String,
    pub hours: u64,
    pub minutes: u64,
}

impl DurationInfo {
    fn zero() -> Self {
        Self {
            seconds: 0,
            formatted: "0:00".to_string(),
            readable: "0s".to_string(),
            hours: 0,
            minutes: 0,
        }
    }

    /// Length in minutes
    #[must_use]
    pub fn minutes_f64(&self) -> f64 {
        self.seconds as f64 / 60.0
    }
}

/// Parse an ISO-8601 duration such as `PT1H2M3S` or `P1DT4M`
///
/// Anything unparsable, including live streams reported as `P0D`, yields a
/// zero duration.
pub fn parse_duration(iso: &str) -> DurationInfo {
    static DURATION_RE: OnceLock<Regex> = OnceLock::new();

    let re = DURATION_RE.get_or_init(|| {
        Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$")
            .expect("Invalid regex pattern")
    });

    let Some(caps) = re.captures(iso.trim()) else {
        return DurationInfo::zero();
    };

    let group = |i: usize| -> u64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse::<u64>().ok())
            .unwrap_or(0)
    };

    let hours = group(1) * 24 + group(2);
    let minutes = group(3);
    let seconds = group(4);
    let total = hours * 3600 + minutes * 60 + seconds;

    if total == 0 {
        return DurationInfo::zero();
    }

    let (formatted, readable) = if hours > 0 {
        (
            format!("{hours}:{minutes:02}:{seconds:02}"),
            format!("{hours}h {minutes}m {seconds}s"),
        )
    } else if minutes > 0 {
        (
            format!("{minutes}:{seconds:02}"),
            format!("{minutes}m {seconds}s"),
        )
    } else {
        (format!("0:{seconds:02}"), format!("{seconds}s"))
    };

    DurationInfo {
        seconds: total,
        formatted,
        readable,
        hours,
        minutes,
    }
}

/// Length bucket for a video
pub fn categorize_video_length(seconds: u64) -> &'static str {
    match seconds {
        0..=59 => "Short (< 1 min)",
        60..=299 => "Brief (1-5 min)",
        300..=899 => "Medium (5-15 min)",
        900..=1799 => "Long (15-30 min)",
        _ => "Extended (30+ min)",
    }
}
