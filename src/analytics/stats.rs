//! Descriptive statistics over metric series

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

/// Summary of a numeric series
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentileStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub p25: f64,
    pub p75: f64,
    /// Population standard deviation
    pub std: f64,
}

/// Percentile by linear interpolation between closest ranks
fn percentile_sorted(sorted: &[f64], pct: f64) -> f64 {
    match sorted.len() {
        0 => 0.0,
        1 => sorted[0],
        n => {
            let rank = pct / 100.0 * (n - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let weight = rank - lower as f64;
            sorted[lower] + (sorted[upper] - sorted[lower]) * weight
        }
    }
}

/// Min, max, mean, median, quartiles and standard deviation
///
/// An empty series yields all zeros.
pub fn percentiles(values: &[f64]) -> PercentileStats {
    if values.is_empty() {
        return PercentileStats::default();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    PercentileStats {
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        mean: values.iter().mean(),
        median: percentile_sorted(&sorted, 50.0),
        p25: percentile_sorted(&sorted, 25.0),
        p75: percentile_sorted(&sorted, 75.0),
        std: if values.len() > 1 {
            values.iter().population_std_dev()
        } else {
            0.0
        },
    }
}

/// Rescale values linearly into `[min_val, max_val]`
///
/// A constant series maps every value to `min_val`.
pub fn normalize_scores(values: &[f64], min_val: f64, max_val: f64) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if hi == lo {
        return vec![min_val; values.len()];
    }
    values
        .iter()
        .map(|v| (v - lo) / (hi - lo) * (max_val - min_val) + min_val)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentiles_match_linear_interpolation() {
        let stats = percentiles(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 4.0);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.p25, 1.75);
        assert_eq!(stats.p75, 3.25);
        assert!((stats.std - 1.118_033_988_7).abs() < 1e-9);
    }

    #[test]
    fn test_percentiles_single_and_empty() {
        let single = percentiles(&[7.0]);
        assert_eq!(single.median, 7.0);
        assert_eq!(single.std, 0.0);
        assert_eq!(percentiles(&[]), PercentileStats::default());
    }

    #[test]
    fn test_normalize_scores() {
        assert_eq!(normalize_scores(&[0.0, 5.0, 10.0], 0.0, 100.0), vec![0.0, 50.0, 100.0]);
        assert_eq!(normalize_scores(&[3.0, 3.0], 0.0, 100.0), vec![0.0, 0.0]);
        assert!(normalize_scores(&[], 0.0, 1.0).is_empty());
    }
}
