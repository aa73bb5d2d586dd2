//! P/E average-reversion score.
//!
//! Scores how cheap the latest P/E is relative to its own recent history.
//! Two sub-scores in [0, 1] are blended:
//!
//! - `score_avg`: distance from the window mean, scaled by the distance from
//!   the mean to the nearer extreme on that side
//! - `score_range`: position inside the [min, max] band, inverted so the
//!   window low scores 1
//!
//! final = 100 × (0.7 × score_avg + 0.3 × score_range)

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use valuation_core::stats::{clamp_unit, mean, min_max};
use valuation_core::{DashboardError, DashboardResult, MetricScore, SeriesPoint};

const AVG_WEIGHT: f64 = 0.7;
const RANGE_WEIGHT: f64 = 0.3;
const MIN_SPREAD: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeReversionConfig {
    /// Look-back measured back from the latest observation
    pub years: u32,
}

impl Default for PeReversionConfig {
    fn default() -> Self {
        Self { years: 2 }
    }
}

/// Score a P/E history. Gaps and non-finite values are dropped before the
/// window is taken.
pub fn pe_reversion_score(points: &[SeriesPoint], config: &PeReversionConfig) -> DashboardResult<MetricScore> {
    if config.years == 0 {
        return Err(DashboardError::InvalidInput(
            "look-back must be at least one year".to_string(),
        ));
    }

    let mut observed: Vec<(NaiveDate, f64)> = points
        .iter()
        .filter_map(|p| p.value.filter(|v| v.is_finite()).map(|v| (p.date, v)))
        .collect();
    observed.sort_by_key(|(date, _)| *date);

    let latest = observed
        .last()
        .map(|(date, _)| *date)
        .ok_or_else(|| DashboardError::InsufficientData("no P/E observations".to_string()))?;
    let cutoff = latest
        .checked_sub_months(Months::new(config.years * 12))
        .unwrap_or(NaiveDate::MIN);

    let window: Vec<f64> = observed
        .iter()
        .filter(|(date, _)| *date >= cutoff)
        .map(|(_, v)| *v)
        .collect();

    let (min_pe, max_pe) = min_max(&window)
        .ok_or_else(|| DashboardError::InsufficientData("empty P/E window".to_string()))?;
    let avg_pe = mean(&window);
    let current_pe = window[window.len() - 1];

    let score_range = if max_pe == min_pe {
        0.5
    } else {
        clamp_unit(1.0 - (current_pe - min_pe) / (max_pe - min_pe))
    };

    let score_avg = if current_pe <= avg_pe {
        0.5 + 0.5 * (avg_pe - current_pe) / (avg_pe - min_pe).max(MIN_SPREAD)
    } else {
        0.5 - 0.5 * (current_pe - avg_pe) / (max_pe - avg_pe).max(MIN_SPREAD)
    };
    let score_avg = clamp_unit(score_avg);

    let score = AVG_WEIGHT * score_avg + RANGE_WEIGHT * score_range;

    let mut details = BTreeMap::new();
    details.insert("current_pe".to_string(), current_pe);
    details.insert("avg_pe".to_string(), avg_pe);
    details.insert("min_pe".to_string(), min_pe);
    details.insert("max_pe".to_string(), max_pe);
    details.insert("score_avg".to_string(), score_avg);
    details.insert("score_range".to_string(), score_range);
    details.insert("data_points".to_string(), window.len() as f64);

    Ok(MetricScore::new(score * 100.0, details, window.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn quarterly(values: &[f64]) -> Vec<SeriesPoint> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let date = NaiveDate::from_ymd_opt(2023, 1, 1)
                    .unwrap()
                    .checked_add_months(Months::new(3 * i as u32))
                    .unwrap();
                SeriesPoint::new(date, *v)
            })
            .collect()
    }

    #[test]
    fn test_current_at_window_low_scores_top() {
        let score = pe_reversion_score(&quarterly(&[20.0, 18.0, 16.0, 10.0]), &PeReversionConfig::default()).unwrap();
        assert_relative_eq!(score.value, 100.0);
        assert_relative_eq!(score.detail("score_range").unwrap(), 1.0);
        assert_eq!(score.data_point_count, Some(4));
        assert!(score.is_sparse());
    }

    #[test]
    fn test_current_at_window_high_scores_zero() {
        let score = pe_reversion_score(&quarterly(&[10.0, 12.0, 14.0, 30.0]), &PeReversionConfig::default()).unwrap();
        assert_relative_eq!(score.value, 0.0);
    }

    #[test]
    fn test_flat_history_is_neutral() {
        let score = pe_reversion_score(&quarterly(&[15.0; 8]), &PeReversionConfig::default()).unwrap();
        // score_avg = 0.5 (current == avg), score_range = 0.5
        assert_relative_eq!(score.value, 50.0);
        assert!(!score.is_sparse());
    }

    #[test]
    fn test_mixed_history() {
        // avg 15, min 10, max 20, current 15 -> score_avg 0.5, score_range 0.5
        let score = pe_reversion_score(&quarterly(&[10.0, 20.0, 15.0]), &PeReversionConfig::default()).unwrap();
        assert_relative_eq!(score.detail("avg_pe").unwrap(), 15.0);
        assert_relative_eq!(score.value, 50.0);
    }

    #[test]
    fn test_window_excludes_old_points() {
        // 12 quarters from 2023-01 to 2025-10; a one-year window keeps 2024-10 onward
        let mut values = vec![100.0; 8];
        values.extend([10.0, 12.0, 14.0, 11.0]);
        let score = pe_reversion_score(&quarterly(&values), &PeReversionConfig { years: 1 }).unwrap();

        assert_eq!(score.data_point_count, Some(5));
        assert_relative_eq!(score.detail("max_pe").unwrap(), 100.0);

        let score = pe_reversion_score(&quarterly(&values[8..]), &PeReversionConfig { years: 1 }).unwrap();
        assert_relative_eq!(score.detail("max_pe").unwrap(), 14.0);
    }

    #[test]
    fn test_gaps_are_skipped() {
        let mut points = quarterly(&[20.0, 10.0]);
        points.push(SeriesPoint::gap(NaiveDate::from_ymd_opt(2023, 9, 1).unwrap()));
        let score = pe_reversion_score(&points, &PeReversionConfig::default()).unwrap();
        assert_relative_eq!(score.detail("current_pe").unwrap(), 10.0);
        assert_eq!(score.data_point_count, Some(2));
    }

    #[test]
    fn test_no_observations() {
        let err = pe_reversion_score(&[], &PeReversionConfig::default()).unwrap_err();
        assert!(matches!(err, DashboardError::InsufficientData(_)));
    }
}
