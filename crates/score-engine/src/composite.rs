//! Weighted composite of per-metric scores.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use valuation_core::{DashboardError, DashboardResult, MetricKind, TickerResult, NEUTRAL_SCORE};

use crate::weights::WeightSet;

/// Number of factor slots the dashboard exposes (valuation, leverage).
pub const DEFAULT_FACTOR_SLOTS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Fixed divisor of the weighted sum. This is configuration, not the
    /// number of metrics that happened to have data.
    pub factor_slots: usize,
    /// Score used for a weighted metric with no data
    pub missing_score: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            factor_slots: DEFAULT_FACTOR_SLOTS,
            missing_score: NEUTRAL_SCORE,
        }
    }
}

impl ScoringConfig {
    pub fn validate(&self) -> DashboardResult<()> {
        if self.factor_slots == 0 {
            return Err(DashboardError::InvalidInput(
                "factor_slots must be at least 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.missing_score) {
            return Err(DashboardError::InvalidInput(format!(
                "missing_score {} outside [0, 100]",
                self.missing_score
            )));
        }
        Ok(())
    }
}

/// Combines metric scores into one composite.
///
/// Pure arithmetic with no cached state, cheap enough to rerun on every
/// weight change.
#[derive(Debug, Clone, Default)]
pub struct ScoreAggregator {
    config: ScoringConfig,
}

impl ScoreAggregator {
    pub fn new(config: ScoringConfig) -> DashboardResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// composite = (Σ score_i × weight_i / 100) / factor_slots
    ///
    /// Every weighted metric contributes; one without a score counts as
    /// `missing_score`. Weights are rescaled to sum to 100 first.
    pub fn composite(&self, scores: &BTreeMap<MetricKind, f64>, weights: &WeightSet) -> f64 {
        let weighted: f64 = weights
            .normalized()
            .iter()
            .map(|w| {
                let score = scores
                    .get(&w.metric)
                    .copied()
                    .filter(|s| s.is_finite())
                    .unwrap_or(self.config.missing_score);
                score.clamp(0.0, 100.0) * w.weight_percent / 100.0
            })
            .sum();

        (weighted / self.config.factor_slots as f64).clamp(0.0, 100.0)
    }

    /// Composite for a loaded ticker
    pub fn composite_for(&self, result: &TickerResult, weights: &WeightSet) -> f64 {
        let scores: BTreeMap<MetricKind, f64> = result
            .scores
            .iter()
            .map(|(metric, score)| (*metric, score.value))
            .collect();
        self.composite(&scores, weights)
    }
}
