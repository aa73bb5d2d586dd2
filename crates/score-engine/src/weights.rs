//! User-adjustable metric weights.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use valuation_core::{DashboardError, DashboardResult, MetricKind, Weight};

const SUM_TOLERANCE: f64 = 1e-6;

/// Weight per active metric slot, in percent.
///
/// With exactly two active metrics, changing one weight moves the other so
/// the pair keeps summing to 100. With any other count the caller may leave
/// the set unbalanced; [`WeightSet::normalized`] rescales it for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightSet {
    weights: BTreeMap<MetricKind, f64>,
}

impl Default for WeightSet {
    fn default() -> Self {
        Self {
            weights: MetricKind::ALL.iter().map(|m| (*m, 50.0)).collect(),
        }
    }
}

impl WeightSet {
    /// Build a balanced set. Each weight must lie in [0, 100] and the set
    /// must sum to 100.
    pub fn new(weights: impl IntoIterator<Item = Weight>) -> DashboardResult<Self> {
        let mut map = BTreeMap::new();
        for w in weights {
            validate_percent(w.metric, w.weight_percent)?;
            if map.insert(w.metric, w.weight_percent).is_some() {
                return Err(DashboardError::InvalidWeights(format!(
                    "{} given more than once",
                    w.metric
                )));
            }
        }

        let set = Self { weights: map };
        if set.weights.is_empty() {
            return Err(DashboardError::InvalidWeights("no metrics given".to_string()));
        }
        if !set.is_balanced() {
            return Err(DashboardError::InvalidWeights(format!(
                "weights sum to {}, expected 100",
                set.total()
            )));
        }
        Ok(set)
    }

    /// Two-slot set built from the valuation share; leverage takes the rest.
    pub fn from_valuation_percent(valuation_percent: f64) -> DashboardResult<Self> {
        validate_percent(MetricKind::Valuation, valuation_percent)?;
        Self::new([
            Weight::new(MetricKind::Valuation, valuation_percent),
            Weight::new(MetricKind::Leverage, 100.0 - valuation_percent),
        ])
    }

    pub fn get(&self, metric: MetricKind) -> Option<f64> {
        self.weights.get(&metric).copied()
    }

    pub fn metrics(&self) -> impl Iterator<Item = MetricKind> + '_ {
        self.weights.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.weights.values().sum()
    }

    pub fn is_balanced(&self) -> bool {
        (self.total() - 100.0).abs() < SUM_TOLERANCE
    }

    /// Change one metric's weight. When exactly two metrics are active the
    /// other one is set to the complement.
    pub fn set_weight(&mut self, metric: MetricKind, percent: f64) -> DashboardResult<()> {
        validate_percent(metric, percent)?;
        if !self.weights.contains_key(&metric) {
            return Err(DashboardError::InvalidWeights(format!(
                "{} is not an active metric",
                metric
            )));
        }

        self.weights.insert(metric, percent);

        if self.weights.len() == 2 {
            if let Some(other) = self.weights.keys().copied().find(|m| *m != metric) {
                self.weights.insert(other, 100.0 - percent);
            }
        }
        Ok(())
    }

    /// Weights rescaled to sum to 100. An all-zero set is returned as is.
    pub fn normalized(&self) -> Vec<Weight> {
        let total = self.total();
        self.weights
            .iter()
            .map(|(metric, w)| {
                let pct = if total > 0.0 { w * 100.0 / total } else { *w };
                Weight::new(*metric, pct)
            })
            .collect()
    }

    pub fn to_weights(&self) -> Vec<Weight> {
        self.weights
            .iter()
            .map(|(metric, w)| Weight::new(*metric, *w))
            .collect()
    }
}

fn validate_percent(metric: MetricKind, percent: f64) -> DashboardResult<()> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(DashboardError::InvalidWeights(format!(
            "{} weight {} outside [0, 100]",
            metric, percent
        )));
    }
    Ok(())
}
