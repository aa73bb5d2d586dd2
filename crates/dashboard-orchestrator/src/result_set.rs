use score_engine::{ScoreAggregator, WeightSet};
use serde::Serialize;
use valuation_core::{DashboardError, TickerResult, SPARSE_DATA_WARNING};

/// Outcome of one load cycle as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStatus {
    Success,
    /// Something was excluded or a secondary batch failed
    PartialSuccess,
    /// The primary valuation batch failed; nothing to show
    Error,
}

/// Tickers kept after reconciliation, in input order.
///
/// Holds no composite scores; [`ResultSet::ranked`] derives them from the
/// weights passed in, so re-weighting never needs a reload.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    entries: Vec<TickerResult>,
}

impl ResultSet {
    pub fn new(mut entries: Vec<TickerResult>) -> Self {
        entries.sort_by_key(|e| e.input_index);
        Self { entries }
    }

    pub fn entries(&self) -> &[TickerResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, ticker: &str) -> Option<&TickerResult> {
        self.entries.iter().find(|e| e.ticker.eq_ignore_ascii_case(ticker))
    }

    /// Entries ordered by composite score, highest first. Equal composites
    /// keep input order. Ranks are 1-based.
    pub fn ranked(&self, aggregator: &ScoreAggregator, weights: &WeightSet) -> Vec<RankedEntry<'_>> {
        let mut scored: Vec<(f64, &TickerResult)> = self
            .entries
            .iter()
            .map(|e| (aggregator.composite_for(e, weights), e))
            .collect();

        // Stable sort over entries already in input order
        scored.sort_by(|a, b| b.0.total_cmp(&a.0));

        scored
            .into_iter()
            .enumerate()
            .map(|(i, (composite, result))| RankedEntry {
                rank: i + 1,
                composite,
                result,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry<'a> {
    pub rank: usize,
    pub composite: f64,
    pub result: &'a TickerResult,
}

impl RankedEntry<'_> {
    pub fn ticker(&self) -> &str {
        &self.result.ticker
    }

    /// Warning text when the ticker was scored from annual filings
    pub fn warning(&self) -> Option<&'static str> {
        self.result.is_sparse().then_some(SPARSE_DATA_WARNING)
    }
}

/// A ticker excluded from the result set by a generic failure
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedTicker {
    pub ticker: String,
    pub reason: String,
}

/// A whole batch that failed (transport, rejection, malformed body)
#[derive(Debug, Clone, PartialEq)]
pub struct BatchError {
    pub endpoint: &'static str,
    pub error: DashboardError,
}

/// Everything one load cycle produced
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    pub results: ResultSet,
    /// Tickers the backend has no data for; candidates for remote fetch
    pub missing: Vec<String>,
    pub failed: Vec<FailedTicker>,
    pub batch_errors: Vec<BatchError>,
    pub status: LoadStatus,
}

impl LoadReport {
    pub fn empty() -> Self {
        Self {
            results: ResultSet::default(),
            missing: Vec::new(),
            failed: Vec::new(),
            batch_errors: Vec::new(),
            status: LoadStatus::Success,
        }
    }

    /// One-line banner for the load-level error, if any
    pub fn error_banner(&self) -> Option<String> {
        if self.batch_errors.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .batch_errors
            .iter()
            .map(|e| format!("{}: {}", e.endpoint, e.error))
            .collect();
        Some(parts.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;
    use valuation_core::{MetricKind, MetricScore};

    fn entry(ticker: &str, input_index: usize, valuation: f64, count: usize) -> TickerResult {
        let mut scores = BTreeMap::new();
        scores.insert(MetricKind::Valuation, MetricScore::new(valuation, BTreeMap::new(), count));
        TickerResult {
            ticker: ticker.to_string(),
            input_index,
            scores,
            chart: None,
        }
    }

    #[test]
    fn test_ranked_descending_with_stable_ties() {
        let set = ResultSet::new(vec![
            entry("C", 2, 70.0, 20),
            entry("A", 0, 70.0, 20),
            entry("B", 1, 90.0, 20),
            entry("D", 3, 10.0, 20),
        ]);
        let weights = WeightSet::from_valuation_percent(100.0).unwrap();

        let ranked = set.ranked(&ScoreAggregator::default(), &weights);
        let order: Vec<&str> = ranked.iter().map(|r| r.ticker()).collect();
        assert_eq!(order, vec!["B", "A", "C", "D"]);
        assert_eq!(ranked[0].rank, 1);
        assert_eq!(ranked[3].rank, 4);
        assert_relative_eq!(ranked[0].composite, 45.0);
    }

    #[test]
    fn test_reweighting_reorders_without_reload() {
        let mut a = entry("A", 0, 80.0, 20);
        a.scores.insert(MetricKind::Leverage, MetricScore::new(10.0, BTreeMap::new(), 20));
        let mut b = entry("B", 1, 60.0, 20);
        b.scores.insert(MetricKind::Leverage, MetricScore::new(90.0, BTreeMap::new(), 20));
        let set = ResultSet::new(vec![a, b]);
        let aggregator = ScoreAggregator::default();

        let by_valuation = set.ranked(&aggregator, &WeightSet::from_valuation_percent(100.0).unwrap());
        assert_eq!(by_valuation[0].ticker(), "A");

        let by_leverage = set.ranked(&aggregator, &WeightSet::from_valuation_percent(0.0).unwrap());
        assert_eq!(by_leverage[0].ticker(), "B");
    }

    #[test]
    fn test_sparse_warning() {
        let set = ResultSet::new(vec![entry("A", 0, 50.0, 4), entry("B", 1, 40.0, 12)]);
        let ranked = set.ranked(&ScoreAggregator::default(), &WeightSet::default());
        assert_eq!(ranked[0].warning(), Some(SPARSE_DATA_WARNING));
        assert_eq!(ranked[1].warning(), None);
    }

    #[test]
    fn test_error_banner() {
        let mut report = LoadReport::empty();
        assert!(report.error_banner().is_none());
        report.batch_errors.push(BatchError {
            endpoint: "batch-leverage-score",
            error: DashboardError::Transport("connection refused".to_string()),
        });
        assert_eq!(
            report.error_banner().unwrap(),
            "batch-leverage-score: Transport error: connection refused"
        );
    }
}
