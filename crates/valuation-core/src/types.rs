use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Fewer observations than this means the backend fell back to annual
/// filings instead of quarterly ones.
pub const SPARSE_DATA_THRESHOLD: usize = 8;

/// Score assumed for a metric slot with no data.
pub const NEUTRAL_SCORE: f64 = 50.0;

pub const SPARSE_DATA_WARNING: &str = "Using annual data instead of quarterly";

/// Well-known chart series names.
pub mod series_names {
    pub const PE_TTM: &str = "peTtm";
    pub const PE_FORWARD: &str = "peForward";
    pub const PRICE: &str = "price";
}

/// Metric slots exposed to the user for composite scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    /// P/E average reversion score
    Valuation,
    /// Debt-to-equity score
    Leverage,
}

impl MetricKind {
    pub const ALL: [MetricKind; 2] = [MetricKind::Valuation, MetricKind::Leverage];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Valuation => "valuation",
            MetricKind::Leverage => "leverage",
        }
    }

    /// Human-readable label for the metric
    pub fn to_label(&self) -> &'static str {
        match self {
            MetricKind::Valuation => "P/E Average Reversion",
            MetricKind::Leverage => "Debt-to-Equity",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One dated observation. `value` is `None` when the source had a gap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    #[serde(with = "crate::calendar_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub value: Option<f64>,
}

impl SeriesPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        Self {
            date,
            value: Some(value),
        }
    }

    pub fn gap(date: NaiveDate) -> Self {
        Self { date, value: None }
    }
}

/// A named sequence of observations. Dates need not be sorted, nor aligned
/// with other series of the same ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSeries {
    pub name: String,
    pub points: Vec<SeriesPoint>,
}

impl MetricSeries {
    pub fn new(name: impl Into<String>, points: Vec<SeriesPoint>) -> Self {
        Self {
            name: name.into(),
            points,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One calendar date with a slot for every subscribed series.
///
/// A series with no observation on this date is present with `None`, never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedPoint {
    #[serde(with = "crate::calendar_date")]
    pub date: NaiveDate,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<f64>>,
}

impl MergedPoint {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, series: &str) -> Option<f64> {
        self.values.get(series).copied().flatten()
    }

    pub fn has(&self, series: &str) -> bool {
        self.get(series).is_some()
    }
}

/// A 0-100 score for one metric of one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    pub value: f64,
    /// Supporting statistics (current/avg/min/max, sub-scores)
    pub details: BTreeMap<String, f64>,
    /// `None` when the backend did not report how many observations it used
    pub data_point_count: Option<usize>,
}

impl MetricScore {
    /// Build a score, clamping into [0, 100]. NaN collapses to neutral.
    pub fn new(value: f64, details: BTreeMap<String, f64>, data_point_count: usize) -> Self {
        let value = if value.is_nan() {
            NEUTRAL_SCORE
        } else {
            value.clamp(0.0, 100.0)
        };

        Self {
            value,
            details,
            data_point_count: Some(data_point_count),
        }
    }

    /// Same as [`MetricScore::new`] for sources that do not report a count.
    pub fn without_count(value: f64, details: BTreeMap<String, f64>) -> Self {
        Self {
            data_point_count: None,
            ..Self::new(value, details, 0)
        }
    }

    /// An unknown count is not treated as sparse.
    pub fn is_sparse(&self) -> bool {
        matches!(self.data_point_count, Some(n) if n < SPARSE_DATA_THRESHOLD)
    }

    pub fn detail(&self, key: &str) -> Option<f64> {
        self.details.get(key).copied()
    }
}

/// User-assigned weight for one metric slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weight {
    pub metric: MetricKind,
    pub weight_percent: f64,
}

impl Weight {
    pub fn new(metric: MetricKind, weight_percent: f64) -> Self {
        Self {
            metric,
            weight_percent,
        }
    }
}

/// Merged chart series for one ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    /// Series names that were subscribed, in display order
    pub series: Vec<String>,
    pub points: Vec<MergedPoint>,
    /// Observation count reported by the backend
    pub data_point_count: usize,
}

impl ChartData {
    pub fn is_sparse(&self) -> bool {
        self.data_point_count < SPARSE_DATA_THRESHOLD
    }
}

/// Everything loaded for one ticker in one load cycle.
///
/// Built once per cycle and replaced wholesale on the next load. The
/// composite score is not stored here; it is derived from `scores` and the
/// current weights whenever it is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerResult {
    pub ticker: String,
    /// Position of the ticker in the user's input list, used to break ties
    pub input_index: usize,
    pub scores: BTreeMap<MetricKind, MetricScore>,
    pub chart: Option<ChartData>,
}

impl TickerResult {
    pub fn score(&self, metric: MetricKind) -> Option<&MetricScore> {
        self.scores.get(&metric)
    }

    /// Sparse when either the primary score or the chart history was built
    /// from annual rather than quarterly data.
    pub fn is_sparse(&self) -> bool {
        let score_sparse = self
            .score(MetricKind::Valuation)
            .map(|s| s.is_sparse())
            .unwrap_or(false);
        let chart_sparse = self.chart.as_ref().map(|c| c.is_sparse()).unwrap_or(false);
        score_sparse || chart_sparse
    }
}

/// Per-ticker outcome of one batch call
#[derive(Debug, Clone, PartialEq)]
pub enum TickerOutcome<T> {
    Success(T),
    /// The backend has no underlying data for this ticker; remediation possible
    MissingData,
    Failed(String),
}

impl<T> TickerOutcome<T> {
    pub fn success(self) -> Option<T> {
        match self {
            TickerOutcome::Success(v) => Some(v),
            _ => None,
        }
    }
}
