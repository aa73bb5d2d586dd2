//! JSON contract of the valuation backend.
//!
//! Every batch endpoint answers `{success, results: [...]}`. Per-ticker
//! entries carry their own `success` flag; `error_code: "MISSING_DATA"` marks
//! a ticker the backend has never seen.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{DashboardError, DashboardResult};
use crate::types::{series_names, MetricScore, MetricSeries, SeriesPoint, TickerOutcome};

/// Reserved sentinel for "no underlying data for this ticker"
pub const MISSING_DATA_CODE: &str = "MISSING_DATA";

pub mod endpoints {
    pub const BATCH_VALUATION_SCORE: &str = "batch-valuation-score";
    pub const BATCH_LEVERAGE_SCORE: &str = "batch-leverage-score";
    pub const BATCH_PRICE_EARNINGS_SERIES: &str = "batch-price-earnings-series";
    pub const FETCH_REMOTE_METRIC: &str = "fetch-remote-metric";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchValuationRequest {
    pub tickers: Vec<String>,
    pub years: u32,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchLeverageRequest {
    pub tickers: Vec<String>,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSeriesRequest {
    pub tickers: Vec<String>,
    pub years: u32,
    #[serde(rename = "includeForward")]
    pub include_forward: bool,
    /// Trailing rolling-mean window; 0 or 1 disables smoothing
    #[serde(default)]
    pub smoothing: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse<T> {
    pub success: bool,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
    #[serde(default)]
    pub error: Option<String>,
}

impl<T> BatchResponse<T> {
    pub fn ok(results: Vec<T>) -> Self {
        Self {
            success: true,
            results,
            error: None,
        }
    }

    /// Unwrap the per-ticker results, failing when the batch itself was rejected.
    pub fn into_results(self, endpoint: &str) -> DashboardResult<Vec<T>> {
        if !self.success {
            return Err(DashboardError::rejected(
                endpoint,
                self.error.unwrap_or_else(|| "success=false".to_string()),
            ));
        }
        Ok(self.results)
    }
}

/// Per-ticker entry of the valuation and leverage batches
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub ticker: String,
    pub success: bool,
    #[serde(default)]
    pub score_100: Option<f64>,
    #[serde(default)]
    pub details: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ScoreResult {
    /// Classify this entry. A success without a finite score is a malformed
    /// response, which fails the whole batch rather than rendering garbage.
    pub fn outcome(&self, endpoint: &str) -> DashboardResult<TickerOutcome<MetricScore>> {
        if !self.success {
            return Ok(classify_failure(
                self.error_code.as_deref(),
                self.error.as_deref(),
            ));
        }

        let value = match self.score_100 {
            Some(v) if v.is_finite() => v,
            Some(v) => {
                return Err(DashboardError::malformed(
                    endpoint,
                    format!("{}: non-finite score_100 {}", self.ticker, v),
                ))
            }
            None => {
                return Err(DashboardError::malformed(
                    endpoint,
                    format!("{}: success without score_100", self.ticker),
                ))
            }
        };

        let mut details = BTreeMap::new();
        let mut data_points = None;
        if let Some(raw) = &self.details {
            for (key, v) in raw {
                if let Some(n) = v.as_f64() {
                    if key == "data_points" {
                        data_points = v.as_u64().map(|c| c as usize);
                    }
                    details.insert(key.clone(), n);
                }
            }
        }

        let score = match data_points {
            Some(count) => MetricScore::new(value, details, count),
            None => MetricScore::without_count(value, details),
        };
        Ok(TickerOutcome::Success(score))
    }
}

/// Per-ticker entry of the price/earnings series batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesResult {
    pub ticker: String,
    pub success: bool,
    #[serde(default)]
    pub pe_ttm: Option<Vec<SeriesPoint>>,
    #[serde(default)]
    pub pe_forward: Option<Vec<SeriesPoint>>,
    #[serde(default)]
    pub price: Option<Vec<SeriesPoint>>,
    #[serde(default)]
    pub data_points: Option<usize>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Named series extracted from a successful series entry
#[derive(Debug, Clone, PartialEq)]
pub struct TickerSeries {
    pub series: Vec<MetricSeries>,
    pub data_point_count: usize,
}

impl SeriesResult {
    pub fn outcome(&self) -> TickerOutcome<TickerSeries> {
        if !self.success {
            return classify_failure(self.error_code.as_deref(), self.error.as_deref());
        }

        let series: Vec<MetricSeries> = [
            (series_names::PE_TTM, &self.pe_ttm),
            (series_names::PE_FORWARD, &self.pe_forward),
            (series_names::PRICE, &self.price),
        ]
        .into_iter()
        .filter_map(|(name, points)| {
            points
                .as_ref()
                .map(|p| MetricSeries::new(name, p.clone()))
        })
        .collect();

        let data_point_count = self.data_points.unwrap_or_else(|| {
            series
                .iter()
                .find(|s| s.name == series_names::PE_TTM)
                .map(|s| s.points.len())
                .unwrap_or(0)
        });

        TickerOutcome::Success(TickerSeries {
            series,
            data_point_count,
        })
    }
}

/// Response of the remediation endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFetchResponse {
    pub success: bool,
    #[serde(default)]
    pub warning: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

fn classify_failure<T>(error_code: Option<&str>, error: Option<&str>) -> TickerOutcome<T> {
    if error_code == Some(MISSING_DATA_CODE) {
        TickerOutcome::MissingData
    } else {
        TickerOutcome::Failed(error.unwrap_or("unknown error").to_string())
    }
}
