//! Offline backend serving scores and series from a JSON fixture file.
//!
//! Valuation scores are computed locally from the fixture's P/E history with
//! the same reversion method the service uses. Tickers absent from the file
//! are reported as missing data; remote fetching is not available.

use async_trait::async_trait;
use chrono::{Months, NaiveDate};
use score_engine::{pe_reversion_score, rolling_mean, PeReversionConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use valuation_core::{
    BatchLeverageRequest, BatchResponse, BatchSeriesRequest, BatchValuationRequest,
    DashboardResult, RemoteFetchResponse, ScoreResult, SeriesPoint, SeriesResult,
    ValuationBackend, MISSING_DATA_CODE,
};

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureTicker {
    #[serde(default)]
    pub pe_ttm: Vec<SeriesPoint>,
    #[serde(default)]
    pub pe_forward: Vec<SeriesPoint>,
    #[serde(default)]
    pub price: Vec<SeriesPoint>,
    /// Precomputed debt-to-equity score, if the fixture has one
    #[serde(default)]
    pub leverage_score: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FixtureFile {
    tickers: HashMap<String, FixtureTicker>,
}

pub struct FixtureBackend {
    tickers: HashMap<String, FixtureTicker>,
}

impl FixtureBackend {
    pub fn from_json(raw: &str) -> ClientResult<Self> {
        let file: FixtureFile = serde_json::from_str(raw)
            .map_err(|e| ClientError::Fixture(format!("invalid fixture: {}", e)))?;
        let tickers = file
            .tickers
            .into_iter()
            .map(|(ticker, data)| (ticker.to_uppercase(), data))
            .collect();
        Ok(Self { tickers })
    }

    pub fn from_path(path: impl AsRef<Path>) -> ClientResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let backend = Self::from_json(&raw)?;
        tracing::info!(
            "Loaded fixture {} with {} tickers",
            path.as_ref().display(),
            backend.tickers.len()
        );
        Ok(backend)
    }

    fn lookup(&self, ticker: &str) -> Option<&FixtureTicker> {
        self.tickers.get(&ticker.to_uppercase())
    }
}

fn missing_score(ticker: &str) -> ScoreResult {
    ScoreResult {
        ticker: ticker.to_string(),
        success: false,
        score_100: None,
        details: None,
        error_code: Some(MISSING_DATA_CODE.to_string()),
        error: Some(format!("{} not found in fixture", ticker)),
    }
}

fn failed_score(ticker: &str, error: String) -> ScoreResult {
    ScoreResult {
        ticker: ticker.to_string(),
        success: false,
        score_100: None,
        details: None,
        error_code: None,
        error: Some(error),
    }
}

/// Points within `years` of the series' latest date
fn trailing_window(points: &[SeriesPoint], years: u32) -> Vec<SeriesPoint> {
    let Some(latest) = points.iter().map(|p| p.date).max() else {
        return Vec::new();
    };
    let cutoff = latest
        .checked_sub_months(Months::new(years * 12))
        .unwrap_or(NaiveDate::MIN);
    points.iter().filter(|p| p.date >= cutoff).copied().collect()
}

#[async_trait]
impl ValuationBackend for FixtureBackend {
    async fn batch_valuation_score(
        &self,
        request: &BatchValuationRequest,
    ) -> DashboardResult<BatchResponse<ScoreResult>> {
        let config = PeReversionConfig { years: request.years };
        let results = request
            .tickers
            .iter()
            .map(|ticker| {
                let Some(data) = self.lookup(ticker) else {
                    return missing_score(ticker);
                };
                match pe_reversion_score(&data.pe_ttm, &config) {
                    Ok(score) => ScoreResult {
                        ticker: ticker.clone(),
                        success: true,
                        score_100: Some(score.value),
                        details: Some(
                            score
                                .details
                                .iter()
                                .map(|(k, v)| (k.clone(), serde_json::json!(v)))
                                .chain(score.data_point_count.map(|n| {
                                    ("data_points".to_string(), serde_json::json!(n))
                                }))
                                .collect(),
                        ),
                        error_code: None,
                        error: None,
                    },
                    Err(e) => failed_score(ticker, e.to_string()),
                }
            })
            .collect();
        Ok(BatchResponse::ok(results))
    }

    async fn batch_leverage_score(
        &self,
        request: &BatchLeverageRequest,
    ) -> DashboardResult<BatchResponse<ScoreResult>> {
        let results = request
            .tickers
            .iter()
            .map(|ticker| match self.lookup(ticker) {
                None => missing_score(ticker),
                Some(FixtureTicker {
                    leverage_score: Some(score),
                    ..
                }) => ScoreResult {
                    ticker: ticker.clone(),
                    success: true,
                    score_100: Some(*score),
                    details: None,
                    error_code: None,
                    error: None,
                },
                Some(_) => failed_score(ticker, "no leverage data in fixture".to_string()),
            })
            .collect();
        Ok(BatchResponse::ok(results))
    }

    async fn batch_price_earnings_series(
        &self,
        request: &BatchSeriesRequest,
    ) -> DashboardResult<BatchResponse<SeriesResult>> {
        let window = request.smoothing as usize;
        let results = request
            .tickers
            .iter()
            .map(|ticker| {
                let Some(data) = self.lookup(ticker) else {
                    return SeriesResult {
                        ticker: ticker.clone(),
                        success: false,
                        pe_ttm: None,
                        pe_forward: None,
                        price: None,
                        data_points: None,
                        error_code: Some(MISSING_DATA_CODE.to_string()),
                        error: Some(format!("{} not found in fixture", ticker)),
                    };
                };

                let pe_ttm = trailing_window(&data.pe_ttm, request.years);
                let data_points = pe_ttm.iter().filter(|p| p.value.is_some()).count();
                let pe_forward = (request.include_forward && !data.pe_forward.is_empty())
                    .then(|| rolling_mean(&trailing_window(&data.pe_forward, request.years), window));

                SeriesResult {
                    ticker: ticker.clone(),
                    success: true,
                    pe_ttm: Some(rolling_mean(&pe_ttm, window)),
                    pe_forward,
                    price: Some(rolling_mean(&trailing_window(&data.price, request.years), window)),
                    data_points: Some(data_points),
                    error_code: None,
                    error: None,
                }
            })
            .collect();
        Ok(BatchResponse::ok(results))
    }

    async fn fetch_remote_metric(&self, ticker: &str) -> DashboardResult<RemoteFetchResponse> {
        tracing::warn!("Fixture backend cannot fetch remote data for {}", ticker);
        Ok(RemoteFetchResponse {
            success: false,
            warning: None,
            error: Some("remote fetch is not available in fixture mode".to_string()),
        })
    }

    fn backend_name(&self) -> &'static str {
        "fixture"
    }
}
