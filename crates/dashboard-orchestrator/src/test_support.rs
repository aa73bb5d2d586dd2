//! Scripted in-memory backends for orchestrator tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::Semaphore;
use valuation_core::{
    calendar_date, BatchLeverageRequest, BatchResponse, BatchSeriesRequest,
    BatchValuationRequest, DashboardResult, RemoteFetchResponse, ScoreResult, SeriesPoint,
    SeriesResult, ValuationBackend, MISSING_DATA_CODE,
};

pub(crate) fn score_ok(ticker: &str, score: f64, data_points: u64) -> ScoreResult {
    let mut details = BTreeMap::new();
    details.insert("data_points".to_string(), serde_json::json!(data_points));
    ScoreResult {
        ticker: ticker.to_string(),
        success: true,
        score_100: Some(score),
        details: Some(details),
        error_code: None,
        error: None,
    }
}

pub(crate) fn score_missing(ticker: &str) -> ScoreResult {
    ScoreResult {
        ticker: ticker.to_string(),
        success: false,
        score_100: None,
        details: None,
        error_code: Some(MISSING_DATA_CODE.to_string()),
        error: Some("not found".to_string()),
    }
}

pub(crate) fn score_failed(ticker: &str, error: &str) -> ScoreResult {
    ScoreResult {
        ticker: ticker.to_string(),
        success: false,
        score_100: None,
        details: None,
        error_code: None,
        error: Some(error.to_string()),
    }
}

/// `points` are (date, P/E, price)
pub(crate) fn series_ok(ticker: &str, points: &[(&str, f64, f64)], data_points: usize) -> SeriesResult {
    let mut pe = Vec::new();
    let mut price = Vec::new();
    for (raw, p, px) in points {
        let date = calendar_date::parse(raw).unwrap();
        pe.push(SeriesPoint::new(date, *p));
        price.push(SeriesPoint::new(date, *px));
    }
    SeriesResult {
        ticker: ticker.to_string(),
        success: true,
        pe_ttm: Some(pe),
        pe_forward: None,
        price: Some(price),
        data_points: Some(data_points),
        error_code: None,
        error: None,
    }
}

/// Replays fixed batch responses and counts calls.
pub(crate) struct ScriptedBackend {
    valuation: DashboardResult<BatchResponse<ScoreResult>>,
    leverage: DashboardResult<BatchResponse<ScoreResult>>,
    series: DashboardResult<BatchResponse<SeriesResult>>,
    remote: BTreeMap<String, RemoteFetchResponse>,
    valuation_calls: AtomicUsize,
    leverage_calls: AtomicUsize,
    series_calls: AtomicUsize,
    last_tickers: Mutex<Vec<String>>,
    remote_requests: Mutex<Vec<String>>,
}

impl ScriptedBackend {
    pub(crate) fn new(
        valuation: DashboardResult<BatchResponse<ScoreResult>>,
        leverage: DashboardResult<BatchResponse<ScoreResult>>,
        series: DashboardResult<BatchResponse<SeriesResult>>,
    ) -> Self {
        Self {
            valuation,
            leverage,
            series,
            remote: BTreeMap::new(),
            valuation_calls: AtomicUsize::new(0),
            leverage_calls: AtomicUsize::new(0),
            series_calls: AtomicUsize::new(0),
            last_tickers: Mutex::new(Vec::new()),
            remote_requests: Mutex::new(Vec::new()),
        }
    }

    /// Every ticker succeeds on every metric with a score of 50
    pub(crate) fn all_ok(tickers: &[&str]) -> Self {
        Self::new(
            Ok(BatchResponse::ok(tickers.iter().map(|t| score_ok(t, 50.0, 20)).collect())),
            Ok(BatchResponse::ok(tickers.iter().map(|t| score_ok(t, 50.0, 20)).collect())),
            Ok(BatchResponse::ok(
                tickers
                    .iter()
                    .map(|t| series_ok(t, &[("2024-01-02", 20.0, 100.0)], 20))
                    .collect(),
            )),
        )
    }

    pub(crate) fn with_remote(mut self, ticker: &str, response: RemoteFetchResponse) -> Self {
        self.remote.insert(ticker.to_string(), response);
        self
    }

    /// (valuation, leverage, series) call counts
    pub(crate) fn calls(&self) -> (usize, usize, usize) {
        (
            self.valuation_calls.load(Ordering::SeqCst),
            self.leverage_calls.load(Ordering::SeqCst),
            self.series_calls.load(Ordering::SeqCst),
        )
    }

    pub(crate) fn last_valuation_tickers(&self) -> Vec<String> {
        self.last_tickers.lock().unwrap().clone()
    }

    pub(crate) fn remote_requests(&self) -> Vec<String> {
        self.remote_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ValuationBackend for ScriptedBackend {
    async fn batch_valuation_score(
        &self,
        request: &BatchValuationRequest,
    ) -> DashboardResult<BatchResponse<ScoreResult>> {
        self.valuation_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_tickers.lock().unwrap() = request.tickers.clone();
        self.valuation.clone()
    }

    async fn batch_leverage_score(
        &self,
        _request: &BatchLeverageRequest,
    ) -> DashboardResult<BatchResponse<ScoreResult>> {
        self.leverage_calls.fetch_add(1, Ordering::SeqCst);
        self.leverage.clone()
    }

    async fn batch_price_earnings_series(
        &self,
        _request: &BatchSeriesRequest,
    ) -> DashboardResult<BatchResponse<SeriesResult>> {
        self.series_calls.fetch_add(1, Ordering::SeqCst);
        self.series.clone()
    }

    async fn fetch_remote_metric(&self, ticker: &str) -> DashboardResult<RemoteFetchResponse> {
        self.remote_requests.lock().unwrap().push(ticker.to_string());
        Ok(self.remote.get(ticker).cloned().unwrap_or(RemoteFetchResponse {
            success: false,
            warning: None,
            error: Some("unknown ticker".to_string()),
        }))
    }

    fn backend_name(&self) -> &'static str {
        "scripted"
    }
}

/// Valuation scores depend on the call number; the first valuation call
/// blocks until the test releases the gate.
pub(crate) struct GatedBackend {
    pub(crate) gate: Semaphore,
    calls: AtomicUsize,
    remote_warning: Option<String>,
}

impl GatedBackend {
    pub(crate) fn new() -> Self {
        Self {
            gate: Semaphore::new(0),
            calls: AtomicUsize::new(0),
            remote_warning: None,
        }
    }

    /// Remote fetches succeed with `warning`
    pub(crate) fn with_remote_warning(mut self, warning: &str) -> Self {
        self.remote_warning = Some(warning.to_string());
        self
    }

    pub(crate) fn valuation_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Score handed out by the n-th valuation call
    pub(crate) fn score_for_call(n: usize) -> f64 {
        10.0 + 10.0 * n as f64
    }
}

#[async_trait]
impl ValuationBackend for GatedBackend {
    async fn batch_valuation_score(
        &self,
        request: &BatchValuationRequest,
    ) -> DashboardResult<BatchResponse<ScoreResult>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n == 0 {
            let _permit = self.gate.acquire().await;
        }
        Ok(BatchResponse::ok(
            request
                .tickers
                .iter()
                .map(|t| score_ok(t, Self::score_for_call(n), 20))
                .collect(),
        ))
    }

    async fn batch_leverage_score(
        &self,
        _request: &BatchLeverageRequest,
    ) -> DashboardResult<BatchResponse<ScoreResult>> {
        Ok(BatchResponse::ok(vec![]))
    }

    async fn batch_price_earnings_series(
        &self,
        _request: &BatchSeriesRequest,
    ) -> DashboardResult<BatchResponse<SeriesResult>> {
        Ok(BatchResponse::ok(vec![]))
    }

    async fn fetch_remote_metric(&self, _ticker: &str) -> DashboardResult<RemoteFetchResponse> {
        Ok(RemoteFetchResponse {
            success: self.remote_warning.is_some(),
            warning: self.remote_warning.clone(),
            error: None,
        })
    }

    fn backend_name(&self) -> &'static str {
        "gated"
    }
}
