use async_trait::async_trait;

use crate::error::DashboardResult;
use crate::wire::{
    BatchLeverageRequest, BatchResponse, BatchSeriesRequest, BatchValuationRequest,
    RemoteFetchResponse, ScoreResult, SeriesResult,
};

/// Source of per-ticker scores and chart series.
///
/// Implemented by the HTTP client and by the offline fixture backend. Each
/// method is one batched call covering every requested ticker.
#[async_trait]
pub trait ValuationBackend: Send + Sync {
    async fn batch_valuation_score(
        &self,
        request: &BatchValuationRequest,
    ) -> DashboardResult<BatchResponse<ScoreResult>>;

    async fn batch_leverage_score(
        &self,
        request: &BatchLeverageRequest,
    ) -> DashboardResult<BatchResponse<ScoreResult>>;

    async fn batch_price_earnings_series(
        &self,
        request: &BatchSeriesRequest,
    ) -> DashboardResult<BatchResponse<SeriesResult>>;

    /// Ask the backend to acquire data for a ticker it reported as missing.
    async fn fetch_remote_metric(&self, ticker: &str) -> DashboardResult<RemoteFetchResponse>;

    fn backend_name(&self) -> &'static str;
}
