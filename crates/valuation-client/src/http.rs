use async_trait::async_trait;
use reqwest::IntoUrl;
use serde::de::DeserializeOwned;
use serde::Serialize;
use valuation_core::{
    endpoints, BatchLeverageRequest, BatchResponse, BatchSeriesRequest, BatchValuationRequest,
    DashboardResult, RemoteFetchResponse, ScoreResult, SeriesResult, ValuationBackend,
};

use crate::config::BackendConfig;
use crate::error::{ClientError, ClientResult};

/// Valuation backend reached over HTTP/JSON.
#[derive(Clone)]
pub struct HttpValuationBackend {
    client: reqwest::Client,
    config: BackendConfig,
}

impl HttpValuationBackend {
    pub fn new(config: BackendConfig) -> ClientResult<Self> {
        config.validate()?;
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> ClientResult<Self> {
        Self::new(BackendConfig::from_env()?)
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Earnings source forwarded on score requests
    pub fn source(&self) -> &str {
        &self.config.source
    }

    async fn post_json<U, B, T>(&self, endpoint: &str, url: U, body: Option<&B>) -> ClientResult<T>
    where
        U: IntoUrl,
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let mut request = self.client.post(url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            return Err(ClientError::Status {
                endpoint: endpoint.to_string(),
                status: response.status().as_u16(),
            });
        }

        // Decode from bytes so a bad body surfaces as a decode error for
        // this endpoint rather than a generic transport failure.
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|source| ClientError::Decode {
            endpoint: endpoint.to_string(),
            source,
        })
    }

    async fn post_batch<B, T>(&self, endpoint: &str, body: &B, tickers: usize) -> DashboardResult<BatchResponse<T>>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        tracing::debug!("POST {} for {} tickers", endpoint, tickers);
        let result = self
            .post_json(endpoint, self.config.endpoint_url(endpoint), Some(body))
            .await;
        if let Err(e) = &result {
            tracing::warn!("{} failed: {}", endpoint, e);
        }
        Ok(result?)
    }

    /// Check service health. Any non-2xx answer counts as unhealthy; an
    /// unreachable service is an error.
    pub async fn health(&self) -> ClientResult<bool> {
        let response = self
            .client
            .get(self.config.endpoint_url("health"))
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}

#[async_trait]
impl ValuationBackend for HttpValuationBackend {
    async fn batch_valuation_score(
        &self,
        request: &BatchValuationRequest,
    ) -> DashboardResult<BatchResponse<ScoreResult>> {
        self.post_batch(endpoints::BATCH_VALUATION_SCORE, request, request.tickers.len())
            .await
    }

    async fn batch_leverage_score(
        &self,
        request: &BatchLeverageRequest,
    ) -> DashboardResult<BatchResponse<ScoreResult>> {
        self.post_batch(endpoints::BATCH_LEVERAGE_SCORE, request, request.tickers.len())
            .await
    }

    async fn batch_price_earnings_series(
        &self,
        request: &BatchSeriesRequest,
    ) -> DashboardResult<BatchResponse<SeriesResult>> {
        self.post_batch(endpoints::BATCH_PRICE_EARNINGS_SERIES, request, request.tickers.len())
            .await
    }

    async fn fetch_remote_metric(&self, ticker: &str) -> DashboardResult<RemoteFetchResponse> {
        let url = self.config.ticker_url(endpoints::FETCH_REMOTE_METRIC, ticker)?;
        tracing::info!("Requesting remote data for {}", ticker);
        let response = self
            .post_json::<_, (), RemoteFetchResponse>(endpoints::FETCH_REMOTE_METRIC, url, None)
            .await?;
        Ok(response)
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}
