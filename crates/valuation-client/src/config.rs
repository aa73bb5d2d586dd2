use reqwest::Url;
use std::env;
use std::time::Duration;

use crate::error::{ClientError, ClientResult};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_SOURCE: &str = "manual";

/// Connection settings for the valuation backend
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout: Duration,
    /// Earnings data source forwarded on score requests
    pub source: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            source: DEFAULT_SOURCE.to_string(),
        }
    }
}

impl BackendConfig {
    pub fn from_env() -> ClientResult<Self> {
        let base_url = env::var("VALUATION_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let timeout_secs: u64 = env::var("VALUATION_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
            .parse()
            .map_err(|e| ClientError::InvalidConfig(format!("VALUATION_TIMEOUT_SECS: {}", e)))?;
        let source = env::var("VALUATION_SOURCE").unwrap_or_else(|_| DEFAULT_SOURCE.to_string());

        let config = Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            source,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ClientResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ClientError::InvalidConfig(format!(
                "base URL must be http(s): {}",
                self.base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(ClientError::InvalidConfig("timeout must be positive".to_string()));
        }
        if self.source.trim().is_empty() {
            return Err(ClientError::InvalidConfig("source must not be empty".to_string()));
        }
        Ok(())
    }

    /// `base_url/endpoint` without doubled slashes
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint)
    }

    /// `base_url/endpoint/{ticker}` with the ticker percent-encoded as a
    /// single path segment
    pub fn ticker_url(&self, endpoint: &str, ticker: &str) -> ClientResult<Url> {
        let mut url = Url::parse(&self.endpoint_url(endpoint))
            .map_err(|e| ClientError::InvalidConfig(format!("invalid base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidConfig("base URL cannot take a path".to_string()))?
            .push(ticker);
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url() {
        let config = BackendConfig {
            base_url: "http://localhost:5000/api/".to_string(),
            ..BackendConfig::default()
        };
        assert_eq!(
            config.endpoint_url("batch-valuation-score"),
            "http://localhost:5000/api/batch-valuation-score"
        );
    }

    #[test]
    fn test_ticker_url_encodes_symbol() {
        let config = BackendConfig::default();
        let url = config.ticker_url("fetch-remote-metric", "BRK/B").unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/fetch-remote-metric/BRK%2FB"
        );

        let url = config.ticker_url("fetch-remote-metric", "AMD").unwrap();
        assert_eq!(url.path(), "/api/fetch-remote-metric/AMD");
    }

    #[test]
    fn test_validate() {
        assert!(BackendConfig::default().validate().is_ok());

        let bad_url = BackendConfig {
            base_url: "localhost:5000".to_string(),
            ..BackendConfig::default()
        };
        assert!(bad_url.validate().is_err());

        let zero_timeout = BackendConfig {
            timeout: Duration::ZERO,
            ..BackendConfig::default()
        };
        assert!(zero_timeout.validate().is_err());
    }
}
