use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DashboardError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Backend rejected {endpoint}: {message}")]
    BackendRejected { endpoint: String, message: String },

    #[error("Malformed response from {endpoint}: {message}")]
    MalformedResponse { endpoint: String, message: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Invalid weights: {0}")]
    InvalidWeights(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Load cycle {0} was superseded")]
    Superseded(u64),
}

impl DashboardError {
    pub fn malformed(endpoint: &str, message: impl Into<String>) -> Self {
        Self::MalformedResponse {
            endpoint: endpoint.to_string(),
            message: message.into(),
        }
    }

    pub fn rejected(endpoint: &str, message: impl Into<String>) -> Self {
        Self::BackendRejected {
            endpoint: endpoint.to_string(),
            message: message.into(),
        }
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;
