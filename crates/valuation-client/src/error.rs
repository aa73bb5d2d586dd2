use thiserror::Error;
use valuation_core::DashboardError;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("{endpoint} returned status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Could not decode {endpoint} response: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Fixture error: {0}")]
    Fixture(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl From<ClientError> for DashboardError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::RequestFailed(e) => DashboardError::Transport(e.to_string()),
            ClientError::Status { endpoint, status } => {
                DashboardError::rejected(&endpoint, format!("HTTP {}", status))
            }
            ClientError::Decode { endpoint, source } => {
                DashboardError::malformed(&endpoint, source.to_string())
            }
            ClientError::InvalidConfig(msg) | ClientError::Fixture(msg) => {
                DashboardError::InvalidInput(msg)
            }
            ClientError::Io(e) => DashboardError::Transport(e.to_string()),
        }
    }
}
