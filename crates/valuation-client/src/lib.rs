//! Valuation backend clients.
//!
//! [`HttpValuationBackend`] talks to the valuation service over HTTP/JSON;
//! [`FixtureBackend`] serves the same contract from a local JSON file.

pub mod config;
pub mod error;
pub mod fixture;
pub mod http;

pub use config::BackendConfig;
pub use error::{ClientError, ClientResult};
pub use fixture::{FixtureBackend, FixtureTicker};
pub use http::HttpValuationBackend;
