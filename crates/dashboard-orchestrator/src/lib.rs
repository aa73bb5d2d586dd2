//! Dashboard Orchestrator
//!
//! Runs load cycles against a [`valuation_core::ValuationBackend`]: one
//! batched request per metric, fan-in, reconciliation into a [`ResultSet`],
//! and a generation-guarded [`LoadController`] so only the newest cycle is
//! ever shown.

pub mod builder;
pub mod controller;
pub mod result_set;
pub mod settings;

#[cfg(test)]
pub(crate) mod test_support;

pub use builder::{normalize_tickers, parse_ticker_list, ResultSetBuilder};
pub use controller::{LoadController, LoadPhase, LoadSnapshot, RemediationOutcome, RemediationReport};
pub use result_set::{BatchError, FailedTicker, LoadReport, LoadStatus, RankedEntry, ResultSet};
pub use settings::{LoadSettings, MAX_CHART_YEARS, MAX_YEARS};
