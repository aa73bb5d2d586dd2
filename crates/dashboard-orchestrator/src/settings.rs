use serde::{Deserialize, Serialize};
use valuation_core::{DashboardError, DashboardResult};

pub const MAX_YEARS: u32 = 10;
pub const MAX_CHART_YEARS: u32 = 20;

/// Per-load request parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSettings {
    /// Look-back for the valuation score
    pub years: u32,
    /// History shown on the chart
    pub chart_years: u32,
    pub include_forward: bool,
    /// Rolling-mean window applied to chart series; 0 disables
    pub smoothing: u32,
    /// Earnings data source name forwarded to the backend
    pub source: String,
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            years: 2,
            chart_years: 5,
            include_forward: true,
            smoothing: 0,
            source: "manual".to_string(),
        }
    }
}

impl LoadSettings {
    pub fn validate(&self) -> DashboardResult<()> {
        if !(1..=MAX_YEARS).contains(&self.years) {
            return Err(DashboardError::InvalidInput(format!(
                "years must be between 1 and {}, got {}",
                MAX_YEARS, self.years
            )));
        }
        if !(1..=MAX_CHART_YEARS).contains(&self.chart_years) {
            return Err(DashboardError::InvalidInput(format!(
                "chart_years must be between 1 and {}, got {}",
                MAX_CHART_YEARS, self.chart_years
            )));
        }
        if self.source.trim().is_empty() {
            return Err(DashboardError::InvalidInput("source must not be empty".to_string()));
        }
        Ok(())
    }
}
