//! Plain-text rendering of a load report for the terminal.

use dashboard_orchestrator::{LoadReport, RankedEntry, RemediationReport};
use std::fmt::Write;
use valuation_core::MetricKind;

fn metric_cell(entry: &RankedEntry<'_>, metric: MetricKind) -> String {
    entry
        .result
        .score(metric)
        .map(|s| format!("{:.1}", s.value))
        .unwrap_or_else(|| "-".to_string())
}

/// Ranked table, one row per ticker, highest composite first
pub fn format_ranking(ranked: &[RankedEntry<'_>]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:<8} {:>9} {:>9} {:>9}  {}",
        "Rank", "Ticker", "Composite", "Valuation", "Leverage", "Notes"
    );
    for entry in ranked {
        let _ = writeln!(
            out,
            "{:>4}  {:<8} {:>9.1} {:>9} {:>9}  {}",
            entry.rank,
            entry.ticker(),
            entry.composite,
            metric_cell(entry, MetricKind::Valuation),
            metric_cell(entry, MetricKind::Leverage),
            entry.warning().map(|w| format!("⚠ {}", w)).unwrap_or_default(),
        );
    }
    out
}

/// Error banner plus missing and failed ticker lists
pub fn format_exclusions(report: &LoadReport) -> String {
    let mut out = String::new();
    if let Some(banner) = report.error_banner() {
        let _ = writeln!(out, "Error: {}", banner);
    }
    if !report.missing.is_empty() {
        let _ = writeln!(out, "Missing data: {}", report.missing.join(", "));
    }
    for failed in &report.failed {
        let _ = writeln!(out, "Failed: {} ({})", failed.ticker, failed.reason);
    }
    out
}

pub fn format_remediation(report: &RemediationReport) -> String {
    let mut out = String::new();
    for o in &report.outcomes {
        let line = match (o.success, &o.warning, &o.error) {
            (true, Some(w), _) => format!("{}: ⚠️ {}", o.ticker, w),
            (true, None, _) => format!("{}: fetched", o.ticker),
            (false, _, e) => format!("{}: {}", o.ticker, e.as_deref().unwrap_or("fetch failed")),
        };
        let _ = writeln!(out, "{}", line);
    }
    out
}
