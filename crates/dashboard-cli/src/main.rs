//! pe-dashboard: load P/E valuation and leverage scores for a ticker list,
//! print the ranking and optionally write gauge and chart SVGs.
//!
//! Usage:
//!   cargo run -p dashboard-cli -- --tickers NFLX,AMD,GOOG
//!   cargo run -p dashboard-cli -- --fixture data/sample_fixture.json --svg-dir out
//!   cargo run -p dashboard-cli -- --valuation-weight 90 --fetch-missing

use anyhow::{Context, Result};
use dashboard_orchestrator::{LoadController, LoadReport, ResultSetBuilder};
use dashboard_render::{ChartOptions, ChartWidget, GaugeWidget, ThemeBus};
use score_engine::ScoreAggregator;
use std::path::Path;
use std::sync::Arc;
use valuation_client::{FixtureBackend, HttpValuationBackend};
use valuation_core::ValuationBackend;

mod config;
mod report;

use config::{AppConfig, CliArgs};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let default_filter = "dashboard_cli=info,dashboard_orchestrator=info,valuation_client=warn";
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
            )
            .init();
    }

    let raw_args: Vec<String> = std::env::args().skip(1).collect();
    let args = match CliArgs::parse(&raw_args) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{:#}", e);
            config::print_usage();
            std::process::exit(1);
        }
    };
    if args.help {
        config::print_usage();
        return Ok(());
    }

    let mut config = AppConfig::from_env()?;
    config.apply(&args)?;

    let backend: Arc<dyn ValuationBackend> = match &args.fixture {
        Some(path) => {
            tracing::info!("Using fixture data from {}", path.display());
            Arc::new(FixtureBackend::from_path(path)?)
        }
        None => {
            tracing::info!("Using valuation API at {}", config.backend.base_url);
            let http = HttpValuationBackend::new(config.backend.clone())?;
            match http.health().await {
                Ok(true) => tracing::debug!("Valuation API is healthy"),
                Ok(false) => tracing::warn!("Valuation API health check failed, loading anyway"),
                Err(e) => tracing::warn!("Valuation API unreachable: {}", e),
            }
            Arc::new(http)
        }
    };

    let aggregator = ScoreAggregator::new(config.scoring.clone())?;
    let controller = LoadController::new(ResultSetBuilder::new(backend, config.load.clone())?);

    tracing::info!(
        "Loading {} tickers ({}y valuation, {}y chart)",
        config.tickers.len(),
        config.load.years,
        config.load.chart_years
    );
    let mut report = controller.load(&config.tickers).await?;
    print_report(&report, &aggregator, &config);

    if args.fetch_missing && !report.missing.is_empty() {
        println!();
        println!("Fetching remote data for {}...", report.missing.join(", "));
        let remediation = controller.fetch_missing(&report.missing, &config.tickers).await?;
        print!("{}", report::format_remediation(&remediation));

        if let Some(reloaded) = remediation.reloaded {
            println!();
            print_report(&reloaded, &aggregator, &config);
            report = reloaded;
        }
    }

    if let Some(dir) = &args.svg_dir {
        let written = write_svgs(&report, &config, dir)?;
        tracing::info!("Wrote {} SVG files to {}", written, dir.display());
    }

    Ok(())
}

fn print_report(report: &LoadReport, aggregator: &ScoreAggregator, config: &AppConfig) {
    let ranked = report.results.ranked(aggregator, &config.weights);
    print!("{}", report::format_ranking(&ranked));
    let exclusions = report::format_exclusions(report);
    if !exclusions.is_empty() {
        println!();
        print!("{}", exclusions);
    }
}

/// One gauge per metric score plus one chart per ticker with series data
fn write_svgs(report: &LoadReport, config: &AppConfig, dir: &Path) -> Result<usize> {
    std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let themes = ThemeBus::new(config.theme);
    let mut written = 0;

    for result in report.results.entries() {
        for (metric, score) in &result.scores {
            let mut gauge = GaugeWidget::full(&themes).with_title(format!("{} {}", result.ticker, metric));
            gauge.set_value(score.value);
            let path = dir.join(format!("{}_{}.svg", result.ticker, metric));
            std::fs::write(&path, gauge.to_svg()).with_context(|| format!("writing {}", path.display()))?;
            written += 1;
        }

        if let Some(chart) = &result.chart {
            let mut widget = ChartWidget::new(ChartOptions::full(), &themes);
            widget.set_data(&result.ticker, chart.clone());
            if let Some(svg) = widget.to_svg() {
                let path = dir.join(format!("{}_chart.svg", result.ticker));
                std::fs::write(&path, svg).with_context(|| format!("writing {}", path.display()))?;
                written += 1;
            }
        }
    }

    Ok(written)
}
