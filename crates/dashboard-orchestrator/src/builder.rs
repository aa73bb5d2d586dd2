//! Batched fan-out over the valuation backend and per-ticker reconciliation.

use score_engine::merge_chart;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use valuation_core::{
    endpoints, BatchLeverageRequest, BatchResponse, BatchSeriesRequest, BatchValuationRequest,
    ChartData, DashboardResult, MetricKind, MetricScore, ScoreResult, TickerOutcome,
    TickerResult, ValuationBackend,
};

use crate::result_set::{BatchError, FailedTicker, LoadReport, LoadStatus, ResultSet};
use crate::settings::LoadSettings;

/// Split a comma-separated ticker list. Blank entries are dropped, symbols
/// are upper-cased and repeats keep their first position.
pub fn parse_ticker_list(input: &str) -> Vec<String> {
    normalize_tickers(input.split(','))
}

pub fn normalize_tickers<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tickers: Vec<String> = Vec::new();
    for t in raw {
        let t = t.as_ref().trim().to_uppercase();
        if !t.is_empty() && !tickers.contains(&t) {
            tickers.push(t);
        }
    }
    tickers
}

/// Per-ticker outcomes of one batch, keyed by upper-cased ticker
type Outcomes<T> = HashMap<String, TickerOutcome<T>>;

pub struct ResultSetBuilder {
    backend: Arc<dyn ValuationBackend>,
    settings: LoadSettings,
}

impl ResultSetBuilder {
    pub fn new(backend: Arc<dyn ValuationBackend>, settings: LoadSettings) -> DashboardResult<Self> {
        settings.validate()?;
        Ok(Self { backend, settings })
    }

    pub fn backend(&self) -> &Arc<dyn ValuationBackend> {
        &self.backend
    }

    pub fn settings(&self) -> &LoadSettings {
        &self.settings
    }

    /// Run one load cycle.
    ///
    /// Issues one request per metric covering every ticker, waits for all of
    /// them, then reconciles. A ticker is kept only when its valuation score
    /// succeeded; leverage and chart data are attached when available.
    pub async fn build(&self, tickers: &[String]) -> LoadReport {
        let tickers = normalize_tickers(tickers);
        if tickers.is_empty() {
            return LoadReport::empty();
        }

        tracing::info!(
            "Loading {} tickers from {} backend",
            tickers.len(),
            self.backend.backend_name()
        );

        let valuation_req = BatchValuationRequest {
            tickers: tickers.clone(),
            years: self.settings.years,
            source: self.settings.source.clone(),
        };
        let leverage_req = BatchLeverageRequest {
            tickers: tickers.clone(),
            source: self.settings.source.clone(),
        };
        let series_req = BatchSeriesRequest {
            tickers: tickers.clone(),
            years: self.settings.chart_years,
            include_forward: self.settings.include_forward,
            smoothing: self.settings.smoothing,
        };

        // Fan out, and do not look at any result until every batch resolved
        let (valuation, leverage, series) = tokio::join!(
            self.backend.batch_valuation_score(&valuation_req),
            self.backend.batch_leverage_score(&leverage_req),
            self.backend.batch_price_earnings_series(&series_req),
        );

        let mut batch_errors = Vec::new();

        let valuation = score_outcomes(endpoints::BATCH_VALUATION_SCORE, valuation);
        let leverage = score_outcomes(endpoints::BATCH_LEVERAGE_SCORE, leverage);
        let series = series.and_then(|batch| {
            let results = batch.into_results(endpoints::BATCH_PRICE_EARNINGS_SERIES)?;
            Ok(results
                .into_iter()
                .map(|r| {
                    let chart = match r.outcome() {
                        TickerOutcome::Success(s) => {
                            TickerOutcome::Success(merge_chart(&s.series, s.data_point_count))
                        }
                        TickerOutcome::MissingData => TickerOutcome::MissingData,
                        TickerOutcome::Failed(e) => TickerOutcome::Failed(e),
                    };
                    (r.ticker.to_uppercase(), chart)
                })
                .collect::<Outcomes<ChartData>>())
        });

        let leverage = keep_or_record(endpoints::BATCH_LEVERAGE_SCORE, leverage, &mut batch_errors);
        let series = keep_or_record(endpoints::BATCH_PRICE_EARNINGS_SERIES, series, &mut batch_errors);

        let valuation = match valuation {
            Ok(v) => v,
            Err(error) => {
                tracing::warn!("Valuation batch failed: {}", error);
                batch_errors.insert(
                    0,
                    BatchError {
                        endpoint: endpoints::BATCH_VALUATION_SCORE,
                        error,
                    },
                );
                return LoadReport {
                    results: ResultSet::default(),
                    missing: Vec::new(),
                    failed: Vec::new(),
                    batch_errors,
                    status: LoadStatus::Error,
                };
            }
        };

        reconcile(&tickers, valuation, leverage, series, batch_errors)
    }
}

fn score_outcomes(
    endpoint: &'static str,
    batch: DashboardResult<BatchResponse<ScoreResult>>,
) -> DashboardResult<Outcomes<MetricScore>> {
    let results = batch?.into_results(endpoint)?;
    // One malformed entry fails the whole batch
    results
        .iter()
        .map(|r| -> DashboardResult<(String, TickerOutcome<MetricScore>)> {
            Ok((r.ticker.to_uppercase(), r.outcome(endpoint)?))
        })
        .collect()
}

fn keep_or_record<T>(
    endpoint: &'static str,
    outcome: DashboardResult<Outcomes<T>>,
    batch_errors: &mut Vec<BatchError>,
) -> Outcomes<T> {
    match outcome {
        Ok(outcomes) => outcomes,
        Err(error) => {
            tracing::warn!("{} failed, continuing without it: {}", endpoint, error);
            batch_errors.push(BatchError { endpoint, error });
            HashMap::new()
        }
    }
}

fn reconcile(
    tickers: &[String],
    mut valuation: Outcomes<MetricScore>,
    mut leverage: Outcomes<MetricScore>,
    mut series: Outcomes<ChartData>,
    batch_errors: Vec<BatchError>,
) -> LoadReport {
    let mut entries = Vec::new();
    let mut missing = Vec::new();
    let mut failed = Vec::new();

    for (input_index, ticker) in tickers.iter().enumerate() {
        match valuation.remove(ticker) {
            Some(TickerOutcome::Success(score)) => {
                let mut scores = BTreeMap::new();
                scores.insert(MetricKind::Valuation, score);

                match leverage.remove(ticker) {
                    Some(TickerOutcome::Success(s)) => {
                        scores.insert(MetricKind::Leverage, s);
                    }
                    Some(TickerOutcome::Failed(e)) => {
                        tracing::debug!("No leverage score for {}: {}", ticker, e)
                    }
                    _ => {}
                }

                let chart = match series.remove(ticker) {
                    Some(TickerOutcome::Success(chart)) => Some(chart),
                    _ => None,
                };

                entries.push(TickerResult {
                    ticker: ticker.clone(),
                    input_index,
                    scores,
                    chart,
                });
            }
            Some(TickerOutcome::MissingData) => {
                tracing::info!("{} has no data on the backend", ticker);
                missing.push(ticker.clone());
            }
            Some(TickerOutcome::Failed(reason)) => {
                tracing::warn!("Excluding {}: {}", ticker, reason);
                failed.push(FailedTicker {
                    ticker: ticker.clone(),
                    reason,
                });
            }
            None => {
                tracing::warn!("Excluding {}: no result returned", ticker);
                failed.push(FailedTicker {
                    ticker: ticker.clone(),
                    reason: "no result returned".to_string(),
                });
            }
        }
    }

    let status = if batch_errors.is_empty() && failed.is_empty() && missing.is_empty() {
        LoadStatus::Success
    } else {
        LoadStatus::PartialSuccess
    };

    tracing::info!(
        "Load finished: {} kept, {} missing, {} failed, {} batch errors",
        entries.len(),
        missing.len(),
        failed.len(),
        batch_errors.len()
    );

    LoadReport {
        results: ResultSet::new(entries),
        missing,
        failed,
        batch_errors,
        status,
    }
}
