//! Load-cycle state machine with a generation guard.
//!
//! Every load takes a fresh generation number. A finished cycle commits its
//! report only if no newer cycle has started since, so a slow response can
//! never replace data from a later request. `spawn_load` also aborts the
//! task of the previous cycle.

use futures_util::future::join_all;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use valuation_core::{DashboardError, DashboardResult};

use crate::builder::{normalize_tickers, ResultSetBuilder};
use crate::result_set::{LoadReport, LoadStatus};

/// `Done` is the resting state between cycles; only a fresh controller is `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum LoadPhase {
    Idle,
    Loading { generation: u64 },
    Done { generation: u64, status: LoadStatus },
}

/// What subscribers see: the current phase and the last committed report
#[derive(Debug, Clone)]
pub struct LoadSnapshot {
    pub phase: LoadPhase,
    /// Generation of `report`, 0 before the first commit
    pub committed_generation: u64,
    pub report: Option<Arc<LoadReport>>,
}

impl LoadSnapshot {
    fn idle() -> Self {
        Self {
            phase: LoadPhase::Idle,
            committed_generation: 0,
            report: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, LoadPhase::Loading { .. })
    }
}

/// Result of asking the backend to acquire data for one missing ticker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RemediationOutcome {
    pub ticker: String,
    pub success: bool,
    pub warning: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RemediationReport {
    pub outcomes: Vec<RemediationOutcome>,
    /// Set when at least one fetch succeeded and the reload committed.
    /// `None` if a newer load superseded the reload.
    pub reloaded: Option<Arc<LoadReport>>,
}

#[derive(Clone)]
pub struct LoadController {
    builder: Arc<ResultSetBuilder>,
    generation: Arc<AtomicU64>,
    state: Arc<watch::Sender<LoadSnapshot>>,
    in_flight: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl LoadController {
    pub fn new(builder: ResultSetBuilder) -> Self {
        let (state, _) = watch::channel(LoadSnapshot::idle());
        Self {
            builder: Arc::new(builder),
            generation: Arc::new(AtomicU64::new(0)),
            state: Arc::new(state),
            in_flight: Arc::new(Mutex::new(None)),
        }
    }

    pub fn builder(&self) -> &ResultSetBuilder {
        &self.builder
    }

    pub fn subscribe(&self) -> watch::Receiver<LoadSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> LoadSnapshot {
        self.state.borrow().clone()
    }

    /// Latest generation handed out
    pub fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn begin(&self) -> u64 {
        let mut generation = 0;
        // Increment under the channel lock so the published phase always
        // names the live generation
        self.state.send_modify(|s| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            s.phase = LoadPhase::Loading { generation };
        });
        tracing::debug!("Load cycle {} started", generation);
        generation
    }

    /// Run a load cycle to completion on the current task.
    ///
    /// Returns `Superseded` if another cycle started before this one finished;
    /// its report is then discarded.
    pub async fn load(&self, tickers: &[String]) -> DashboardResult<Arc<LoadReport>> {
        let generation = self.begin();
        let report = self.builder.build(tickers).await;
        commit(&self.state, &self.generation, generation, report)
    }

    /// Start a load cycle in the background, aborting the previous one.
    pub fn spawn_load(&self, tickers: Vec<String>) -> u64 {
        let generation = self.begin();
        let builder = self.builder.clone();
        let state = self.state.clone();
        let counter = self.generation.clone();

        let handle = tokio::spawn(async move {
            let report = builder.build(&tickers).await;
            // Superseded is already logged in commit
            let _ = commit(&state, &counter, generation, report);
        });

        let previous = match self.in_flight.lock() {
            Ok(mut slot) => slot.replace(handle),
            Err(poisoned) => poisoned.into_inner().replace(handle),
        };
        if let Some(previous) = previous {
            previous.abort();
        }
        generation
    }

    /// Wait until `generation` (or a later one) has committed
    pub async fn wait_for(&self, generation: u64) -> Option<Arc<LoadReport>> {
        let mut rx = self.subscribe();
        let snapshot = rx
            .wait_for(|s| s.committed_generation >= generation)
            .await
            .ok()?;
        snapshot.report.clone()
    }

    /// Ask the backend to acquire data for each missing ticker, concurrently,
    /// then reload `tickers` if any fetch succeeded.
    pub async fn fetch_missing(
        &self,
        missing: &[String],
        tickers: &[String],
    ) -> DashboardResult<RemediationReport> {
        let missing = normalize_tickers(missing);
        let backend = self.builder.backend();

        let outcomes: Vec<RemediationOutcome> = join_all(missing.iter().map(|ticker| async move {
            match backend.fetch_remote_metric(ticker).await {
                Ok(r) => RemediationOutcome {
                    ticker: ticker.clone(),
                    success: r.success,
                    warning: r.warning,
                    error: r.error,
                },
                Err(e) => RemediationOutcome {
                    ticker: ticker.clone(),
                    success: false,
                    warning: None,
                    error: Some(e.to_string()),
                },
            }
        }))
        .await;

        for o in &outcomes {
            match (o.success, &o.warning, &o.error) {
                (true, Some(w), _) => tracing::warn!("Fetched {} with warning: {}", o.ticker, w),
                (true, None, _) => tracing::info!("Fetched data for {}", o.ticker),
                (false, _, e) => tracing::warn!(
                    "Failed to fetch {}: {}",
                    o.ticker,
                    e.as_deref().unwrap_or("unknown error")
                ),
            }
        }

        let reloaded = if outcomes.iter().any(|o| o.success) {
            match self.load(tickers).await {
                Ok(report) => Some(report),
                Err(DashboardError::Superseded(generation)) => {
                    tracing::info!("Reload {} after remote fetch was superseded", generation);
                    None
                }
                Err(e) => return Err(e),
            }
        } else {
            None
        };

        Ok(RemediationReport { outcomes, reloaded })
    }
}

fn commit(
    state: &watch::Sender<LoadSnapshot>,
    counter: &AtomicU64,
    generation: u64,
    report: LoadReport,
) -> DashboardResult<Arc<LoadReport>> {
    let report = Arc::new(report);
    let status = report.status;
    let committed = state.send_if_modified(|s| {
        // Checked under the channel lock so a concurrent begin() cannot slip in
        if counter.load(Ordering::SeqCst) != generation {
            return false;
        }
        s.phase = LoadPhase::Done { generation, status };
        s.committed_generation = generation;
        s.report = Some(report.clone());
        true
    });

    if committed {
        Ok(report)
    } else {
        tracing::debug!("Discarding results of superseded load cycle {}", generation);
        Err(DashboardError::Superseded(generation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::LoadSettings;
    use crate::test_support::*;
    use valuation_core::{BatchResponse, MetricKind, RemoteFetchResponse, ValuationBackend};

    fn controller_with(backend: Arc<dyn ValuationBackend>) -> LoadController {
        LoadController::new(ResultSetBuilder::new(backend, LoadSettings::default()).unwrap())
    }

    fn tickers(list: &[&str]) -> Vec<String> {
        list.iter().map(|t| t.to_string()).collect()
    }

    fn valuation_of(report: &LoadReport, ticker: &str) -> f64 {
        report
            .results
            .get(ticker)
            .and_then(|r| r.score(MetricKind::Valuation))
            .map(|s| s.value)
            .unwrap()
    }

    #[tokio::test]
    async fn test_load_commits_and_notifies() {
        let controller = controller_with(Arc::new(ScriptedBackend::all_ok(&["A"])));
        let mut rx = controller.subscribe();
        assert_eq!(rx.borrow().phase, LoadPhase::Idle);

        let report = controller.load(&tickers(&["A"])).await.unwrap();
        assert_eq!(report.status, LoadStatus::Success);

        assert!(rx.has_changed().unwrap());
        let snapshot = rx.borrow_and_update().clone();
        assert_eq!(
            snapshot.phase,
            LoadPhase::Done {
                generation: 1,
                status: LoadStatus::Success
            }
        );
        assert_eq!(snapshot.committed_generation, 1);
    }

    #[tokio::test]
    async fn test_stale_cycle_never_overwrites_newer() {
        let backend = Arc::new(GatedBackend::new());
        let controller = controller_with(backend.clone());

        let slow = controller.clone();
        let first = tokio::spawn(async move { slow.load(&tickers(&["AAPL"])).await });

        // Let cycle 1 reach the backend and block there
        while backend.valuation_calls() == 0 {
            tokio::task::yield_now().await;
        }

        let second = controller.load(&tickers(&["AAPL"])).await.unwrap();
        assert_eq!(valuation_of(&second, "AAPL"), GatedBackend::score_for_call(1));

        // Release cycle 1; it finishes after cycle 2 and must be dropped
        backend.gate.add_permits(1);
        let first = first.await.unwrap();
        assert_eq!(first.unwrap_err(), DashboardError::Superseded(1));

        let snapshot = controller.snapshot();
        assert_eq!(snapshot.committed_generation, 2);
        let shown = snapshot.report.unwrap();
        assert_eq!(valuation_of(&shown, "AAPL"), GatedBackend::score_for_call(1));
    }

    #[tokio::test]
    async fn test_spawn_load_cancels_previous() {
        let backend = Arc::new(GatedBackend::new());
        let controller = controller_with(backend.clone());

        let g1 = controller.spawn_load(tickers(&["MSFT"]));
        while backend.valuation_calls() == 0 {
            tokio::task::yield_now().await;
        }
        let g2 = controller.spawn_load(tickers(&["MSFT"]));
        assert_eq!((g1, g2), (1, 2));

        let report = controller.wait_for(g2).await.unwrap();
        assert_eq!(valuation_of(&report, "MSFT"), GatedBackend::score_for_call(1));

        // Cycle 1 was aborted; releasing its gate changes nothing
        backend.gate.add_permits(1);
        tokio::task::yield_now().await;
        assert_eq!(controller.snapshot().committed_generation, 2);
    }

    #[tokio::test]
    async fn test_snapshot_names_latest_generation() {
        let backend = Arc::new(GatedBackend::new());
        let controller = controller_with(backend.clone());

        controller.spawn_load(tickers(&["MSFT"]));
        let g2 = controller.spawn_load(tickers(&["MSFT"]));

        assert_eq!(controller.current_generation(), g2);
        assert_eq!(controller.snapshot().phase, LoadPhase::Loading { generation: g2 });
    }

    #[tokio::test]
    async fn test_superseded_reload_keeps_fetch_outcomes() {
        let backend = Arc::new(GatedBackend::new().with_remote_warning("annual only"));
        let controller = controller_with(backend.clone());

        let remediating = controller.clone();
        let task = tokio::spawn(async move {
            remediating
                .fetch_missing(&tickers(&["B"]), &tickers(&["A", "B"]))
                .await
        });

        // The reload reaches the backend and blocks there
        while backend.valuation_calls() == 0 {
            tokio::task::yield_now().await;
        }
        controller.load(&tickers(&["A"])).await.unwrap();
        backend.gate.add_permits(1);

        let remediation = task.await.unwrap().unwrap();
        assert_eq!(
            remediation.outcomes,
            vec![RemediationOutcome {
                ticker: "B".to_string(),
                success: true,
                warning: Some("annual only".to_string()),
                error: None,
            }]
        );
        assert!(remediation.reloaded.is_none());
        assert_eq!(controller.snapshot().committed_generation, 2);
    }

    #[tokio::test]
    async fn test_fetch_missing_then_reload() {
        let backend = Arc::new(
            ScriptedBackend::new(
                Ok(BatchResponse::ok(vec![score_ok("A", 70.0, 20), score_missing("B")])),
                Ok(BatchResponse::ok(vec![])),
                Ok(BatchResponse::ok(vec![])),
            )
            .with_remote(
                "B",
                RemoteFetchResponse {
                    success: true,
                    warning: Some("Only annual filings available".to_string()),
                    error: None,
                },
            ),
        );
        let controller = controller_with(backend.clone());
        let all = tickers(&["A", "B", "C"]);

        let report = controller.load(&all).await.unwrap();
        assert_eq!(report.missing, vec!["B".to_string()]);

        let remediation = controller
            .fetch_missing(&tickers(&["B", "C"]), &all)
            .await
            .unwrap();

        assert_eq!(remediation.outcomes.len(), 2);
        assert!(remediation.outcomes[0].success);
        assert!(!remediation.outcomes[1].success);
        assert!(remediation.reloaded.is_some());
        assert_eq!(backend.calls().0, 2);

        let mut requested = backend.remote_requests();
        requested.sort();
        assert_eq!(requested, vec!["B".to_string(), "C".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_missing_without_success_skips_reload() {
        let backend = Arc::new(ScriptedBackend::all_ok(&["A"]));
        let controller = controller_with(backend.clone());

        let remediation = controller
            .fetch_missing(&tickers(&["ZZZ"]), &tickers(&["A"]))
            .await
            .unwrap();

        assert!(remediation.reloaded.is_none());
        assert_eq!(backend.calls().0, 0);
    }
}
