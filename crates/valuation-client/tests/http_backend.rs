use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpListener;
use valuation_client::{BackendConfig, HttpValuationBackend};
use valuation_core::{
    endpoints, BatchLeverageRequest, BatchSeriesRequest, BatchValuationRequest, DashboardError,
    TickerOutcome, ValuationBackend,
};

async fn valuation(Json(body): Json<Value>) -> Json<Value> {
    let tickers = body["tickers"].as_array().cloned().unwrap_or_default();
    let results: Vec<Value> = tickers
        .iter()
        .map(|t| match t.as_str() {
            Some("ZZZ") => json!({
                "ticker": "ZZZ",
                "success": false,
                "error_code": "MISSING_DATA",
                "error": "not in database"
            }),
            Some(ticker) => json!({
                "ticker": ticker,
                "success": true,
                "score_100": 61.5,
                "details": {"current_pe": 21.0, "data_points": body["years"].as_u64().unwrap_or(0) * 4}
            }),
            None => json!({"ticker": "", "success": false, "error": "bad ticker"}),
        })
        .collect();
    Json(json!({"success": true, "results": results}))
}

async fn leverage() -> (StatusCode, &'static str) {
    (StatusCode::SERVICE_UNAVAILABLE, "down")
}

async fn series() -> &'static str {
    "<html>not json</html>"
}

async fn fetch_remote(Path(ticker): Path<String>) -> Json<Value> {
    Json(json!({"success": true, "warning": format!("{} has annual data only", ticker)}))
}

async fn spawn_server() -> String {
    let app = Router::new()
        .route("/api/health", get(|| async { "ok" }))
        .route("/api/batch-valuation-score", post(valuation))
        .route("/api/batch-leverage-score", post(leverage))
        .route("/api/batch-price-earnings-series", post(series))
        .route("/api/fetch-remote-metric/:ticker", post(fetch_remote));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{}/api", port)
}

async fn backend() -> HttpValuationBackend {
    HttpValuationBackend::new(BackendConfig {
        base_url: spawn_server().await,
        timeout: Duration::from_secs(5),
        source: "manual".to_string(),
    })
    .unwrap()
}

#[tokio::test]
async fn test_valuation_batch_round_trip() {
    let backend = backend().await;
    let request = BatchValuationRequest {
        tickers: vec!["AMD".to_string(), "ZZZ".to_string()],
        years: 2,
        source: backend.source().to_string(),
    };

    let results = backend
        .batch_valuation_score(&request)
        .await
        .unwrap()
        .into_results(endpoints::BATCH_VALUATION_SCORE)
        .unwrap();

    assert_eq!(results.len(), 2);
    let amd = results[0]
        .outcome(endpoints::BATCH_VALUATION_SCORE)
        .unwrap()
        .success()
        .unwrap();
    assert_eq!(amd.value, 61.5);
    assert_eq!(amd.data_point_count, Some(8));
    assert_eq!(
        results[1].outcome(endpoints::BATCH_VALUATION_SCORE).unwrap(),
        TickerOutcome::MissingData
    );
}

#[tokio::test]
async fn test_non_success_status_is_rejected() {
    let backend = backend().await;
    let request = BatchLeverageRequest {
        tickers: vec!["AMD".to_string()],
        source: "manual".to_string(),
    };

    let err = backend.batch_leverage_score(&request).await.unwrap_err();
    assert_eq!(
        err,
        DashboardError::rejected(endpoints::BATCH_LEVERAGE_SCORE, "HTTP 503")
    );
}

#[tokio::test]
async fn test_undecodable_body_is_malformed() {
    let backend = backend().await;
    let request = BatchSeriesRequest {
        tickers: vec!["AMD".to_string()],
        years: 5,
        include_forward: true,
        smoothing: 0,
    };

    let err = backend.batch_price_earnings_series(&request).await.unwrap_err();
    assert!(matches!(
        err,
        DashboardError::MalformedResponse { ref endpoint, .. } if endpoint == endpoints::BATCH_PRICE_EARNINGS_SERIES
    ));
}

#[tokio::test]
async fn test_remote_fetch() {
    let backend = backend().await;
    let response = backend.fetch_remote_metric("NEWCO").await.unwrap();
    assert!(response.success);
    assert_eq!(response.warning.as_deref(), Some("NEWCO has annual data only"));
}

#[tokio::test]
async fn test_remote_fetch_ticker_is_one_path_segment() {
    let backend = backend().await;
    let response = backend.fetch_remote_metric("BRK/B").await.unwrap();
    assert_eq!(response.warning.as_deref(), Some("BRK/B has annual data only"));
}

#[tokio::test]
async fn test_health() {
    let backend = backend().await;
    assert!(backend.health().await.unwrap());
}

#[tokio::test]
async fn test_unreachable_backend_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let backend = HttpValuationBackend::new(BackendConfig {
        base_url: format!("http://127.0.0.1:{}/api", port),
        timeout: Duration::from_secs(2),
        source: "manual".to_string(),
    })
    .unwrap();
    let request = BatchLeverageRequest {
        tickers: vec!["AMD".to_string()],
        source: "manual".to_string(),
    };

    let err = backend.batch_leverage_score(&request).await.unwrap_err();
    assert!(matches!(err, DashboardError::Transport(_)));
    assert!(backend.health().await.is_err());
}
