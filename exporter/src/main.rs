// exporter/src/main.rs

//! Parity exporter binary.
//!
//! Polls one node over JSON-RPC on a fixed interval and serves the
//! resulting gauges over HTTP:
//!
//! - `GET /metrics`
//! - `GET /health`

mod config;
mod routes;
mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::{Router, routing::get};
use clap::Parser;
use tokio::{signal, time::MissedTickBehavior};
use tracing::Instrument;

use collector::{MetricsRegistry, create_metrics};
use config::ExporterConfig;
use routes::{health, metrics};
use state::{AppState, SharedState};

#[tokio::main]
async fn main() {
    // Basic tracing setup.
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "parity_exporter=info,collector=info".to_string()),
        )
        .init();

    if let Err(e) = run(ExporterConfig::parse()).await {
        tracing::error!("fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: ExporterConfig) -> Result<(), String> {
    let collector_cfg = cfg.collector();
    collector_cfg
        .validate()
        .map_err(|e| format!("invalid configuration: {e}"))?;

    // ---------------------------
    // Metrics + collector
    // ---------------------------

    let metrics = Arc::new(
        MetricsRegistry::new(&collector_cfg.namespace)
            .map_err(|e| format!("failed to initialise metrics registry: {e}"))?,
    );

    let collector = create_metrics(&collector_cfg, metrics)
        .map_err(|e| format!("failed to create RPC client for {}: {e}", collector_cfg.node_url))?;

    let app_state: SharedState = Arc::new(AppState { collector });

    // ---------------------------
    // Refresh loop
    // ---------------------------

    let refresh_state = app_state.clone();
    let span = tracing::info_span!("collector", node = %collector_cfg.node_url);
    tokio::spawn(
        run_refresh_loop(refresh_state, collector_cfg.poll_interval).instrument(span),
    );

    // ---------------------------
    // HTTP router
    // ---------------------------

    tracing::info!("metrics exporter listening on http://{}/metrics", cfg.listen_addr);

    let listener = tokio::net::TcpListener::bind(cfg.listen_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", cfg.listen_addr))?;

    axum::serve(listener, router(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("metrics server error: {e}"))?;

    Ok(())
}

fn router(state: SharedState) -> Router {
    Router::new()
        .route("/metrics", get(metrics::serve_metrics))
        .route("/health", get(health::health))
        .with_state(state)
}

/// Background refresh loop.
///
/// The first cycle runs immediately; later ones follow `interval`. A slow
/// node delays the next tick instead of causing a burst of catch-up cycles.
async fn run_refresh_loop(state: SharedState, interval: Duration) {
    tracing::info!("refresh loop running with interval {}s", interval.as_secs());

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let outcome = state.collector.refresh().await;
        tracing::debug!(?outcome, "refresh cycle finished");
    }
}

/// Waits for Ctrl-C and returns, used for graceful shutdown.
async fn shutdown_signal() {
    let _ = signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use collector::CollectorConfig;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state() -> SharedState {
        let cfg = CollectorConfig::default();
        let metrics = Arc::new(MetricsRegistry::new(&cfg.namespace).unwrap());
        let collector = create_metrics(&cfg, metrics).unwrap();
        Arc::new(AppState { collector })
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let content_type = resp
            .headers()
            .get(header::CONTENT_TYPE)
            .map(|v| v.to_str().unwrap().to_string());
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn metrics_route_serves_current_gauges() {
        let state = test_state();
        let gauges = &state.collector.metrics().node;
        gauges.up.set(1);
        gauges.current_block.set(100);
        gauges.set_version("Parity/v2.5.0");

        let (status, content_type, body) = get(router(state), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type.as_deref(), Some("text/plain; version=0.0.4"));
        assert!(body.contains("parity_up 1"));
        assert!(body.contains("parity_current_block 100"));
        assert!(body.contains(r#"parity_version{value="Parity/v2.5.0"} 1"#));
    }

    #[tokio::test]
    async fn metrics_route_before_first_refresh_reports_zeroes() {
        let (status, _, body) = get(router(test_state()), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("parity_up 0"));
        assert!(body.contains("parity_sync_status 0"));
    }

    #[tokio::test]
    async fn health_route_before_first_refresh() {
        let (status, _, body) = get(router(test_state()), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            r#"{"status":"ok","node_up":false,"last_refresh":null}"#
        );
    }

    #[tokio::test]
    async fn health_route_reports_last_refresh() {
        // Nothing listens on this port, so the cycle ends with the node down.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let cfg = CollectorConfig {
            node_url: format!("http://{addr}/"),
            ..Default::default()
        };
        let metrics = Arc::new(MetricsRegistry::new(&cfg.namespace).unwrap());
        let state = Arc::new(AppState {
            collector: create_metrics(&cfg, metrics).unwrap(),
        });
        state.collector.refresh().await;

        let (status, _, body) = get(router(state), "/health").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["node_up"], false);
        assert_eq!(json["last_refresh"]["outcome"], "down");
        assert!(json["last_refresh"]["unix_secs"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (status, _, _) = get(router(test_state()), "/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
