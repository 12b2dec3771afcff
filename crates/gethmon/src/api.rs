//! HTTP API for the sync monitor

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::error;

use crate::metrics::{self, MetricsCollector};
use crate::monitor::{ProbeOutcome, SyncMonitor};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub monitor: Arc<SyncMonitor>,
    pub metrics: MetricsCollector,
}

/// Liveness probe handler
///
/// 200 while the node is starting, synced, or behind-but-progressing;
/// 500 on a stalled node or any evaluation failure (fail-closed).
pub async fn healthz_handler(State(state): State<AppState>) -> Response {
    let started = Instant::now();
    let result = state.monitor.probe().await;
    metrics::PROBE_DURATION.observe(started.elapsed().as_secs_f64());

    match result {
        Ok(ProbeOutcome::Starting) => {
            metrics::PROBES_TOTAL.with_label_values(&["starting"]).inc();
            (StatusCode::OK, "starting...").into_response()
        }
        Ok(_) => {
            metrics::PROBES_TOTAL.with_label_values(&["ok"]).inc();
            (StatusCode::OK, "ok").into_response()
        }
        Err(e) => {
            metrics::PROBES_TOTAL.with_label_values(&["failure"]).inc();
            error!("Probe failed: {}", e);
            e.into_response()
        }
    }
}

/// Status handler with the last observed sample
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.monitor.status().await)
}

/// Handler for the /metrics endpoint
pub async fn metrics_handler(State(state): State<AppState>) -> Result<String, StatusCode> {
    match state.metrics.gather() {
        Ok(metrics_text) => Ok(metrics_text),
        Err(err) => {
            error!("Failed to gather metrics: {}", err);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Root handler with info
pub async fn root_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "gethmon",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Liveness-check sidecar for an Ethereum node",
        "endpoints": {
            "GET /healthz": "Liveness probe",
            "GET /status": "Last sync sample and monitor state",
            "GET /metrics": "Prometheus metrics"
        }
    }))
}
