//! Error types for the sync monitor

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Sync monitor errors
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Unsupported ethereum network: {0}")]
    UnsupportedNetwork(u64),

    #[error("Local node unavailable: {0}")]
    LocalNodeUnavailable(String),

    #[error("Reference API unavailable: {0}")]
    ReferenceUnavailable(String),

    #[error("Node not syncing: diff {diff} unchanged for a full check interval")]
    Stalled { diff: u64 },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MonitorError {
    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            MonitorError::UnsupportedNetwork(_) => "UNSUPPORTED_NETWORK",
            MonitorError::LocalNodeUnavailable(_) => "LOCAL_NODE_UNAVAILABLE",
            MonitorError::ReferenceUnavailable(_) => "REFERENCE_UNAVAILABLE",
            MonitorError::Stalled { .. } => "NODE_STALLED",
            MonitorError::Config(_) => "CONFIG_ERROR",
        }
    }
}

impl IntoResponse for MonitorError {
    fn into_response(self) -> Response {
        // The probe contract is 200 vs 500; the body carries the error kind
        // for anyone reading probe logs.
        let body = Json(json!({
            "error": self.code(),
            "message": self.to_string(),
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

pub type MonitorResult<T> = Result<T, MonitorError>;
