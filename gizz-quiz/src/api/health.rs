//! Health check endpoint

use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// "ok", or "degraded" while an upstream source is failing
    pub status: String,
    /// Module name ("gizz-quiz")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
    /// Most recent absorbed upstream failure, for diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let uptime = Utc::now().signed_duration_since(state.startup_time);
    let uptime_seconds = uptime.num_seconds().max(0) as u64;

    let failures = state.controller.gateway().source_failures().await;
    let last_error = if failures.is_empty() {
        None
    } else {
        Some(
            failures
                .iter()
                .map(|f| format!("{}: {}", f.source, f.error))
                .collect::<Vec<_>>()
                .join("; "),
        )
    };

    Json(HealthResponse {
        status: if last_error.is_some() { "degraded" } else { "ok" }.to_string(),
        module: "gizz-quiz".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds,
        last_error,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
