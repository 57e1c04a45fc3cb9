//! Health check endpoint
//!
//! Liveness only: never touches the contact store.

use axum::{extract::State, routing::get, Json, Router};
use identity_common::time;
use serde::Serialize;

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Module name ("identity-svc")
    pub module: String,
    /// Crate version from Cargo.toml
    pub version: String,
    /// Current server time, RFC 3339
    pub timestamp: String,
    /// Seconds since service started
    pub uptime_seconds: u64,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let now = time::now();
    let uptime_seconds = now.signed_duration_since(state.startup_time).num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        module: "identity-svc".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: now.to_rfc3339(),
        uptime_seconds,
    })
}

/// Build health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check).fallback(super::not_found))
}
