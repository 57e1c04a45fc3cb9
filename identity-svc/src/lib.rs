//! identity-svc library - Contact identity resolution service
//!
//! Consolidates partial contact records (email and/or phone number) into
//! clusters with one canonical primary contact. See [`identity`] for the
//! resolution rules.

use axum::Router;
use chrono::{DateTime, Utc};
use identity_common::time;
use sqlx::SqlitePool;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod utils;

pub use crate::error::{ApiError, ApiResult};
use crate::identity::IdentityService;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Transactional resolver over the contact store
    pub identity: IdentityService,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, max_conflict_wait_ms: u64) -> Self {
        Self {
            identity: IdentityService::new(db, max_conflict_wait_ms),
            startup_time: time::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::identify_routes())
        .merge(api::health_routes())
        .fallback(api::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
