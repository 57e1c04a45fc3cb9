//! HTTP API handlers for identity-svc

pub mod health;
pub mod identify;

pub use health::health_routes;
pub use identify::identify_routes;

use crate::error::ApiError;

/// Fallback for unknown routes
pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
