//! Error types for identity-svc
//!
//! Wire format is fixed by existing clients:
//! - 400 `{"error": "<message>"}`
//! - 404 `{"error": "Route not found"}`
//! - 500 `{"error": "Internal Server Error", "message": "<detail>"}`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::identity::ResolveError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Unknown route (404)
    #[error("Route not found")]
    NotFound,

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Route not found" })),
            )
                .into_response(),
            ApiError::Internal(detail) => {
                error!(error = %detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "Internal Server Error",
                        "message": detail,
                    })),
                )
                    .into_response()
            }
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_errors_map_to_status() {
        let bad: ApiError = ResolveError::InvalidRequest("missing".to_string()).into();
        assert_eq!(bad.into_response().status(), StatusCode::BAD_REQUEST);

        let conflict: ApiError =
            ResolveError::TransientStoreConflict("database is locked".to_string()).into();
        assert_eq!(conflict.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);

        let store: ApiError = ResolveError::StoreUnavailable("pool timed out".to_string()).into();
        assert_eq!(store.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_not_found_status() {
        assert_eq!(ApiError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
    }
}
