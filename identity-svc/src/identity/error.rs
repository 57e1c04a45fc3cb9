//! Failure kinds of a resolution
//!
//! Every path out of the resolver is one of these; callers decide whether
//! to retry (`TransientStoreConflict`), reject (`InvalidRequest`) or fail.

use thiserror::Error;

/// SQLite result codes that mean "another writer got there first":
/// BUSY, LOCKED, BUSY_RECOVERY, BUSY_SNAPSHOT, LOCKED_SHAREDCACHE.
const CONFLICT_CODES: &[&str] = &["5", "6", "261", "517", "262"];

#[derive(Debug, Error)]
pub enum ResolveError {
    /// Neither email nor phone number survived normalization
    #[error("{0}")]
    InvalidRequest(String),

    /// Concurrent modification detected by the store; safe to retry
    #[error("Transient store conflict: {0}")]
    TransientStoreConflict(String),

    /// The store failed for a reason retrying will not fix
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Stored data violates a cluster invariant
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResolveError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ResolveError::TransientStoreConflict(_))
    }
}

impl From<sqlx::Error> for ResolveError {
    fn from(err: sqlx::Error) -> Self {
        if is_conflict(&err) {
            ResolveError::TransientStoreConflict(err.to_string())
        } else {
            ResolveError::StoreUnavailable(err.to_string())
        }
    }
}

impl From<identity_common::Error> for ResolveError {
    fn from(err: identity_common::Error) -> Self {
        match err {
            identity_common::Error::Database(db_err) => db_err.into(),
            identity_common::Error::InvalidInput(msg) => ResolveError::InvalidRequest(msg),
            other => ResolveError::Internal(other.to_string()),
        }
    }
}

fn is_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            let code_matches = db_err
                .code()
                .map(|code| CONFLICT_CODES.iter().any(|c| *c == code))
                .unwrap_or(false);
            let message = db_err.message();
            code_matches
                || message.contains("database is locked")
                || message.contains("database table is locked")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_are_not_transient() {
        let err: ResolveError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, ResolveError::StoreUnavailable(_)));
        assert!(!err.is_transient());

        let err: ResolveError = sqlx::Error::RowNotFound.into();
        assert!(!err.is_transient());
    }

    #[test]
    fn test_common_errors_map_by_kind() {
        let err: ResolveError =
            identity_common::Error::InvalidInput("missing".to_string()).into();
        assert!(matches!(err, ResolveError::InvalidRequest(_)));

        let err: ResolveError = identity_common::Error::Internal("bad".to_string()).into();
        assert!(matches!(err, ResolveError::Internal(_)));
    }

    #[test]
    fn test_display_of_invalid_request_is_bare_message() {
        let err = ResolveError::InvalidRequest("At least one of email or phoneNumber must be provided".to_string());
        assert_eq!(err.to_string(), "At least one of email or phoneNumber must be provided");
    }
}
