//! Transactional boundary around [`resolve`](super::resolve)

use sqlx::SqlitePool;
use tracing::warn;

use super::{resolve, IdentityQuery, IdentityView, ResolveError};
use crate::db::SqliteContactStore;
use crate::utils::{begin_monitored, retry_on_conflict};

/// Runs each resolution in its own SQLite transaction
///
/// SQLite transactions are serializable: when two overlapping requests
/// both read and then both try to write, the loser's write fails with a
/// busy/snapshot error. That surfaces as `TransientStoreConflict`, the
/// transaction is rolled back, and the whole resolution re-runs from a
/// fresh read, so neither duplicate primaries nor half-merged clusters
/// can become visible.
#[derive(Clone)]
pub struct IdentityService {
    pool: SqlitePool,
    max_conflict_wait_ms: u64,
}

impl IdentityService {
    pub fn new(pool: SqlitePool, max_conflict_wait_ms: u64) -> Self {
        Self {
            pool,
            max_conflict_wait_ms,
        }
    }

    /// Resolve `query`, committing all of its writes or none of them
    pub async fn identify(&self, query: &IdentityQuery) -> Result<IdentityView, ResolveError> {
        retry_on_conflict("identify", self.max_conflict_wait_ms, || {
            self.identify_once(query)
        })
        .await
    }

    async fn identify_once(&self, query: &IdentityQuery) -> Result<IdentityView, ResolveError> {
        let mut tx = begin_monitored(&self.pool, "identity::identify").await?;

        let outcome = {
            let mut store = SqliteContactStore::new(tx.inner_mut());
            resolve(&mut store, query).await
        };

        match outcome {
            Ok(view) => {
                tx.commit().await?;
                Ok(view)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback after failed resolution also failed");
                }
                Err(err)
            }
        }
    }
}
