//! Connection pool monitoring utilities
//!
//! Instrumented transaction begin/commit/rollback that log how long a
//! request waited for a connection and how long it held it. Pool
//! saturation shows up here first when many identify calls overlap.

use sqlx::{Sqlite, Transaction};
use std::time::Instant;

use crate::identity::ResolveError;

/// Monitored transaction wrapper that logs acquisition and release timing
pub struct MonitoredTransaction<'c> {
    tx: Option<Transaction<'c, Sqlite>>,
    caller: &'static str,
    acquired_at: Instant,
}

impl<'c> MonitoredTransaction<'c> {
    fn new(tx: Transaction<'c, Sqlite>, caller: &'static str, acquired_at: Instant) -> Self {
        Self {
            tx: Some(tx),
            caller,
            acquired_at,
        }
    }

    /// Commit the transaction and log release timing
    pub async fn commit(mut self) -> Result<(), ResolveError> {
        let held_ms = self.acquired_at.elapsed().as_millis();
        let Some(tx) = self.tx.take() else {
            return Err(ResolveError::Internal("transaction already consumed".to_string()));
        };

        tx.commit().await?;

        if held_ms > 1000 {
            tracing::warn!(
                caller = self.caller,
                held_ms,
                "LONG TRANSACTION - Connection held for extended period"
            );
        } else {
            tracing::debug!(caller = self.caller, held_ms, "Connection released (commit)");
        }

        Ok(())
    }

    /// Rollback the transaction and log release timing
    pub async fn rollback(mut self) -> Result<(), ResolveError> {
        let held_ms = self.acquired_at.elapsed().as_millis();
        let Some(tx) = self.tx.take() else {
            return Err(ResolveError::Internal("transaction already consumed".to_string()));
        };

        tx.rollback().await?;

        tracing::debug!(caller = self.caller, held_ms, "Connection released (rollback)");

        Ok(())
    }

    /// Get a mutable reference to the inner transaction
    pub fn inner_mut(&mut self) -> &mut Transaction<'c, Sqlite> {
        self.tx.as_mut().expect("Transaction already consumed")
    }
}

impl<'c> Drop for MonitoredTransaction<'c> {
    fn drop(&mut self) {
        if self.tx.is_some() {
            // sqlx rolls back an unfinished transaction when it is dropped
            tracing::warn!(
                caller = self.caller,
                held_ms = self.acquired_at.elapsed().as_millis(),
                "Transaction dropped without commit or rollback (error path?)"
            );
        }
    }
}

/// Begin a monitored transaction with connection pool timing logs
pub async fn begin_monitored<'c>(
    pool: &'c sqlx::SqlitePool,
    caller: &'static str,
) -> Result<MonitoredTransaction<'c>, ResolveError> {
    let start = Instant::now();

    tracing::debug!(caller, "Connection acquisition requested");

    let tx = pool.begin().await?;

    let wait_ms = start.elapsed().as_millis();
    if wait_ms > 1000 {
        tracing::warn!(
            caller,
            wait_ms,
            "SLOW CONNECTION ACQUISITION - Pool may be saturated (all connections in use)"
        );
    } else {
        tracing::debug!(caller, wait_ms, "Connection acquired");
    }

    Ok(MonitoredTransaction::new(tx, caller, Instant::now()))
}
