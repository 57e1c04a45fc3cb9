//! Database initialization
//!
//! Opens (creating when missing) the SQLite contact store and brings the
//! `contacts` schema up to date. Safe to call on every startup.

use crate::config::StoreConfig;
use crate::time::millis_to_duration;
use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Initialize database connection pool and create tables if needed
pub async fn init_database(db_path: &Path, store: &StoreConfig) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // Per-connection settings go on the connect options so every pooled
    // connection gets them, not just the first one.
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path.display()))?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(millis_to_duration(store.busy_timeout_ms));

    let pool = SqlitePoolOptions::new()
        .max_connections(store.max_connections.max(1))
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    create_contacts_table(&pool).await?;

    Ok(pool)
}

/// Create the contacts table and its lookup indexes
///
/// The CHECK constraint keeps `linked_id` NULL exactly for primaries.
pub async fn create_contacts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS contacts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            phone_number TEXT,
            email TEXT,
            linked_id INTEGER REFERENCES contacts(id),
            link_precedence TEXT NOT NULL CHECK (link_precedence IN ('primary', 'secondary')),
            created_at TIMESTAMP NOT NULL,
            updated_at TIMESTAMP NOT NULL,
            deleted_at TIMESTAMP,
            CHECK (
                (link_precedence = 'primary' AND linked_id IS NULL)
                OR (link_precedence = 'secondary' AND linked_id IS NOT NULL)
            )
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_contacts_email ON contacts(email)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_contacts_phone_number ON contacts(phone_number)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_contacts_linked_id ON contacts(linked_id)")
        .execute(pool)
        .await?;

    Ok(())
}
