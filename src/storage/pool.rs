//! Database connection pool management.
//!
//! This module initializes and configures the SQLite connection pool with:
//! - Automatic database file creation
//! - WAL journal, so a failed batch can always be rolled back
//! - Relaxed syncing and in-memory temp storage for bulk loads

use std::str::FromStr;

use log::{error, info};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqliteSynchronous};
use sqlx::SqlitePool;

use crate::error_handling::DatabaseError;

/// Initializes and returns a database connection pool for `db_url`
/// (for example `sqlite:deals.db` or `sqlite::memory:`).
pub async fn init_db_pool(db_url: &str) -> Result<SqlitePool, DatabaseError> {
    let options = SqliteConnectOptions::from_str(db_url)
        .map_err(|source| DatabaseError::InvalidUrl {
            url: db_url.to_string(),
            source,
        })?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .pragma("temp_store", "MEMORY");

    let pool = SqlitePool::connect_with(options).await.map_err(|e| {
        error!("Failed to connect to database: {e}");
        DatabaseError::SqlError(e)
    })?;

    info!("Connected to database {db_url}");
    Ok(pool)
}
