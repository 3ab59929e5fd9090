//! Deals table schema.

use log::info;
use sqlx::SqlitePool;

use crate::error_handling::DatabaseError;

/// Creates the `Deals` table. Safe to run against an existing database.
pub const CREATE_DEALS_TABLE: &str = "CREATE TABLE IF NOT EXISTS Deals (
    ID                   TEXT PRIMARY KEY NOT NULL,
    PieceCID             TEXT,
    PieceSize            INTEGER NOT NULL,
    VerifiedDeal         BOOLEAN NOT NULL,
    ClientAddress        TEXT NOT NULL,
    ProviderAddress      TEXT NOT NULL,
    Label                TEXT,
    StartEpoch           INTEGER NOT NULL,
    EndEpoch             INTEGER NOT NULL,
    StoragePricePerEpoch TEXT,
    ProviderCollateral   TEXT,
    ClientCollateral     TEXT,
    SectorStartEpoch     INTEGER NOT NULL,
    LastUpdatedEpoch     INTEGER NOT NULL,
    SlashEpoch           INTEGER NOT NULL
)";

/// Creates the tables this crate writes to. Runs once before the first write.
pub async fn create_tables(pool: &SqlitePool) -> Result<(), DatabaseError> {
    info!("Creating db tables...");
    sqlx::query(CREATE_DEALS_TABLE).execute(pool).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::accessor::DEAL_FIELD_NAMES;
    use sqlx::Row;

    #[tokio::test]
    async fn test_create_tables_is_idempotent() {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .expect("Failed to create test database pool");
        create_tables(&pool).await.expect("first run");
        create_tables(&pool).await.expect("second run");
    }

    #[tokio::test]
    async fn test_columns_match_deal_fields() {
        let pool = crate::storage::test_helpers::create_test_pool().await;
        let rows = sqlx::query("SELECT name FROM pragma_table_info('Deals') ORDER BY cid")
            .fetch_all(&pool)
            .await
            .expect("Failed to read table info");
        let columns: Vec<String> = rows.iter().map(|r| r.get::<String, _>(0)).collect();
        assert_eq!(columns, *DEAL_FIELD_NAMES);
    }
}
