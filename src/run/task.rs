//! The two export paths, each run as its own tokio task.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use log::info;
use tokio_util::sync::CancellationToken;

use crate::export::export_text_file;
use crate::models::{DealModel, MarketDeal};
use crate::storage::{create_tables, init_db_pool, DealStore};

/// Writes the deal set to `path` as `<id>|<json>` lines.
pub async fn text_task(path: PathBuf, deals: Arc<BTreeMap<String, MarketDeal>>) -> Result<usize> {
    let start = Instant::now();
    info!("Writing {} deals to {}", deals.len(), path.display());

    let written = export_text_file(path.clone(), deals)
        .await
        .with_context(|| format!("Failed to write deals to {}", path.display()))?;

    info!("Wrote {written} deals to text, took {:?}", start.elapsed());
    Ok(written)
}

/// Opens the database, ensures the schema and inserts the deal set in batches.
///
/// Cancellation drops the in-flight batch transaction, which rolls it back.
/// Batches committed before that stay in the database.
pub async fn db_task(
    db_url: String,
    batch_commit: usize,
    deals: Arc<BTreeMap<String, MarketDeal>>,
    cancel: CancellationToken,
) -> Result<usize> {
    let start = Instant::now();

    let pool = init_db_pool(&db_url)
        .await
        .context("Failed to initialize database pool")?;
    create_tables(&pool)
        .await
        .context("Failed to create database tables")?;

    info!(
        "Inserting {} deals into {db_url} ({batch_commit} per transaction)",
        deals.len()
    );
    let store = DealStore::new(pool.clone());
    // owned rows: a borrowing iterator held across the spawned await is not Send
    let models: Vec<DealModel> = deals
        .iter()
        .map(|(id, deal)| DealModel::new(id.clone(), deal.clone()))
        .collect();

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(anyhow!("Database export cancelled")),
        res = store.insert_batched(models, batch_commit) => {
            res.context("Failed to insert deals into database")
        }
    };
    pool.close().await;

    let written = result?;
    info!("Inserted {written} deals into database, took {:?}", start.elapsed());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::storage::test_helpers::sample_deal;

    fn deals(n: usize) -> Arc<BTreeMap<String, MarketDeal>> {
        Arc::new(
            (0..n)
                .map(|i| {
                    let id = format!("d{i:05}");
                    let deal = sample_deal(&id).deal;
                    (id, deal)
                })
                .collect(),
        )
    }

    fn db_url(dir: &tempfile::TempDir) -> String {
        format!("sqlite:{}", dir.path().join("deals.db").display())
    }

    async fn stored_count(url: &str) -> i64 {
        let pool = init_db_pool(url).await.unwrap();
        let count = DealStore::new(pool.clone()).count().await.unwrap();
        pool.close().await;
        count
    }

    #[tokio::test]
    async fn test_spawned_db_task_inserts_every_deal() {
        let dir = tempfile::tempdir().unwrap();
        let url = db_url(&dir);

        let handle = tokio::spawn(db_task(url.clone(), 3, deals(10), CancellationToken::new()));
        let written = handle.await.unwrap().unwrap();

        assert_eq!(written, 10);
        assert_eq!(stored_count(&url).await, 10);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let url = db_url(&dir);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = tokio::spawn(db_task(url.clone(), 2, deals(5), cancel))
            .await
            .unwrap()
            .unwrap_err();

        assert!(err.to_string().contains("cancelled"), "{err:#}");
        assert_eq!(stored_count(&url).await, 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_run_keeps_only_whole_batches() {
        let dir = tempfile::tempdir().unwrap();
        let url = db_url(&dir);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(150)).await;
            trigger.cancel();
        });

        let result = tokio::spawn(db_task(url.clone(), 7_000, deals(20_000), cancel))
            .await
            .unwrap();

        let count = stored_count(&url).await;
        assert_eq!(count % 7_000, 0, "partial batch left behind: {count} rows");
        match result {
            Ok(written) => assert_eq!(written as i64, count),
            Err(_) => assert!(count < 20_000),
        }
    }
}
