//! Deal store.
//!
//! Owns the database pool and writes deals in batches, one transaction per
//! batch. A failure anywhere in a batch rolls the whole batch back.

use log::{debug, warn};
use sqlx::SqlitePool;

use crate::config::PROGRESS_LOG_INTERVAL;
use crate::error_handling::StoreError;
use crate::models::DealModel;

use super::accessor::{DealAccessor, SELECT_BY_ID_SQL};

/// Batched transactional writes and point lookups for deals.
///
/// A store is meant to have a single writer; it does no locking of its own.
#[derive(Clone)]
pub struct DealStore {
    pool: SqlitePool,
}

impl DealStore {
    pub fn new(pool: SqlitePool) -> Self {
        DealStore { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Inserts `deals` in order inside one transaction.
    ///
    /// Either every deal is committed or, on the first failure, none are.
    pub async fn batch_insert(&self, deals: &[DealModel]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for deal in deals {
            if let Err(e) = DealAccessor::new(deal).insert(&mut tx).await {
                debug!("Rolling back batch of {} deals at {}: {e}", deals.len(), deal.id);
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("Failed to roll back deal batch: {rollback_err}");
                }
                return Err(e);
            }
        }

        tx.commit().await?;
        Ok(())
    }

    /// Splits `deals` into batches of `batch_size` and inserts each with
    /// [`batch_insert`](Self::batch_insert).
    ///
    /// Stops at the first failing batch; batches committed before it stay
    /// committed. Returns the number of deals written.
    pub async fn insert_batched<I>(&self, deals: I, batch_size: usize) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = DealModel>,
    {
        if batch_size == 0 {
            return Err(StoreError::InvalidBatchSize);
        }

        let mut written = 0usize;
        let mut batch = Vec::with_capacity(batch_size);
        let mut deals = deals.into_iter();

        loop {
            batch.clear();
            batch.extend(deals.by_ref().take(batch_size));
            if batch.is_empty() {
                break;
            }

            self.batch_insert(&batch).await?;

            let before = written;
            written += batch.len();
            if written / PROGRESS_LOG_INTERVAL > before / PROGRESS_LOG_INTERVAL {
                if let Some(last) = batch.last() {
                    debug!("Inserted {written} deals into database (last id {})", last.id);
                }
            }
        }

        Ok(written)
    }

    /// Rewrites every column of an existing deal, outside any transaction.
    pub async fn update(&self, deal: &DealModel) -> Result<(), StoreError> {
        let changed = DealAccessor::new(deal).update(&self.pool).await?;
        if changed == 0 {
            return Err(StoreError::NotFound(deal.id.clone()));
        }
        Ok(())
    }

    /// Loads one deal by identifier.
    pub async fn by_id(&self, id: &str) -> Result<DealModel, StoreError> {
        let row = sqlx::query(SELECT_BY_ID_SQL.as_str())
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::from_lookup(id, e))?;

        let mut deal = DealModel::default();
        DealAccessor::new(&mut deal).scan(&row)?;
        Ok(deal)
    }

    /// Number of stored deals.
    pub async fn count(&self) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Deals")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DealLabel;
    use crate::storage::test_helpers::{create_test_pool, sample_deal};
    use num_bigint::BigInt;

    #[tokio::test]
    async fn test_batch_insert_and_by_id() {
        let store = DealStore::new(create_test_pool().await);
        let deals = vec![sample_deal("d1"), sample_deal("d2")];
        store.batch_insert(&deals).await.expect("batch insert");

        assert_eq!(store.count().await.unwrap(), 2);
        assert_eq!(store.by_id("d1").await.unwrap(), deals[0]);
        assert_eq!(store.by_id("d2").await.unwrap(), deals[1]);
    }

    #[tokio::test]
    async fn test_batch_insert_is_all_or_nothing() {
        let store = DealStore::new(create_test_pool().await);
        let mut bad = sample_deal("d2");
        bad.deal.proposal.label = DealLabel::String("a".repeat(300));
        let deals = vec![sample_deal("d1"), bad, sample_deal("d3")];

        let err = store.batch_insert(&deals).await.unwrap_err();
        match err {
            StoreError::Field(e) => assert_eq!(e.field, "Label"),
            other => panic!("expected field error, got {other:?}"),
        }
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_batch_insert_rolls_back_on_duplicate_id() {
        let store = DealStore::new(create_test_pool().await);
        let deals = vec![sample_deal("d1"), sample_deal("d1")];
        let err = store.batch_insert(&deals).await.unwrap_err();
        assert!(matches!(err, StoreError::Sql(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_by_id_missing_is_not_found() {
        let store = DealStore::new(create_test_pool().await);
        let err = store.by_id("nope").await.unwrap_err();
        assert!(err.is_not_found(), "{err:?}");
    }

    #[tokio::test]
    async fn test_update_rewrites_all_but_id() {
        let store = DealStore::new(create_test_pool().await);
        store.batch_insert(&[sample_deal("d1")]).await.unwrap();

        let mut deal = sample_deal("d1");
        deal.deal.state.slash_epoch = 4242;
        deal.deal.proposal.label = DealLabel::Bytes(vec![0xAB, 0xCD]);
        deal.deal.proposal.client_collateral = BigInt::from(77);
        store.update(&deal).await.expect("update");

        assert_eq!(store.by_id("d1").await.unwrap(), deal);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = DealStore::new(create_test_pool().await);
        let err = store.update(&sample_deal("ghost")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_insert_batched_splits_into_transactions() {
        let store = DealStore::new(create_test_pool().await);
        let deals: Vec<DealModel> = (0..7).map(|i| sample_deal(&format!("d{i}"))).collect();
        let written = store.insert_batched(deals, 3).await.unwrap();
        assert_eq!(written, 7);
        assert_eq!(store.count().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_insert_batched_keeps_earlier_batches_on_failure() {
        let store = DealStore::new(create_test_pool().await);
        let mut deals: Vec<DealModel> = (0..5).map(|i| sample_deal(&format!("d{i}"))).collect();
        deals[3].deal.proposal.label = DealLabel::Bytes(vec![0; 512]);

        let err = store.insert_batched(deals, 2).await.unwrap_err();
        assert!(matches!(err, StoreError::Field(_)));
        // d0, d1 committed; the d2/d3 batch rolled back; d4 never attempted
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_insert_batched_rejects_zero_batch_size() {
        let store = DealStore::new(create_test_pool().await);
        let err = store.insert_batched(Vec::new(), 0).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidBatchSize));
    }

    #[tokio::test]
    async fn test_null_collateral_reads_back_as_zero() {
        let store = DealStore::new(create_test_pool().await);
        store.batch_insert(&[sample_deal("d1")]).await.unwrap();
        sqlx::query("UPDATE Deals SET ClientCollateral = NULL WHERE ID = 'd1'")
            .execute(store.pool())
            .await
            .unwrap();

        let deal = store.by_id("d1").await.unwrap();
        assert_eq!(deal.deal.proposal.client_collateral, BigInt::from(0));
    }

    #[tokio::test]
    async fn test_corrupt_row_surfaces_field_error() {
        let store = DealStore::new(create_test_pool().await);
        store.batch_insert(&[sample_deal("d1")]).await.unwrap();
        sqlx::query("UPDATE Deals SET PieceCID = 'zzz' WHERE ID = 'd1'")
            .execute(store.pool())
            .await
            .unwrap();

        let err = store.by_id("d1").await.unwrap_err();
        match err {
            StoreError::Field(e) => assert_eq!(e.field, "PieceCID"),
            other => panic!("expected field error, got {other:?}"),
        }
    }
}
