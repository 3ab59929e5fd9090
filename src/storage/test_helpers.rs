//! Shared test helpers for storage module tests.
//!
//! This module provides common utilities for database setup and test data creation
//! used across storage module tests.

#[cfg(test)]
use std::str::FromStr;

#[cfg(test)]
use sqlx::sqlite::SqlitePoolOptions;
#[cfg(test)]
use sqlx::SqlitePool;

#[cfg(test)]
use crate::models::{DealLabel, DealModel, DealProposal, DealState, MarketDeal};
#[cfg(test)]
use crate::storage::create_tables;

/// Creates a test database pool with the schema applied.
/// Uses an in-memory database held on a single connection, so every query
/// sees the same database.
#[cfg(test)]
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    create_tables(&pool)
        .await
        .expect("Failed to create tables");
    pool
}

/// Builds a deal with realistic values for every column.
#[cfg(test)]
pub fn sample_deal(id: &str) -> DealModel {
    use fvm_shared::address::Address;
    use num_bigint::BigInt;

    DealModel::new(
        id,
        MarketDeal {
            proposal: DealProposal {
                piece_cid: cid::Cid::from_str(
                    "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi",
                )
                .expect("valid CID"),
                piece_size: 34359738368,
                verified_deal: true,
                client: Address::new_id(1234),
                provider: Address::new_id(5678),
                label: DealLabel::String(format!("label for {id}")),
                start_epoch: 1_000,
                end_epoch: 1_520_000,
                storage_price_per_epoch: BigInt::from(0),
                provider_collateral: BigInt::from(8606598491116498u64),
                client_collateral: BigInt::from(0),
            },
            state: DealState {
                sector_start_epoch: 1_200,
                last_updated_epoch: -1,
                slash_epoch: -1,
            },
        },
    )
}
