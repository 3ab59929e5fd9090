// Shared test helpers for node mocking and database setup.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use serde_json::{json, Value};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use deal_export::storage::create_tables;

/// Creates an in-memory database pool with the `Deals` table.
/// A single connection keeps every query on the same database.
#[allow(dead_code)] // Used by other test files
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database pool");
    create_tables(&pool).await.expect("Failed to create tables");
    pool
}

/// A deal in the node's JSON encoding, varied by `n`.
#[allow(dead_code)]
pub fn node_deal_json(n: u64) -> Value {
    json!({
        "Proposal": {
            "PieceCID": {"/": "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi"},
            "PieceSize": 34359738368u64,
            "VerifiedDeal": n % 2 == 0,
            "Client": format!("f0{}", 1000 + n),
            "Provider": "f05678",
            "Label": format!("deal label {n}"),
            "StartEpoch": 1000 + n,
            "EndEpoch": 1_520_000 + n,
            "StoragePricePerEpoch": "0",
            "ProviderCollateral": "8606598491116498",
            "ClientCollateral": (n * 1_000_000_000_000_000u64).to_string()
        },
        "State": {
            "SectorStartEpoch": 1200,
            "LastUpdatedEpoch": -1,
            "SlashEpoch": -1
        }
    })
}

/// A `Filecoin.StateMarketDeals` response holding one deal per id.
#[allow(dead_code)]
pub fn market_deals_response(ids: &[&str]) -> Value {
    let deals: serde_json::Map<String, Value> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.to_string(), node_deal_json(i as u64)))
        .collect();
    json!({"jsonrpc": "2.0", "result": deals, "id": 1})
}
