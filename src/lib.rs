//! deal_export library: Filecoin storage-market deal export
//!
//! This library fetches every storage-market deal a Lotus node knows about
//! and writes the set down two independent paths:
//! - a line-delimited text file of `<id>|<json>` records
//! - a SQLite `Deals` table, one typed column per deal field
//!
//! The database mapping is driven by a static list of fields, each with its
//! own codec between the in-memory value and the column value.
//!
//! # Example
//!
//! ```no_run
//! use deal_export::{run_export, Config};
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config {
//!     api_info: std::env::var("FULLNODE_API_INFO")?,
//!     batch_commit: 1000,
//!     ..Default::default()
//! };
//!
//! let report = run_export(config, CancellationToken::new()).await?;
//! println!(
//!     "Exported {} deals ({} failed paths)",
//!     report.total_deals,
//!     report.failures.len()
//! );
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod config;
mod error_handling;
pub mod export;
pub mod initialization;
pub mod models;
pub mod node;
mod run;
pub mod storage;

// Re-export public API
pub use config::{Config, LogFormat, LogLevel, Opt};
pub use error_handling::{
    CodecError, DatabaseError, ExportError, FieldError, InitializationError, RpcError, StoreError,
};
pub use models::{DealLabel, DealModel, MarketDeal};
pub use run::{export_deals, run_export, ExportReport};
