//! Configuration constants.
//!
//! This module defines the configuration constants used throughout the application,
//! including defaults for CLI options and logging intervals.

use std::time::Duration;

/// Default path of the line-delimited text export.
pub const DEFAULT_OUT_FILE: &str = "deals.txt";

/// Default database connection URL.
pub const DEFAULT_DB_URL: &str = "sqlite:deals.db";

/// Deals written per database transaction.
pub const DEFAULT_BATCH_COMMIT: usize = 500;

/// Timeout for the market-deals query. The full deal set is several GB on
/// mainnet, so this is generous.
pub const DEFAULT_NODE_TIMEOUT: Duration = Duration::from_secs(300);

/// Environment variable holding the node's `<token>:<multiaddr>`.
pub const API_INFO_ENV: &str = "FULLNODE_API_INFO";

/// JSON-RPC API version the node client dials.
pub const NODE_API_VERSION: &str = "v1";

/// Emit a progress line every this many inserted deals.
pub const PROGRESS_LOG_INTERVAL: usize = 10_000;
