//! HTTP client initialization.

use std::time::Duration;

use reqwest::ClientBuilder;

/// User-Agent sent to the node.
const USER_AGENT: &str = concat!("deal_export/", env!("CARGO_PKG_VERSION"));

/// Initializes the HTTP client used for node RPC calls.
///
/// Creates a `reqwest::Client` configured with:
/// - A whole-request timeout (the deal set is one large response)
/// - A crate User-Agent
/// - Rustls TLS backend (no native TLS)
///
/// # Errors
///
/// Returns a `reqwest::Error` if client creation fails.
pub fn init_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    ClientBuilder::new()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}
