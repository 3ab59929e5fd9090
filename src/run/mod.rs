//! Export driver: fetch the deal set once, then write it down both paths.

mod task;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use log::{error, info};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::models::MarketDeal;
use crate::node::{ApiInfo, NodeClient};

use task::{db_task, text_task};

/// Outcome of an export run.
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    /// Deals returned by the node
    pub total_deals: usize,
    /// Lines written to the text file; `None` when the path was disabled or failed
    pub text_written: Option<usize>,
    /// Rows committed to the database; `None` when the path was disabled or failed
    pub db_written: Option<usize>,
    /// One message per failed path
    pub failures: Vec<String>,
    /// Wall time of the whole run
    pub elapsed_seconds: f64,
}

impl ExportReport {
    /// True when every enabled path finished.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Fetches every market deal from the node and exports it.
///
/// # Errors
///
/// Fails when the API info is malformed, the node cannot be queried, or
/// `cancel` fires before the deals arrive. Failures of the individual write
/// paths do not fail the run; they are listed in [`ExportReport::failures`].
///
/// # Example
///
/// ```no_run
/// use deal_export::{run_export, Config};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config {
///     api_info: "eyJhbGciOi...:/ip4/127.0.0.1/tcp/1234/http".to_string(),
///     ..Default::default()
/// };
/// let report = run_export(config, CancellationToken::new()).await?;
/// println!("Exported {} deals", report.total_deals);
/// # Ok(())
/// # }
/// ```
pub async fn run_export(config: Config, cancel: CancellationToken) -> Result<ExportReport> {
    let start = Instant::now();

    let api_info = ApiInfo::parse(&config.api_info).context("Failed to parse node API info")?;
    let client = NodeClient::new(&api_info, config.node_timeout)
        .context("Failed to initialize node client")?;

    info!("Fetching market deals from {}", client.endpoint());
    let fetch_start = Instant::now();
    let deals = tokio::select! {
        res = client.state_market_deals() => res.context("Failed to fetch market deals")?,
        _ = cancel.cancelled() => bail!("Cancelled while fetching market deals"),
    };
    info!(
        "Fetched {} market deals, took {:?}",
        deals.len(),
        fetch_start.elapsed()
    );

    let mut report = export_deals(&config, deals, cancel).await;
    report.elapsed_seconds = start.elapsed().as_secs_f64();
    Ok(report)
}

/// Writes an already fetched deal set to the enabled paths.
///
/// The text path and the database path run as independent tasks and are both
/// joined before returning; one failing does not stop the other.
pub async fn export_deals(
    config: &Config,
    deals: BTreeMap<String, MarketDeal>,
    cancel: CancellationToken,
) -> ExportReport {
    let start = Instant::now();
    let deals = Arc::new(deals);
    let mut report = ExportReport {
        total_deals: deals.len(),
        ..Default::default()
    };

    let text_handle = config
        .out_file
        .clone()
        .map(|path| tokio::spawn(text_task(path, Arc::clone(&deals))));
    let db_handle = config.db_url.clone().map(|url| {
        tokio::spawn(db_task(
            url,
            config.batch_commit,
            Arc::clone(&deals),
            cancel.clone(),
        ))
    });

    report.text_written = join_path("text", text_handle, &mut report.failures).await;
    report.db_written = join_path("database", db_handle, &mut report.failures).await;

    report.elapsed_seconds = start.elapsed().as_secs_f64();
    report
}

async fn join_path(
    name: &str,
    handle: Option<JoinHandle<Result<usize>>>,
    failures: &mut Vec<String>,
) -> Option<usize> {
    let outcome = match handle?.await {
        Ok(res) => res,
        Err(join_err) => Err(anyhow::Error::new(join_err).context(format!("{name} export task"))),
    };
    match outcome {
        Ok(written) => Some(written),
        Err(e) => {
            error!("{name} export failed: {e:#}");
            failures.push(format!("{name}: {e:#}"));
            None
        }
    }
}
