//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `deal_export` library that handles:
//! - Command-line argument parsing
//! - Logger initialization
//! - Ctrl-C cancellation
//! - User-facing output formatting
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use log::warn;
use std::process;
use tokio_util::sync::CancellationToken;

use deal_export::initialization::init_logger_with;
use deal_export::{run_export, Config, Opt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from(Opt::parse());

    init_logger_with(config.log_level.clone().into(), config.log_format.clone())
        .context("Failed to initialize logger")?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, rolling back the open database batch");
            on_signal.cancel();
        }
    });

    match run_export(config, cancel).await {
        Ok(report) => {
            println!(
                "✅ Exported {} deal{} in {:.1}s (text: {}, database: {})",
                report.total_deals,
                if report.total_deals == 1 { "" } else { "s" },
                report.elapsed_seconds,
                describe(report.text_written),
                describe(report.db_written),
            );
            if !report.is_success() {
                for failure in &report.failures {
                    eprintln!("deal_export error: {failure}");
                }
                process::exit(1);
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("deal_export error: {:#}", e);
            process::exit(1);
        }
    }
}

fn describe(written: Option<usize>) -> String {
    written.map_or_else(|| "-".to_string(), |n| n.to_string())
}
