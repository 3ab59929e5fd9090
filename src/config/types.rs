//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    API_INFO_ENV, DEFAULT_BATCH_COMMIT, DEFAULT_DB_URL, DEFAULT_NODE_TIMEOUT, DEFAULT_OUT_FILE,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Library configuration (no CLI dependencies).
///
/// # Examples
///
/// ```no_run
/// use deal_export::Config;
///
/// let config = Config {
///     api_info: "eyJhbGciOi...:/ip4/127.0.0.1/tcp/1234/http".to_string(),
///     batch_commit: 1000,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Node connection info (`<token>:<multiaddr>` or a URL)
    pub api_info: String,

    /// Text export path; `None` skips the text export
    pub out_file: Option<PathBuf>,

    /// Database URL; `None` skips the database export
    pub db_url: Option<String>,

    /// Deals per database transaction
    pub batch_commit: usize,

    /// Timeout for the node query
    pub node_timeout: Duration,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_info: String::new(),
            out_file: Some(PathBuf::from(DEFAULT_OUT_FILE)),
            db_url: Some(DEFAULT_DB_URL.to_string()),
            batch_commit: DEFAULT_BATCH_COMMIT,
            node_timeout: DEFAULT_NODE_TIMEOUT,
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}

/// Command-line options.
///
/// # Examples
///
/// ```bash
/// # Export to the default deals.txt and sqlite:deals.db
/// FULLNODE_API_INFO=<token>:/ip4/127.0.0.1/tcp/1234/http deal_export
///
/// # Database only, bigger transactions, debug logging
/// deal_export --out-file "" --db-url sqlite:/data/deals.db --batch-commit 5000 --debug
/// ```
#[derive(Debug, Parser)]
#[command(
    name = "deal_export",
    about = "Exports storage-market deals from a Lotus node to a text file and a SQLite database."
)]
pub struct Opt {
    /// File to write `<id>|<json>` lines to (empty to skip)
    #[arg(long, default_value = DEFAULT_OUT_FILE)]
    pub out_file: String,

    /// Database connection URL (empty to skip)
    #[arg(long, default_value = DEFAULT_DB_URL)]
    pub db_url: String,

    /// Number of deals committed per database transaction
    #[arg(long, default_value_t = DEFAULT_BATCH_COMMIT as u64, value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_commit: u64,

    /// Enable debug logging (shorthand for --log-level debug)
    #[arg(long)]
    pub debug: bool,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Timeout for the market-deals query, in seconds
    #[arg(long, default_value_t = DEFAULT_NODE_TIMEOUT.as_secs())]
    pub timeout_seconds: u64,

    /// Node API info: `<token>:<multiaddr>`, `<token>:<url>`, or just the address
    #[arg(long, env = API_INFO_ENV, hide_env_values = true)]
    pub api_info: String,
}

impl From<Opt> for Config {
    fn from(opt: Opt) -> Self {
        let log_level = if opt.debug {
            LogLevel::Debug
        } else {
            opt.log_level
        };
        Config {
            api_info: opt.api_info,
            out_file: (!opt.out_file.is_empty()).then(|| PathBuf::from(opt.out_file)),
            db_url: (!opt.db_url.is_empty()).then_some(opt.db_url),
            batch_commit: usize::try_from(opt.batch_commit).unwrap_or(usize::MAX),
            node_timeout: Duration::from_secs(opt.timeout_seconds),
            log_level,
            log_format: opt.log_format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Opt, clap::Error> {
        let mut full = vec!["deal_export", "--api-info", "tok:/ip4/127.0.0.1/tcp/1234/http"];
        full.extend_from_slice(args);
        Opt::try_parse_from(full)
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Debug),
            log::LevelFilter::Debug
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_defaults() {
        let config = Config::from(parse(&[]).unwrap());
        assert_eq!(config.out_file, Some(PathBuf::from("deals.txt")));
        assert_eq!(config.db_url.as_deref(), Some("sqlite:deals.db"));
        assert_eq!(config.batch_commit, 500);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.node_timeout, Duration::from_secs(300));
    }

    #[test]
    fn test_empty_paths_disable_outputs() {
        let config = Config::from(parse(&["--out-file", "", "--db-url", ""]).unwrap());
        assert!(config.out_file.is_none());
        assert!(config.db_url.is_none());
    }

    #[test]
    fn test_debug_flag_overrides_log_level() {
        let config = Config::from(parse(&["--debug", "--log-level", "warn"]).unwrap());
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_batch_commit_must_be_positive() {
        assert!(parse(&["--batch-commit", "0"]).is_err());
        let config = Config::from(parse(&["--batch-commit", "42"]).unwrap());
        assert_eq!(config.batch_commit, 42);
    }
}
