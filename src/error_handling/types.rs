//! Error type definitions.
//!
//! This module defines the error types used throughout the application, from
//! single-column codec failures up to the node client and the export paths.

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error")]
    LoggerError(#[from] SetLoggerError),

    /// Error building the HTTP client used to talk to the node.
    #[error("HTTP client initialization error")]
    HttpClientError(#[from] ReqwestError),
}

/// Error types for database setup (connection and schema).
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The connection URL could not be parsed.
    #[error("Invalid database URL '{url}'")]
    InvalidUrl {
        url: String,
        #[source]
        source: sqlx::Error,
    },

    /// SQL execution error.
    #[error(transparent)]
    SqlError(#[from] sqlx::Error),
}

/// Failure converting a single value between its in-memory and column form.
///
/// The offending column name is attached by [`FieldError`].
#[derive(Error, Debug)]
pub enum CodecError {
    /// Text could not be parsed back into the field's type.
    #[error("parsing '{raw}': {reason}")]
    Parse { raw: String, reason: String },

    /// Text had the right shape but its payload could not be decoded.
    #[error("decoding '{raw}': {reason}")]
    Decode { raw: String, reason: String },

    /// The value cannot be represented as a column value.
    #[error("marshalling value: {0}")]
    Marshal(String),

    /// NULL was scanned for a column that requires a value.
    #[error("unexpected NULL")]
    UnexpectedNull,

    /// The scanned primitive is not the kind the field reads.
    #[error("expected {expected} column value, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// A [`CodecError`] tagged with the column it happened on.
#[derive(Error, Debug)]
#[error("field {field}: {source}")]
pub struct FieldError {
    pub field: &'static str,
    #[source]
    pub source: CodecError,
}

impl FieldError {
    pub fn new(field: &'static str, source: CodecError) -> Self {
        FieldError { field, source }
    }
}

/// Error types for deal store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A field failed to marshal or unmarshal; the whole record is discarded.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// Statement preparation or execution failed.
    #[error(transparent)]
    Sql(#[from] sqlx::Error),

    /// No row matched the requested deal identifier.
    #[error("deal {0} not found")]
    NotFound(String),

    /// Batches must hold at least one record.
    #[error("batch size must be at least 1")]
    InvalidBatchSize,
}

impl StoreError {
    /// Maps sqlx's "no rows" condition onto [`StoreError::NotFound`].
    pub(crate) fn from_lookup(id: &str, err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound(id.to_string()),
            other => StoreError::Sql(other),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Error types for talking to the node.
#[derive(Error, Debug)]
pub enum RpcError {
    /// The API info string could not be turned into an endpoint.
    #[error("invalid node API info '{0}'")]
    InvalidApiInfo(String),

    /// The node could not be reached.
    #[error("connect to node at {url}")]
    Connect {
        url: String,
        #[source]
        source: ReqwestError,
    },

    /// The node answered with a non-success HTTP status.
    #[error("node returned HTTP {status}: {body}")]
    Fetch { status: u16, body: String },

    /// The node answered with a JSON-RPC error object.
    #[error("node returned RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The response body was not the expected JSON.
    #[error("decoding node response: {0}")]
    Decode(String),
}

/// Error types for the text export path.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("encoding deal {id} as JSON")]
    Json {
        id: String,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_names_field_and_raw_value() {
        let err = FieldError::new(
            "PieceCID",
            CodecError::Parse {
                raw: "bogus".into(),
                reason: "bad multibase".into(),
            },
        );
        let msg = err.to_string();
        assert!(msg.contains("PieceCID"), "{msg}");
        assert!(msg.contains("bogus"), "{msg}");
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = StoreError::from_lookup("d1", sqlx::Error::RowNotFound);
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "deal d1 not found");
    }

    #[test]
    fn test_error_chains_print_each_cause_once() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = anyhow::Error::new(ExportError::from(io)).context("Failed to write deals");
        assert_eq!(format!("{err:#}"), "Failed to write deals: no such file");

        let err = anyhow::Error::new(StoreError::from(sqlx::Error::PoolClosed));
        let chain = format!("{err:#}");
        assert_eq!(chain.matches("closed").count(), 1, "{chain}");

        let json_err = serde_json::from_str::<u8>("x").unwrap_err();
        let reason = json_err.to_string();
        let err = anyhow::Error::new(ExportError::Json {
            id: "d1".into(),
            source: json_err,
        });
        let chain = format!("{err:#}");
        assert_eq!(chain, format!("encoding deal d1 as JSON: {reason}"));
    }

    #[test]
    fn test_other_sql_errors_stay_sql() {
        let err = StoreError::from_lookup("d1", sqlx::Error::PoolClosed);
        assert!(matches!(err, StoreError::Sql(_)));
    }
}
