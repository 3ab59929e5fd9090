//! Error handling.
//!
//! This module provides the error type definitions for every layer:
//! - **Codec / field errors**: a single column failed to convert
//! - **Store errors**: SQL failures, lookups that miss, and field errors
//! - **RPC errors**: the node could not be reached or returned a failure
//! - **Export / initialization errors**: the text path and process setup

mod types;

// Re-export public API
pub use types::{
    CodecError, DatabaseError, ExportError, FieldError, InitializationError, RpcError, StoreError,
};
