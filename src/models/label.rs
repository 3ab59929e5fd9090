//! Deal proposal label.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum label payload, in bytes.
pub const DEAL_MAX_LABEL_SIZE: usize = 256;

/// Free-text or opaque label attached to a deal proposal.
///
/// In JSON the string variant is a plain string and the bytes variant is an
/// array of numbers, so the two stay distinguishable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DealLabel {
    String(String),
    Bytes(Vec<u8>),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LabelError {
    #[error("label is {0} bytes, larger than the {max} byte limit", max = DEAL_MAX_LABEL_SIZE)]
    TooLong(usize),
}

impl Default for DealLabel {
    fn default() -> Self {
        DealLabel::String(String::new())
    }
}

impl DealLabel {
    pub fn new_string(s: impl Into<String>) -> Result<Self, LabelError> {
        let s = s.into();
        check_len(s.len())?;
        Ok(DealLabel::String(s))
    }

    pub fn new_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, LabelError> {
        let bytes = bytes.into();
        check_len(bytes.len())?;
        Ok(DealLabel::Bytes(bytes))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, DealLabel::String(_))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            DealLabel::String(s) => s.is_empty(),
            DealLabel::Bytes(b) => b.is_empty(),
        }
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        match self {
            DealLabel::String(s) => s.len(),
            DealLabel::Bytes(b) => b.len(),
        }
    }

    /// Fails if the label could not have come from the chain.
    pub fn validate(&self) -> Result<(), LabelError> {
        check_len(self.len())
    }
}

fn check_len(len: usize) -> Result<(), LabelError> {
    if len > DEAL_MAX_LABEL_SIZE {
        return Err(LabelError::TooLong(len));
    }
    Ok(())
}
