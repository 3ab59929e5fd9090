//! Column codecs.
//!
//! Each codec converts one in-memory field type to a primitive SQLite can
//! store (`INTEGER`, `TEXT`, or `NULL`) and back. The contract every codec
//! honors is the round-trip law: unmarshalling a marshalled value yields an
//! equal value.
//!
//! | Codec          | Column  | NULL on read             |
//! |----------------|---------|--------------------------|
//! | [`Plain`]      | as-is   | error                    |
//! | [`CidCodec`]   | TEXT    | field left untouched     |
//! | [`AddressCodec`] | TEXT  | error                    |
//! | [`LabelCodec`] | TEXT    | field left untouched     |
//! | [`BigIntCodec`]| TEXT    | zero                     |

use std::marker::PhantomData;
use std::str::FromStr;

use cid::Cid;
use fvm_shared::address::Address;
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;

use crate::error_handling::CodecError;
use crate::models::DealLabel;

/// The primitive a column is scanned as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
    Integer,
    Boolean,
    Text,
}

impl SlotKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotKind::Integer => "integer",
            SlotKind::Boolean => "boolean",
            SlotKind::Text => "text",
        }
    }
}

/// A database-storable primitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbValue {
    Null,
    Integer(i64),
    Boolean(bool),
    Text(String),
}

impl DbValue {
    fn kind_name(&self) -> &'static str {
        match self {
            DbValue::Null => "null",
            DbValue::Integer(_) => "integer",
            DbValue::Boolean(_) => "boolean",
            DbValue::Text(_) => "text",
        }
    }

    fn mismatch(&self, expected: SlotKind) -> CodecError {
        CodecError::TypeMismatch {
            expected: expected.as_str(),
            found: self.kind_name(),
        }
    }

    /// Reads a TEXT slot; `None` means the column was NULL.
    fn into_text(self) -> Result<Option<String>, CodecError> {
        match self {
            DbValue::Null => Ok(None),
            DbValue::Text(s) => Ok(Some(s)),
            other => Err(other.mismatch(SlotKind::Text)),
        }
    }
}

/// Bidirectional conversion between a field type and a [`DbValue`].
pub trait FieldCodec: Send + Sync {
    type Value;

    /// Primitive kind the scanner should read for this column.
    fn slot(&self) -> SlotKind;

    fn marshal(&self, value: &Self::Value) -> Result<DbValue, CodecError>;

    /// Writes the scanned value into `value`. Codecs that treat NULL as
    /// "unset" may leave `value` as it was.
    fn unmarshal(&self, raw: DbValue, value: &mut Self::Value) -> Result<(), CodecError>;
}

/// Types the SQLite driver stores natively.
pub trait PlainValue: Sized {
    const SLOT: SlotKind;

    fn to_db(&self) -> Result<DbValue, CodecError>;

    fn from_db(raw: DbValue) -> Result<Self, CodecError>;
}

impl PlainValue for i64 {
    const SLOT: SlotKind = SlotKind::Integer;

    fn to_db(&self) -> Result<DbValue, CodecError> {
        Ok(DbValue::Integer(*self))
    }

    fn from_db(raw: DbValue) -> Result<Self, CodecError> {
        match raw {
            DbValue::Integer(i) => Ok(i),
            DbValue::Null => Err(CodecError::UnexpectedNull),
            other => Err(other.mismatch(Self::SLOT)),
        }
    }
}

impl PlainValue for u64 {
    const SLOT: SlotKind = SlotKind::Integer;

    fn to_db(&self) -> Result<DbValue, CodecError> {
        i64::try_from(*self)
            .map(DbValue::Integer)
            .map_err(|_| CodecError::Marshal(format!("{self} does not fit in a signed 64-bit column")))
    }

    fn from_db(raw: DbValue) -> Result<Self, CodecError> {
        let i = i64::from_db(raw)?;
        u64::try_from(i).map_err(|_| CodecError::Decode {
            raw: i.to_string(),
            reason: "negative value for an unsigned field".to_string(),
        })
    }
}

impl PlainValue for bool {
    const SLOT: SlotKind = SlotKind::Boolean;

    fn to_db(&self) -> Result<DbValue, CodecError> {
        Ok(DbValue::Boolean(*self))
    }

    fn from_db(raw: DbValue) -> Result<Self, CodecError> {
        match raw {
            DbValue::Boolean(b) => Ok(b),
            DbValue::Integer(i) => Ok(i != 0),
            DbValue::Null => Err(CodecError::UnexpectedNull),
            other => Err(other.mismatch(Self::SLOT)),
        }
    }
}

impl PlainValue for String {
    const SLOT: SlotKind = SlotKind::Text;

    fn to_db(&self) -> Result<DbValue, CodecError> {
        Ok(DbValue::Text(self.clone()))
    }

    fn from_db(raw: DbValue) -> Result<Self, CodecError> {
        raw.into_text()?.ok_or(CodecError::UnexpectedNull)
    }
}

/// Identity passthrough for types the driver already understands.
pub struct Plain<T>(PhantomData<fn() -> T>);

impl<T> Plain<T> {
    pub fn new() -> Self {
        Plain(PhantomData)
    }
}

impl<T> Default for Plain<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: PlainValue> FieldCodec for Plain<T> {
    type Value = T;

    fn slot(&self) -> SlotKind {
        T::SLOT
    }

    fn marshal(&self, value: &T) -> Result<DbValue, CodecError> {
        value.to_db()
    }

    fn unmarshal(&self, raw: DbValue, value: &mut T) -> Result<(), CodecError> {
        *value = T::from_db(raw)?;
        Ok(())
    }
}

/// Content identifiers, stored in their canonical multibase text form.
pub struct CidCodec;

impl FieldCodec for CidCodec {
    type Value = Cid;

    fn slot(&self) -> SlotKind {
        SlotKind::Text
    }

    fn marshal(&self, value: &Cid) -> Result<DbValue, CodecError> {
        Ok(DbValue::Text(value.to_string()))
    }

    fn unmarshal(&self, raw: DbValue, value: &mut Cid) -> Result<(), CodecError> {
        let Some(text) = raw.into_text()? else {
            return Ok(());
        };
        *value = Cid::from_str(&text).map_err(|e| CodecError::Parse {
            reason: format!("invalid CID: {e}"),
            raw: text,
        })?;
        Ok(())
    }
}

/// Filecoin addresses, stored as `f0...`/`f1...` text.
pub struct AddressCodec;

impl FieldCodec for AddressCodec {
    type Value = Address;

    fn slot(&self) -> SlotKind {
        SlotKind::Text
    }

    fn marshal(&self, value: &Address) -> Result<DbValue, CodecError> {
        Ok(DbValue::Text(value.to_string()))
    }

    fn unmarshal(&self, raw: DbValue, value: &mut Address) -> Result<(), CodecError> {
        let Some(text) = raw.into_text()? else {
            return Err(CodecError::Parse {
                raw: "NULL".to_string(),
                reason: "address column is empty".to_string(),
            });
        };
        *value = Address::from_str(&text).map_err(|e| CodecError::Parse {
            reason: format!("invalid address: {e}"),
            raw: text,
        })?;
        Ok(())
    }
}

const LABEL_STRING_PREFIX: char = '\'';
const LABEL_BYTES_PREFIX: char = 'x';

/// Deal labels, stored with a one-character discriminator so the two union
/// variants stay distinguishable as text: `'` + the string, or `x` + the
/// lowercase hex of the bytes.
pub struct LabelCodec;

impl FieldCodec for LabelCodec {
    type Value = DealLabel;

    fn slot(&self) -> SlotKind {
        SlotKind::Text
    }

    fn marshal(&self, value: &DealLabel) -> Result<DbValue, CodecError> {
        value
            .validate()
            .map_err(|e| CodecError::Marshal(format!("deal label: {e}")))?;
        let text = match value {
            DealLabel::String(s) => format!("{LABEL_STRING_PREFIX}{s}"),
            // "x" alone does not decode; an empty payload is the empty label
            DealLabel::Bytes(b) if b.is_empty() => LABEL_STRING_PREFIX.to_string(),
            DealLabel::Bytes(b) => format!("{LABEL_BYTES_PREFIX}{}", hex::encode(b)),
        };
        Ok(DbValue::Text(text))
    }

    fn unmarshal(&self, raw: DbValue, value: &mut DealLabel) -> Result<(), CodecError> {
        let Some(text) = raw.into_text()? else {
            return Ok(());
        };

        if text.is_empty() || text == "'" {
            *value = DealLabel::default();
            return Ok(());
        }

        if let Some(encoded) = text.strip_prefix(LABEL_BYTES_PREFIX) {
            if encoded.is_empty() {
                return Err(CodecError::Decode {
                    raw: text,
                    reason: "empty hex payload".to_string(),
                });
            }
            let bytes = hex::decode(encoded).map_err(|e| CodecError::Decode {
                raw: text.clone(),
                reason: format!("invalid hex: {e}"),
            })?;
            *value = DealLabel::new_bytes(bytes).map_err(|e| CodecError::Decode {
                raw: text.clone(),
                reason: e.to_string(),
            })?;
            return Ok(());
        }

        // Anything else is a string label behind a one-character prefix.
        let mut chars = text.chars();
        chars.next();
        *value = DealLabel::new_string(chars.as_str()).map_err(|e| CodecError::Decode {
            raw: text.clone(),
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

/// Token amounts, stored as decimal text. NULL reads back as zero.
pub struct BigIntCodec;

impl FieldCodec for BigIntCodec {
    type Value = BigInt;

    fn slot(&self) -> SlotKind {
        SlotKind::Text
    }

    fn marshal(&self, value: &BigInt) -> Result<DbValue, CodecError> {
        Ok(DbValue::Text(value.to_string()))
    }

    fn unmarshal(&self, raw: DbValue, value: &mut BigInt) -> Result<(), CodecError> {
        let Some(text) = raw.into_text()? else {
            *value = BigInt::zero();
            return Ok(());
        };
        *value = parse_big_int(&text).ok_or_else(|| CodecError::Parse {
            raw: text.clone(),
            reason: "not an integer literal".to_string(),
        })?;
        Ok(())
    }
}

/// Parses an integer literal with its base taken from the prefix:
/// `0x`/`0X` hex, `0b`/`0B` binary, `0o`/`0O` or a bare leading `0` octal,
/// decimal otherwise. An optional `+`/`-` sign may precede the prefix.
/// Single `_` separators are allowed between digits and right after a prefix.
pub fn parse_big_int(s: &str) -> Option<BigInt> {
    let (sign, unsigned) = match s.as_bytes().first() {
        Some(b'-') => (Sign::Minus, &s[1..]),
        Some(b'+') => (Sign::Plus, &s[1..]),
        _ => (Sign::Plus, s),
    };

    let (radix, prefixed, digits) = if let Some(rest) = strip_prefix_ci(unsigned, "0x") {
        (16, true, rest)
    } else if let Some(rest) = strip_prefix_ci(unsigned, "0b") {
        (2, true, rest)
    } else if let Some(rest) = strip_prefix_ci(unsigned, "0o") {
        (8, true, rest)
    } else if unsigned.len() > 1 && unsigned.starts_with('0') {
        (8, true, &unsigned[1..])
    } else {
        (10, false, unsigned)
    };

    if !separators_ok(digits, prefixed) {
        return None;
    }
    let digits: String = digits.chars().filter(|&c| c != '_').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }

    let magnitude = BigUint::parse_bytes(digits.as_bytes(), radix)?;
    Some(BigInt::from_biguint(sign, magnitude))
}

/// `_` must sit between two digits, or between a base prefix and a digit.
fn separators_ok(digits: &str, prefixed: bool) -> bool {
    let mut prev_digit = prefixed;
    let mut prev_underscore = false;
    for c in digits.chars() {
        if c == '_' {
            if !prev_digit {
                return false;
            }
            prev_digit = false;
            prev_underscore = true;
        } else {
            prev_digit = true;
            prev_underscore = false;
        }
    }
    !prev_underscore
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let head = s.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &s[prefix.len()..])
}
