//! Storage-market deal types.
//!
//! These mirror the shape the node returns from `Filecoin.StateMarketDeals`,
//! including its JSON field names, so the same types serve the RPC response,
//! the text export, and the database rows.

mod label;

use cid::Cid;
use fvm_shared::address::Address;
use num_bigint::BigInt;
use serde::{Deserialize, Serialize};

pub use label::{DealLabel, LabelError, DEAL_MAX_LABEL_SIZE};

/// Chain epoch. `-1` means the event has not happened yet.
pub type ChainEpoch = i64;

/// A deal as persisted by this crate: the node-assigned identifier plus the
/// on-chain deal content.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DealModel {
    pub id: String,
    pub deal: MarketDeal,
}

impl DealModel {
    pub fn new(id: impl Into<String>, deal: MarketDeal) -> Self {
        DealModel {
            id: id.into(),
            deal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MarketDeal {
    pub proposal: DealProposal,
    pub state: DealState,
}

/// The client's proposal, as published on chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DealProposal {
    #[serde(rename = "PieceCID", with = "cid_json")]
    pub piece_cid: Cid,
    pub piece_size: u64,
    pub verified_deal: bool,
    #[serde(with = "address_json")]
    pub client: Address,
    #[serde(with = "address_json")]
    pub provider: Address,
    pub label: DealLabel,
    pub start_epoch: ChainEpoch,
    pub end_epoch: ChainEpoch,
    #[serde(with = "bigint_json")]
    pub storage_price_per_epoch: BigInt,
    #[serde(with = "bigint_json")]
    pub provider_collateral: BigInt,
    #[serde(with = "bigint_json")]
    pub client_collateral: BigInt,
}

impl Default for DealProposal {
    fn default() -> Self {
        DealProposal {
            piece_cid: Cid::default(),
            piece_size: 0,
            verified_deal: false,
            client: Address::new_id(0),
            provider: Address::new_id(0),
            label: DealLabel::default(),
            start_epoch: 0,
            end_epoch: 0,
            storage_price_per_epoch: BigInt::default(),
            provider_collateral: BigInt::default(),
            client_collateral: BigInt::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DealState {
    pub sector_start_epoch: ChainEpoch,
    pub last_updated_epoch: ChainEpoch,
    pub slash_epoch: ChainEpoch,
}

/// CIDs in node JSON are wrapped as `{"/": "<cid>"}`.
mod cid_json {
    use std::str::FromStr;

    use cid::Cid;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct Link {
        #[serde(rename = "/")]
        link: String,
    }

    pub fn serialize<S: Serializer>(cid: &Cid, serializer: S) -> Result<S::Ok, S::Error> {
        Link {
            link: cid.to_string(),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Cid, D::Error> {
        let Link { link } = Link::deserialize(deserializer)?;
        Cid::from_str(&link).map_err(|e| D::Error::custom(format!("invalid CID '{link}': {e}")))
    }
}

mod address_json {
    use std::str::FromStr;

    use fvm_shared::address::Address;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(addr: &Address, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&addr.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Address, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_str(&s).map_err(|e| D::Error::custom(format!("invalid address '{s}': {e}")))
    }
}

/// Token amounts travel as decimal strings.
mod bigint_json {
    use num_bigint::BigInt;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigInt, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigInt, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse::<BigInt>()
            .map_err(|e| D::Error::custom(format!("invalid integer '{s}': {e}")))
    }
}
