//! Deal record accessor.
//!
//! Binds every persisted attribute of a [`DealModel`] to its column codec and
//! drives the generic scan / insert / update operations over that binding.
//!
//! The field list is declared once, in column order, and is immutable for the
//! life of the process. Every SQL statement is derived from it, so a SELECT
//! projection and the positional scan that reads it can never disagree.

use std::ops::{Deref, DerefMut};
use std::sync::LazyLock;

use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnection, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool};

use crate::error_handling::{CodecError, FieldError, StoreError};
use crate::models::DealModel;

use super::codec::{
    AddressCodec, BigIntCodec, CidCodec, DbValue, FieldCodec, LabelCodec, Plain, SlotKind,
};

/// Name of the primary-key column.
pub const ID_FIELD: &str = "ID";

/// Table every statement targets.
pub const DEALS_TABLE: &str = "Deals";

/// One column of the `Deals` table bound to its place in a [`DealModel`].
trait DealField: Send + Sync {
    fn name(&self) -> &'static str;

    fn slot(&self) -> SlotKind;

    fn marshal(&self, deal: &DealModel) -> Result<DbValue, CodecError>;

    fn unmarshal(&self, raw: DbValue, deal: &mut DealModel) -> Result<(), CodecError>;
}

struct Field<C: FieldCodec> {
    name: &'static str,
    codec: C,
    get: fn(&DealModel) -> &C::Value,
    get_mut: fn(&mut DealModel) -> &mut C::Value,
}

impl<C: FieldCodec> DealField for Field<C> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn slot(&self) -> SlotKind {
        self.codec.slot()
    }

    fn marshal(&self, deal: &DealModel) -> Result<DbValue, CodecError> {
        self.codec.marshal((self.get)(deal))
    }

    fn unmarshal(&self, raw: DbValue, deal: &mut DealModel) -> Result<(), CodecError> {
        self.codec.unmarshal(raw, (self.get_mut)(deal))
    }
}

fn bind<C>(
    name: &'static str,
    codec: C,
    get: fn(&DealModel) -> &C::Value,
    get_mut: fn(&mut DealModel) -> &mut C::Value,
) -> Box<dyn DealField>
where
    C: FieldCodec + 'static,
    C::Value: 'static,
{
    Box::new(Field {
        name,
        codec,
        get,
        get_mut,
    })
}

static DEAL_FIELDS: LazyLock<Vec<Box<dyn DealField>>> = LazyLock::new(|| {
    vec![
        bind(ID_FIELD, Plain::<String>::new(), |d| &d.id, |d| &mut d.id),
        bind("PieceCID", CidCodec, |d| &d.deal.proposal.piece_cid, |d| {
            &mut d.deal.proposal.piece_cid
        }),
        bind("PieceSize", Plain::<u64>::new(), |d| &d.deal.proposal.piece_size, |d| {
            &mut d.deal.proposal.piece_size
        }),
        bind("VerifiedDeal", Plain::<bool>::new(), |d| &d.deal.proposal.verified_deal, |d| {
            &mut d.deal.proposal.verified_deal
        }),
        bind("ClientAddress", AddressCodec, |d| &d.deal.proposal.client, |d| {
            &mut d.deal.proposal.client
        }),
        bind("ProviderAddress", AddressCodec, |d| &d.deal.proposal.provider, |d| {
            &mut d.deal.proposal.provider
        }),
        bind("Label", LabelCodec, |d| &d.deal.proposal.label, |d| {
            &mut d.deal.proposal.label
        }),
        bind("StartEpoch", Plain::<i64>::new(), |d| &d.deal.proposal.start_epoch, |d| {
            &mut d.deal.proposal.start_epoch
        }),
        bind("EndEpoch", Plain::<i64>::new(), |d| &d.deal.proposal.end_epoch, |d| {
            &mut d.deal.proposal.end_epoch
        }),
        bind(
            "StoragePricePerEpoch",
            BigIntCodec,
            |d| &d.deal.proposal.storage_price_per_epoch,
            |d| &mut d.deal.proposal.storage_price_per_epoch,
        ),
        bind(
            "ProviderCollateral",
            BigIntCodec,
            |d| &d.deal.proposal.provider_collateral,
            |d| &mut d.deal.proposal.provider_collateral,
        ),
        bind(
            "ClientCollateral",
            BigIntCodec,
            |d| &d.deal.proposal.client_collateral,
            |d| &mut d.deal.proposal.client_collateral,
        ),
        bind(
            "SectorStartEpoch",
            Plain::<i64>::new(),
            |d| &d.deal.state.sector_start_epoch,
            |d| &mut d.deal.state.sector_start_epoch,
        ),
        bind(
            "LastUpdatedEpoch",
            Plain::<i64>::new(),
            |d| &d.deal.state.last_updated_epoch,
            |d| &mut d.deal.state.last_updated_epoch,
        ),
        bind("SlashEpoch", Plain::<i64>::new(), |d| &d.deal.state.slash_epoch, |d| {
            &mut d.deal.state.slash_epoch
        }),
    ]
});

/// Column names in scan/insert order.
pub static DEAL_FIELD_NAMES: LazyLock<Vec<&'static str>> =
    LazyLock::new(|| DEAL_FIELDS.iter().map(|f| f.name()).collect());

/// `ID, PieceCID, ...`, used as the projection of every SELECT.
pub static DEAL_COLUMNS: LazyLock<String> = LazyLock::new(|| DEAL_FIELD_NAMES.join(", "));

static INSERT_SQL: LazyLock<String> = LazyLock::new(|| {
    let placeholders = vec!["?"; DEAL_FIELDS.len()].join(", ");
    format!(
        "INSERT INTO {DEALS_TABLE} ({}) VALUES ({placeholders})",
        *DEAL_COLUMNS
    )
});

static UPDATE_SQL: LazyLock<String> = LazyLock::new(|| {
    let assignments = DEAL_FIELD_NAMES
        .iter()
        .filter(|name| **name != ID_FIELD)
        .map(|name| format!("{name} = ?"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("UPDATE {DEALS_TABLE} SET {assignments} WHERE {ID_FIELD} = ?")
});

pub(crate) static SELECT_BY_ID_SQL: LazyLock<String> = LazyLock::new(|| {
    format!(
        "SELECT {} FROM {DEALS_TABLE} WHERE {ID_FIELD} = ?",
        *DEAL_COLUMNS
    )
});

/// Source of one result row, read positionally in a single call.
pub trait ScanRow {
    /// Reads column `i` as `slots[i]` for every slot.
    fn scan(&self, slots: &[SlotKind]) -> Result<Vec<DbValue>, sqlx::Error>;
}

impl ScanRow for SqliteRow {
    fn scan(&self, slots: &[SlotKind]) -> Result<Vec<DbValue>, sqlx::Error> {
        slots
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                let value = match slot {
                    SlotKind::Integer => self
                        .try_get::<Option<i64>, _>(i)?
                        .map_or(DbValue::Null, DbValue::Integer),
                    SlotKind::Boolean => self
                        .try_get::<Option<bool>, _>(i)?
                        .map_or(DbValue::Null, DbValue::Boolean),
                    SlotKind::Text => self
                        .try_get::<Option<String>, _>(i)?
                        .map_or(DbValue::Null, DbValue::Text),
                };
                Ok(value)
            })
            .collect()
    }
}

/// Already-decoded column values, in projection order.
impl ScanRow for [DbValue] {
    fn scan(&self, slots: &[SlotKind]) -> Result<Vec<DbValue>, sqlx::Error> {
        if self.len() != slots.len() {
            return Err(sqlx::Error::ColumnIndexOutOfBounds {
                index: slots.len().saturating_sub(1),
                len: self.len(),
            });
        }
        Ok(self.to_vec())
    }
}

fn bind_value<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    value: DbValue,
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    match value {
        DbValue::Null => query.bind(None::<String>),
        DbValue::Integer(i) => query.bind(i),
        DbValue::Boolean(b) => query.bind(b),
        DbValue::Text(s) => query.bind(s),
    }
}

/// Accessor over one deal. Construction never fails; every failure surfaces
/// from [`scan`](DealAccessor::scan), [`insert`](DealAccessor::insert) or
/// [`update`](DealAccessor::update), tagged with the offending column.
pub struct DealAccessor<D> {
    deal: D,
}

impl<D> DealAccessor<D> {
    pub fn new(deal: D) -> Self {
        DealAccessor { deal }
    }
}

impl<D: Deref<Target = DealModel>> DealAccessor<D> {
    /// Marshals every field, in column order.
    pub fn values(&self) -> Result<Vec<DbValue>, FieldError> {
        DEAL_FIELDS
            .iter()
            .map(|field| {
                field
                    .marshal(&self.deal)
                    .map_err(|e| FieldError::new(field.name(), e))
            })
            .collect()
    }

    /// Inserts the deal through `conn`, normally an open transaction.
    pub async fn insert(&self, conn: &mut SqliteConnection) -> Result<(), StoreError> {
        let values = self.values()?;
        let query = values
            .into_iter()
            .fold(sqlx::query(INSERT_SQL.as_str()), bind_value);
        query.execute(conn).await?;
        Ok(())
    }

    /// Rewrites every column except the identifier. Returns the number of
    /// rows changed (0 or 1).
    pub async fn update(&self, pool: &SqlitePool) -> Result<u64, StoreError> {
        let mut id = None;
        let mut assignments = Vec::with_capacity(DEAL_FIELDS.len() - 1);
        for field in DEAL_FIELDS.iter() {
            let value = field
                .marshal(&self.deal)
                .map_err(|e| FieldError::new(field.name(), e))?;
            if field.name() == ID_FIELD {
                id = Some(value);
            } else {
                assignments.push(value);
            }
        }

        let query = assignments
            .into_iter()
            .chain(id)
            .fold(sqlx::query(UPDATE_SQL.as_str()), bind_value);
        let result = query.execute(pool).await?;
        Ok(result.rows_affected())
    }
}

impl<D: DerefMut<Target = DealModel>> DealAccessor<D> {
    /// Fills the deal from a row whose columns follow [`DEAL_COLUMNS`].
    ///
    /// The deal is only written when every field unmarshals; on failure it
    /// keeps its previous contents.
    pub fn scan<R: ScanRow + ?Sized>(&mut self, row: &R) -> Result<(), StoreError> {
        let slots: Vec<SlotKind> = DEAL_FIELDS.iter().map(|f| f.slot()).collect();
        let raw = row.scan(&slots)?;

        let mut scanned = DealModel::clone(&self.deal);
        for (field, value) in DEAL_FIELDS.iter().zip(raw) {
            field
                .unmarshal(value, &mut scanned)
                .map_err(|e| FieldError::new(field.name(), e))?;
        }
        *self.deal = scanned;
        Ok(())
    }
}
