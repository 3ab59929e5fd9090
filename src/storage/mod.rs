//! Deal persistence: field codecs, the record accessor, schema, pool and store.

pub mod accessor;
pub mod codec;
pub mod pool;
pub mod schema;
pub mod store;
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used items
pub use accessor::{DealAccessor, ScanRow, DEAL_COLUMNS, DEAL_FIELD_NAMES};
pub use codec::{DbValue, FieldCodec, SlotKind};
pub use pool::init_db_pool;
pub use schema::create_tables;
pub use store::DealStore;
