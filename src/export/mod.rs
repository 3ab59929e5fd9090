//! Export of the fetched deal set to flat text.

mod text;

pub use text::{export_text_file, write_deals_text};
