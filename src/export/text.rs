//! Line-delimited text export.
//!
//! Each deal becomes one line, `<id>|<json>`, where the JSON is the node's
//! own encoding of the deal. Lines follow id order.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;

use crate::config::PROGRESS_LOG_INTERVAL;
use crate::error_handling::ExportError;
use crate::models::MarketDeal;

/// Writes every deal as `<id>|<json>\n` and returns the number of lines.
///
/// The writer is flushed before returning. A deal that fails to encode stops
/// the export; lines already written stay in the writer.
pub fn write_deals_text<W: Write>(
    mut writer: W,
    deals: &BTreeMap<String, MarketDeal>,
) -> Result<usize, ExportError> {
    let mut written = 0;
    for (id, deal) in deals {
        let json = serde_json::to_string(deal).map_err(|source| ExportError::Json {
            id: id.clone(),
            source,
        })?;
        writeln!(writer, "{id}|{json}")?;
        written += 1;
        if written % PROGRESS_LOG_INTERVAL == 0 {
            info!("Wrote {written} deals to text");
        }
    }
    writer.flush()?;
    Ok(written)
}

/// Creates (or truncates) `path` and writes the deals to it on the blocking pool.
pub async fn export_text_file(
    path: PathBuf,
    deals: Arc<BTreeMap<String, MarketDeal>>,
) -> Result<usize, ExportError> {
    tokio::task::spawn_blocking(move || write_to_path(&path, &deals))
        .await
        .map_err(|e| ExportError::Io(io::Error::other(e)))?
}

fn write_to_path(path: &Path, deals: &BTreeMap<String, MarketDeal>) -> Result<usize, ExportError> {
    let file = File::create(path)?;
    write_deals_text(BufWriter::new(file), deals)
}
