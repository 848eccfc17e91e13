//! CSV output with a header row taken from the record's field names.

use crate::error::ScrapeError;
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Write `records` to `path` as CSV, replacing any existing file.
///
/// Rows are serialized in memory first so a failed record never leaves a
/// half-written file behind.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn write_records<R: Serialize>(records: &[R], path: &Path) -> Result<(), ScrapeError> {
    let mut writer = ::csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| ScrapeError::Io(e.into_error()))?;
    fs::write(path, bytes).await?;
    info!("Wrote CSV");
    Ok(())
}
