//! JSON output: one pretty-printed array of record objects per file.

use crate::error::ScrapeError;
use serde::Serialize;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Write `records` to `path` as a pretty JSON array, replacing any
/// existing file.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = records.len()))]
pub async fn write_records<R: Serialize>(records: &[R], path: &Path) -> Result<(), ScrapeError> {
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json).await?;
    info!("Wrote JSON");
    Ok(())
}
