//! Persisting validated records.
//!
//! [`ResultSink::save`] is the last step of every runner: sanitize and
//! validate, report how many records were dropped, then write whatever is
//! left in the configured formats.
//!
//! # Submodules
//!
//! - [`csv`]: header row plus one line per record
//! - [`json`]: pretty-printed array of objects
//!
//! # Output Structure
//!
//! ```text
//! data_dir/
//! ├── gaming_laptops_20250506_101500.csv
//! ├── gaming_laptops_20250506_101500.json
//! ├── headlines_20250506_101502.csv
//! └── headlines_20250506_101502.json
//! ```

pub mod csv;
pub mod json;

use crate::config::{Config, OutputFormat};
use crate::error::ScrapeError;
use crate::models::Record;
use crate::utils::{ensure_writable_dir, sanitize_filename};
use crate::validators::filter_valid_data;
use chrono::{DateTime, Local};
use std::path::PathBuf;
use tracing::{info, instrument, warn};

const MAX_STEM_LENGTH: usize = 100;

/// What a [`ResultSink::save`] call did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SinkReport {
    /// Records handed to the sink.
    pub total: usize,
    /// Records that passed validation and were written.
    pub saved: usize,
    /// Records rejected by the validator.
    pub dropped: usize,
    /// CSV file written, if the format includes CSV and anything was saved.
    pub csv_path: Option<PathBuf>,
    /// JSON file written, if the format includes JSON and anything was saved.
    pub json_path: Option<PathBuf>,
}

/// Writes record batches into the data directory.
#[derive(Debug, Clone)]
pub struct ResultSink {
    /// Directory the files land in; created on first write.
    data_dir: PathBuf,
    /// Which of CSV and JSON to write.
    format: OutputFormat,
}

/// `<sanitized stem>_<YYYYMMDD_HHMMSS>`, without extension.
pub fn output_stem(stem: &str, at: DateTime<Local>) -> String {
    let mut clean = sanitize_filename(stem, MAX_STEM_LENGTH);
    if clean.is_empty() {
        clean = "results".to_string();
    }
    format!("{}_{}", clean, at.format("%Y%m%d_%H%M%S"))
}

impl ResultSink {
    pub fn new(data_dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            data_dir: data_dir.into(),
            format,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.data_dir.clone(), config.output_format)
    }

    /// Validate `records` and write the survivors.
    ///
    /// Having nothing to write is reported, not an error.
    ///
    /// # Arguments
    ///
    /// * `records` - The batch to persist, sanitized in place before validation
    /// * `validator` - Per-kind check, e.g. [`validate_product`](crate::validators::validate_product)
    /// * `stem` - File name stem before sanitizing (a search query or `"jobs"`)
    ///
    /// # Errors
    ///
    /// I/O or serialization failures while writing.
    #[instrument(level = "info", skip_all, fields(stem = %stem, total = records.len()))]
    pub async fn save<R, V>(
        &self,
        records: Vec<R>,
        validator: V,
        stem: &str,
    ) -> Result<SinkReport, ScrapeError>
    where
        R: Record,
        V: Fn(&R) -> bool,
    {
        let total = records.len();
        let mut report = SinkReport {
            total,
            ..SinkReport::default()
        };
        if total == 0 {
            warn!("No data collected in this run");
            return Ok(report);
        }

        let valid = filter_valid_data(records, validator);
        report.saved = valid.len();
        report.dropped = total - valid.len();
        if report.dropped > 0 {
            warn!(dropped = report.dropped, "Filtered out invalid entries");
        }
        if valid.is_empty() {
            warn!("No valid data to save");
            return Ok(report);
        }

        ensure_writable_dir(&self.data_dir).await?;
        let base = output_stem(stem, Local::now());

        if self.format.wants_csv() {
            let path = self.data_dir.join(format!("{base}.csv"));
            self::csv::write_records(&valid, &path).await?;
            report.csv_path = Some(path);
        }
        if self.format.wants_json() {
            let path = self.data_dir.join(format!("{base}.json"));
            json::write_records(&valid, &path).await?;
            report.json_path = Some(path);
        }

        info!(saved = report.saved, dropped = report.dropped, "Saved results");
        Ok(report)
    }
}
