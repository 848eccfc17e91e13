//! # Site Scrapers
//!
//! Site-specific scrapers for e-commerce products, job listings, news
//! headlines and real estate listings. Each site is a declarative table of
//! CSS selector fallback chains driven through one generic
//! "navigate, extract, paginate" loop; results are deduplicated, validated
//! and written as CSV and/or JSON.
//!
//! ## Features
//!
//! - Amazon India and Flipkart product search (headless Chromium)
//! - Naukri job listings and 99acres property listings (headless Chromium)
//! - Times of India, The Hindu and NDTV headlines (plain HTTP with retry)
//! - Partial results saved on Ctrl-C
//!
//! ## Usage
//!
//! ```sh
//! site_scrapers ecommerce --query "gaming laptops" --pages 3
//! site_scrapers all --no-headless
//! ```
//!
//! ## Architecture
//!
//! 1. **Configuration**: flags and environment variables, validated once
//! 2. **Fetching**: browser or HTTP [`fetch::PageFetcher`]
//! 3. **Extraction**: per-site [`scrapers::SiteProfile`] over the page loop
//! 4. **Output**: validation, then CSV/JSON files in the data directory

use clap::Parser;
use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, error, info, warn};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod extract;
mod fetch;
mod models;
mod outputs;
mod runners;
mod scrapers;
mod utils;
mod validators;

use cli::{Cli, Command};
use config::Config;
use error::ScrapeError;
use utils::ensure_writable_dir;

const LOG_FILE_NAME: &str = "scraper.log";

/// Stdout plus an append-only log file in `logs_dir`. Falls back to stdout
/// alone when the log file cannot be opened.
fn init_tracing(config: &Config) {
    let default_level = if config.debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let stdout_layer = tfmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(UtcTime::rfc_3339());

    let log_path = config.logs_dir.join(LOG_FILE_NAME);
    let file_result = std::fs::create_dir_all(&config.logs_dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
    });
    let (file_layer, file_error) = match file_result {
        Ok(file) => (
            Some(
                tfmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_timer(UtcTime::rfc_3339())
                    .with_writer(Mutex::new(file)),
            ),
            None,
        ),
        Err(e) => (None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    if let Some(e) = file_error {
        warn!(path = %log_path.display(), error = %e, "Log file unavailable; logging to stdout only");
    }
}

async fn dispatch(config: Arc<Config>, command: Command) -> Result<(), ScrapeError> {
    match command {
        Command::All => runners::run_all(config).await,
        Command::Ecommerce(args) => runners::run_ecommerce(config, args).await.map(|_| ()),
        Command::Jobs(args) => runners::run_jobs(config, args).await.map(|_| ()),
        Command::News => runners::run_news(config).await.map(|_| ()),
        Command::Realestate(args) => runners::run_realestate(config, args).await.map(|_| ()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let (config, command) = Cli::parse().into_parts();
    init_tracing(&config);

    let start_time = Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), ?command, "site_scrapers starting up");

    if let Err(e) = config.validate() {
        error!(error = %e, "Refusing to start");
        return ExitCode::FAILURE;
    }
    debug!(?config, "Loaded configuration");

    // Early check: fail before launching any browser
    if let Err(e) = ensure_writable_dir(&config.data_dir).await {
        error!(
            path = %config.data_dir.display(),
            error = %e,
            "Data directory is not writable (fix perms or choose a different path)"
        );
        return ExitCode::FAILURE;
    }

    let result = dispatch(Arc::new(config), command).await;

    let elapsed = start_time.elapsed();
    match result {
        Ok(()) => {
            info!(?elapsed, secs = elapsed.as_secs(), "Execution complete");
            ExitCode::SUCCESS
        }
        Err(ScrapeError::Interrupted) => {
            warn!(?elapsed, "Scraping interrupted by user");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(?elapsed, error = %e, "Scraping failed");
            ExitCode::FAILURE
        }
    }
}
