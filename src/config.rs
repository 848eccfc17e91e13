//! Runtime configuration.
//!
//! Every setting can be given as a command-line flag or through the
//! environment (e.g. `MAX_PAGES=3`). The parsed [`Config`] is validated once
//! at startup, wrapped in an `Arc`, and handed to every component that needs
//! it; nothing reads settings from global state.

use crate::error::ScrapeError;
use clap::{Args, ValueEnum};
use rand::{Rng, rng};
use std::path::PathBuf;
use std::time::Duration;

/// Which files the result sink writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Csv,
    Json,
    Both,
}

impl OutputFormat {
    pub fn wants_csv(self) -> bool {
        matches!(self, OutputFormat::Csv | OutputFormat::Both)
    }

    pub fn wants_json(self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Both)
    }
}

/// Scraper settings shared by every runner.
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// Run the browser without a visible window
    #[arg(
        long,
        env = "HEADLESS",
        default_value_t = true,
        action = clap::ArgAction::Set,
        value_parser = clap::builder::BoolishValueParser::new(),
        global = true
    )]
    pub headless: bool,

    /// Default page limit for paginated scrapers
    #[arg(long, env = "MAX_PAGES", default_value_t = 5, global = true)]
    pub max_pages: u32,

    /// Navigation / request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT", default_value_t = 60, global = true)]
    pub request_timeout: u64,

    /// Lower bound of the random delay between requests, in seconds
    #[arg(long, env = "REQUEST_DELAY_MIN", default_value_t = 2.0, global = true)]
    pub request_delay_min: f64,

    /// Upper bound of the random delay between requests, in seconds
    #[arg(long, env = "REQUEST_DELAY_MAX", default_value_t = 5.0, global = true)]
    pub request_delay_max: f64,

    /// Attempt ceiling for transient HTTP failures
    #[arg(long, env = "MAX_RETRIES", default_value_t = 3, global = true)]
    pub max_retries: u32,

    /// Browser locale
    #[arg(long, env = "BROWSER_LOCALE", default_value = "en-IN", global = true)]
    pub browser_locale: String,

    /// Browser timezone
    #[arg(long, env = "BROWSER_TIMEZONE", default_value = "Asia/Kolkata", global = true)]
    pub browser_timezone: String,

    /// Block image requests in the browser
    #[arg(
        long,
        env = "BLOCK_IMAGES",
        default_value_t = true,
        action = clap::ArgAction::Set,
        value_parser = clap::builder::BoolishValueParser::new(),
        global = true
    )]
    pub block_images: bool,

    /// Output files to write
    #[arg(long, env = "OUTPUT_FORMAT", value_enum, default_value_t = OutputFormat::Both, global = true)]
    pub output_format: OutputFormat,

    /// Directory for CSV/JSON results
    #[arg(long, env = "DATA_DIR", default_value = "data", global = true)]
    pub data_dir: PathBuf,

    /// Directory for the log file
    #[arg(long, env = "LOGS_DIR", default_value = "logs", global = true)]
    pub logs_dir: PathBuf,

    /// Verbose logging
    #[arg(
        long,
        env = "DEBUG",
        default_value_t = false,
        action = clap::ArgAction::Set,
        value_parser = clap::builder::BoolishValueParser::new(),
        global = true
    )]
    pub debug: bool,
}

impl Config {
    /// Reject settings the scrapers cannot work with.
    pub fn validate(&self) -> Result<(), ScrapeError> {
        if self.max_pages == 0 {
            return Err(ScrapeError::Config("max_pages must be at least 1".into()));
        }
        if self.request_timeout == 0 {
            return Err(ScrapeError::Config("request_timeout must be at least 1s".into()));
        }
        let in_bounds = |secs: f64| secs.is_finite() && (0.0..=MAX_REQUEST_DELAY_SECS).contains(&secs);
        if !in_bounds(self.request_delay_min)
            || !in_bounds(self.request_delay_max)
            || self.request_delay_max < self.request_delay_min
        {
            return Err(ScrapeError::Config(format!(
                "request delay range {}..{} is invalid",
                self.request_delay_min, self.request_delay_max
            )));
        }
        if self.max_retries == 0 {
            return Err(ScrapeError::Config("max_retries must be at least 1".into()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Random pause range used between pages and after navigation.
    pub fn request_delay(&self) -> DelayRange {
        DelayRange::from_secs_f64(self.request_delay_min, self.request_delay_max)
    }
}

/// Longest pause accepted for either delay bound, in seconds.
pub const MAX_REQUEST_DELAY_SECS: f64 = 3600.0;

/// Inclusive range a random human-like pause is drawn from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DelayRange {
    pub min: Duration,
    pub max: Duration,
}

impl DelayRange {
    pub const ZERO: DelayRange = DelayRange {
        min: Duration::ZERO,
        max: Duration::ZERO,
    };

    /// Bounds are clamped to `0..=MAX_REQUEST_DELAY_SECS`; NaN counts as 0.
    pub fn from_secs_f64(min: f64, max: f64) -> Self {
        let clamp = |secs: f64| Duration::from_secs_f64(secs.max(0.0).min(MAX_REQUEST_DELAY_SECS));
        let min = clamp(min);
        let max = clamp(max).max(min);
        Self { min, max }
    }

    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        rng().random_range(self.min..=self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    fn parse(args: &[&str]) -> Config {
        let mut argv = vec!["site_scrapers"];
        argv.extend_from_slice(args);
        argv.push("news");
        Cli::parse_from(argv).config
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = parse(&[
            "--max-pages",
            "2",
            "--output-format",
            "json",
            "--headless",
            "false",
            "--data-dir",
            "/tmp/out",
        ]);
        assert_eq!(config.max_pages, 2);
        assert_eq!(config.output_format, OutputFormat::Json);
        assert!(!config.headless);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_validate_rejects_inverted_delay() {
        let mut config = parse(&[]);
        config.request_delay_min = 5.0;
        config.request_delay_max = 1.0;
        assert!(matches!(config.validate(), Err(ScrapeError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_pages() {
        let mut config = parse(&[]);
        config.max_pages = 0;
        config.request_delay_min = 0.0;
        config.request_delay_max = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_output_format_selection() {
        assert!(OutputFormat::Both.wants_csv() && OutputFormat::Both.wants_json());
        assert!(OutputFormat::Csv.wants_csv() && !OutputFormat::Csv.wants_json());
        assert!(!OutputFormat::Json.wants_csv() && OutputFormat::Json.wants_json());
    }

    #[test]
    fn test_delay_range_sample_within_bounds() {
        let range = DelayRange::from_secs_f64(0.1, 0.3);
        for _ in 0..50 {
            let d = range.sample();
            assert!(d >= range.min && d <= range.max);
        }
        assert_eq!(DelayRange::ZERO.sample(), Duration::ZERO);
    }

    #[test]
    fn test_delay_range_clamps_inverted_bounds() {
        let range = DelayRange::from_secs_f64(2.0, 1.0);
        assert_eq!(range.min, range.max);
    }

    #[test]
    fn test_validate_rejects_unbounded_delay() {
        for max in ["inf", "1e30", "NaN"] {
            let config = parse(&["--request-delay-max", max]);
            assert!(
                matches!(config.validate(), Err(ScrapeError::Config(_))),
                "max {max}"
            );
        }
    }

    #[test]
    fn test_delay_range_never_panics_on_huge_bounds() {
        let range = DelayRange::from_secs_f64(f64::NAN, f64::INFINITY);
        assert_eq!(range.min, Duration::ZERO);
        assert_eq!(range.max, Duration::from_secs_f64(MAX_REQUEST_DELAY_SECS));
    }
}
