//! Command-line interface definitions for the site scrapers.
//!
//! Scraper settings ([`Config`]) are global flags that can also come from
//! environment variables; each subcommand selects one data domain and
//! carries that domain's search inputs.

use crate::config::Config;
use clap::{Args, Parser, Subcommand};

pub const DEFAULT_QUERY: &str = "gaming laptops";
pub const DEFAULT_ECOMMERCE_PAGES: u32 = 3;
pub const DEFAULT_ROLE: &str = "python developer";
pub const DEFAULT_LOCATION: &str = "remote";
pub const DEFAULT_CITY: &str = "pune";

/// Command-line arguments for the site scrapers.
///
/// # Examples
///
/// ```sh
/// # Run every scraper
/// site_scrapers all
///
/// # Run one scraper
/// site_scrapers ecommerce --query "laptops" --pages 5
/// site_scrapers jobs --role "python developer" --location bangalore
/// site_scrapers news
/// site_scrapers realestate --city mumbai
///
/// # Watch the browser work
/// site_scrapers ecommerce --query phones --no-headless
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    /// Show the browser window (same as `--headless false`)
    #[arg(long, global = true)]
    pub no_headless: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Final configuration and the selected command.
    pub fn into_parts(self) -> (Config, Command) {
        let mut config = self.config;
        if self.no_headless {
            config.headless = false;
        }
        (config, self.command)
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run all scrapers with their default inputs
    All,
    /// Amazon and Flipkart product search
    Ecommerce(EcommerceArgs),
    /// Naukri job listings
    Jobs(JobsArgs),
    /// Times of India, The Hindu and NDTV headlines
    News,
    /// 99acres property listings
    Realestate(RealEstateArgs),
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct EcommerceArgs {
    /// Product search query
    #[arg(long, default_value = DEFAULT_QUERY)]
    pub query: String,

    /// Max pages per site
    #[arg(long, default_value_t = DEFAULT_ECOMMERCE_PAGES)]
    pub pages: u32,
}

impl Default for EcommerceArgs {
    fn default() -> Self {
        Self {
            query: DEFAULT_QUERY.to_string(),
            pages: DEFAULT_ECOMMERCE_PAGES,
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct JobsArgs {
    /// Job role
    #[arg(long, default_value = DEFAULT_ROLE)]
    pub role: String,

    /// Job location
    #[arg(long, default_value = DEFAULT_LOCATION)]
    pub location: String,

    /// Max pages (defaults to --max-pages)
    #[arg(long)]
    pub pages: Option<u32>,
}

impl Default for JobsArgs {
    fn default() -> Self {
        Self {
            role: DEFAULT_ROLE.to_string(),
            location: DEFAULT_LOCATION.to_string(),
            pages: None,
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct RealEstateArgs {
    /// City to search
    #[arg(long, default_value = DEFAULT_CITY)]
    pub city: String,

    /// Max pages (defaults to --max-pages)
    #[arg(long)]
    pub pages: Option<u32>,
}

impl Default for RealEstateArgs {
    fn default() -> Self {
        Self {
            city: DEFAULT_CITY.to_string(),
            pages: None,
        }
    }
}
