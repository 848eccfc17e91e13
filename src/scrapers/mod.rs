//! Site scrapers: one generic page loop, many declarative site profiles.
//!
//! Every site is described by a [`SiteProfile`]: where to start, which
//! selector chains find listing containers and the next-page link, which
//! phrases mean the site has blocked us, and how one container becomes a
//! record. [`SiteScraper`] drives any profile through the same loop:
//!
//! ```text
//! Fetch ──ok──▶ Extract ──items──▶ Paginate ──next link, under limit──▶ Fetch
//!   │              │                   │
//!   └─err──▶ Done  └─block / empty─▶ Done   └─no link / limit──▶ Done
//! ```
//!
//! # Supported Sites
//!
//! | Site | Module | Record | Fetcher |
//! |------|--------|--------|---------|
//! | Amazon India | [`amazon`] | [`Product`](crate::models::Product) | browser |
//! | Flipkart | [`flipkart`] | [`Product`](crate::models::Product) | browser |
//! | Naukri | [`naukri`] | [`JobListing`](crate::models::JobListing) | browser |
//! | 99acres | [`acres`] | [`Property`](crate::models::Property) | browser |
//! | Times of India, The Hindu, NDTV | [`news`] | [`Headline`](crate::models::Headline) | HTTP |
//!
//! Parsing happens in a synchronous step per page, so no parsed document is
//! ever held across an `.await`.

pub mod acres;
pub mod amazon;
pub mod flipkart;
pub mod naukri;
pub mod news;

use crate::config::DelayRange;
use crate::error::{ScrapeError, SkipReason};
use crate::extract::{self, ContainerRule, NextPageRule};
use crate::fetch::PageFetcher;
use crate::models::Record;
use crate::utils::{is_valid_url, truncate_for_log, truncate_text};
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use std::fmt;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Declarative description of one site.
pub trait SiteProfile: Send + Sync {
    type Record: Record;

    /// Short site name; prefixes dedup keys and log lines.
    fn tag(&self) -> &'static str;

    /// First results page.
    fn start_url(&self) -> Result<Url, url::ParseError>;

    fn containers(&self) -> ContainerRule;

    /// `None` for single-page sources.
    fn next_page(&self) -> Option<NextPageRule>;

    /// Phrases that mark a hard block (CAPTCHA or interstitial).
    fn block_markers(&self) -> &'static [&'static str] {
        &[]
    }

    /// Build a record from one listing container. `base` is the URL of the
    /// page the container came from.
    fn extract(&self, item: ElementRef<'_>, base: &Url) -> Result<Self::Record, SkipReason>;

    /// URL used for duplicate suppression; `None` disables dedup for the
    /// record.
    fn dedup_url<'r>(&self, record: &'r Self::Record) -> Option<&'r str>;
}

/// Resolve a possibly relative `href` against the page URL. Links that do
/// not end up as http(s) URLs (`javascript:`, `mailto:`) are rejected.
pub fn resolve_link(base: &Url, href: &str) -> Result<String, SkipReason> {
    base.join(href)
        .ok()
        .map(String::from)
        .filter(|url| is_valid_url(url))
        .ok_or_else(|| SkipReason::BadLink(truncate_text(href, 120, "...")))
}

/// Records gathered during one run, plus the keys already seen.
///
/// Owned by the runner rather than the scrape future, so whatever was
/// collected survives an interrupted run.
#[derive(Debug)]
pub struct Collector<R> {
    records: Vec<R>,
    seen: HashSet<String>,
}

impl<R> Default for Collector<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            seen: HashSet::new(),
        }
    }
}

impl<R> Collector<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `record` unless `key` was seen before. Records without a key
    /// are always added.
    pub fn push(&mut self, key: Option<String>, record: R) -> bool {
        if let Some(key) = key {
            if !self.seen.insert(key) {
                return false;
            }
        }
        self.records.push(record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[cfg(test)]
    pub fn records(&self) -> &[R] {
        &self.records
    }

    pub fn into_records(self) -> Vec<R> {
        self.records
    }
}

/// Why a page loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    FetchFailed,
    Blocked,
    NoResults,
    NoNextPage,
    PageLimit,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::FetchFailed => "fetch failed",
            StopReason::Blocked => "blocked",
            StopReason::NoResults => "no results",
            StopReason::NoNextPage => "no next page",
            StopReason::PageLimit => "page limit reached",
        };
        f.write_str(s)
    }
}

/// Totals for one [`SiteScraper::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRunSummary {
    /// Pages fetched, including the one that ended the run.
    pub pages: u32,
    pub collected: usize,
    pub skipped: usize,
    pub duplicates: usize,
    pub stop: StopReason,
}

#[derive(Debug, Default)]
struct PageOutcome {
    collected: usize,
    skipped: usize,
    duplicates: usize,
    verdict: PageVerdict,
}

#[derive(Debug, Default)]
enum PageVerdict {
    Blocked(&'static str),
    #[default]
    NoResults,
    Items {
        next_href: Option<String>,
    },
}

/// Parse one page and push its records into `collector`.
fn process_page<P: SiteProfile>(
    profile: &P,
    html: &str,
    page_url: &Url,
    collector: &mut Collector<P::Record>,
) -> PageOutcome {
    let document = Html::parse_document(html);
    let mut outcome = PageOutcome::default();

    if let Some(marker) = extract::find_block_marker(&document, profile.block_markers()) {
        outcome.verdict = PageVerdict::Blocked(marker);
        return outcome;
    }

    let containers = extract::select_containers(&document, &profile.containers());
    if containers.is_empty() {
        return outcome;
    }

    for item in containers {
        match profile.extract(item, page_url) {
            Ok(record) => {
                let key = profile
                    .dedup_url(&record)
                    .filter(|url| !url.is_empty())
                    .map(|url| format!("{}_{}", profile.tag(), url));
                if collector.push(key, record) {
                    outcome.collected += 1;
                } else {
                    outcome.duplicates += 1;
                }
            }
            Err(reason) => {
                debug!(site = profile.tag(), %reason, "Skipping listing");
                outcome.skipped += 1;
            }
        }
    }

    let next_href = profile
        .next_page()
        .and_then(|rule| extract::find_next_link(&document, &rule));
    outcome.verdict = PageVerdict::Items { next_href };
    outcome
}

/// Generic paginating scraper for one [`SiteProfile`].
#[derive(Debug)]
pub struct SiteScraper<P> {
    profile: P,
    max_pages: u32,
    delay: DelayRange,
}

impl<P: SiteProfile> SiteScraper<P> {
    pub fn new(profile: P, max_pages: u32, delay: DelayRange) -> Self {
        Self {
            profile,
            max_pages: max_pages.max(1),
            delay,
        }
    }

    /// Walk the site's result pages, pushing new records into `collector`.
    ///
    /// Fetch failures, blocks and empty pages end the run normally and are
    /// reported through [`PageRunSummary::stop`]. Only an unbuildable start
    /// URL is an error.
    #[instrument(level = "info", skip_all, fields(site = self.profile.tag(), max_pages = self.max_pages))]
    pub async fn run<F>(
        &self,
        fetcher: &F,
        collector: &mut Collector<P::Record>,
    ) -> Result<PageRunSummary, ScrapeError>
    where
        F: PageFetcher + ?Sized,
    {
        let site = self.profile.tag();
        let mut cursor = Some(self.profile.start_url()?);
        let mut pages = 0u32;
        let (mut collected, mut skipped, mut duplicates) = (0usize, 0usize, 0usize);

        info!("Starting scrape");

        let stop = loop {
            let Some(url) = cursor.take() else {
                break StopReason::NoNextPage;
            };
            pages += 1;
            info!(page = pages, %url, "Processing page");

            let html = match fetcher.fetch_page(&url).await {
                Ok(html) => html,
                Err(e) => {
                    error!(page = pages, error = %e, "Page fetch failed; ending pagination");
                    break StopReason::FetchFailed;
                }
            };

            let outcome = process_page(&self.profile, &html, &url, collector);
            collected += outcome.collected;
            skipped += outcome.skipped;
            duplicates += outcome.duplicates;

            let next_href = match outcome.verdict {
                PageVerdict::Blocked(marker) => {
                    error!(page = pages, marker, "{site} block page detected; aborting");
                    break StopReason::Blocked;
                }
                PageVerdict::NoResults => {
                    warn!(page = pages, "No items found");
                    debug!(preview = %truncate_for_log(&html, 300), "Page without listings");
                    break StopReason::NoResults;
                }
                PageVerdict::Items { next_href } => next_href,
            };

            info!(
                page = pages,
                new = outcome.collected,
                skipped = outcome.skipped,
                duplicates = outcome.duplicates,
                "Extracted items"
            );

            let Some(href) = next_href else {
                info!("No next page found");
                break StopReason::NoNextPage;
            };
            if pages >= self.max_pages {
                break StopReason::PageLimit;
            }
            match url.join(&href) {
                Ok(next) => cursor = Some(next),
                Err(e) => {
                    warn!(%href, error = %e, "Next page link could not be resolved");
                    break StopReason::NoNextPage;
                }
            }

            sleep(self.delay.sample()).await;
        };

        let summary = PageRunSummary {
            pages,
            collected,
            skipped,
            duplicates,
            stop,
        };
        info!(
            pages,
            collected,
            skipped,
            duplicates,
            stop = %summary.stop,
            "Scrape finished"
        );
        Ok(summary)
    }
}
