//! Per-domain runners: wire profiles to fetchers, then save.
//!
//! Every runner follows the same shape:
//!
//! 1. create the record buffers it owns
//! 2. run the scrape future until it finishes or Ctrl-C arrives
//! 3. save whatever was collected, even after an interrupt or failure
//!
//! Browser-backed sites get a fresh Chromium per site; the news sources
//! share one HTTP connection pool and run concurrently.

use crate::cli::{EcommerceArgs, JobsArgs, RealEstateArgs};
use crate::config::{Config, DelayRange};
use crate::error::ScrapeError;
use crate::fetch::{BrowserFetcher, HttpFetcher, PageFetcher, RetryFetch};
use crate::models::{Headline, JobListing, Product, Property, Record};
use crate::outputs::{ResultSink, SinkReport};
use crate::scrapers::acres::NinetyNineAcres;
use crate::scrapers::amazon::Amazon;
use crate::scrapers::flipkart::Flipkart;
use crate::scrapers::naukri::Naukri;
use crate::scrapers::news::{NewsSource, SOURCES};
use crate::scrapers::{Collector, PageRunSummary, SiteProfile, SiteScraper};
use crate::validators::{validate_headline, validate_job, validate_product, validate_property};
use futures::future::join_all;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Drive `scrape` to completion unless Ctrl-C comes first.
async fn until_interrupted<F>(scrape: F) -> Result<(), ScrapeError>
where
    F: Future<Output = Result<(), ScrapeError>>,
{
    tokio::select! {
        result = scrape => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted by user; saving partial results");
            Err(ScrapeError::Interrupted)
        }
    }
}

/// Save `records`, then report the scrape outcome. A failed scrape still
/// gets its partial results written.
async fn finish<R, V>(
    config: &Config,
    records: Vec<R>,
    validator: V,
    stem: &str,
    outcome: Result<(), ScrapeError>,
) -> Result<SinkReport, ScrapeError>
where
    R: Record,
    V: Fn(&R) -> bool,
{
    let saved = ResultSink::from_config(config)
        .save(records, validator, stem)
        .await;
    match (outcome, saved) {
        (Ok(()), saved) => saved,
        (Err(e), Ok(report)) => {
            info!(saved = report.saved, "Partial results saved");
            Err(e)
        }
        (Err(e), Err(save_err)) => {
            error!(error = %save_err, "Could not save partial results");
            Err(e)
        }
    }
}

/// Launch a browser, walk one site, close the browser.
#[instrument(level = "info", skip_all, fields(site = profile.tag()))]
async fn scrape_with_browser<P: SiteProfile>(
    config: &Config,
    profile: P,
    max_pages: u32,
    collector: &mut Collector<P::Record>,
) -> Result<PageRunSummary, ScrapeError> {
    let mut fetcher = BrowserFetcher::launch(config).await?;
    let scraper = SiteScraper::new(profile, max_pages, config.request_delay());
    let result = scraper.run(&fetcher, collector).await;
    if let Err(e) = fetcher.close().await {
        warn!(error = %e, "Failed to close browser");
    }
    result
}

async fn scrape_ecommerce(
    config: &Config,
    args: &EcommerceArgs,
    collector: &mut Collector<Product>,
) -> Result<(), ScrapeError> {
    // Sequential on purpose: two browsers at once trips rate limits.
    let amazon = scrape_with_browser(config, Amazon::new(&args.query), args.pages, collector).await;
    match &amazon {
        Ok(_) => info!(products = collector.len(), "Amazon done; moving on to Flipkart"),
        Err(e) => error!(error = %e, "Amazon scrape failed"),
    }
    let flipkart =
        scrape_with_browser(config, Flipkart::new(&args.query), args.pages, collector).await;
    if let Err(e) = &flipkart {
        error!(error = %e, "Flipkart scrape failed");
    }

    match (amazon, flipkart) {
        (Err(e), Err(_)) => Err(e),
        _ => Ok(()),
    }
}

/// Amazon then Flipkart into one product file named after the query.
#[instrument(level = "info", skip_all, fields(query = %args.query, pages = args.pages))]
pub async fn run_ecommerce(
    config: Arc<Config>,
    args: EcommerceArgs,
) -> Result<SinkReport, ScrapeError> {
    info!("Starting e-commerce price tracker");
    let mut collector = Collector::new();
    let outcome = until_interrupted(scrape_ecommerce(&config, &args, &mut collector)).await;
    finish(
        &config,
        collector.into_records(),
        validate_product,
        &args.query,
        outcome,
    )
    .await
}

/// Naukri listings for a role and location.
#[instrument(level = "info", skip_all, fields(role = %args.role, location = %args.location))]
pub async fn run_jobs(config: Arc<Config>, args: JobsArgs) -> Result<SinkReport, ScrapeError> {
    info!("Starting job portal scraper");
    let pages = args.pages.unwrap_or(config.max_pages);
    let mut collector: Collector<JobListing> = Collector::new();
    let outcome = until_interrupted(async {
        let profile = Naukri::new(&args.role, &args.location);
        scrape_with_browser(&config, profile, pages, &mut collector)
            .await
            .map(|_| ())
    })
    .await;
    finish(&config, collector.into_records(), validate_job, "jobs", outcome).await
}

/// 99acres listings for a city.
#[instrument(level = "info", skip_all, fields(city = %args.city))]
pub async fn run_realestate(
    config: Arc<Config>,
    args: RealEstateArgs,
) -> Result<SinkReport, ScrapeError> {
    info!("Starting real estate crawler");
    let pages = args.pages.unwrap_or(config.max_pages);
    let mut collector: Collector<Property> = Collector::new();
    let outcome = until_interrupted(async {
        let profile = NinetyNineAcres::new(&args.city);
        scrape_with_browser(&config, profile, pages, &mut collector)
            .await
            .map(|_| ())
    })
    .await;
    finish(
        &config,
        collector.into_records(),
        validate_property,
        "realestate",
        outcome,
    )
    .await
}

async fn scrape_source<F: PageFetcher>(
    source: NewsSource,
    fetcher: F,
    collector: &mut Collector<Headline>,
) -> Result<PageRunSummary, ScrapeError> {
    SiteScraper::new(source, 1, DelayRange::ZERO)
        .run(&fetcher, collector)
        .await
}

/// Fetch every source concurrently, each into its own collector. One
/// failing source never cancels the others.
async fn scrape_news(
    config: &Config,
    http: &HttpFetcher,
    sources: &[NewsSource],
    collectors: &mut [Collector<Headline>],
) -> Result<(), ScrapeError> {
    let backoff = config.request_delay();

    let tasks = sources
        .iter()
        .copied()
        .zip(collectors.iter_mut())
        .map(|(source, collector)| {
            let fetcher = RetryFetch::new(http.clone(), config.max_retries, backoff.min, backoff.max);
            async move { (source.name, scrape_source(source, fetcher, collector).await) }
        });

    for (name, result) in join_all(tasks).await {
        match result {
            Ok(summary) => info!(
                source = name,
                collected = summary.collected,
                stop = %summary.stop,
                "Collected headlines"
            ),
            Err(e) => error!(source = name, error = %e, "News source failed"),
        }
    }
    Ok(())
}

async fn collect_headlines(
    config: &Config,
    sources: &[NewsSource],
) -> Result<SinkReport, ScrapeError> {
    let mut collectors: Vec<Collector<Headline>> = sources.iter().map(|_| Collector::new()).collect();
    let outcome = match HttpFetcher::new(config) {
        Ok(http) => until_interrupted(scrape_news(config, &http, sources, &mut collectors)).await,
        Err(e) => Err(e.into()),
    };
    if collectors.iter().all(Collector::is_empty) {
        warn!("No headlines collected from any source");
    }
    let records = collectors
        .into_iter()
        .flat_map(Collector::into_records)
        .collect();
    finish(config, records, validate_headline, "headlines", outcome).await
}

/// Headlines from every news source into one file.
#[instrument(level = "info", skip_all)]
pub async fn run_news(config: Arc<Config>) -> Result<SinkReport, ScrapeError> {
    info!("Starting news headline aggregator");
    collect_headlines(&config, &SOURCES).await
}

/// Every runner at once with default inputs. Returns the first failure
/// after all runners have finished.
#[instrument(level = "info", skip_all)]
pub async fn run_all(config: Arc<Config>) -> Result<(), ScrapeError> {
    let (ecommerce, jobs, news, realestate) = tokio::join!(
        run_ecommerce(Arc::clone(&config), EcommerceArgs::default()),
        run_jobs(Arc::clone(&config), JobsArgs::default()),
        run_news(Arc::clone(&config)),
        run_realestate(Arc::clone(&config), RealEstateArgs::default()),
    );

    let mut first_error = None;
    for (runner, result) in [
        ("ecommerce", ecommerce),
        ("jobs", jobs),
        ("news", news),
        ("realestate", realestate),
    ] {
        match result {
            Ok(report) => info!(runner, saved = report.saved, "Runner complete"),
            Err(e) => {
                error!(runner, error = %e, "Runner failed");
                first_error.get_or_insert(e);
            }
        }
    }
    first_error.map_or(Ok(()), Err)
}
