//! Scripted-browser fetcher using chromiumoxide.
//!
//! One Chromium process and one tab per fetcher. The tab is prepared once at
//! launch with a randomized [`Fingerprint`], the stealth init script, extra
//! headers and (optionally) an image blocklist. Every fetch then:
//!
//! 1. navigates under the configured timeout
//! 2. waits a random human-like delay
//! 3. dismisses common popups
//! 4. scrolls in steps until the page stops growing
//! 5. returns the rendered HTML
//!
//! Navigation failures are returned to the caller and never retried here;
//! the page loop treats them as the end of pagination.

use super::PageFetcher;
use super::fingerprint::{Fingerprint, STEALTH_SCRIPT};
use crate::config::{Config, DelayRange};
use crate::error::FetchError;
use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetLocaleOverrideParams, SetTimezoneOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::network::{
    Headers, SetBlockedUrLsParams, SetExtraHttpHeadersParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use futures::StreamExt;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, instrument, warn};
use url::Url;

const MAX_SCROLLS: usize = 5;
const SCROLL_DISTANCE: u32 = 600;
const SCROLL_PAUSE: DelayRange = DelayRange {
    min: Duration::from_millis(500),
    max: Duration::from_millis(1500),
};

const BLOCKED_IMAGE_PATTERNS: &[&str] = &[
    "*.png", "*.jpg", "*.jpeg", "*.gif", "*.svg", "*.webp", "*.ico",
];

const POPUP_CLOSE_SELECTORS: &[&str] = &[
    "button[aria-label*='close' i]",
    "button[class*='close' i]",
    ".modal-close",
    ".popup-close",
    "[data-dismiss='modal']",
];

fn browser_err(e: impl std::fmt::Display) -> FetchError {
    FetchError::Browser(e.to_string())
}

/// A headless (or headed) Chromium tab driven over CDP.
pub struct BrowserFetcher {
    browser: Option<Browser>,
    handler: Option<JoinHandle<()>>,
    page: Page,
    fingerprint: Fingerprint,
    nav_timeout: Duration,
    settle_delay: DelayRange,
}

impl BrowserFetcher {
    /// Launch Chromium and prepare a stealth tab from `config`.
    #[instrument(level = "info", skip_all, fields(headless = config.headless))]
    pub async fn launch(config: &Config) -> Result<Self, FetchError> {
        let fingerprint = Fingerprint::randomized(&config.browser_locale, &config.browser_timezone);

        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(fingerprint.viewport_width, fingerprint.viewport_height)
            .request_timeout(config.timeout())
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--lang={}", config.browser_locale));
        if !config.headless {
            builder = builder.with_head();
        }
        let browser_config = builder.build().map_err(browser_err)?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(browser_err)?;

        let handler = tokio::spawn(async move {
            while handler.next().await.is_some() {}
        });

        let page = browser.new_page("about:blank").await.map_err(browser_err)?;

        let fetcher = Self {
            browser: Some(browser),
            handler: Some(handler),
            page,
            fingerprint,
            nav_timeout: config.timeout(),
            settle_delay: config.request_delay(),
        };
        fetcher.prepare_page(config.block_images).await?;

        debug!(
            viewport_width = fetcher.fingerprint.viewport_width,
            viewport_height = fetcher.fingerprint.viewport_height,
            user_agent = %fetcher.fingerprint.user_agent,
            "Created stealth browser context"
        );
        Ok(fetcher)
    }

    async fn prepare_page(&self, block_images: bool) -> Result<(), FetchError> {
        let fp = &self.fingerprint;

        let user_agent = SetUserAgentOverrideParams::builder()
            .user_agent(fp.user_agent.clone())
            .accept_language("en-US,en;q=0.9")
            .build()
            .map_err(FetchError::Browser)?;
        self.page.execute(user_agent).await.map_err(browser_err)?;

        self.page
            .execute(SetDeviceMetricsOverrideParams::new(
                i64::from(fp.viewport_width),
                i64::from(fp.viewport_height),
                1.0,
                false,
            ))
            .await
            .map_err(browser_err)?;

        self.page
            .execute(SetLocaleOverrideParams {
                locale: Some(fp.locale.clone()),
            })
            .await
            .map_err(browser_err)?;
        self.page
            .execute(SetTimezoneOverrideParams::new(fp.timezone.clone()))
            .await
            .map_err(browser_err)?;

        self.page
            .execute(SetExtraHttpHeadersParams::new(Headers::new(serde_json::json!({
                "Accept-Language": "en-US,en;q=0.9",
                "DNT": "1",
            }))))
            .await
            .map_err(browser_err)?;

        self.page
            .execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_SCRIPT))
            .await
            .map_err(browser_err)?;

        if block_images {
            let patterns = BLOCKED_IMAGE_PATTERNS.iter().map(|p| p.to_string()).collect();
            self.page
                .execute(SetBlockedUrLsParams::new(patterns))
                .await
                .map_err(browser_err)?;
        }
        Ok(())
    }

    async fn dismiss_popups(&self) {
        for selector in POPUP_CLOSE_SELECTORS {
            if let Ok(element) = self.page.find_element(*selector).await {
                if element.click().await.is_ok() {
                    debug!(selector, "Closed popup");
                    sleep(Duration::from_millis(500)).await;
                }
            }
        }
    }

    /// Scroll in steps to trigger lazy loading; stops early once the
    /// document height stops changing.
    async fn auto_scroll(&self) {
        let mut prev_height: Option<i64> = None;

        for step in 0..MAX_SCROLLS {
            let scroll = format!("window.scrollBy(0, {SCROLL_DISTANCE})");
            if let Err(e) = self.page.evaluate(scroll).await {
                warn!(error = %e, "Auto-scroll failed");
                return;
            }
            sleep(SCROLL_PAUSE.sample()).await;

            let height = match self.page.evaluate("document.body.scrollHeight").await {
                Ok(result) => result.into_value::<i64>().ok(),
                Err(e) => {
                    warn!(error = %e, "Could not read page height");
                    return;
                }
            };
            if height.is_some() && height == prev_height {
                debug!(scrolls = step + 1, "Reached page bottom");
                return;
            }
            prev_height = height;
        }
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
        let t0 = Instant::now();
        info!("Navigating");

        match timeout(self.nav_timeout, self.page.goto(url.as_str())).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(FetchError::Navigation {
                    url: url.to_string(),
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Err(FetchError::Timeout {
                    url: url.to_string(),
                    secs: self.nav_timeout.as_secs(),
                });
            }
        }

        let pause = self.settle_delay.sample();
        debug!(?pause, "Waiting after page load");
        sleep(pause).await;

        self.dismiss_popups().await;
        self.auto_scroll().await;

        let html = self.page.content().await.map_err(browser_err)?;
        debug!(
            bytes = html.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Rendered page"
        );
        Ok(html)
    }

    async fn close(&mut self) -> Result<(), FetchError> {
        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!(error = %e, "Browser did not close cleanly");
            }
            let _ = browser.wait().await;
        }
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
        Ok(())
    }
}

impl Drop for BrowserFetcher {
    fn drop(&mut self) {
        if let Some(handler) = self.handler.take() {
            handler.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;

    #[tokio::test]
    #[ignore] // Requires Chromium to be installed
    async fn test_browser_fetch_data_url() {
        let config = Cli::parse_from([
            "site_scrapers",
            "--request-delay-min",
            "0",
            "--request-delay-max",
            "0",
            "news",
        ])
        .config;
        let mut fetcher = BrowserFetcher::launch(&config).await.expect("launch");
        let url = Url::parse("data:text/html,<h1>Hello</h1>").unwrap();
        let html = fetcher.fetch_page(&url).await.expect("fetch");
        assert!(html.contains("<h1>Hello</h1>"));
        fetcher.close().await.unwrap();
    }

    #[test]
    fn test_scroll_pause_bounds() {
        for _ in 0..20 {
            let pause = SCROLL_PAUSE.sample();
            assert!(pause >= Duration::from_millis(500) && pause <= Duration::from_millis(1500));
        }
    }
}
