//! Plain HTTP fetcher.
//!
//! A single GET per call with a browser-like header set. Status codes other
//! than 2xx become [`FetchError::Status`] so the retry layer can tell a 503
//! from a 404.

use super::PageFetcher;
use crate::config::Config;
use crate::error::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use std::time::Instant;
use tracing::{debug, instrument};
use url::Url;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// GET-based fetcher sharing one connection pool; cheap to clone.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    /// Shared client with the default header set and timeout applied.
    client: Client,
    /// Request timeout, kept for error reporting.
    timeout_secs: u64,
}

impl HttpFetcher {
    /// Build a client from `config`: `REQUEST_TIMEOUT` per request and at
    /// most 10 redirects.
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder()
            .default_headers(default_headers())
            .timeout(config.timeout())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;
        Ok(Self {
            client,
            timeout_secs: config.request_timeout,
        })
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert("dnt", HeaderValue::from_static("1"));
    headers
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    secs: self.timeout_secs,
                }
            } else {
                FetchError::Http(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        debug!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched page"
        );
        Ok(body)
    }
}
