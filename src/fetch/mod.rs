//! Page fetchers.
//!
//! Two interchangeable ways to turn a URL into document text:
//!
//! | Fetcher | Module | Used by | Failure handling |
//! |---------|--------|---------|------------------|
//! | [`BrowserFetcher`] | [`browser`] | e-commerce, jobs, real estate | no retry; the page loop stops |
//! | [`HttpFetcher`] | [`http`] | news | wrapped in [`RetryFetch`] for transient errors |
//!
//! Both implement [`PageFetcher`], which is all the page loop sees.

pub mod browser;
pub mod fingerprint;
pub mod http;
pub mod retry;

use crate::error::FetchError;
use async_trait::async_trait;
use url::Url;

pub use browser::BrowserFetcher;
pub use http::HttpFetcher;
pub use retry::RetryFetch;

/// Something that can return the document text for a URL.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` and return the rendered or raw document.
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError>;

    /// Release any resources (browser process, pages). Idempotent.
    async fn close(&mut self) -> Result<(), FetchError> {
        Ok(())
    }
}
