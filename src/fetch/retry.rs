//! Exponential backoff around any [`PageFetcher`].
//!
//! # Retry Strategy
//!
//! - At most `max_attempts` attempts in total
//! - Only [`FetchError::is_transient`] failures are retried
//! - Delay doubles from `base_delay`, capped at `max_delay`
//! - Random jitter (0-250ms by default) added to each delay

use super::PageFetcher;
use crate::error::FetchError;
use async_trait::async_trait;
use rand::{Rng, rng};
use std::fmt;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, instrument, warn};
use url::Url;

/// Decorator that retries transient failures of the wrapped fetcher.
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter
/// ```
pub struct RetryFetch<T> {
    /// The fetcher whose failures are retried.
    inner: T,
    /// Total attempts per URL, including the first one.
    max_attempts: u32,
    /// Delay after the first failure (doubles with each attempt).
    base_delay: Duration,
    /// Upper bound on the doubled delay, before jitter.
    max_delay: Duration,
    /// Upper bound on the random extra delay added to each wait.
    max_jitter: Duration,
}

impl<T> RetryFetch<T>
where
    T: PageFetcher,
{
    /// Wrap an existing [`PageFetcher`] with exponential backoff.
    ///
    /// # Arguments
    ///
    /// * `inner` - The fetcher to wrap
    /// * `max_attempts` - Total attempts per URL; `0` is treated as `1`
    /// * `base_delay` - Delay after the first failure (`REQUEST_DELAY_MIN`)
    /// * `max_delay` - Cap on the backoff (`REQUEST_DELAY_MAX`); raised to
    ///   `base_delay` if smaller
    ///
    /// # Example
    ///
    /// ```ignore
    /// let http = HttpFetcher::new(&config)?;
    /// let fetcher = RetryFetch::new(http, 3, Duration::from_secs(2), Duration::from_secs(5));
    /// ```
    pub fn new(inner: T, max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay: max_delay.max(base_delay),
            max_jitter: Duration::from_millis(250),
        }
    }

    /// Replace the default 250ms jitter bound.
    #[cfg(test)]
    pub fn with_jitter(mut self, max_jitter: Duration) -> Self {
        self.max_jitter = max_jitter;
        self
    }

    /// Delay before the next attempt, after `attempt` failures.
    fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << exp).min(self.max_delay);
        let jitter_ms = self.max_jitter.as_millis() as u64;
        let jitter = if jitter_ms == 0 {
            Duration::ZERO
        } else {
            Duration::from_millis(rng().random_range(0..=jitter_ms))
        };
        delay + jitter
    }
}

impl<T> fmt::Debug for RetryFetch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryFetch")
            .field("max_attempts", &self.max_attempts)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

#[async_trait]
impl<T> PageFetcher for RetryFetch<T>
where
    T: PageFetcher,
{
    #[instrument(level = "debug", skip_all, fields(%url))]
    async fn fetch_page(&self, url: &Url) -> Result<String, FetchError> {
        let total_t0 = Instant::now();
        let mut attempt = 0u32;

        loop {
            let attempt_t0 = Instant::now();
            match self.inner.fetch_page(url).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    attempt += 1;
                    let elapsed_ms_attempt = attempt_t0.elapsed().as_millis() as u64;
                    let elapsed_ms_total = total_t0.elapsed().as_millis() as u64;

                    if !e.is_transient() {
                        warn!(attempt, error = %e, "fetch failed with a non-transient error");
                        return Err(e);
                    }
                    if attempt >= self.max_attempts {
                        error!(
                            attempt,
                            max = self.max_attempts,
                            elapsed_ms_attempt,
                            elapsed_ms_total,
                            error = %e,
                            "fetch exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_attempts,
                        elapsed_ms_attempt,
                        elapsed_ms_total,
                        ?delay,
                        error = %e,
                        "fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), FetchError> {
        self.inner.close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Replays a scripted sequence of outcomes, one per call.
    struct Scripted {
        outcomes: Mutex<Vec<Result<String, FetchError>>>,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(mut outcomes: Vec<Result<String, FetchError>>) -> Self {
            outcomes.reverse();
            Self {
                outcomes: Mutex::new(outcomes),
                calls: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl PageFetcher for Scripted {
        async fn fetch_page(&self, _url: &Url) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Ok("<html></html>".to_string()))
        }
    }

    fn status(code: u16) -> FetchError {
        FetchError::Status {
            status: code,
            url: "https://example.com".to_string(),
        }
    }

    fn quick(inner: Scripted, attempts: u32) -> RetryFetch<Scripted> {
        RetryFetch::new(inner, attempts, Duration::from_millis(1), Duration::from_millis(4))
            .with_jitter(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_retries_transient_then_succeeds() {
        let fetcher = quick(
            Scripted::new(vec![Err(status(503)), Err(status(502)), Ok("done".into())]),
            3,
        );
        let url = Url::parse("https://example.com").unwrap();
        assert_eq!(fetcher.fetch_page(&url).await.unwrap(), "done");
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_at_attempt_ceiling() {
        let fetcher = quick(
            Scripted::new(vec![Err(status(500)), Err(status(500)), Err(status(500))]),
            2,
        );
        let url = Url::parse("https://example.com").unwrap();
        let err = fetcher.fetch_page(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 500, .. }));
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_does_not_retry_client_errors() {
        let fetcher = quick(Scripted::new(vec![Err(status(404))]), 5);
        let url = Url::parse("https://example.com").unwrap();
        assert!(fetcher.fetch_page(&url).await.is_err());
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let fetcher = RetryFetch::new(
            Scripted::new(vec![]),
            5,
            Duration::from_secs(1),
            Duration::from_secs(5),
        )
        .with_jitter(Duration::ZERO);
        assert_eq!(fetcher.backoff(1), Duration::from_secs(1));
        assert_eq!(fetcher.backoff(2), Duration::from_secs(2));
        assert_eq!(fetcher.backoff(3), Duration::from_secs(4));
        assert_eq!(fetcher.backoff(4), Duration::from_secs(5));
    }
}
