//! Error types shared by the fetchers, the page loop and the result sink.
//!
//! Expected "not found" outcomes are never errors here: a selector miss is a
//! `None`, an unusable listing is a [`SkipReason`], and an empty results page
//! ends pagination through a [`StopReason`](crate::scrapers::StopReason).

use thiserror::Error;

/// A failed page fetch, from either the browser or the HTTP fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },

    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
}

impl FetchError {
    /// Whether a retry has a reasonable chance of succeeding.
    ///
    /// Timeouts, connection failures, 5xx responses and 429 are transient;
    /// other 4xx responses and body decode failures are not.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout { .. } => true,
            FetchError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            FetchError::Status { status, .. } => *status >= 500 || *status == 429,
            FetchError::Navigation { .. } | FetchError::Browser(_) => false,
        }
    }
}

/// Errors that end a scraper run or a save.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("interrupted by user")]
    Interrupted,
}

/// Why a single listing container produced no record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("no title found")]
    MissingTitle,

    #[error("no link found")]
    MissingLink,

    #[error("link {0:?} could not be resolved")]
    BadLink(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_transience() {
        let server_error = FetchError::Status {
            status: 503,
            url: "https://example.com".to_string(),
        };
        let rate_limited = FetchError::Status {
            status: 429,
            url: "https://example.com".to_string(),
        };
        let not_found = FetchError::Status {
            status: 404,
            url: "https://example.com".to_string(),
        };
        assert!(server_error.is_transient());
        assert!(rate_limited.is_transient());
        assert!(!not_found.is_transient());
    }

    #[test]
    fn test_navigation_is_not_transient() {
        let err = FetchError::Navigation {
            url: "https://example.com".to_string(),
            reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
        };
        assert!(!err.is_transient());
        assert_eq!(
            err.to_string(),
            "navigation to https://example.com failed: net::ERR_NAME_NOT_RESOLVED"
        );
    }

    #[test]
    fn test_timeout_is_transient() {
        let err = FetchError::Timeout {
            url: "https://example.com".to_string(),
            secs: 60,
        };
        assert!(err.is_transient());
    }

    #[test]
    fn test_skip_reason_display() {
        assert_eq!(SkipReason::MissingTitle.to_string(), "no title found");
        assert!(SkipReason::BadLink("::".to_string()).to_string().contains("::"));
    }
}
