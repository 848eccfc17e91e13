//! Record validation and text sanitizing.
//!
//! Validators are plain `fn(&R) -> bool` so the sink can take any of them;
//! [`filter_valid_data`] sanitizes every record before asking the
//! validator, which means a field made of nothing but whitespace or control
//! characters counts as missing.

use crate::models::{Headline, JobListing, Product, Property, Record};
use url::Url;

/// A URL parses and has both a scheme and a network location.
pub fn validate_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => !parsed.scheme().is_empty() && parsed.host_str().is_some_and(|h| !h.is_empty()),
        Err(_) => false,
    }
}

/// Remove NUL bytes and control characters (except `\n` and `\t`), then
/// collapse whitespace. Returns `None` when nothing is left.
pub fn sanitize_text(text: &str) -> Option<String> {
    let kept: String = text
        .chars()
        .filter(|&c| c != '\0' && (!c.is_control() || c == '\n' || c == '\t'))
        .collect();
    let joined = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    if joined.is_empty() { None } else { Some(joined) }
}

/// Products need a platform, a title and a well-formed URL.
pub fn validate_product(product: &Product) -> bool {
    !product.platform.is_empty() && !product.title.is_empty() && validate_url(&product.url)
}

/// Headlines need a source, headline text and a well-formed link.
pub fn validate_headline(headline: &Headline) -> bool {
    !headline.source.is_empty() && !headline.headline.is_empty() && validate_url(&headline.link)
}

/// Job listings need a title and a company.
pub fn validate_job(job: &JobListing) -> bool {
    !job.title.is_empty() && !job.company.is_empty()
}

/// Property listings need a title and a location.
pub fn validate_property(property: &Property) -> bool {
    !property.title.is_empty() && !property.location.is_empty()
}

/// Sanitize every record, then keep only those the validator accepts.
pub fn filter_valid_data<R, V>(records: Vec<R>, validator: V) -> Vec<R>
where
    R: Record,
    V: Fn(&R) -> bool,
{
    records
        .into_iter()
        .map(|mut record| {
            record.sanitize();
            record
        })
        .filter(|record| validator(record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::now_timestamp;

    fn headline(text: &str, link: &str) -> Headline {
        Headline {
            source: "Times of India".to_string(),
            headline: text.to_string(),
            link: link.to_string(),
            timestamp: now_timestamp(),
        }
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/a?b=c"));
        assert!(validate_url("http://localhost:8080"));
        assert!(!validate_url("/relative/path"));
        assert!(!validate_url("mailto:someone@example.com"));
        assert!(!validate_url(""));
        assert!(!validate_url("not a url"));
    }

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("a\u{0}b").as_deref(), Some("ab"));
        assert_eq!(sanitize_text("  x \n\t y  ").as_deref(), Some("x y"));
        assert_eq!(sanitize_text("\u{1b}[31mred").as_deref(), Some("[31mred"));
        assert_eq!(sanitize_text(" \u{7} "), None);
        assert_eq!(sanitize_text(""), None);
    }

    #[test]
    fn test_validate_headline() {
        assert!(validate_headline(&headline("Budget passed", "https://toi.in/a")));
        assert!(!validate_headline(&headline("", "https://toi.in/a")));
        assert!(!validate_headline(&headline("Budget passed", "/a")));
    }

    #[test]
    fn test_validate_job_and_property() {
        let job = JobListing {
            title: "Python Developer".to_string(),
            company: "".to_string(),
            experience: "2-5 Yrs".to_string(),
            salary: "Not disclosed".to_string(),
            location: "Remote".to_string(),
            link: "".to_string(),
            timestamp: now_timestamp(),
        };
        assert!(!validate_job(&job));
        assert!(validate_job(&JobListing {
            company: "Acme".to_string(),
            ..job
        }));

        let property = Property {
            title: "3 BHK Flat".to_string(),
            price: "Price on Request".to_string(),
            location: "Baner, Pune".to_string(),
            link: "".to_string(),
            timestamp: now_timestamp(),
        };
        assert!(validate_property(&property));
        assert!(!validate_property(&Property {
            location: String::new(),
            ..property
        }));
    }

    #[test]
    fn test_filter_valid_data_sanitizes_before_validating() {
        let records = vec![
            headline("  Markets  rally ", "https://toi.in/1"),
            headline(" \u{0}\u{7} ", "https://toi.in/2"),
            headline("Monsoon arrives", "javascript-void"),
        ];
        let valid = filter_valid_data(records, validate_headline);
        assert_eq!(valid.len(), 1);
        assert_eq!(valid[0].headline, "Markets rally");
    }
}
