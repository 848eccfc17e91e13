//! Naukri job listings for a role and location.
//!
//! Listing pages are addressed by slug, e.g.
//! `https://www.naukri.com/python-developer-jobs-in-remote`; later pages
//! are reached through the pagination control.
//! Missing detail fields fall back to Naukri's own placeholders.

use super::{SiteProfile, resolve_link};
use crate::error::SkipReason;
use crate::extract::{ContainerRule, NextPageRule, extract_attr, extract_text};
use crate::models::{JobListing, now_timestamp};
use scraper::ElementRef;
use tracing::debug;
use url::Url;

const BASE_URL: &str = "https://www.naukri.com";

const CONTAINERS: ContainerRule = ContainerRule {
    selectors: &["div.srp-jobtuple-wrapper", "article.jobTuple", "div.list"],
    must_contain: None,
};

const NEXT_PAGE: NextPageRule = NextPageRule {
    selectors: &["div[class*='pagination'] a"],
    text_contains: Some("Next"),
    anchor_text: Some("Next"),
};

const TITLE: &[&str] = &["a.title"];
const COMPANY: &[&str] = &["a.comp-name", "a.subTitle"];
const EXPERIENCE: &[&str] = &["span.exp-wrap", "span.exp", "li.experience"];
const SALARY: &[&str] = &["span.sal-wrap", "span.sal", "li.salary"];
const LOCATION: &[&str] = &["span.loc-wrap", "span.loc", "li.location"];

fn slug(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let joined = lowered.split_whitespace().collect::<Vec<_>>().join("-");
    urlencoding::encode(&joined).into_owned()
}

#[derive(Debug, Clone)]
pub struct Naukri {
    role: String,
    location: String,
}

impl Naukri {
    pub fn new(role: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            location: location.into(),
        }
    }
}

impl SiteProfile for Naukri {
    type Record = JobListing;

    fn tag(&self) -> &'static str {
        "Naukri"
    }

    fn start_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!(
            "{BASE_URL}/{}-jobs-in-{}",
            slug(&self.role),
            slug(&self.location)
        ))
    }

    fn containers(&self) -> ContainerRule {
        CONTAINERS
    }

    fn next_page(&self) -> Option<NextPageRule> {
        Some(NEXT_PAGE)
    }

    fn extract(&self, item: ElementRef<'_>, base: &Url) -> Result<JobListing, SkipReason> {
        let title = extract_text(item, TITLE).ok_or(SkipReason::MissingTitle)?;

        // A listing without a usable link is still worth keeping.
        let link = match extract_attr(item, TITLE, "href") {
            Some(href) => resolve_link(base, &href).unwrap_or_else(|reason| {
                debug!(%reason, "Keeping job without link");
                String::new()
            }),
            None => String::new(),
        };

        Ok(JobListing {
            title,
            company: extract_text(item, COMPANY).unwrap_or_else(|| "Confidential".to_string()),
            experience: extract_text(item, EXPERIENCE)
                .unwrap_or_else(|| "Not specified".to_string()),
            salary: extract_text(item, SALARY).unwrap_or_else(|| "Not disclosed".to_string()),
            location: extract_text(item, LOCATION).unwrap_or_else(|| "Not specified".to_string()),
            link,
            timestamp: now_timestamp(),
        })
    }

    fn dedup_url<'r>(&self, record: &'r JobListing) -> Option<&'r str> {
        Some(&record.link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{find_next_link, select_containers};
    use scraper::Html;

    fn base() -> Url {
        Naukri::new("Python Developer", "Remote").start_url().unwrap()
    }

    #[test]
    fn test_start_url_uses_slugs() {
        assert_eq!(
            base().as_str(),
            "https://www.naukri.com/python-developer-jobs-in-remote"
        );
    }

    #[test]
    fn test_extracts_listing_with_defaults() {
        let doc = Html::parse_document(
            r#"
            <article class="jobTuple">
              <a class="title" href="https://www.naukri.com/job-listings-python-dev-acme-123">Python Developer</a>
              <a class="subTitle">Acme Corp</a>
              <li class="experience">2-5 Yrs</li>
            </article>
            "#,
        );
        let cards = select_containers(&doc, &CONTAINERS);
        assert_eq!(cards.len(), 1);

        let job = Naukri::new("x", "y").extract(cards[0], &base()).unwrap();
        assert_eq!(job.title, "Python Developer");
        assert_eq!(job.company, "Acme Corp");
        assert_eq!(job.experience, "2-5 Yrs");
        assert_eq!(job.salary, "Not disclosed");
        assert_eq!(job.location, "Not specified");
        assert_eq!(job.link, "https://www.naukri.com/job-listings-python-dev-acme-123");
    }

    #[test]
    fn test_missing_company_is_confidential() {
        let doc = Html::parse_document(
            r#"<div class="srp-jobtuple-wrapper"><a class="title">Data Engineer</a></div>"#,
        );
        let cards = select_containers(&doc, &CONTAINERS);
        let job = Naukri::new("x", "y").extract(cards[0], &base()).unwrap();
        assert_eq!(job.company, "Confidential");
        assert_eq!(job.link, "");
    }

    #[test]
    fn test_job_titles_mentioning_next_are_not_pagination() {
        let doc = Html::parse_document(
            r#"<div class="srp-jobtuple-wrapper">
                 <a class="title" href="/job-listings-nextjs-dev-1">Next.js Developer</a>
               </div>
               <div class="styles_pagination__oIvXh">
                 <a href="/python-developer-jobs-in-remote-2"><span>Next</span></a>
               </div>"#,
        );
        assert_eq!(
            find_next_link(&doc, &NEXT_PAGE).as_deref(),
            Some("/python-developer-jobs-in-remote-2")
        );

        let without_pager = Html::parse_document(
            r#"<a class="title" href="/job-listings-nextjs-dev-1">Next.js Developer</a>"#,
        );
        assert_eq!(find_next_link(&without_pager, &NEXT_PAGE), None);
    }
}
