//! Amazon India product search.
//!
//! Search results live at `https://www.amazon.in/s?k=<query>`; each result
//! is a `div[data-component-type='s-search-result']` card and pagination
//! follows the `a.s-pagination-next` control. A CAPTCHA interstitial ends
//! the run.

use super::{SiteProfile, resolve_link};
use crate::error::SkipReason;
use crate::extract::{ContainerRule, NextPageRule, extract_attr, extract_text};
use crate::models::{Product, now_timestamp};
use crate::utils::{clean_price, extract_number};
use scraper::ElementRef;
use url::Url;

const BASE_URL: &str = "https://www.amazon.in";

const CONTAINERS: ContainerRule = ContainerRule {
    selectors: &[
        "div[data-component-type='s-search-result']",
        "div.s-result-item[data-asin]",
    ],
    must_contain: None,
};

const NEXT_PAGE: NextPageRule = NextPageRule {
    selectors: &["a.s-pagination-next"],
    text_contains: None,
    anchor_text: None,
};

const BLOCK_MARKERS: &[&str] = &["Enter the characters you see below"];

const TITLE: &[&str] = &["h2 a span", "h2", "span.a-text-normal"];
const LINK: &[&str] = &["h2 a", "a.a-link-normal"];
const PRICE: &[&str] = &["span.a-price-whole", "span.a-offscreen"];
const RATING: &[&str] = &["span.a-icon-alt", "i.a-icon-star-small"];
const REVIEWS: &[&str] = &["span.a-size-base.s-underline-text", "span.a-size-base"];
const IMAGE: &[&str] = &["img.s-image"];
const AVAILABILITY: &[&str] = &["span.a-color-price"];

#[derive(Debug, Clone)]
pub struct Amazon {
    query: String,
}

impl Amazon {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

impl SiteProfile for Amazon {
    type Record = Product;

    fn tag(&self) -> &'static str {
        "Amazon"
    }

    fn start_url(&self) -> Result<Url, url::ParseError> {
        Url::parse_with_params(&format!("{BASE_URL}/s"), &[("k", self.query.as_str())])
    }

    fn containers(&self) -> ContainerRule {
        CONTAINERS
    }

    fn next_page(&self) -> Option<NextPageRule> {
        Some(NEXT_PAGE)
    }

    fn block_markers(&self) -> &'static [&'static str] {
        BLOCK_MARKERS
    }

    fn extract(&self, item: ElementRef<'_>, base: &Url) -> Result<Product, SkipReason> {
        let title = extract_text(item, TITLE).ok_or(SkipReason::MissingTitle)?;
        let href = extract_attr(item, LINK, "href").ok_or(SkipReason::MissingLink)?;
        let url = resolve_link(base, &href)?;

        let price = extract_text(item, PRICE).and_then(|raw| clean_price(&raw));
        // "4.3 out of 5 stars" -> "4.3"
        let rating = extract_text(item, RATING)
            .and_then(|raw| raw.split_whitespace().next().map(str::to_string));

        let unavailable = extract_text(item, AVAILABILITY)
            .is_some_and(|text| text.contains("Currently unavailable"));
        let availability = if price.is_some() && !unavailable {
            "In Stock"
        } else {
            "Out of Stock"
        };

        // The bare `span.a-size-base` fallback also matches badges like "Sponsored"
        let reviews = extract_text(item, REVIEWS).filter(|raw| extract_number(raw).is_some());

        Ok(Product {
            platform: "Amazon".to_string(),
            title,
            price,
            rating,
            reviews,
            url,
            image_url: extract_attr(item, IMAGE, "src"),
            availability: availability.to_string(),
            timestamp: now_timestamp(),
        })
    }

    fn dedup_url<'r>(&self, record: &'r Product) -> Option<&'r str> {
        Some(&record.url)
    }
}
