//! 99acres property listings for a city.

use super::{SiteProfile, resolve_link};
use crate::error::SkipReason;
use crate::extract::{ContainerRule, NextPageRule, extract_attr, extract_text};
use crate::models::{Property, now_timestamp};
use scraper::ElementRef;
use url::Url;

const BASE_URL: &str = "https://www.99acres.com";

// The last two are a catch-all for redesigned tuple layouts.
const CONTAINERS: ContainerRule = ContainerRule {
    selectors: &[
        "div.projectTuple",
        "div.srpTuple__tupleTable",
        "div[class*='tuple']",
        "div[class*='Tuple']",
    ],
    must_contain: None,
};

const NEXT_PAGE: NextPageRule = NextPageRule {
    selectors: &["a[class*='pagination']"],
    text_contains: Some("Next"),
    anchor_text: Some("Next"),
};

const TITLE: &[&str] = &["a.srpTuple__propertyName", "a.projectTuple__projectName"];
const PRICE: &[&str] = &["td.srpTuple__price", "div.list_header_semiBold"];
const LOCATION: &[&str] = &[
    "a.srpTuple__localityName",
    "div.projectTuple__subHeadingWithLocality",
];

#[derive(Debug, Clone)]
pub struct NinetyNineAcres {
    city: String,
}

impl NinetyNineAcres {
    pub fn new(city: impl Into<String>) -> Self {
        Self { city: city.into() }
    }
}

impl SiteProfile for NinetyNineAcres {
    type Record = Property;

    fn tag(&self) -> &'static str {
        "99acres"
    }

    fn start_url(&self) -> Result<Url, url::ParseError> {
        let city_path = urlencoding::encode(&self.city.trim().to_lowercase()).into_owned();
        Url::parse_with_params(
            &format!("{BASE_URL}/search/property/buy/{city_path}"),
            &[("keyword", self.city.as_str())],
        )
    }

    fn containers(&self) -> ContainerRule {
        CONTAINERS
    }

    fn next_page(&self) -> Option<NextPageRule> {
        Some(NEXT_PAGE)
    }

    fn extract(&self, item: ElementRef<'_>, base: &Url) -> Result<Property, SkipReason> {
        let title = extract_text(item, TITLE).ok_or(SkipReason::MissingTitle)?;
        let link = match extract_attr(item, TITLE, "href") {
            Some(href) => resolve_link(base, &href)?,
            None => String::new(),
        };

        Ok(Property {
            title,
            price: extract_text(item, PRICE).unwrap_or_else(|| "Price on Request".to_string()),
            location: extract_text(item, LOCATION).unwrap_or_else(|| self.city.clone()),
            link,
            timestamp: now_timestamp(),
        })
    }

    fn dedup_url<'r>(&self, record: &'r Property) -> Option<&'r str> {
        Some(&record.link)
    }
}
