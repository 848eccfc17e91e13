//! Flipkart product search.
//!
//! Flipkart ships several card layouts with obfuscated class names that
//! change often, so every field carries a long fallback chain and the
//! container rule only accepts cards that actually contain a link.

use super::{SiteProfile, resolve_link};
use crate::error::SkipReason;
use crate::extract::{ContainerRule, NextPageRule, element_text, extract_attr, extract_text};
use crate::models::{Product, now_timestamp};
use crate::utils::clean_price;
use scraper::{ElementRef, Selector};
use url::Url;

const BASE_URL: &str = "https://www.flipkart.com";

const CONTAINERS: ContainerRule = ContainerRule {
    selectors: &["div._1AtVbE", "div._75nlfW", "div[data-id]"],
    must_contain: Some("a[href]"),
};

const NEXT_PAGE: NextPageRule = NextPageRule {
    selectors: &["a._1LKTO3", "a._9QVEpD", "nav a"],
    text_contains: Some("Next"),
    anchor_text: Some("Next"),
};

const TITLE: &[&str] = &["div.KzDlHZ", "div._4rR01T", "a.s1Q9rs", "div.name"];
const LINK: &[&str] = &["a.CGtC98", "a._1fQZEK", "a.s1Q9rs", "a[href]"];
const PRICE: &[&str] = &["div.Nx9bqj", "div._30jeq3", "div._25b18c ._30jeq3"];
const RATING: &[&str] = &["div.XQDdHH", "div._3LWZlK"];
const REVIEWS: &[&str] = &["span.Wphh3N", "span._2_R_DZ"];
const IMAGE: &[&str] = &["img._396cs4", "img.DByuf4", "img"];
const AVAILABILITY: &[&str] = &["div._3Owiq", "div._2JzRXW"];

#[derive(Debug, Clone)]
pub struct Flipkart {
    query: String,
}

impl Flipkart {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
        }
    }
}

/// Text of the card's first link, for layouts without a title element.
fn link_text(item: ElementRef<'_>) -> Option<String> {
    let selector = Selector::parse("a[href]").ok()?;
    let text = element_text(item.select(&selector).next()?);
    (!text.is_empty()).then_some(text)
}

impl SiteProfile for Flipkart {
    type Record = Product;

    fn tag(&self) -> &'static str {
        "Flipkart"
    }

    fn start_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&format!(
            "{BASE_URL}/search?q={}&sort=recency_desc",
            urlencoding::encode(&self.query)
        ))
    }

    fn containers(&self) -> ContainerRule {
        CONTAINERS
    }

    fn next_page(&self) -> Option<NextPageRule> {
        Some(NEXT_PAGE)
    }

    fn extract(&self, item: ElementRef<'_>, base: &Url) -> Result<Product, SkipReason> {
        let title = extract_text(item, TITLE)
            .or_else(|| link_text(item))
            .ok_or(SkipReason::MissingTitle)?;
        let href = extract_attr(item, LINK, "href").ok_or(SkipReason::MissingLink)?;
        let url = resolve_link(base, &href)?;

        let price = extract_text(item, PRICE).and_then(|raw| clean_price(&raw));
        let sold_out =
            extract_text(item, AVAILABILITY).is_some_and(|text| text.contains("Sold Out"));
        let availability = if price.is_some() && !sold_out {
            "In Stock"
        } else {
            "Out of Stock"
        };

        Ok(Product {
            platform: "Flipkart".to_string(),
            title,
            price,
            rating: extract_text(item, RATING),
            reviews: extract_text(item, REVIEWS),
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{find_next_link, select_containers};
    use scraper::Html;

    const RESULTS_PAGE: &str = r#"
        <html><body>
          <div class="_75nlfW"><span>Sponsored banner, no link</span></div>
          <div class="_75nlfW">
            <a class="CGtC98" href="/hp-victus/p/itm123?pid=COMG">
              <div class="KzDlHZ">HP Victus Gaming Laptop</div>
              <div class="Nx9bqj">₹58,990</div>
              <div class="XQDdHH">4.3</div>
              <span class="Wphh3N">2,311 Ratings</span>
            </a>
          </div>
          <div class="_75nlfW">
            <a href="/msi-thin/p/itm456">MSI Thin GF63</a>
            <div class="_3Owiq">Sold Out</div>
            <div class="Nx9bqj">₹49,990</div>
          </div>
          <nav>
            <a href="/search?q=gaming&amp;page=1">1</a>
            <a class="_9QVEpD" href="/search?q=gaming&amp;page=2"><span>Next</span></a>
          </nav>
        </body></html>
    "#;

    fn base() -> Url {
        Flipkart::new("gaming laptops").start_url().unwrap()
    }

    #[test]
    fn test_start_url() {
        assert_eq!(
            base().as_str(),
            "https://www.flipkart.com/search?q=gaming%20laptops&sort=recency_desc"
        );
    }

    #[test]
    fn test_cards_without_links_are_ignored() {
        let doc = Html::parse_document(RESULTS_PAGE);
        assert_eq!(select_containers(&doc, &CONTAINERS).len(), 2);
    }

    #[test]
    fn test_extracts_product_fields() {
        let doc = Html::parse_document(RESULTS_PAGE);
        let cards = select_containers(&doc, &CONTAINERS);
        let product = Flipkart::new("x").extract(cards[0], &base()).unwrap();
        assert_eq!(product.title, "HP Victus Gaming Laptop");
        assert_eq!(product.price, Some(58990));
        assert_eq!(product.rating.as_deref(), Some("4.3"));
        assert_eq!(product.url, "https://www.flipkart.com/hp-victus/p/itm123?pid=COMG");
        assert_eq!(product.availability, "In Stock");
    }

    #[test]
    fn test_title_falls_back_to_link_text() {
        let doc = Html::parse_document(RESULTS_PAGE);
        let cards = select_containers(&doc, &CONTAINERS);
        let product = Flipkart::new("x").extract(cards[1], &base()).unwrap();
        assert_eq!(product.title, "MSI Thin GF63");
        assert_eq!(product.availability, "Out of Stock");
    }

    #[test]
    fn test_next_link_requires_next_text() {
        let doc = Html::parse_document(RESULTS_PAGE);
        assert_eq!(
            find_next_link(&doc, &NEXT_PAGE).as_deref(),
            Some("/search?q=gaming&page=2")
        );
    }

    #[test]
    fn test_listing_titled_next_is_not_pagination() {
        let doc = Html::parse_document(
            r#"<div class="_75nlfW"><a href="/nextbook-flexx/p/itm9">Acer Nextbook Flexx 11</a></div>"#,
        );
        assert_eq!(find_next_link(&doc, &NEXT_PAGE), None);
    }

    #[test]
    fn test_unstyled_next_anchor_is_found() {
        let doc = Html::parse_document(
            r#"<div class="_75nlfW"><a href="/nextbook-flexx/p/itm9">Acer Nextbook Flexx 11</a></div>
               <div class="pager"><a href="/search?q=x&amp;page=2">Next</a></div>"#,
        );
        assert_eq!(
            find_next_link(&doc, &NEXT_PAGE).as_deref(),
            Some("/search?q=x&page=2")
        );
    }
}
