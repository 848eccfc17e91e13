//! Headline sources.
//!
//! News front pages are single static documents, so each source is plain
//! data: a name, a page URL and the anchor selectors for its headlines. The
//! anchors themselves are the listing containers.
//!
//! | Source | Page |
//! |--------|------|
//! | Times of India | `/home/headlines` |
//! | The Hindu | front page |
//! | NDTV | `/top-stories` |

use super::{SiteProfile, resolve_link};
use crate::error::SkipReason;
use crate::extract::{ContainerRule, NextPageRule, element_text};
use crate::models::{Headline, now_timestamp};
use scraper::ElementRef;
use url::Url;

/// One headline source.
#[derive(Debug, Clone, Copy)]
pub struct NewsSource {
    pub tag: &'static str,
    /// Written to the `source` column.
    pub name: &'static str,
    pub url: &'static str,
    pub headlines: ContainerRule,
}

pub const TIMES_OF_INDIA: NewsSource = NewsSource {
    tag: "TOI",
    name: "Times of India",
    url: "https://timesofindia.indiatimes.com/home/headlines",
    headlines: ContainerRule {
        selectors: &["span.w_tle > a", ".main-content a"],
        must_contain: None,
    },
};

pub const THE_HINDU: NewsSource = NewsSource {
    tag: "Hindu",
    name: "The Hindu",
    url: "https://www.thehindu.com/",
    headlines: ContainerRule {
        selectors: &["h3.title a", ".story-card-news h3 a"],
        must_contain: None,
    },
};

pub const NDTV: NewsSource = NewsSource {
    tag: "NDTV",
    name: "NDTV",
    url: "https://www.ndtv.com/top-stories",
    headlines: ContainerRule {
        selectors: &[".news_Itm-cont h2 a", ".newsHdng a"],
        must_contain: None,
    },
};

/// Every source the news runner fans out to.
pub const SOURCES: [NewsSource; 3] = [TIMES_OF_INDIA, THE_HINDU, NDTV];

impl SiteProfile for NewsSource {
    type Record = Headline;

    fn tag(&self) -> &'static str {
        self.tag
    }

    fn start_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(self.url)
    }

    fn containers(&self) -> ContainerRule {
        self.headlines
    }

    fn next_page(&self) -> Option<NextPageRule> {
        None
    }

    fn extract(&self, item: ElementRef<'_>, base: &Url) -> Result<Headline, SkipReason> {
        let headline = element_text(item);
        if headline.is_empty() {
            return Err(SkipReason::MissingTitle);
        }
        let href = item
            .value()
            .attr("href")
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .ok_or(SkipReason::MissingLink)?;

        Ok(Headline {
            source: self.name.to_string(),
            headline,
            link: resolve_link(base, href)?,
            timestamp: now_timestamp(),
        })
    }

    fn dedup_url<'r>(&self, record: &'r Headline) -> Option<&'r str> {
        Some(&record.link)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::select_containers;
    use scraper::Html;

    #[test]
    fn test_toi_relative_links_are_resolved() {
        let doc = Html::parse_document(
            r#"<ul><li><span class="w_tle"><a href="/india/story/123.cms">Monsoon reaches Kerala</a></span></li></ul>"#,
        );
        let base = TIMES_OF_INDIA.start_url().unwrap();
        let anchors = select_containers(&doc, &TIMES_OF_INDIA.containers());
        let headline = TIMES_OF_INDIA.extract(anchors[0], &base).unwrap();
        assert_eq!(headline.source, "Times of India");
        assert_eq!(headline.headline, "Monsoon reaches Kerala");
        assert_eq!(headline.link, "https://timesofindia.indiatimes.com/india/story/123.cms");
    }

    #[test]
    fn test_hindu_fallback_selector() {
        let doc = Html::parse_document(
            r#"<div class="story-card-news"><h3><a href="https://www.thehindu.com/news/a1.ece">Budget session begins</a></h3></div>"#,
        );
        let base = THE_HINDU.start_url().unwrap();
        let anchors = select_containers(&doc, &THE_HINDU.containers());
        assert_eq!(anchors.len(), 1);
        let headline = THE_HINDU.extract(anchors[0], &base).unwrap();
        assert_eq!(headline.link, "https://www.thehindu.com/news/a1.ece");
    }

    #[test]
    fn test_anchor_without_text_or_href_is_skipped() {
        let doc = Html::parse_document(
            r#"<div class="news_Itm-cont"><h2><a href="/x"> </a></h2><h2><a>Orphan</a></h2></div>"#,
        );
        let base = NDTV.start_url().unwrap();
        let anchors = select_containers(&doc, &NDTV.containers());
        assert_eq!(NDTV.extract(anchors[0], &base), Err(SkipReason::MissingTitle));
        assert_eq!(NDTV.extract(anchors[1], &base), Err(SkipReason::MissingLink));
    }

    #[test]
    fn test_sources_are_single_page() {
        for source in SOURCES {
            assert!(source.next_page().is_none());
            assert!(source.start_url().is_ok());
        }
    }
}
