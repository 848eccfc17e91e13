//! Selector fallback chains over parsed HTML.
//!
//! Site markup drifts, so every logical field is looked up through an
//! ordered list of CSS selectors, most specific first. A selector that does
//! not parse or does not match is skipped; running out of selectors is a
//! normal `None`, never an error.

use crate::utils::normalize_whitespace;
use scraper::{ElementRef, Html, Selector};
use tracing::trace;

/// Ordered container lookup for one results page.
#[derive(Debug, Clone, Copy)]
pub struct ContainerRule {
    /// Tried in order; the first selector yielding at least one container wins.
    pub selectors: &'static [&'static str],
    /// Keep only containers with a descendant matching this selector.
    pub must_contain: Option<&'static str>,
}

/// Ordered lookup for the "next page" control.
#[derive(Debug, Clone, Copy)]
pub struct NextPageRule {
    pub selectors: &'static [&'static str],
    /// Only accept matches whose text contains this marker.
    pub text_contains: Option<&'static str>,
    /// Last resort after `selectors`: any `<a>` whose whole text equals
    /// this. Exact so that a listing titled "Acer Nextbook" is not taken
    /// for pagination.
    pub anchor_text: Option<&'static str>,
}

fn parse_selector(raw: &str) -> Option<Selector> {
    match Selector::parse(raw) {
        Ok(selector) => Some(selector),
        Err(e) => {
            trace!(selector = raw, error = %e, "Skipping unparseable selector");
            None
        }
    }
}

/// Text content of `node` with whitespace runs collapsed.
pub fn element_text(node: ElementRef<'_>) -> String {
    normalize_whitespace(&node.text().collect::<String>()).unwrap_or_default()
}

/// First non-empty trimmed text among descendants matching `selectors`,
/// tried in order.
pub fn extract_text(node: ElementRef<'_>, selectors: &[&str]) -> Option<String> {
    selectors.iter().find_map(|raw| {
        let selector = parse_selector(raw)?;
        let found = node.select(&selector).next()?;
        let text = element_text(found);
        (!text.is_empty()).then_some(text)
    })
}

/// First non-empty trimmed `attr` value among descendants matching
/// `selectors`, tried in order.
pub fn extract_attr(node: ElementRef<'_>, selectors: &[&str], attr: &str) -> Option<String> {
    selectors.iter().find_map(|raw| {
        let selector = parse_selector(raw)?;
        let found = node.select(&selector).next()?;
        let value = found.value().attr(attr)?.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Listing containers for a page, following the rule's fallback chain.
pub fn select_containers<'a>(document: &'a Html, rule: &ContainerRule) -> Vec<ElementRef<'a>> {
    let required = rule.must_contain.and_then(parse_selector);
    for raw in rule.selectors {
        let Some(selector) = parse_selector(raw) else {
            continue;
        };
        let found: Vec<ElementRef<'a>> = document
            .select(&selector)
            .filter(|el| match &required {
                Some(req) => el.select(req).next().is_some(),
                None => true,
            })
            .collect();
        if !found.is_empty() {
            trace!(selector = raw, count = found.len(), "Container selector matched");
            return found;
        }
    }
    Vec::new()
}

fn non_empty_href(el: ElementRef<'_>) -> Option<String> {
    let href = el.value().attr("href")?.trim();
    (!href.is_empty()).then(|| href.to_string())
}

/// `href` of the first element matching the next-page rule.
pub fn find_next_link(document: &Html, rule: &NextPageRule) -> Option<String> {
    let by_selector = rule.selectors.iter().find_map(|raw| {
        let selector = parse_selector(raw)?;
        document.select(&selector).find_map(|el| {
            if let Some(marker) = rule.text_contains {
                if !element_text(el).contains(marker) {
                    return None;
                }
            }
            non_empty_href(el)
        })
    });
    by_selector.or_else(|| {
        let wanted = rule.anchor_text?;
        let anchors = parse_selector("a[href]")?;
        document
            .select(&anchors)
            .filter(|el| element_text(*el) == wanted)
            .find_map(non_empty_href)
    })
}

/// The first hard-block phrase present in the page's text, if any.
pub fn find_block_marker(document: &Html, markers: &[&'static str]) -> Option<&'static str> {
    if markers.is_empty() {
        return None;
    }
    let text = document.root_element().text().collect::<String>();
    markers.iter().copied().find(|marker| text.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn test_extract_text_first_selector() {
        let doc = fragment("<div><h1>Title</h1><h2>Sub</h2></div>");
        assert_eq!(
            extract_text(doc.root_element(), &["h1", "h2"]).as_deref(),
            Some("Title")
        );
    }

    #[test]
    fn test_extract_text_kth_selector_wins() {
        let doc = fragment(r#"<div><span class="price">  ₹1,299 </span></div>"#);
        let candidates = ["h2 a span", "div.missing", "p.nope", "span.price", "span"];
        for k in 0..3 {
            let mut chain: Vec<&str> = candidates[..3].to_vec();
            chain.truncate(k);
            chain.push("span.price");
            assert_eq!(
                extract_text(doc.root_element(), &chain).as_deref(),
                Some("₹1,299"),
                "k = {k}"
            );
        }
    }

    #[test]
    fn test_extract_text_skips_empty_matches() {
        let doc = fragment(r#"<div><h2>   </h2><span class="t">Real title</span></div>"#);
        assert_eq!(
            extract_text(doc.root_element(), &["h2", "span.t"]).as_deref(),
            Some("Real title")
        );
    }

    #[test]
    fn test_extract_text_no_match_is_none() {
        let doc = fragment("<div><p>text</p></div>");
        assert_eq!(extract_text(doc.root_element(), &["h1", "h2"]), None);
        assert_eq!(extract_text(doc.root_element(), &[]), None);
    }

    #[test]
    fn test_extract_text_skips_invalid_selector() {
        let doc = fragment("<div><h1>Title</h1></div>");
        assert_eq!(
            extract_text(doc.root_element(), &["[[[", "h1"]).as_deref(),
            Some("Title")
        );
    }

    #[test]
    fn test_extract_attr() {
        let doc = fragment(r#"<div><a class="x">no href</a><a href=" /page ">Link</a></div>"#);
        assert_eq!(
            extract_attr(doc.root_element(), &["a.x", "a[href]"], "href").as_deref(),
            Some("/page")
        );
        assert_eq!(extract_attr(doc.root_element(), &["img"], "src"), None);
    }

    #[test]
    fn test_select_containers_falls_back() {
        let doc = fragment(
            r#"<div class="generic"><a href="/1">one</a></div>
               <div class="generic"><a href="/2">two</a></div>"#,
        );
        let rule = ContainerRule {
            selectors: &["div.specific", "div.generic"],
            must_contain: None,
        };
        assert_eq!(select_containers(&doc, &rule).len(), 2);
    }

    #[test]
    fn test_select_containers_must_contain_filter() {
        let doc = fragment(
            r#"<div data-id="1"><a href="/1">one</a></div>
               <div data-id="2"><span>ad slot</span></div>"#,
        );
        let rule = ContainerRule {
            selectors: &["div[data-id]"],
            must_contain: Some("a[href]"),
        };
        assert_eq!(select_containers(&doc, &rule).len(), 1);
    }

    #[test]
    fn test_select_containers_none() {
        let doc = fragment("<p>nothing</p>");
        let rule = ContainerRule {
            selectors: &["div.a", "div.b"],
            must_contain: None,
        };
        assert!(select_containers(&doc, &rule).is_empty());
    }

    #[test]
    fn test_find_next_link_with_text_marker() {
        let doc = fragment(
            r#"<nav><a href="?page=1">Previous</a><a href="?page=3">Next</a></nav>"#,
        );
        let rule = NextPageRule {
            selectors: &["a.missing", "nav a"],
            text_contains: Some("Next"),
            anchor_text: None,
        };
        assert_eq!(find_next_link(&doc, &rule).as_deref(), Some("?page=3"));
    }

    #[test]
    fn test_find_next_link_absent() {
        let doc = fragment(r#"<a class="s-pagination-next s-pagination-disabled">Next</a>"#);
        let rule = NextPageRule {
            selectors: &["a.s-pagination-next"],
            text_contains: None,
            anchor_text: None,
        };
        assert_eq!(find_next_link(&doc, &rule), None);
    }

    #[test]
    fn test_find_next_link_anchor_text_is_exact() {
        let rule = NextPageRule {
            selectors: &["a.pager-next"],
            text_contains: Some("Next"),
            anchor_text: Some("Next"),
        };
        let listing_only = fragment(
            r#"<div class="card"><a href="/nextbook-flexx/p/itm9">Acer Nextbook Flexx 11</a></div>"#,
        );
        assert_eq!(find_next_link(&listing_only, &rule), None);

        let with_pager = fragment(
            r#"<div class="card"><a href="/nextbook-flexx/p/itm9">Acer Nextbook Flexx 11</a></div>
               <div class="pages"><a href="?page=2"> Next </a></div>"#,
        );
        assert_eq!(find_next_link(&with_pager, &rule).as_deref(), Some("?page=2"));
    }

    #[test]
    fn test_find_block_marker() {
        let doc = fragment("<p>Enter the characters you see below</p>");
        assert_eq!(
            find_block_marker(&doc, &["Enter the characters you see below"]),
            Some("Enter the characters you see below")
        );
        assert_eq!(find_block_marker(&doc, &[]), None);
        assert_eq!(find_block_marker(&fragment("<p>ok</p>"), &["captcha"]), None);
    }
}
