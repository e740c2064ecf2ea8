//! HTML link extraction
//!
//! Parsing goes through scraper (html5ever), which recovers from broken
//! markup the way browsers do.

use crate::url::{normalize_url, NormalizedUrl};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts every `<a href>` target from an HTML document
///
/// Each href is resolved against `base_url` (the final, post-redirect URL
/// of the page) and normalized. Hrefs that do not yield a valid http(s)
/// URL (`mailto:`, `javascript:`, unparsable values) are dropped.
/// Duplicates are removed, keeping the first occurrence in document order.
///
/// # Example
///
/// ```
/// use crawl_url::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/a">A</a><a href="mailto:x@y.z">M</a><a href="/a#top">A again</a>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(html, &base_url);
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://example.com/a");
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<NormalizedUrl> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        if let Ok(link) = normalize_url(href, Some(base_url)) {
            if seen.insert(link.clone()) {
                links.push(link);
            }
        }
    }

    links
}
