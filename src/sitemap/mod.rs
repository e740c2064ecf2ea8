//! Sitemap handling module
//!
//! This module discovers, fetches and parses XML sitemaps, including gzip
//! compressed files and sitemap indexes.

mod discovery;
mod service;
mod source;
pub mod stream;

pub use discovery::{SitemapDiscovery, COMMON_SITEMAP_PATHS};
pub use service::SitemapService;
pub use source::{SitemapFetcher, SitemapReader};
pub use stream::{
    extract_loc_spans, parse_document, sniff_kind, ParsedSitemap, SitemapEntry, SitemapItem,
    SitemapKind, SitemapRef, SitemapStream,
};

/// Returns true if `location` names a sitemap file (`.xml` or `.xml.gz`)
///
/// The query string and fragment are ignored.
///
/// # Examples
///
/// ```
/// use crawl_url::sitemap::is_sitemap_location;
///
/// assert!(is_sitemap_location("https://example.com/sitemap.xml"));
/// assert!(is_sitemap_location("https://example.com/post-sitemap.XML.gz?v=2"));
/// assert!(!is_sitemap_location("https://example.com/blog"));
/// ```
pub fn is_sitemap_location(location: &str) -> bool {
    let path = location
        .split(['?', '#'])
        .next()
        .unwrap_or(location)
        .to_ascii_lowercase();
    path.ends_with(".xml") || path.ends_with(".xml.gz")
}
