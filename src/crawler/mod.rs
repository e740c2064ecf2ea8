//! Crawler module for link-following discovery
//!
//! This module contains the crawling side of the engine:
//! - HTTP fetching and response classification
//! - HTML parsing and link extraction
//! - Per-origin rate limiting
//! - The breadth-first frontier

mod extractor;
mod fetcher;
mod frontier;
mod parser;
mod rate_limiter;

pub use extractor::{LinkExtractor, LinkSource};
pub use fetcher::{
    build_http_client, fetch_page, is_html, send_with_retry, FetchResult, RetryPolicy,
    MAX_REDIRECTS, RETRY_STATUSES,
};
pub use frontier::{CrawlTask, Frontier};
pub use parser::extract_links;
pub use rate_limiter::RateLimiter;
