//! Page link extraction: fetch one page, return its outgoing links

use crate::crawler::fetcher::{fetch_page, FetchResult, RetryPolicy};
use crate::crawler::parser::extract_links;
use crate::url::NormalizedUrl;
use crate::CrawlError;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

/// Something that turns a page URL into the links found on it
///
/// The frontier only depends on this trait, so traversal can be driven by
/// an in-memory link graph in tests.
#[async_trait]
pub trait LinkSource: Send + Sync {
    /// Returns the page's links, or `FetchFailed` if it could not be retrieved
    ///
    /// A page that is reachable but not HTML yields an empty list.
    async fn extract(&self, url: &NormalizedUrl) -> Result<Vec<NormalizedUrl>, CrawlError>;
}

/// Fetches pages over HTTP and extracts `<a href>` links
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    client: Client,
    retry: RetryPolicy,
}

impl LinkExtractor {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            retry: RetryPolicy::NONE,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[async_trait]
impl LinkSource for LinkExtractor {
    async fn extract(&self, url: &NormalizedUrl) -> Result<Vec<NormalizedUrl>, CrawlError> {
        match fetch_page(&self.client, url.as_url(), self.retry).await {
            FetchResult::Success {
                final_url, body, ..
            } => {
                let links = extract_links(&body, &final_url);
                debug!(url = %url, links = links.len(), "Extracted links");
                Ok(links)
            }
            FetchResult::ContentMismatch { content_type, .. } => {
                debug!(url = %url, content_type = %content_type, "Skipping non-HTML page");
                Ok(Vec::new())
            }
            FetchResult::HttpError { status_code } => {
                warn!(url = %url, status = status_code, "Page fetch failed");
                Err(CrawlError::fetch_failed(url.as_str(), format!("HTTP {}", status_code)))
            }
            FetchResult::NetworkError { error } => {
                warn!(url = %url, error = %error, "Page fetch failed");
                Err(CrawlError::fetch_failed(url.as_str(), error))
            }
        }
    }
}
