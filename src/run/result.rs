use serde::Serialize;

/// Outcome of a crawl or sitemap run
///
/// Run operations never return `Err`; failures are reported here with
/// `success = false` and whatever was collected before the failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlResult {
    pub success: bool,
    /// URLs in the order they were discovered
    pub urls: Vec<String>,
    /// Always `urls.len()`
    pub count: usize,
    pub message: String,
    pub errors: Vec<String>,
}

/// Sitemap runs share the crawl envelope
pub type SitemapResult = CrawlResult;

impl CrawlResult {
    pub fn success(urls: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            success: true,
            count: urls.len(),
            urls,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// A failed run with no URLs and a single error
    pub fn failure(message: impl Into<String>, error: impl ToString) -> Self {
        Self {
            success: false,
            urls: Vec::new(),
            count: 0,
            message: message.into(),
            errors: vec![error.to_string()],
        }
    }

    pub fn with_errors(mut self, errors: Vec<String>) -> Self {
        self.errors.extend(errors);
        self
    }
}
