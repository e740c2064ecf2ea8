//! crawl-url: discover the reachable URLs of a site
//!
//! Two strategies share one traversal core: declarative sitemap parsing
//! (with robots.txt discovery, index expansion and gzip support) and a
//! depth-bounded breadth-first crawl that respects robots.txt and a
//! per-origin request delay.

pub mod config;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod run;
pub mod sitemap;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for crawl-url operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid URL '{url}': {source}")]
    InvalidUrl { url: String, source: UrlError },

    #[error("Fetch failed for {url}: {reason}")]
    FetchFailed { url: String, reason: String },

    #[error("Malformed sitemap {url}: {source}")]
    MalformedSitemap { url: String, source: SitemapError },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl CrawlError {
    /// Builds a `FetchFailed` error from anything printable
    pub fn fetch_failed(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::FetchFailed {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid domain pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Sitemap document errors
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("XML syntax error at byte {position}: {message}")]
    Syntax { position: u64, message: String },

    #[error("Unexpected root element <{0}>, expected <urlset> or <sitemapindex>")]
    UnexpectedRoot(String),

    #[error("Document ended before </{0}> was closed")]
    Truncated(String),

    #[error("Document has no root element")]
    Empty,
}

/// Result type alias for crawl-url operations
pub type Result<T> = std::result::Result<T, CrawlError>;

// Re-export commonly used types
pub use config::Config;
pub use run::{CrawlResult, Mode, ProgressCallback, RunOptions, Runner, SitemapResult};
pub use crate::url::{normalize_url, Fingerprint, NormalizedUrl};
