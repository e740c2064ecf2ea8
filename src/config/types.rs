use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure
///
/// Every section is optional; a missing key takes its default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub sitemap: SitemapConfig,
    pub scope: ScopeConfig,
    #[serde(rename = "domain-delay")]
    pub domain_delay: Vec<DomainDelayEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum link depth from the start URL (start is depth 0)
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Minimum time between requests to the same origin (seconds)
    pub delay: f64,

    /// Stop once this many URLs are collected
    #[serde(rename = "max-urls")]
    pub max_urls: usize,

    /// Maximum new links enqueued from a single page
    #[serde(rename = "max-links-per-page")]
    pub max_links_per_page: usize,

    /// Visited-set ceiling before the oldest fingerprints are evicted
    #[serde(rename = "max-tracked-urls")]
    pub max_tracked_urls: usize,

    /// Page request timeout (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// robots.txt request timeout (seconds, at most 10)
    #[serde(rename = "robots-timeout")]
    pub robots_timeout: u64,

    /// Pages fetched in parallel per round, each from a distinct origin
    pub concurrency: usize,

    /// Raise an origin's delay to its robots.txt `Crawl-delay`
    #[serde(rename = "respect-crawl-delay")]
    pub respect_crawl_delay: bool,

    /// Extra attempts after a timeout or a 429/500/502/503/504 response
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Wait before the first retry (seconds), doubled for each later one
    #[serde(rename = "retry-backoff")]
    pub retry_backoff: f64,
}

impl CrawlerConfig {
    /// The per-origin delay; invalid values fall back to zero
    pub fn delay_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay).unwrap_or(Duration::ZERO)
    }

    pub fn request_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn robots_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.robots_timeout)
    }

    pub fn retry_backoff_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.retry_backoff).unwrap_or(Duration::ZERO)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            delay: 1.0,
            max_urls: 10_000,
            max_links_per_page: 50,
            max_tracked_urls: 100_000,
            request_timeout: 10,
            robots_timeout: 10,
            concurrency: 1,
            respect_crawl_delay: true,
            max_retries: 3,
            retry_backoff: 1.0,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the robots.txt product token
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl UserAgentConfig {
    /// Formats the User-Agent header: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "crawl-url".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

/// Sitemap processing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SitemapConfig {
    /// Bytes sampled to tell an index from a leaf sitemap
    #[serde(rename = "sample-bytes")]
    pub sample_bytes: usize,

    /// Sitemap request timeout (seconds)
    #[serde(rename = "request-timeout")]
    pub request_timeout: u64,

    /// Recover `<loc>` values from documents that fail to parse
    pub lenient: bool,
}

impl SitemapConfig {
    pub fn request_timeout_duration(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            sample_bytes: 2048,
            request_timeout: 30,
            lenient: false,
        }
    }
}

/// Domain allow/deny lists
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Patterns links must match to be followed; empty means any domain
    #[serde(rename = "allowed-domains")]
    pub allowed_domains: Vec<String>,

    /// Patterns whose links are never followed
    #[serde(rename = "blocked-domains")]
    pub blocked_domains: Vec<String>,
}

/// Per-domain delay override
#[derive(Debug, Clone, Deserialize)]
pub struct DomainDelayEntry {
    /// Domain pattern (e.g., "example.com" or "*.example.com")
    pub domain: String,

    /// Delay in seconds
    pub delay: f64,
}
