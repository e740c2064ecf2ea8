//! Run dispatch module
//!
//! Picks a discovery strategy for a start location and runs it with
//! per-run collaborators (HTTP client, robots cache, rate limiter).

mod options;
mod result;
mod runner;

pub use options::RunOptions;
pub use result::{CrawlResult, SitemapResult};
pub use runner::Runner;

use crate::ConfigError;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Receives `(message, urls_found_so_far)` as a run progresses
pub type ProgressCallback = Arc<dyn Fn(&str, usize) + Send + Sync>;

/// Discovery strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Sitemaps when the site has them, crawling otherwise
    #[default]
    Auto,
    Sitemap,
    Crawl,
}

impl FromStr for Mode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "sitemap" => Ok(Self::Sitemap),
            "crawl" => Ok(Self::Crawl),
            other => Err(ConfigError::Validation(format!(
                "Unknown mode '{}', expected auto, sitemap or crawl",
                other
            ))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Sitemap => "sitemap",
            Self::Crawl => "crawl",
        })
    }
}
