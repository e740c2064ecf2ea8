//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use crawl_url::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawl-url.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, DomainDelayEntry, ScopeConfig, SitemapConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::{
    validate, validate_delay, validate_depth, MAX_CONCURRENCY, MAX_DEPTH_LIMIT, MAX_RETRIES,
};
