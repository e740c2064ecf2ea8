//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and caching robots.txt files.
//! It respects robots.txt directives when crawling websites.

mod cache;
mod parser;

pub use cache::{RobotsCache, MAX_ROBOTS_TIMEOUT};
pub use parser::ParsedRobots;

use crate::CrawlError;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

/// Fetches robots.txt for an origin
///
/// # Arguments
///
/// * `client` - HTTP client carrying the crawler's user agent
/// * `origin` - `scheme://host[:port]` to fetch `/robots.txt` from
/// * `timeout` - Upper bound for the whole request
///
/// # Returns
///
/// * `Ok(ParsedRobots)` - Parsed rules on 200, the allow-all policy on any other status
/// * `Err(CrawlError)` - Transport failure or timeout
pub async fn fetch_robots(
    client: &Client,
    origin: &str,
    timeout: Duration,
) -> Result<ParsedRobots, CrawlError> {
    let robots_url = format!("{}/robots.txt", origin.trim_end_matches('/'));
    debug!(url = %robots_url, "Fetching robots.txt");

    let response = client
        .get(&robots_url)
        .timeout(timeout)
        .send()
        .await
        .map_err(|e| CrawlError::fetch_failed(&robots_url, e))?;

    if response.status() != StatusCode::OK {
        debug!(url = %robots_url, status = %response.status(), "No robots.txt, allowing all");
        return Ok(ParsedRobots::allow_all());
    }

    let body = response
        .text()
        .await
        .map_err(|e| CrawlError::fetch_failed(&robots_url, e))?;

    Ok(ParsedRobots::from_content(&body))
}
