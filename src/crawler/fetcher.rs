//! HTTP fetcher implementation
//!
//! This module handles page requests for the crawler:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - Retrying transient failures with exponential backoff
//! - Classifying the outcome (HTML, other content, HTTP error, network error)

use crate::config::{CrawlerConfig, UserAgentConfig};
use reqwest::{redirect::Policy, Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Maximum redirect hops followed per request
pub const MAX_REDIRECTS: usize = 10;

/// Statuses that are retried
pub const RETRY_STATUSES: [StatusCode; 5] = [
    StatusCode::TOO_MANY_REQUESTS,
    StatusCode::INTERNAL_SERVER_ERROR,
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

/// How many times a request is repeated and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub max_retries: u32,
    /// Wait before the first retry; each later wait doubles
    pub backoff: Duration,
}

impl RetryPolicy {
    /// A single attempt
    pub const NONE: Self = Self {
        max_retries: 0,
        backoff: Duration::ZERO,
    };

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: config.retry_backoff_duration(),
        }
    }

    /// Wait before retry number `retry` (zero-based)
    pub fn delay(&self, retry: u32) -> Duration {
        self.backoff.saturating_mul(2u32.saturating_pow(retry))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

/// Sends `request`, repeating it on timeouts, connection failures and
/// [`RETRY_STATUSES`]
///
/// The last response or error is returned once retries run out. Requests
/// whose body cannot be cloned are sent once.
pub async fn send_with_retry(
    request: RequestBuilder,
    policy: RetryPolicy,
) -> Result<Response, reqwest::Error> {
    let mut retry = 0;
    loop {
        let attempt = match request.try_clone() {
            Some(attempt) => attempt,
            None => return request.send().await,
        };
        let exhausted = retry >= policy.max_retries;

        match attempt.send().await {
            Ok(response) if !exhausted && RETRY_STATUSES.contains(&response.status()) => {
                debug!(
                    url = %response.url(),
                    status = %response.status(),
                    retry = retry + 1,
                    "Retrying request"
                );
            }
            Err(e) if !exhausted && (e.is_timeout() || e.is_connect()) => {
                debug!(error = %e, retry = retry + 1, "Retrying request");
            }
            outcome => return outcome,
        }

        tokio::time::sleep(policy.delay(retry)).await;
        retry += 1;
    }
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value
        content_type: String,
        /// Page body content
        body: String,
    },

    /// Page is not HTML (Content-Type mismatch)
    ContentMismatch {
        /// Final URL after redirects
        final_url: Url,
        /// The actual Content-Type received
        content_type: String,
    },

    /// Non-2xx response
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Whole-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use crawl_url::config::UserAgentConfig;
/// use crawl_url::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page and classifies the response
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx with HTML content type | `Success` |
/// | 2xx with any other content type | `ContentMismatch` |
/// | Non-2xx status | `HttpError` |
/// | Timeout, refused connection, body read failure | `NetworkError` |
///
/// Transient failures are retried per `retry` before being classified.
pub async fn fetch_page(client: &Client, url: &Url, retry: RetryPolicy) -> FetchResult {
    let response = match send_with_retry(client.get(url.clone()), retry).await {
        Ok(response) => response,
        Err(e) => return classify_network_error(&e),
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html(&content_type) {
        return FetchResult::ContentMismatch {
            final_url,
            content_type,
        };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
        },
        Err(e) => classify_network_error(&e),
    }
}

/// Returns true for HTML and XHTML content types
pub fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}

fn classify_network_error(e: &reqwest::Error) -> FetchResult {
    let error = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else if e.is_redirect() {
        format!("Too many redirects: {}", e)
    } else {
        e.to_string()
    };
    FetchResult::NetworkError { error }
}
