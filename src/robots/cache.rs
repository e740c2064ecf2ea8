//! Per-run robots.txt cache
//!
//! One fetch per origin, even when many tasks ask at once. Entries live for
//! the whole run and are never refreshed.

use crate::robots::{fetch_robots, ParsedRobots};
use crate::url::NormalizedUrl;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// Upper bound on a robots.txt fetch
pub const MAX_ROBOTS_TIMEOUT: Duration = Duration::from_secs(10);

type Slot = Arc<OnceCell<Arc<ParsedRobots>>>;

/// Fetches and caches robots.txt policies by origin
#[derive(Debug)]
pub struct RobotsCache {
    client: Client,
    user_agent: String,
    timeout: Duration,
    entries: Mutex<HashMap<String, Slot>>,
}

impl RobotsCache {
    /// Creates an empty cache
    ///
    /// `user_agent` is the product token matched against `User-agent`
    /// lines. `timeout` is clamped to [`MAX_ROBOTS_TIMEOUT`].
    pub fn new(client: Client, user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
            timeout: timeout.min(MAX_ROBOTS_TIMEOUT),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Returns the policy for `origin`, fetching it on first use
    ///
    /// Never fails: an unreachable or unusable robots.txt yields the
    /// allow-all policy.
    pub async fn policy(&self, origin: &str) -> Arc<ParsedRobots> {
        let slot = self.slot(origin);
        slot.get_or_init(|| async {
            let robots = match fetch_robots(&self.client, origin, self.timeout).await {
                Ok(robots) => robots,
                Err(e) => {
                    warn!(origin = %origin, error = %e, "robots.txt unavailable, allowing all");
                    ParsedRobots::allow_all()
                }
            };
            Arc::new(robots)
        })
        .await
        .clone()
    }

    /// Checks if `url` may be fetched under its origin's robots.txt
    pub async fn can_fetch(&self, url: &NormalizedUrl) -> bool {
        let policy = self.policy(&url.origin()).await;
        let allowed = policy.is_allowed(url.as_str(), &self.user_agent);
        if !allowed {
            debug!(url = %url, "Disallowed by robots.txt");
        }
        allowed
    }

    /// Returns the `Crawl-delay` that applies to this crawler on `origin`
    pub async fn crawl_delay(&self, origin: &str) -> Option<Duration> {
        let policy = self.policy(origin).await;
        policy
            .crawl_delay(&self.user_agent)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    /// Seeds the cache for `origin` without a network fetch
    ///
    /// Has no effect if the origin is already resolved.
    pub fn insert(&self, origin: &str, robots: ParsedRobots) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .entry(origin.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new_with(Some(Arc::new(robots)))));
    }

    /// Number of origins resolved or being resolved
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, origin: &str) -> Slot {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries
            .entry(origin.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::normalize_url;

    fn cache() -> RobotsCache {
        RobotsCache::new(Client::new(), "TestBot", Duration::from_secs(30))
    }

    #[test]
    fn test_timeout_clamped() {
        let cache = cache();
        assert_eq!(cache.timeout, MAX_ROBOTS_TIMEOUT);
    }

    #[tokio::test]
    async fn test_seeded_policy_is_used() {
        let cache = cache();
        cache.insert(
            "https://example.com",
            ParsedRobots::from_content("User-agent: *\nDisallow: /private/\nCrawl-delay: 2"),
        );

        let public = normalize_url("https://example.com/public", None).unwrap();
        let private = normalize_url("https://example.com/private/secret", None).unwrap();

        assert!(cache.can_fetch(&public).await);
        assert!(!cache.can_fetch(&private).await);
        assert_eq!(
            cache.crawl_delay("https://example.com").await,
            Some(Duration::from_secs(2))
        );
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_origin_fails_open() {
        let cache = RobotsCache::new(Client::new(), "TestBot", Duration::from_millis(500));
        // Port 9 (discard) on localhost is expected to refuse connections
        let url = normalize_url("http://127.0.0.1:9/page", None).unwrap();
        assert!(cache.can_fetch(&url).await);
        assert!(cache.policy("http://127.0.0.1:9").await.is_allow_all());
    }

    #[test]
    fn test_insert_does_not_overwrite() {
        let cache = cache();
        cache.insert("https://example.com", ParsedRobots::allow_all());
        cache.insert(
            "https://example.com",
            ParsedRobots::from_content("User-agent: *\nDisallow: /"),
        );
        let slot = cache.slot("https://example.com");
        assert!(slot.get().map(|p| p.is_allow_all()).unwrap_or(false));
    }
}
