//! Per-origin request spacing
//!
//! Each origin gets its own async lock around a [`DomainState`]. Callers
//! for the same origin queue on that lock and leave at least `delay` apart;
//! callers for different origins never touch each other's lock.

use crate::config::Config;
use crate::state::DomainState;
use crate::url::{origin_host, DomainPattern};
use crate::ConfigError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, trace};

/// Enforces a minimum delay between requests to the same origin
#[derive(Debug)]
pub struct RateLimiter {
    default_delay: Duration,
    overrides: Vec<(DomainPattern, Duration)>,
    domains: Mutex<HashMap<String, Arc<AsyncMutex<DomainState>>>>,
}

impl RateLimiter {
    /// Creates a limiter applying `default_delay` to every origin
    pub fn new(default_delay: Duration) -> Self {
        Self {
            default_delay,
            overrides: Vec::new(),
            domains: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a limiter from the `[crawler] delay` and `[[domain-delay]]` settings
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let mut limiter = Self::new(config.crawler.delay_duration());
        for entry in &config.domain_delay {
            let pattern = DomainPattern::parse(&entry.domain)?;
            let delay = Duration::try_from_secs_f64(entry.delay).map_err(|_| {
                ConfigError::Validation(format!(
                    "Invalid delay {} for '{}'",
                    entry.delay, entry.domain
                ))
            })?;
            limiter = limiter.with_override(pattern, delay);
        }
        Ok(limiter)
    }

    /// Adds a delay for hosts matching `pattern`; the first matching override wins
    pub fn with_override(mut self, pattern: DomainPattern, delay: Duration) -> Self {
        self.overrides.push((pattern, delay));
        self
    }

    pub fn default_delay(&self) -> Duration {
        self.default_delay
    }

    /// Waits until a request to `origin` is allowed, then records it
    ///
    /// The timestamp is recorded immediately before returning, while the
    /// origin's lock is still held. Returns the time spent sleeping.
    pub async fn wait_if_needed(&self, origin: &str) -> Duration {
        let slot = self.slot(origin);
        let mut state = slot.lock().await;

        let waited = match state.time_until_next_request(Instant::now()) {
            Some(wait) => {
                trace!(origin = %origin, wait_ms = wait.as_millis() as u64, "Rate limiting");
                tokio::time::sleep(wait).await;
                wait
            }
            None => Duration::ZERO,
        };

        state.record_request(Instant::now());
        waited
    }

    /// Overrides the delay of one origin
    pub async fn set_delay(&self, origin: &str, delay: Duration) {
        let slot = self.slot(origin);
        slot.lock().await.set_delay(delay);
    }

    /// Raises the delay of one origin (e.g. to honor `Crawl-delay`), never lowering it
    pub async fn raise_delay(&self, origin: &str, delay: Duration) {
        let slot = self.slot(origin);
        let mut state = slot.lock().await;
        if delay > state.delay {
            debug!(origin = %origin, delay_ms = delay.as_millis() as u64, "Raising delay");
            state.raise_delay(delay);
        }
    }

    /// Returns the delay currently applied to `origin`
    pub async fn delay_for(&self, origin: &str) -> Duration {
        let slot = self.slot(origin);
        let delay = slot.lock().await.delay;
        delay
    }

    /// Number of requests recorded for `origin`
    pub async fn request_count(&self, origin: &str) -> u32 {
        let slot = self.slot(origin);
        let count = slot.lock().await.request_count;
        count
    }

    fn initial_delay(&self, origin: &str) -> Duration {
        let host = origin_host(origin);
        self.overrides
            .iter()
            .find(|(pattern, _)| pattern.matches(host))
            .map(|(_, delay)| *delay)
            .unwrap_or(self.default_delay)
    }

    fn slot(&self, origin: &str) -> Arc<AsyncMutex<DomainState>> {
        let mut domains = self.domains.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = domains.get(origin) {
            return slot.clone();
        }
        let slot = Arc::new(AsyncMutex::new(DomainState::new(self.initial_delay(origin))));
        domains.insert(origin.to_string(), slot.clone());
        slot
    }
}
