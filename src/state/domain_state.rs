use std::time::{Duration, Instant};

/// Tracks the request timing of one origin during a crawl
///
/// Owned by the rate limiter and created on the first request to the
/// origin.
#[derive(Debug, Clone)]
pub struct DomainState {
    /// Minimum spacing between two requests to this origin
    pub delay: Duration,

    /// Timestamp of the last request to this origin
    pub last_request_time: Option<Instant>,

    /// Number of requests made to this origin in the current run
    pub request_count: u32,
}

impl DomainState {
    /// Creates a new DomainState with the given delay
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_request_time: None,
            request_count: 0,
        }
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let elapsed = now.saturating_duration_since(last);
        if elapsed < self.delay {
            Some(self.delay - elapsed)
        } else {
            None
        }
    }

    /// Records that a request was made to this origin
    pub fn record_request(&mut self, now: Instant) {
        self.request_count = self.request_count.saturating_add(1);
        self.last_request_time = Some(now);
    }

    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Raises the delay to at least `delay`; never lowers it
    pub fn raise_delay(&mut self, delay: Duration) {
        if delay > self.delay {
            self.delay = delay;
        }
    }
}
