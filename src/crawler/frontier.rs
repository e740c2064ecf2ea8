//! Depth-bounded breadth-first traversal
//!
//! The frontier owns the FIFO queue, the visited set and the ordered result
//! list for one crawl. Each round takes up to `concurrency` tasks with
//! distinct origins off the front of the queue, fetches them in parallel and
//! folds the results back in pop order, so output does not depend on which
//! fetch finishes first.

use crate::config::CrawlerConfig;
use crate::crawler::extractor::LinkSource;
use crate::crawler::rate_limiter::RateLimiter;
use crate::robots::RobotsCache;
use crate::run::{CrawlResult, ProgressCallback};
use crate::state::VisitedSet;
use crate::url::{normalize_url, Fingerprint, NormalizedUrl, Scope};
use crate::CrawlError;
use futures::future::join_all;
use std::collections::{HashSet, VecDeque};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// A URL waiting in the frontier together with its link distance from the start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub url: NormalizedUrl,
    pub depth: u32,
}

/// Why a crawl loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Exhausted,
    Ceiling,
    Cancelled,
}

/// Mutable state of one crawl call
struct CrawlState {
    queue: VecDeque<CrawlTask>,
    queued: HashSet<Fingerprint>,
    visited: VisitedSet,
    urls: Vec<String>,
    errors: Vec<String>,
}

impl CrawlState {
    fn new(start: NormalizedUrl, max_tracked: usize) -> Self {
        let mut queued = HashSet::new();
        queued.insert(start.fingerprint());
        Self {
            queue: VecDeque::from([CrawlTask {
                url: start,
                depth: 0,
            }]),
            queued,
            visited: VisitedSet::new(max_tracked),
            urls: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn pop(&mut self) -> Option<CrawlTask> {
        let task = self.queue.pop_front()?;
        self.queued.remove(&task.url.fingerprint());
        Some(task)
    }

    fn push_front(&mut self, task: CrawlTask) {
        self.queued.insert(task.url.fingerprint());
        self.queue.push_front(task);
    }
}

/// Breadth-first crawler over a [`LinkSource`]
///
/// Robots rules and per-origin delays come from the shared [`RobotsCache`]
/// and [`RateLimiter`], which outlive a single crawl.
pub struct Frontier<'a, S: LinkSource> {
    config: CrawlerConfig,
    scope: Scope,
    filter: Option<String>,
    robots: &'a RobotsCache,
    limiter: &'a RateLimiter,
    source: &'a S,
    progress: Option<ProgressCallback>,
    cancel: CancellationToken,
}

impl<'a, S: LinkSource> Frontier<'a, S> {
    pub fn new(
        config: CrawlerConfig,
        robots: &'a RobotsCache,
        limiter: &'a RateLimiter,
        source: &'a S,
    ) -> Self {
        Self {
            config,
            scope: Scope::unrestricted(),
            filter: None,
            robots,
            limiter,
            source,
            progress: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Only links whose canonical form starts with `prefix` are followed
    pub fn with_filter(mut self, prefix: Option<String>) -> Self {
        self.filter = prefix.filter(|p| !p.is_empty());
        self
    }

    pub fn with_progress(mut self, progress: Option<ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Crawls from `start` and returns the visited URLs in visit order
    ///
    /// Never returns an error: an invalid start URL, or a start page that
    /// could not be fetched, becomes a failed [`CrawlResult`]. Cancellation
    /// returns what was collected so far as a successful partial result.
    pub async fn crawl(&self, start: &str) -> CrawlResult {
        let start_url = match normalize_url(start, None) {
            Ok(url) => url,
            Err(e) => {
                let error = CrawlError::InvalidUrl {
                    url: start.to_string(),
                    source: e,
                };
                return CrawlResult::failure(format!("Invalid start URL: {}", start), error);
            }
        };

        info!(
            start = %start_url,
            max_depth = self.config.max_depth,
            max_urls = self.config.max_urls,
            "Starting crawl"
        );

        let mut state = CrawlState::new(start_url.clone(), self.config.max_tracked_urls);
        let stop = self.run(&mut state).await;

        let count = state.urls.len();
        info!(urls = count, errors = state.errors.len(), ?stop, "Crawl finished");

        match stop {
            Stop::Cancelled => CrawlResult::success(
                state.urls,
                format!("Crawl cancelled after collecting {} URLs", count),
            )
            .with_errors(state.errors),
            _ if count == 0 && !state.errors.is_empty() => CrawlResult {
                success: false,
                urls: Vec::new(),
                count: 0,
                message: format!("No pages could be fetched from {}", start_url),
                errors: state.errors,
            },
            Stop::Ceiling => CrawlResult::success(
                state.urls,
                format!("Reached the limit of {} URLs", self.config.max_urls),
            )
            .with_errors(state.errors),
            Stop::Exhausted => {
                CrawlResult::success(state.urls, format!("Successfully crawled {} URLs", count))
                    .with_errors(state.errors)
            }
        }
    }

    async fn run(&self, state: &mut CrawlState) -> Stop {
        loop {
            if self.cancel.is_cancelled() {
                return Stop::Cancelled;
            }

            let remaining = self.config.max_urls.saturating_sub(state.urls.len());
            if remaining == 0 {
                return Stop::Ceiling;
            }

            let slots = self.config.concurrency.max(1).min(remaining);
            let batch = tokio::select! {
                _ = self.cancel.cancelled() => return Stop::Cancelled,
                batch = self.next_batch(state, slots) => batch,
            };

            if batch.is_empty() {
                return Stop::Exhausted;
            }

            let fetches = batch.iter().map(|task| self.visit(task));
            let results = tokio::select! {
                _ = self.cancel.cancelled() => return Stop::Cancelled,
                results = join_all(fetches) => results,
            };

            for (task, result) in batch.into_iter().zip(results) {
                self.record(state, task, result);
            }
        }
    }

    /// Pops the next runnable tasks, at most one per origin
    ///
    /// Stale tasks (already visited, too deep, disallowed by robots.txt) are
    /// dropped on the way. The first task whose origin is already in the
    /// batch goes back to the front of the queue and ends the batch.
    async fn next_batch(&self, state: &mut CrawlState, slots: usize) -> Vec<CrawlTask> {
        let mut batch: Vec<CrawlTask> = Vec::with_capacity(slots);
        let mut origins: HashSet<String> = HashSet::new();

        while batch.len() < slots {
            let Some(task) = state.pop() else {
                break;
            };

            let fingerprint = task.url.fingerprint();
            if state.visited.seen(&fingerprint) {
                debug!(url = %task.url, "Already visited");
                continue;
            }
            if task.depth > self.config.max_depth {
                debug!(url = %task.url, depth = task.depth, "Beyond max depth");
                continue;
            }

            let origin = task.url.origin();
            if origins.contains(&origin) {
                state.push_front(task);
                break;
            }

            if !self.robots.can_fetch(&task.url).await {
                state.visited.mark(fingerprint);
                self.report(
                    &format!("Disallowed by robots.txt: {}", shorten(task.url.as_str(), 50)),
                    state.urls.len(),
                );
                continue;
            }

            state.visited.mark(fingerprint);
            origins.insert(origin);
            batch.push(task);
        }

        batch
    }

    async fn visit(&self, task: &CrawlTask) -> Result<Vec<NormalizedUrl>, CrawlError> {
        let origin = task.url.origin();

        if self.config.respect_crawl_delay {
            if let Some(delay) = self.robots.crawl_delay(&origin).await {
                self.limiter.raise_delay(&origin, delay).await;
            }
        }

        self.limiter.wait_if_needed(&origin).await;
        debug!(url = %task.url, depth = task.depth, "Fetching");
        self.source.extract(&task.url).await
    }

    fn record(
        &self,
        state: &mut CrawlState,
        task: CrawlTask,
        result: Result<Vec<NormalizedUrl>, CrawlError>,
    ) {
        let links = match result {
            Ok(links) => links,
            Err(e) => {
                warn!(url = %task.url, error = %e, "Skipping page");
                state.errors.push(e.to_string());
                self.report(
                    &format!("Skipped: {}", shorten(task.url.as_str(), 50)),
                    state.urls.len(),
                );
                return;
            }
        };

        state.urls.push(task.url.to_string());
        self.report(
            &format!("Crawling: {}", shorten(task.url.as_str(), 50)),
            state.urls.len(),
        );

        if task.depth + 1 > self.config.max_depth {
            return;
        }

        let mut added = 0;
        for link in links {
            if added >= self.config.max_links_per_page {
                break;
            }
            if !self.should_enqueue(state, &link) {
                continue;
            }
            state.queued.insert(link.fingerprint());
            state.queue.push_back(CrawlTask {
                url: link,
                depth: task.depth + 1,
            });
            added += 1;
        }

        debug!(url = %task.url, added, queue = state.queue.len(), "Enqueued links");
    }

    fn report(&self, message: &str, found: usize) {
        if let Some(progress) = &self.progress {
            progress(message, found);
        }
    }

    fn should_enqueue(&self, state: &CrawlState, link: &NormalizedUrl) -> bool {
        let fingerprint = link.fingerprint();
        if state.visited.seen(&fingerprint) || state.queued.contains(&fingerprint) {
            return false;
        }

        if !self.scope.classify(link.host()).should_crawl() {
            return false;
        }

        match &self.filter {
            Some(prefix) => link.starts_with(prefix),
            None => true,
        }
    }
}

/// Shortens a URL for display, keeping it under `max_len` characters
fn shorten(url: &str, max_len: usize) -> String {
    if url.chars().count() <= max_len {
        return url.to_string();
    }
    let kept: String = url.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
}
