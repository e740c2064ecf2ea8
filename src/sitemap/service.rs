//! Sitemap processing
//!
//! Turns one or more sitemap locations into a [`SitemapResult`]. Each
//! location is sampled first to tell an index from a leaf sitemap; an index
//! is expanded one level, and every child that fails is recorded while its
//! siblings carry on.
//!
//! Documents are parsed on a blocking thread and their entries handed over
//! through a bounded channel, so reading stops as soon as the URL ceiling
//! is reached.

use crate::config::Config;
use crate::robots::RobotsCache;
use crate::run::{CrawlResult, ProgressCallback, SitemapResult};
use crate::sitemap::stream::{
    extract_loc_spans, sniff_kind, SitemapItem, SitemapKind, SitemapRef, SitemapStream,
};
use crate::sitemap::{SitemapDiscovery, SitemapFetcher};
use crate::state::VisitedSet;
use crate::url::{normalize_url, Fingerprint};
use crate::CrawlError;
use std::collections::HashSet;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Parsed items queued between the parsing thread and the collector
const ITEM_BUFFER: usize = 256;

/// Why collection stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Done,
    Ceiling,
    Cancelled,
}

/// What a single document turned out to contain
#[derive(Debug)]
enum Loaded {
    /// A urlset; its entries are already collected
    Leaf,
    Index(Vec<SitemapRef>),
    /// An index found below another index; not downloaded
    NestedIndex,
}

/// URLs gathered across documents, deduplicated and capped
struct Collector {
    urls: Vec<String>,
    seen: VisitedSet,
    errors: Vec<String>,
    documents: usize,
    leaves: usize,
    max_urls: usize,
}

impl Collector {
    fn new(max_urls: usize, max_tracked: usize) -> Self {
        Self {
            urls: Vec::new(),
            seen: VisitedSet::new(max_tracked),
            errors: Vec::new(),
            documents: 0,
            leaves: 0,
            max_urls,
        }
    }

    fn is_full(&self) -> bool {
        self.urls.len() >= self.max_urls
    }

    /// Adds `loc` if it passes `filter` and is new; ignored once full
    fn push(&mut self, loc: &str, filter: Option<&str>) {
        if self.is_full() {
            return;
        }
        let loc = loc.trim();
        if loc.is_empty() {
            return;
        }
        if let Some(prefix) = filter {
            if !loc.starts_with(prefix) {
                return;
            }
        }
        if self.seen.check_and_mark(fingerprint(loc)) {
            self.urls.push(loc.to_string());
        }
    }

    /// Drops every URL collected after `mark` and forgets its fingerprint
    fn rollback(&mut self, mark: usize) {
        if mark >= self.urls.len() {
            return;
        }
        let dropped: HashSet<Fingerprint> =
            self.urls.drain(mark..).map(|url| fingerprint(&url)).collect();
        self.seen.forget_all(&dropped);
    }

    fn fail(&mut self, error: impl ToString) {
        self.errors.push(error.to_string());
    }
}

fn fingerprint(loc: &str) -> Fingerprint {
    match normalize_url(loc, None) {
        Ok(url) => url.fingerprint(),
        Err(_) => Fingerprint::of(loc),
    }
}

/// Extracts page URLs from sitemaps
pub struct SitemapService<'a> {
    fetcher: &'a SitemapFetcher,
    robots: &'a RobotsCache,
    sample_bytes: usize,
    lenient: bool,
    max_urls: usize,
    max_tracked: usize,
    progress: Option<ProgressCallback>,
    cancel: CancellationToken,
}

impl<'a> SitemapService<'a> {
    /// `robots` is only consulted by [`Self::process_base_url`]
    pub fn new(fetcher: &'a SitemapFetcher, robots: &'a RobotsCache, config: &Config) -> Self {
        Self {
            fetcher,
            robots,
            sample_bytes: config.sitemap.sample_bytes,
            lenient: config.sitemap.lenient,
            max_urls: config.crawler.max_urls,
            max_tracked: config.crawler.max_tracked_urls,
            progress: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_progress(mut self, progress: Option<ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Extracts URLs from one sitemap or sitemap index
    pub async fn process_sitemap_url(&self, location: &str, filter: Option<&str>) -> SitemapResult {
        self.process_discovered(&[location.to_string()], filter).await
    }

    /// Discovers the sitemaps of the site of `base` and processes them
    ///
    /// Fails with "No sitemaps found for this domain" when robots.txt lists
    /// none and no common location exists.
    pub async fn process_base_url(&self, base: &str, filter: Option<&str>) -> SitemapResult {
        let base_url = match normalize_url(base, None) {
            Ok(url) => url,
            Err(e) => {
                let error = CrawlError::InvalidUrl {
                    url: base.to_string(),
                    source: e,
                };
                return CrawlResult::failure(format!("Invalid URL: {}", base), error);
            }
        };

        self.report("Discovering sitemaps...", 0);
        let discovery = SitemapDiscovery::new(self.robots, self.fetcher);
        let sitemaps = tokio::select! {
            _ = self.cancel.cancelled() => {
                return CrawlResult::success(Vec::new(), "Sitemap discovery cancelled");
            }
            sitemaps = discovery.discover(base_url.as_url()) => sitemaps,
        };

        if sitemaps.is_empty() {
            return CrawlResult::failure(
                "No sitemaps found for this domain",
                format!(
                    "No sitemap listed in robots.txt or found at common locations for {}",
                    base_url.origin()
                ),
            );
        }

        self.process_discovered(&sitemaps, filter).await
    }

    /// Processes already-known sitemap locations in order
    pub async fn process_discovered(&self, locations: &[String], filter: Option<&str>) -> SitemapResult {
        let filter = filter.filter(|f| !f.is_empty());
        let mut collector = Collector::new(self.max_urls, self.max_tracked);

        info!(sitemaps = locations.len(), filter = ?filter, "Processing sitemaps");
        let stop = self.collect(locations, filter, &mut collector).await;
        info!(
            urls = collector.urls.len(),
            sitemaps = collector.leaves,
            errors = collector.errors.len(),
            ?stop,
            "Sitemap processing finished"
        );

        let count = collector.urls.len();
        match stop {
            Stop::Cancelled => CrawlResult::success(
                collector.urls,
                format!("Sitemap processing cancelled after collecting {} URLs", count),
            )
            .with_errors(collector.errors),
            _ if collector.documents == 0 => {
                let message = match locations {
                    [only] => format!("Failed to process sitemap {}", only),
                    _ => "None of the sitemaps could be processed".to_string(),
                };
                CrawlResult {
                    success: false,
                    urls: Vec::new(),
                    count: 0,
                    message,
                    errors: collector.errors,
                }
            }
            Stop::Ceiling => CrawlResult::success(
                collector.urls,
                format!("Reached the limit of {} URLs", self.max_urls),
            )
            .with_errors(collector.errors),
            Stop::Done if collector.leaves == 1 => {
                CrawlResult::success(collector.urls, format!("Extracted {} URLs from sitemap", count))
                    .with_errors(collector.errors)
            }
            Stop::Done => CrawlResult::success(
                collector.urls,
                format!(
                    "Successfully extracted {} URLs from {} sitemaps",
                    count, collector.leaves
                ),
            )
            .with_errors(collector.errors),
        }
    }

    async fn collect(
        &self,
        locations: &[String],
        filter: Option<&str>,
        collector: &mut Collector,
    ) -> Stop {
        let total = locations.len();
        for (i, location) in locations.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Stop::Cancelled;
            }
            if collector.is_full() {
                return Stop::Ceiling;
            }
            self.report(&format!("Processing sitemap {}/{}", i + 1, total), collector.urls.len());

            let loaded = tokio::select! {
                _ = self.cancel.cancelled() => return Stop::Cancelled,
                loaded = self.load(location, false, filter, collector) => loaded,
            };

            match loaded {
                Ok(Loaded::Leaf) => {
                    collector.documents += 1;
                    collector.leaves += 1;
                }
                Ok(Loaded::Index(children)) => {
                    collector.documents += 1;
                    let stop = self.expand_index(location, children, filter, collector).await;
                    if stop != Stop::Done {
                        return stop;
                    }
                }
                Ok(Loaded::NestedIndex) => {}
                Err(e) => {
                    warn!(sitemap = %location, error = %e, "Sitemap failed");
                    collector.fail(e);
                }
            }
        }

        if collector.is_full() {
            Stop::Ceiling
        } else {
            Stop::Done
        }
    }

    async fn expand_index(
        &self,
        index: &str,
        children: Vec<SitemapRef>,
        filter: Option<&str>,
        collector: &mut Collector,
    ) -> Stop {
        let total = children.len();
        info!(index = %index, children = total, "Expanding sitemap index");

        for (i, child) in children.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return Stop::Cancelled;
            }
            if collector.is_full() {
                return Stop::Ceiling;
            }
            self.report(
                &format!("Processing sitemap {}/{} from index", i + 1, total),
                collector.urls.len(),
            );

            let loaded = tokio::select! {
                _ = self.cancel.cancelled() => return Stop::Cancelled,
                loaded = self.load(&child.loc, true, filter, collector) => loaded,
            };

            match loaded {
                Ok(Loaded::Leaf) => {
                    collector.documents += 1;
                    collector.leaves += 1;
                }
                Ok(Loaded::Index(_)) | Ok(Loaded::NestedIndex) => {
                    warn!(sitemap = %child.loc, "Nested sitemap index not expanded");
                    collector.fail(format!("Nested sitemap index not expanded: {}", child.loc));
                }
                Err(e) => {
                    warn!(sitemap = %child.loc, error = %e, "Child sitemap failed");
                    collector.fail(e);
                }
            }
        }

        Stop::Done
    }

    /// Streams one document into `collector`
    ///
    /// With `nested` set, a document sampled as an index is not downloaded.
    /// A document that fails to parse contributes nothing: whatever it
    /// added before the error is rolled back.
    async fn load(
        &self,
        location: &str,
        nested: bool,
        filter: Option<&str>,
        collector: &mut Collector,
    ) -> Result<Loaded, CrawlError> {
        let sample = self.fetcher.sample(location, self.sample_bytes).await?;
        let sampled_kind = sniff_kind(&sample);
        debug!(sitemap = %location, kind = ?sampled_kind, "Sampled sitemap");

        if nested && sampled_kind == Some(SitemapKind::Index) {
            return Ok(Loaded::NestedIndex);
        }

        let reader = self.fetcher.open(location).await?;
        let (tx, mut rx) = mpsc::channel(ITEM_BUFFER);
        let url = location.to_string();
        let parser = tokio::task::spawn_blocking(move || -> Result<Option<SitemapKind>, CrawlError> {
            let input = reader
                .into_buf_read()
                .map_err(|e| CrawlError::fetch_failed(url.as_str(), e))?;
            let mut stream = SitemapStream::new(input);
            for item in stream.by_ref() {
                let item = item.map_err(|source| CrawlError::MalformedSitemap {
                    url: url.clone(),
                    source,
                })?;
                // The collector hung up: ceiling reached or run cancelled
                if tx.blocking_send(item).is_err() {
                    break;
                }
            }
            Ok(stream.kind())
        });

        let mark = collector.urls.len();
        let mut entries = 0usize;
        let mut children = Vec::new();
        while let Some(item) = rx.recv().await {
            match item {
                SitemapItem::Url(entry) => {
                    entries += 1;
                    collector.push(&entry.loc, filter);
                    if collector.is_full() {
                        break;
                    }
                }
                SitemapItem::Sitemap(child) => children.push(child),
            }
        }
        drop(rx);

        match parser.await? {
            Ok(Some(SitemapKind::Index)) => Ok(Loaded::Index(children)),
            Ok(_) => {
                debug!(sitemap = %location, entries, "Parsed sitemap");
                Ok(Loaded::Leaf)
            }
            Err(CrawlError::MalformedSitemap { url, source }) => {
                collector.rollback(mark);
                if self.lenient {
                    let locs = extract_loc_spans(&self.fetcher.fetch_text(location).await?);
                    if !locs.is_empty() {
                        warn!(
                            sitemap = %location,
                            error = %source,
                            recovered = locs.len(),
                            "Malformed sitemap, recovered <loc> values"
                        );
                        for loc in &locs {
                            collector.push(loc, filter);
                        }
                        return Ok(Loaded::Leaf);
                    }
                }
                Err(CrawlError::MalformedSitemap { url, source })
            }
            Err(e) => {
                collector.rollback(mark);
                Err(e)
            }
        }
    }

    fn report(&self, message: &str, found: usize) {
        if let Some(progress) = &self.progress {
            progress(message, found);
        }
    }
}
