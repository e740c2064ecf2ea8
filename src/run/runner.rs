use crate::config::{validate, Config};
use crate::crawler::{build_http_client, Frontier, LinkExtractor, RateLimiter, RetryPolicy};
use crate::robots::RobotsCache;
use crate::run::{CrawlResult, Mode, ProgressCallback, RunOptions};
use crate::sitemap::{is_sitemap_location, SitemapDiscovery, SitemapFetcher, SitemapService};
use crate::url::{normalize_url, Scope};
use crate::CrawlError;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Collaborators shared by every strategy of one run
struct RunContext {
    config: Config,
    client: Client,
    robots: RobotsCache,
    sitemaps: SitemapFetcher,
}

impl RunContext {
    fn new(config: Config) -> Result<Self, CrawlError> {
        let client = build_http_client(&config.user_agent, config.crawler.request_timeout_duration())?;
        let robots = RobotsCache::new(
            client.clone(),
            config.user_agent.crawler_name.clone(),
            config.crawler.robots_timeout_duration(),
        );
        let sitemaps = SitemapFetcher::new(client.clone(), config.sitemap.request_timeout_duration())
            .with_retry(RetryPolicy::from_config(&config.crawler));
        Ok(Self {
            config,
            client,
            robots,
            sitemaps,
        })
    }
}

/// Runs URL discovery for one start location
///
/// Each call to [`Runner::execute`] builds its own HTTP client, robots
/// cache and rate limiter; nothing is shared between runs.
pub struct Runner {
    config: Config,
    progress: Option<ProgressCallback>,
    cancel: CancellationToken,
}

impl Runner {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            progress: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Token that stops the run and keeps the partial result
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs discovery and returns the outcome
    ///
    /// Mode selection:
    /// - `Sitemap`: a `.xml`/`.xml.gz` location is processed directly,
    ///   anything else is treated as a site whose sitemaps are discovered
    /// - `Crawl`: breadth-first crawl from the URL
    /// - `Auto`: a `.xml`/`.xml.gz` location is processed as a sitemap;
    ///   otherwise the site's sitemaps are used when discovery finds any,
    ///   and the site is crawled when it finds none or they yield nothing
    pub async fn execute(&self, options: &RunOptions) -> CrawlResult {
        let mut config = self.config.clone();
        options.apply_to(&mut config);
        if let Err(e) = options.validate().and_then(|_| validate(&config)) {
            return CrawlResult::failure("Invalid options", e);
        }

        let context = match RunContext::new(config) {
            Ok(context) => context,
            Err(e) => return CrawlResult::failure("Failed to build HTTP client", e),
        };

        let location = options.url.trim();
        info!(url = %location, mode = %options.mode, "Starting run");

        match options.mode {
            Mode::Crawl => self.crawl(&context, location, options).await,
            Mode::Sitemap => self.sitemap(&context, location, options).await,
            Mode::Auto => self.auto(&context, location, options).await,
        }
    }

    async fn sitemap(&self, context: &RunContext, location: &str, options: &RunOptions) -> CrawlResult {
        let service = self.sitemap_service(context);
        if is_sitemap_location(location) {
            service
                .process_sitemap_url(location, options.filter_prefix())
                .await
        } else {
            service
                .process_base_url(location, options.filter_prefix())
                .await
        }
    }

    async fn auto(&self, context: &RunContext, location: &str, options: &RunOptions) -> CrawlResult {
        if is_sitemap_location(location) {
            info!(url = %location, "Location looks like a sitemap");
            return self
                .sitemap_service(context)
                .process_sitemap_url(location, options.filter_prefix())
                .await;
        }

        let base = match normalize_url(location, None) {
            Ok(url) => url,
            Err(e) => {
                let error = CrawlError::InvalidUrl {
                    url: location.to_string(),
                    source: e,
                };
                return CrawlResult::failure(format!("Invalid URL: {}", location), error);
            }
        };

        self.report("Discovering sitemaps...", 0);
        let discovery = SitemapDiscovery::new(&context.robots, &context.sitemaps);
        let found = tokio::select! {
            _ = self.cancel.cancelled() => {
                return CrawlResult::success(Vec::new(), "Run cancelled during sitemap discovery");
            }
            found = discovery.discover(base.as_url()) => found,
        };

        if found.is_empty() {
            info!(url = %base, "No sitemap found, crawling");
            return self.crawl(context, location, options).await;
        }

        let result = self
            .sitemap_service(context)
            .process_discovered(&found, options.filter_prefix())
            .await;
        if result.success && (result.count > 0 || self.cancel.is_cancelled()) {
            return result;
        }

        warn!(
            url = %base,
            message = %result.message,
            "Sitemaps yielded no URLs, falling back to crawling"
        );
        self.crawl(context, location, options)
            .await
            .with_errors(result.errors)
    }

    async fn crawl(&self, context: &RunContext, location: &str, options: &RunOptions) -> CrawlResult {
        let config = &context.config;
        let limiter = match RateLimiter::from_config(config) {
            Ok(limiter) => limiter,
            Err(e) => return CrawlResult::failure("Invalid options", e),
        };
        let scope = match Scope::from_config(&config.scope) {
            Ok(scope) => scope,
            Err(e) => return CrawlResult::failure("Invalid options", e),
        };
        let extractor = LinkExtractor::new(context.client.clone())
            .with_retry(RetryPolicy::from_config(&config.crawler));

        Frontier::new(config.crawler.clone(), &context.robots, &limiter, &extractor)
            .with_scope(scope)
            .with_filter(options.filter_prefix().map(str::to_string))
            .with_progress(self.progress.clone())
            .with_cancel(self.cancel.clone())
            .crawl(location)
            .await
    }

    fn sitemap_service<'a>(&self, context: &'a RunContext) -> SitemapService<'a> {
        SitemapService::new(&context.sitemaps, &context.robots, &context.config)
            .with_progress(self.progress.clone())
            .with_cancel(self.cancel.clone())
    }

    fn report(&self, message: &str, found: usize) {
        if let Some(progress) = &self.progress {
            progress(message, found);
        }
    }
}
