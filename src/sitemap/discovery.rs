use crate::robots::RobotsCache;
use crate::sitemap::SitemapFetcher;
use tracing::{debug, info};
use url::Url;

/// Paths probed when robots.txt lists no sitemap, in order
pub const COMMON_SITEMAP_PATHS: [&str; 4] = [
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemaps/sitemap.xml",
    "/xml-sitemaps/sitemap.xml",
];

/// Finds the sitemaps a site advertises
pub struct SitemapDiscovery<'a> {
    robots: &'a RobotsCache,
    fetcher: &'a SitemapFetcher,
}

impl<'a> SitemapDiscovery<'a> {
    pub fn new(robots: &'a RobotsCache, fetcher: &'a SitemapFetcher) -> Self {
        Self { robots, fetcher }
    }

    /// Returns the sitemap URLs for the site of `base`
    ///
    /// Every `Sitemap:` line of the origin's robots.txt is returned when
    /// there is at least one. Otherwise the common locations are probed and
    /// the first one that answers 2xx is returned. An empty list means no
    /// sitemap was found.
    pub async fn discover(&self, base: &Url) -> Vec<String> {
        let origin = base.origin().ascii_serialization();
        let policy = self.robots.policy(&origin).await;

        let listed: Vec<String> = policy
            .sitemaps()
            .into_iter()
            .map(|raw| match base.join(&raw) {
                Ok(url) => url.to_string(),
                Err(_) => raw,
            })
            .collect();

        if !listed.is_empty() {
            info!(origin = %origin, count = listed.len(), "Sitemaps listed in robots.txt");
            return listed;
        }

        for path in COMMON_SITEMAP_PATHS {
            let Ok(candidate) = base.join(path) else {
                continue;
            };
            if self.fetcher.exists(&candidate).await {
                info!(url = %candidate, "Found sitemap at common location");
                return vec![candidate.to_string()];
            }
        }

        debug!(origin = %origin, "No sitemap found");
        Vec::new()
    }
}
