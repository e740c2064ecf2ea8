use crate::config::{validate_delay, validate_depth, Config};
use crate::run::Mode;
use crate::ConfigError;
use tracing::warn;
use url::Url;

/// Parameters of a single run
///
/// `None` fields fall back to the loaded [`Config`].
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Start URL, sitemap URL or local sitemap path
    pub url: String,
    pub mode: Mode,
    pub max_depth: Option<u32>,
    /// Seconds between requests to one origin
    pub delay: Option<f64>,
    /// Only URLs starting with this prefix are kept (sitemaps) or followed (crawl)
    pub filter: Option<String>,
    pub max_urls: Option<usize>,
}

impl RunOptions {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn delay(mut self, seconds: f64) -> Self {
        self.delay = Some(seconds);
        self
    }

    pub fn filter(mut self, prefix: impl Into<String>) -> Self {
        self.filter = Some(prefix.into());
        self
    }

    pub fn max_urls(mut self, max: usize) -> Self {
        self.max_urls = Some(max);
        self
    }

    /// Checks the overrides that were given
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::Validation("URL cannot be empty".to_string()));
        }
        if let Some(depth) = self.max_depth {
            validate_depth(depth)?;
        }
        if let Some(delay) = self.delay {
            validate_delay(delay, "delay")?;
        }
        if self.max_urls == Some(0) {
            return Err(ConfigError::Validation(
                "max-urls must be >= 1, got 0".to_string(),
            ));
        }
        if let Some(filter) = self.filter_prefix() {
            self.validate_filter(filter)?;
        }
        Ok(())
    }

    /// The filter must be an absolute http(s) URL
    ///
    /// In crawl mode its host must also be the start URL's host, since links
    /// to other hosts are never matched. Sitemaps may list URLs on another
    /// host than their own, so the other modes only warn.
    fn validate_filter(&self, filter: &str) -> Result<(), ConfigError> {
        let filter_host = Url::parse(filter)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .and_then(|url| host_and_port(&url))
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "Filter URL is invalid: '{}' is not an absolute http(s) URL",
                    filter
                ))
            })?;

        let base = match Url::parse(self.url.trim()).ok().and_then(|url| host_and_port(&url)) {
            Some(base) => base,
            None => return Ok(()),
        };
        if base == filter_host {
            return Ok(());
        }

        if self.mode == Mode::Crawl {
            return Err(ConfigError::Validation(format!(
                "Filter domain '{}' doesn't match crawl domain '{}'; no links would be followed. \
                 Example filter: {}/docs/",
                filter_host,
                base,
                self.url.trim().trim_end_matches('/')
            )));
        }
        warn!(filter = %filter_host, base = %base, "Filter domain differs from the start URL's domain");
        Ok(())
    }

    /// Writes the given overrides into `config`
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(depth) = self.max_depth {
            config.crawler.max_depth = depth;
        }
        if let Some(delay) = self.delay {
            config.crawler.delay = delay;
        }
        if let Some(max) = self.max_urls {
            config.crawler.max_urls = max;
        }
    }

    /// Filter prefix, with an empty string treated as none
    pub fn filter_prefix(&self) -> Option<&str> {
        self.filter.as_deref().map(str::trim).filter(|f| !f.is_empty())
    }
}

fn host_and_port(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_applied() {
        let options = RunOptions::new("https://a.com")
            .max_depth(2)
            .delay(0.5)
            .max_urls(10);
        let mut config = Config::default();
        options.apply_to(&mut config);

        assert_eq!(config.crawler.max_depth, 2);
        assert_eq!(config.crawler.delay, 0.5);
        assert_eq!(config.crawler.max_urls, 10);
    }

    #[test]
    fn test_missing_overrides_keep_config() {
        let mut config = Config::default();
        RunOptions::new("https://a.com").apply_to(&mut config);
        assert_eq!(config.crawler.max_depth, 3);
        assert_eq!(config.crawler.max_urls, 10_000);
    }

    #[test]
    fn test_validation() {
        assert!(RunOptions::new("https://a.com").validate().is_ok());
        assert!(RunOptions::new("  ").validate().is_err());
        assert!(RunOptions::new("https://a.com").max_depth(0).validate().is_err());
        assert!(RunOptions::new("https://a.com").max_depth(11).validate().is_err());
        assert!(RunOptions::new("https://a.com").delay(-1.0).validate().is_err());
        assert!(RunOptions::new("https://a.com").max_urls(0).validate().is_err());
    }

    #[test]
    fn test_filter_must_be_absolute_url() {
        let options = RunOptions::new("https://a.com").filter("/docs");
        assert!(matches!(options.validate(), Err(ConfigError::Validation(_))));
        assert!(RunOptions::new("https://a.com").filter("https://a.com/docs").validate().is_ok());
    }

    #[test]
    fn test_crawl_filter_on_other_domain_rejected() {
        let options = RunOptions::new("https://a.com/")
            .mode(Mode::Crawl)
            .filter("https://other.com/docs");
        match options.validate() {
            Err(ConfigError::Validation(message)) => {
                assert!(message.contains("'other.com'"));
                assert!(message.contains("'a.com'"));
            }
            other => panic!("expected a validation error, got {:?}", other),
        }

        // Same host, different port
        let options = RunOptions::new("http://localhost:8080/")
            .mode(Mode::Crawl)
            .filter("http://localhost:9090/");
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_sitemap_filter_on_other_domain_allowed() {
        let options = RunOptions::new("https://cdn.a.com/sitemap.xml")
            .mode(Mode::Sitemap)
            .filter("https://a.com/blog");
        assert!(options.validate().is_ok());

        let local = RunOptions::new("./sitemap.xml")
            .mode(Mode::Crawl)
            .filter("https://a.com/blog");
        assert!(local.validate().is_ok());
    }

    #[test]
    fn test_empty_filter_ignored() {
        assert_eq!(RunOptions::new("https://a.com").filter(" ").filter_prefix(), None);
        assert_eq!(
            RunOptions::new("https://a.com").filter("https://a.com/blog").filter_prefix(),
            Some("https://a.com/blog")
        );
    }
}
