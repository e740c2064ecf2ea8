use crate::config::types::{
    Config, CrawlerConfig, DomainDelayEntry, ScopeConfig, SitemapConfig, UserAgentConfig,
};
use crate::url::DomainPattern;
use crate::ConfigError;
use url::Url;

/// Deepest crawl accepted
pub const MAX_DEPTH_LIMIT: u32 = 10;

/// Most pages fetched in parallel
pub const MAX_CONCURRENCY: usize = 32;

/// Most retries allowed per request
pub const MAX_RETRIES: u32 = 10;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_sitemap_config(&config.sitemap)?;
    validate_scope(&config.scope)?;
    validate_domain_delays(&config.domain_delay)?;
    Ok(())
}

/// Validates crawler configuration
pub fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    validate_depth(config.max_depth)?;
    validate_delay(config.delay, "delay")?;

    if config.max_urls < 1 {
        return Err(ConfigError::Validation(format!(
            "max-urls must be >= 1, got {}",
            config.max_urls
        )));
    }

    if config.max_links_per_page < 1 {
        return Err(ConfigError::Validation(format!(
            "max-links-per-page must be >= 1, got {}",
            config.max_links_per_page
        )));
    }

    if config.max_tracked_urls < 1 {
        return Err(ConfigError::Validation(format!(
            "max-tracked-urls must be >= 1, got {}",
            config.max_tracked_urls
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "request-timeout must be at least 1 second".to_string(),
        ));
    }

    if config.robots_timeout < 1 || config.robots_timeout > 10 {
        return Err(ConfigError::Validation(format!(
            "robots-timeout must be between 1 and 10 seconds, got {}",
            config.robots_timeout
        )));
    }

    if config.max_retries > MAX_RETRIES {
        return Err(ConfigError::Validation(format!(
            "max-retries must be at most {}, got {}",
            MAX_RETRIES, config.max_retries
        )));
    }
    validate_delay(config.retry_backoff, "retry-backoff")?;

    if config.concurrency < 1 || config.concurrency > MAX_CONCURRENCY {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and {}, got {}",
            MAX_CONCURRENCY, config.concurrency
        )));
    }

    Ok(())
}

/// Validates a crawl depth
pub fn validate_depth(depth: u32) -> Result<(), ConfigError> {
    if depth < 1 || depth > MAX_DEPTH_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max-depth must be between 1 and {}, got {}",
            MAX_DEPTH_LIMIT, depth
        )));
    }
    Ok(())
}

/// Validates a delay in seconds
pub fn validate_delay(delay: f64, field: &str) -> Result<(), ConfigError> {
    if !delay.is_finite() || delay < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be a non-negative number of seconds, got {}",
            field, delay
        )));
    }
    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.trim().is_empty() {
        return Err(ConfigError::Validation(
            "crawler-version cannot be empty".to_string(),
        ));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;
    }

    Ok(())
}

fn validate_sitemap_config(config: &SitemapConfig) -> Result<(), ConfigError> {
    if config.sample_bytes < 64 {
        return Err(ConfigError::Validation(format!(
            "sample-bytes must be >= 64, got {}",
            config.sample_bytes
        )));
    }

    if config.request_timeout < 1 {
        return Err(ConfigError::Validation(
            "sitemap request-timeout must be at least 1 second".to_string(),
        ));
    }

    Ok(())
}

fn validate_scope(config: &ScopeConfig) -> Result<(), ConfigError> {
    for pattern in config
        .allowed_domains
        .iter()
        .chain(config.blocked_domains.iter())
    {
        DomainPattern::parse(pattern)?;
    }
    Ok(())
}

fn validate_domain_delays(entries: &[DomainDelayEntry]) -> Result<(), ConfigError> {
    for entry in entries {
        DomainPattern::parse(&entry.domain)?;
        validate_delay(entry.delay, &format!("delay for '{}'", entry.domain))?;
    }
    Ok(())
}
