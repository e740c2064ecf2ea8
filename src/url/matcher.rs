use crate::ConfigError;
use std::fmt;

/// A domain pattern from the configuration
///
/// Two forms are supported:
/// 1. Exact: `example.com` matches only `example.com`
/// 2. Wildcard: `*.example.com` matches `example.com` itself and any
///    subdomain such as `blog.example.com` or `api.v2.example.com`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainPattern {
    base: String,
    wildcard: bool,
}

impl DomainPattern {
    /// Parses and validates a pattern; matching is case-insensitive
    ///
    /// # Examples
    ///
    /// ```
    /// use crawl_url::url::DomainPattern;
    ///
    /// let pattern = DomainPattern::parse("*.Example.com").unwrap();
    /// assert!(pattern.matches("example.com"));
    /// assert!(pattern.matches("blog.example.com"));
    /// assert!(!pattern.matches("myexample.com"));
    ///
    /// assert!(DomainPattern::parse("*.").is_err());
    /// ```
    pub fn parse(pattern: &str) -> Result<Self, ConfigError> {
        let pattern = pattern.trim().to_lowercase();
        if pattern.is_empty() {
            return Err(ConfigError::InvalidPattern(
                "Domain pattern cannot be empty".to_string(),
            ));
        }

        let (base, wildcard) = match pattern.strip_prefix("*.") {
            Some(base) => (base.to_string(), true),
            None => (pattern, false),
        };
        validate_domain_string(&base)?;

        Ok(Self { base, wildcard })
    }

    /// Returns true if `host` is covered by this pattern
    pub fn matches(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        if self.wildcard {
            host == self.base || host.ends_with(&format!(".{}", self.base))
        } else {
            host == self.base
        }
    }
}

impl fmt::Display for DomainPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.wildcard {
            write!(f, "*.{}", self.base)
        } else {
            f.write_str(&self.base)
        }
    }
}

/// Validates a domain string (without wildcard prefix)
///
/// Single-label hosts such as `localhost` are accepted.
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "Domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::InvalidPattern(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
    }

    Ok(())
}
