use crate::config::ScopeConfig;
use crate::url::DomainPattern;
use crate::ConfigError;

/// Where a link host stands relative to the configured scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomainScope {
    /// May be enqueued
    Allowed,
    /// Matched a blocked pattern
    Blocked,
    /// An allow list exists and the host is not on it
    OutOfScope,
}

impl DomainScope {
    /// Returns true if links to this host may be followed
    pub fn should_crawl(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Allow/deny lists of domain patterns
#[derive(Debug, Clone, Default)]
pub struct Scope {
    allowed: Vec<DomainPattern>,
    blocked: Vec<DomainPattern>,
}

impl Scope {
    /// Scope that allows every host
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn new(allowed: Vec<DomainPattern>, blocked: Vec<DomainPattern>) -> Self {
        Self { allowed, blocked }
    }

    /// Builds a scope from the `[scope]` configuration section
    pub fn from_config(config: &ScopeConfig) -> Result<Self, ConfigError> {
        let allowed = config
            .allowed_domains
            .iter()
            .map(|p| DomainPattern::parse(p))
            .collect::<Result<Vec<_>, _>>()?;
        let blocked = config
            .blocked_domains
            .iter()
            .map(|p| DomainPattern::parse(p))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(allowed, blocked))
    }

    /// Classifies a host
    ///
    /// Priority order:
    /// 1. Blocked list (highest priority)
    /// 2. Allowed list, when non-empty
    /// 3. Allowed (default)
    pub fn classify(&self, host: &str) -> DomainScope {
        if self.blocked.iter().any(|p| p.matches(host)) {
            return DomainScope::Blocked;
        }

        if !self.allowed.is_empty() && !self.allowed.iter().any(|p| p.matches(host)) {
            return DomainScope::OutOfScope;
        }

        DomainScope::Allowed
    }
}
