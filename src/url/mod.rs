//! URL handling module
//!
//! This module provides URL normalization, fingerprinting, domain extraction,
//! wildcard matching and scope classification.

mod domain;
mod fingerprint;
mod matcher;
mod normalize;
mod scope;

pub use domain::{extract_domain, origin_host};
pub use fingerprint::Fingerprint;
pub use matcher::DomainPattern;
pub use normalize::{normalize_url, NormalizedUrl};
pub use scope::{DomainScope, Scope};

/// Suggests a corrected URL for a common input mistake
///
/// A bare domain such as `example.com/docs` gets an `https://` prefix;
/// anything else yields `None`.
///
/// # Examples
///
/// ```
/// use crawl_url::url::suggest_url_fix;
///
/// assert_eq!(suggest_url_fix("example.com"), Some("https://example.com".to_string()));
/// assert_eq!(suggest_url_fix("https://example.com"), None);
/// ```
pub fn suggest_url_fix(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() || raw.contains("://") {
        return None;
    }

    let candidate = format!("https://{}", raw.trim_start_matches('/'));
    normalize_url(&candidate, None).ok()?;
    Some(candidate)
}
