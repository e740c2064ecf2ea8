use crate::url::Fingerprint;
use crate::UrlError;
use std::fmt;
use std::str::FromStr;
use url::Url;

/// A validated, canonical http(s) URL
///
/// Two `NormalizedUrl`s compare equal whenever their inputs differ only by
/// fragment, scheme/host case, or an empty versus `/` root path. The
/// canonical string is the dedup key for the whole crate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedUrl(Url);

impl NormalizedUrl {
    /// Returns the underlying parsed URL
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the canonical string form
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the lowercase host; always present for a normalized URL
    pub fn host(&self) -> &str {
        self.0.host_str().unwrap_or_default()
    }

    /// Returns the origin (`scheme://host[:port]`) used to scope rate limits and robots rules
    pub fn origin(&self) -> String {
        self.0.origin().ascii_serialization()
    }

    /// Returns the stable dedup fingerprint of the canonical string
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of(self.as_str())
    }

    /// Returns true if the canonical string starts with `prefix`
    pub fn starts_with(&self, prefix: &str) -> bool {
        self.as_str().starts_with(prefix)
    }
}

impl fmt::Display for NormalizedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for NormalizedUrl {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for NormalizedUrl {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize_url(s, None)
    }
}

/// Resolves and normalizes a URL
///
/// # Normalization Steps
///
/// 1. Resolve `raw` against `base` (standard reference resolution), or
///    parse it as absolute when no base is given
/// 2. Reject anything that is not http/https, or that has no host
/// 3. Lowercase scheme and host
/// 4. Remove the fragment
/// 5. Treat an empty path as `/`, so `https://a.com` == `https://a.com/`
///
/// The query string and existing percent-encoding are kept as they are.
///
/// # Examples
///
/// ```
/// use crawl_url::url::normalize_url;
///
/// let url = normalize_url("HTTPS://Example.COM#top", None).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/");
///
/// let base = url::Url::parse("https://example.com/docs/intro").unwrap();
/// let link = normalize_url("../blog?id=7#comments", Some(&base)).unwrap();
/// assert_eq!(link.as_str(), "https://example.com/blog?id=7");
/// ```
pub fn normalize_url(raw: &str, base: Option<&Url>) -> Result<NormalizedUrl, UrlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlError::Parse("empty URL".to_string()));
    }

    let parsed = match base {
        Some(base) => base.join(raw),
        None => Url::parse(raw),
    };
    let mut url = parsed.map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    // The url crate lowercases scheme and host of special schemes while parsing
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "only http and https are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);

    if url.path().is_empty() {
        url.set_path("/");
    }

    Ok(NormalizedUrl(url))
}
