use url::Url;

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use crawl_url::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM:8080/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Returns the host part of an origin string (`scheme://host[:port]`)
///
/// IPv6 hosts keep their brackets. Inputs without a scheme are treated as
/// bare `host[:port]`.
///
/// # Examples
///
/// ```
/// use crawl_url::url::origin_host;
///
/// assert_eq!(origin_host("https://example.com:8443"), "example.com");
/// assert_eq!(origin_host("http://[::1]:3000"), "[::1]");
/// ```
pub fn origin_host(origin: &str) -> &str {
    let authority = origin
        .split_once("://")
        .map_or(origin, |(_, rest)| rest);
    let authority = authority.split('/').next().unwrap_or(authority);

    if authority.starts_with('[') {
        return match authority.find(']') {
            Some(end) => &authority[..=end],
            None => authority,
        };
    }

    authority.split(':').next().unwrap_or(authority)
}
