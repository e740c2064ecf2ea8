//! Integration tests for crawl-url
//!
//! These tests use wiremock to create mock HTTP servers and run crawls,
//! sitemap extraction and mode dispatch end-to-end.

mod crawl_tests;
mod run_tests;
mod sitemap_tests;

use crawl_url::Config;
use wiremock::ResponseTemplate;

/// Configuration with no politeness delay, no retry backoff and short timeouts
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.crawler.delay = 0.0;
    config.crawler.request_timeout = 5;
    config.crawler.robots_timeout = 2;
    config.crawler.retry_backoff = 0.0;
    config.sitemap.request_timeout = 5;
    config.user_agent.crawler_name = "TestBot".to_string();
    config
}

/// 200 response with an HTML body
pub fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "text/html")
}

/// 200 response with an XML body
pub fn xml(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.as_bytes().to_vec(), "application/xml")
}

/// HTML page linking to each of `links`
pub fn links_page(links: &[String]) -> String {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}">{}</a>"#, l, l))
        .collect();
    format!("<html><head><title>Test</title></head><body>{}</body></html>", anchors)
}

pub fn urlset(locs: &[String]) -> String {
    let entries: String = locs
        .iter()
        .map(|l| format!("<url><loc>{}</loc><changefreq>weekly</changefreq></url>", l))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    )
}

pub fn sitemap_index(children: &[String]) -> String {
    let entries: String = children
        .iter()
        .map(|c| format!("<sitemap><loc>{}</loc></sitemap>", c))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</sitemapindex>"#,
        entries
    )
}
