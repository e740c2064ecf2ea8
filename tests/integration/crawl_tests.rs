//! Crawl mode against a mock site

use crate::{html, links_page, test_config};
use crawl_url::{Mode, ProgressCallback, RunOptions, Runner};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_full_crawl_single_domain() {
    // Start a mock server
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nAllow: /"))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&links_page(&[
            format!("{}/page1", base_url),
            "/page2".to_string(),
            "#top".to_string(),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page1"))
        .respond_with(html(&links_page(&["/".to_string(), "/page2#section".to_string()])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/page2"))
        .respond_with(html("<html><body>Content 2</body></html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let options = RunOptions::new(format!("{}/", base_url)).mode(Mode::Crawl);
    let result = Runner::new(test_config()).execute(&options).await;

    assert!(result.success, "crawl failed: {}", result.message);
    assert_eq!(
        result.urls,
        vec![
            format!("{}/", base_url),
            format!("{}/page1", base_url),
            format!("{}/page2", base_url),
        ]
    );
    assert_eq!(result.count, 3);
    assert_eq!(result.message, "Successfully crawled 3 URLs");
}

#[tokio::test]
async fn test_robots_txt_respect() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Disallow /private/ for every agent
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private/"),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&links_page(&[
            "/allowed".to_string(),
            "/private/secret".to_string(),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/allowed"))
        .respond_with(html("<html><body>Allowed content</body></html>"))
        .mount(&mock_server)
        .await;

    // Should never be called
    Mock::given(method("GET"))
        .and(path("/private/secret"))
        .respond_with(html("<html><body>Secret</body></html>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let options = RunOptions::new(format!("{}/", base_url)).mode(Mode::Crawl);
    let result = Runner::new(test_config()).execute(&options).await;

    assert!(result.success);
    assert_eq!(
        result.urls,
        vec![format!("{}/", base_url), format!("{}/allowed", base_url)]
    );
    assert!(!result.urls.iter().any(|u| u.contains("/private/")));

    // Wiremock verifies the expect(0) when mock_server drops
}

#[tokio::test]
async fn test_crawl_with_depth_limit() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let pages: Vec<String> = (1..=5).map(|i| format!("/p{}", i)).collect();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&links_page(&pages)))
        .mount(&mock_server)
        .await;

    for page in &pages {
        Mock::given(method("GET"))
            .and(path(page.as_str()))
            .respond_with(html(&links_page(&["/common".to_string()])))
            .mount(&mock_server)
            .await;
    }

    // Depth 2, beyond the limit
    Mock::given(method("GET"))
        .and(path("/common"))
        .respond_with(html("<html><body>Common</body></html>"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let options = RunOptions::new(format!("{}/", base_url))
        .mode(Mode::Crawl)
        .max_depth(1);
    let result = Runner::new(test_config()).execute(&options).await;

    assert!(result.success);
    assert_eq!(result.count, 6);
    assert_eq!(result.urls[0], format!("{}/", base_url));
    for (i, page) in pages.iter().enumerate() {
        assert_eq!(result.urls[i + 1], format!("{}{}", base_url, page));
    }
}

#[tokio::test]
async fn test_failed_pages_are_recorded_not_fatal() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&links_page(&["/missing".to_string(), "/ok".to_string()])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/ok"))
        .respond_with(html("<html><body>ok</body></html>"))
        .mount(&mock_server)
        .await;

    // /missing falls through to wiremock's default 404

    let options = RunOptions::new(format!("{}/", base_url)).mode(Mode::Crawl);
    let result = Runner::new(test_config()).execute(&options).await;

    assert!(result.success);
    assert_eq!(
        result.urls,
        vec![format!("{}/", base_url), format!("{}/ok", base_url)]
    );
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].contains("HTTP 404"));
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Two 503s, then the page
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<html><body>Back up</body></html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let options = RunOptions::new(format!("{}/", base_url)).mode(Mode::Crawl);
    let result = Runner::new(test_config()).execute(&options).await;

    assert!(result.success, "{}", result.message);
    assert_eq!(result.urls, vec![format!("{}/", base_url)]);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn test_retries_give_up_after_limit() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;

    let mut config = test_config();
    config.crawler.max_retries = 1;
    let options = RunOptions::new(format!("{}/", base_url)).mode(Mode::Crawl);
    let result = Runner::new(config).execute(&options).await;

    assert!(!result.success);
    assert!(result.errors[0].contains("HTTP 503"));
}

#[tokio::test]
async fn test_unreachable_start_page_fails() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let options = RunOptions::new(format!("{}/", base_url)).mode(Mode::Crawl);
    let result = Runner::new(test_config()).execute(&options).await;

    assert!(!result.success);
    assert_eq!(result.count, 0);
    assert!(result.message.starts_with("No pages could be fetched"));
}

#[tokio::test]
async fn test_same_origin_requests_are_spaced() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&links_page(&["/a".to_string(), "/b".to_string()])))
        .mount(&mock_server)
        .await;

    for page in ["/a", "/b"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(html("<html><body>leaf</body></html>"))
            .mount(&mock_server)
            .await;
    }

    let options = RunOptions::new(format!("{}/", base_url))
        .mode(Mode::Crawl)
        .delay(0.2);

    let started = Instant::now();
    let result = Runner::new(test_config()).execute(&options).await;
    let elapsed = started.elapsed();

    assert_eq!(result.count, 3);
    // Three requests to one origin need at least two full delays
    assert!(
        elapsed >= Duration::from_millis(400),
        "requests were not spaced: {:?}",
        elapsed
    );
}

#[tokio::test]
async fn test_cancellation_returns_partial_result() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let pages: Vec<String> = (1..=10).map(|i| format!("/p{}", i)).collect();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&links_page(&pages)))
        .mount(&mock_server)
        .await;

    for page in &pages {
        Mock::given(method("GET"))
            .and(path(page.as_str()))
            .respond_with(html("<html><body>leaf</body></html>"))
            .mount(&mock_server)
            .await;
    }

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let progress: ProgressCallback = Arc::new(move |_message: &str, found: usize| {
        if found >= 3 {
            trigger.cancel();
        }
    });

    let options = RunOptions::new(format!("{}/", base_url)).mode(Mode::Crawl);
    let result = Runner::new(test_config())
        .with_cancel(cancel)
        .with_progress(progress)
        .execute(&options)
        .await;

    assert!(result.success);
    assert_eq!(result.count, 3);
    assert_eq!(result.urls.len(), result.count);
    assert!(result.message.contains("cancelled"));
}
