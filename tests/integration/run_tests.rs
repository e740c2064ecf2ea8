//! Auto-mode dispatch and saved output

use crate::{html, links_page, test_config, urlset, xml};
use crawl_url::output::{write_result, OutputFormat};
use crawl_url::{RunOptions, Runner};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

#[tokio::test]
async fn test_auto_uses_sitemap_for_xml_location() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/post-sitemap.xml"))
        .respond_with(xml(&urlset(&["https://a.com/post".to_string()])))
        .mount(&mock_server)
        .await;

    // No discovery when the location already names a sitemap
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(html(""))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = Runner::new(test_config())
        .execute(&RunOptions::new(format!("{}/post-sitemap.xml?v=1", base_url)))
        .await;

    assert!(result.success, "{}", result.message);
    assert_eq!(result.urls, vec!["https://a.com/post"]);
}

#[tokio::test]
async fn test_auto_prefers_discovered_sitemap() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("HEAD"))
        .and(path("/sitemap.xml"))
        .respond_with(wiremock::ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(&urlset(&[
            format!("{}/a", base_url),
            format!("{}/b", base_url),
        ])))
        .mount(&mock_server)
        .await;

    // The home page is never crawled
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&links_page(&["/c".to_string()])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = Runner::new(test_config())
        .execute(&RunOptions::new(format!("{}/", base_url)))
        .await;

    assert!(result.success);
    assert_eq!(
        result.urls,
        vec![format!("{}/a", base_url), format!("{}/b", base_url)]
    );
}

#[tokio::test]
async fn test_auto_crawls_without_sitemap() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(&links_page(&["/about".to_string()])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html("<html><body>About</body></html>"))
        .mount(&mock_server)
        .await;

    let result = Runner::new(test_config())
        .execute(&RunOptions::new(format!("{}/", base_url)))
        .await;

    assert!(result.success);
    assert_eq!(
        result.urls,
        vec![format!("{}/", base_url), format!("{}/about", base_url)]
    );
}

#[tokio::test]
async fn test_auto_falls_back_when_sitemap_is_empty() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("HEAD"))
        .and(path("/sitemap.xml"))
        .respond_with(wiremock::ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(&urlset(&[])))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<html><body>Home</body></html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = Runner::new(test_config())
        .execute(&RunOptions::new(format!("{}/", base_url)))
        .await;

    assert!(result.success);
    assert_eq!(result.urls, vec![format!("{}/", base_url)]);
}

#[tokio::test]
async fn test_results_saved_in_each_format() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(xml(&urlset(&[
            "https://a.com/docs/intro".to_string(),
            "https://a.com/docs/setup".to_string(),
        ])))
        .mount(&mock_server)
        .await;

    let location = format!("{}/sitemap.xml", base_url);
    let result = Runner::new(test_config())
        .execute(&RunOptions::new(location.clone()))
        .await;
    assert_eq!(result.count, 2);

    let dir = tempfile::tempdir().unwrap();

    let txt = dir.path().join("out").join("urls.txt");
    write_result(&txt, &result, OutputFormat::Text, &location).unwrap();
    assert_eq!(
        std::fs::read_to_string(&txt).unwrap(),
        "https://a.com/docs/intro\nhttps://a.com/docs/setup"
    );

    let json = dir.path().join("urls.json");
    write_result(&json, &result, OutputFormat::Json, &location).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
    assert_eq!(value["metadata"]["total_urls"], 2);
    assert_eq!(value["metadata"]["base_url"], location.as_str());
    assert_eq!(value["urls"][0], "https://a.com/docs/intro");

    let csv = dir.path().join("urls.csv");
    write_result(&csv, &result, OutputFormat::Csv, &location).unwrap();
    let contents = std::fs::read_to_string(&csv).unwrap();
    let rows: Vec<&str> = contents.lines().collect();
    assert_eq!(rows[0], "URL,Domain,Path");
    assert_eq!(rows[1], "https://a.com/docs/intro,a.com,/docs/intro");
}
