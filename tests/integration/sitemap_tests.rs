//! Sitemap mode against a mock site

use crate::{sitemap_index, test_config, urlset, xml};
use crawl_url::{Mode, RunOptions, Runner};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Write;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gzip(data: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

async fn mount_xml(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(xml(&body))
        .mount(server)
        .await;
}

fn sitemap_options(url: String) -> RunOptions {
    RunOptions::new(url).mode(Mode::Sitemap)
}

#[tokio::test]
async fn test_urlset_entries_in_document_order() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let locs = vec![
        "https://a.com/one".to_string(),
        "https://a.com/two".to_string(),
        "https://b.com/three".to_string(),
    ];
    mount_xml(&mock_server, "/sitemap.xml", urlset(&locs)).await;

    let result = Runner::new(test_config())
        .execute(&sitemap_options(format!("{}/sitemap.xml", base_url)))
        .await;

    assert!(result.success, "{}", result.message);
    assert_eq!(result.urls, locs);
    assert_eq!(result.message, "Extracted 3 URLs from sitemap");
}

#[tokio::test]
async fn test_index_children_are_concatenated() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_xml(
        &mock_server,
        "/sitemap_index.xml",
        sitemap_index(&[
            format!("{}/posts.xml", base_url),
            format!("{}/pages.xml", base_url),
        ]),
    )
    .await;
    mount_xml(
        &mock_server,
        "/posts.xml",
        urlset(&["https://a.com/p1".to_string(), "https://a.com/p2".to_string()]),
    )
    .await;
    mount_xml(
        &mock_server,
        "/pages.xml",
        urlset(&[
            "https://a.com/x".to_string(),
            "https://a.com/y".to_string(),
            "https://a.com/z".to_string(),
        ]),
    )
    .await;

    let result = Runner::new(test_config())
        .execute(&sitemap_options(format!("{}/sitemap_index.xml", base_url)))
        .await;

    assert!(result.success);
    assert_eq!(result.count, 5);
    assert_eq!(result.urls[0], "https://a.com/p1");
    assert_eq!(result.urls[4], "https://a.com/z");
    assert_eq!(result.message, "Successfully extracted 5 URLs from 2 sitemaps");
}

#[tokio::test]
async fn test_gzip_child_sitemap() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_xml(
        &mock_server,
        "/sitemap_index.xml",
        sitemap_index(&[format!("{}/archive.xml.gz", base_url)]),
    )
    .await;

    // Served as an opaque file, no content-encoding
    Mock::given(method("GET"))
        .and(path("/archive.xml.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            gzip(&urlset(&["https://a.com/old".to_string()])),
            "application/x-gzip",
        ))
        .mount(&mock_server)
        .await;

    let result = Runner::new(test_config())
        .execute(&sitemap_options(format!("{}/sitemap_index.xml", base_url)))
        .await;

    assert!(result.success);
    assert_eq!(result.urls, vec!["https://a.com/old"]);
}

#[tokio::test]
async fn test_gzip_content_encoding() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    gzip(&urlset(&[
                        "https://a.com/one".to_string(),
                        "https://a.com/two".to_string(),
                    ])),
                    "application/xml",
                )
                .insert_header("content-encoding", "gzip"),
        )
        .mount(&mock_server)
        .await;

    let result = Runner::new(test_config())
        .execute(&sitemap_options(format!("{}/sitemap.xml", base_url)))
        .await;

    assert!(result.success, "{}", result.message);
    assert_eq!(result.urls, vec!["https://a.com/one", "https://a.com/two"]);
}

#[tokio::test]
async fn test_sitemap_retried_after_server_error() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // First two attempts hit a 502
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    mount_xml(
        &mock_server,
        "/sitemap.xml",
        urlset(&["https://a.com/recovered".to_string()]),
    )
    .await;

    let result = Runner::new(test_config())
        .execute(&sitemap_options(format!("{}/sitemap.xml", base_url)))
        .await;

    assert!(result.success, "{}", result.message);
    assert_eq!(result.urls, vec!["https://a.com/recovered"]);
}

#[tokio::test]
async fn test_prefix_filter_keeps_matching_entries() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_xml(
        &mock_server,
        "/sitemap.xml",
        urlset(&[
            "https://a.com/1".to_string(),
            "https://b.com/2".to_string(),
            "https://a.com/3".to_string(),
        ]),
    )
    .await;

    let options = sitemap_options(format!("{}/sitemap.xml", base_url)).filter("https://a.com");
    let result = Runner::new(test_config()).execute(&options).await;

    assert_eq!(result.urls, vec!["https://a.com/1", "https://a.com/3"]);
}

#[tokio::test]
async fn test_malformed_child_does_not_stop_siblings() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_xml(
        &mock_server,
        "/sitemap_index.xml",
        sitemap_index(&[
            format!("{}/broken.xml", base_url),
            format!("{}/gone.xml", base_url),
            format!("{}/good.xml", base_url),
        ]),
    )
    .await;
    mount_xml(
        &mock_server,
        "/broken.xml",
        "<urlset><url><loc>https://a.com/lost</loc></url><url><loc>https://a.com/x</url>"
            .to_string(),
    )
    .await;
    mount_xml(&mock_server, "/good.xml", urlset(&["https://a.com/kept".to_string()])).await;

    let result = Runner::new(test_config())
        .execute(&sitemap_options(format!("{}/sitemap_index.xml", base_url)))
        .await;

    assert!(result.success);
    assert_eq!(result.urls, vec!["https://a.com/kept"]);
    assert_eq!(result.errors.len(), 2);
    assert!(result.errors[0].contains("broken.xml"));
    assert!(result.errors[1].contains("HTTP 404"));
}

#[tokio::test]
async fn test_discovery_from_robots_txt() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            "User-agent: *\nDisallow: /admin\n\nSitemap: {}/custom/map.xml\n",
            base_url
        )))
        .mount(&mock_server)
        .await;
    mount_xml(
        &mock_server,
        "/custom/map.xml",
        urlset(&["https://a.com/from-robots".to_string()]),
    )
    .await;

    // Common locations must not be probed
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let result = Runner::new(test_config())
        .execute(&sitemap_options(format!("{}/", base_url)))
        .await;

    assert!(result.success);
    assert_eq!(result.urls, vec!["https://a.com/from-robots"]);
}

#[tokio::test]
async fn test_discovery_by_probing_common_paths() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // No robots.txt, /sitemap.xml missing, /sitemap_index.xml present
    Mock::given(method("HEAD"))
        .and(path("/sitemap_index.xml"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    mount_xml(
        &mock_server,
        "/sitemap_index.xml",
        sitemap_index(&[format!("{}/child.xml", base_url)]),
    )
    .await;
    mount_xml(
        &mock_server,
        "/child.xml",
        urlset(&["https://a.com/probed".to_string()]),
    )
    .await;

    let result = Runner::new(test_config())
        .execute(&sitemap_options(base_url.clone()))
        .await;

    assert!(result.success, "{}", result.message);
    assert_eq!(result.urls, vec!["https://a.com/probed"]);
}

#[tokio::test]
async fn test_head_rejected_falls_back_to_get() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(405))
        .mount(&mock_server)
        .await;
    mount_xml(
        &mock_server,
        "/sitemap.xml",
        urlset(&["https://a.com/via-get".to_string()]),
    )
    .await;

    let result = Runner::new(test_config())
        .execute(&sitemap_options(base_url.clone()))
        .await;

    assert!(result.success);
    assert_eq!(result.urls, vec!["https://a.com/via-get"]);
}

#[tokio::test]
async fn test_no_sitemaps_found() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    let result = Runner::new(test_config())
        .execute(&sitemap_options(base_url.clone()))
        .await;

    assert!(!result.success);
    assert_eq!(result.message, "No sitemaps found for this domain");
    assert_eq!(result.count, 0);
}
