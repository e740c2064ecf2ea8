//! Text, JSON and CSV renderings of a run result

use crate::output::traits::{OutputResult, ResultWriter};
use crate::run::CrawlResult;
use serde::Serialize;
use url::Url;

/// Version of the JSON layout
pub const JSON_FORMAT_VERSION: &str = "1.0";

/// One URL per line
pub struct TextWriter;

impl ResultWriter for TextWriter {
    fn render(&self, result: &CrawlResult, _base_url: &str) -> OutputResult<String> {
        Ok(result.urls.join("\n"))
    }
}

#[derive(Serialize)]
struct JsonMetadata<'a> {
    crawl_date: String,
    total_urls: usize,
    format_version: &'static str,
    base_url: &'a str,
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    metadata: JsonMetadata<'a>,
    urls: &'a [String],
}

/// `{"metadata": {...}, "urls": [...]}`, pretty-printed
pub struct JsonWriter;

impl ResultWriter for JsonWriter {
    fn render(&self, result: &CrawlResult, base_url: &str) -> OutputResult<String> {
        let document = JsonDocument {
            metadata: JsonMetadata {
                crawl_date: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                total_urls: result.urls.len(),
                format_version: JSON_FORMAT_VERSION,
                base_url,
            },
            urls: &result.urls,
        };
        Ok(serde_json::to_string_pretty(&document)?)
    }
}

/// Header `URL,Domain,Path` and one row per URL, CRLF-terminated
///
/// URLs that do not parse get empty domain and path columns.
pub struct CsvWriter;

impl ResultWriter for CsvWriter {
    fn render(&self, result: &CrawlResult, _base_url: &str) -> OutputResult<String> {
        let mut writer = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .from_writer(Vec::new());
        writer.write_record(["URL", "Domain", "Path"])?;

        for raw in &result.urls {
            let (domain, path) = match Url::parse(raw) {
                Ok(url) => {
                    let domain = match (url.host_str(), url.port()) {
                        (Some(host), Some(port)) => format!("{}:{}", host, port),
                        (Some(host), None) => host.to_string(),
                        (None, _) => String::new(),
                    };
                    (domain, url.path().to_string())
                }
                Err(_) => (String::new(), String::new()),
            };
            writer.write_record([raw.as_str(), domain.as_str(), path.as_str()])?;
        }

        let bytes = writer.into_inner().map_err(|e| e.into_error())?;
        String::from_utf8(bytes)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e).into())
    }
}
