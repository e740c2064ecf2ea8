//! Output module for saving run results
//!
//! This module handles:
//! - Rendering results as text, JSON or CSV
//! - Writing them to disk
//! - Naming output files after the crawled domain

mod formats;
mod traits;

pub use formats::{CsvWriter, JsonWriter, TextWriter, JSON_FORMAT_VERSION};
pub use traits::{OutputError, OutputFormat, OutputResult, ResultWriter};

use crate::run::CrawlResult;
use std::fs;
use std::path::Path;
use tracing::info;
use url::Url;

/// Longest cleaned domain kept in a generated filename
const MAX_NAME_LEN: usize = 50;

/// Renders `result` in `format`
pub fn format_result(
    result: &CrawlResult,
    format: OutputFormat,
    base_url: &str,
) -> OutputResult<String> {
    format.writer().render(result, base_url)
}

/// Writes `result` to `output_path`, creating parent directories
///
/// # Arguments
///
/// * `output_path` - File to create or overwrite
/// * `result` - The run result to save
/// * `format` - File format
/// * `base_url` - Location the run started from, recorded in JSON metadata
pub fn write_result(
    output_path: &Path,
    result: &CrawlResult,
    format: OutputFormat,
    base_url: &str,
) -> OutputResult<()> {
    let contents = format_result(result, format, base_url)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(output_path, contents)?;

    info!(
        path = %output_path.display(),
        urls = result.count,
        format = %format,
        "Saved results"
    );
    Ok(())
}

/// Builds a default output filename: cleaned domain, timestamp, extension
///
/// # Examples
///
/// ```
/// use crawl_url::output::{generate_filename, OutputFormat};
///
/// let name = generate_filename("https://docs.example.com/guide", OutputFormat::Csv);
/// assert!(name.starts_with("docs_example_com_"));
/// assert!(name.ends_with(".csv"));
/// ```
pub fn generate_filename(base_url: &str, format: OutputFormat) -> String {
    let domain = Url::parse(base_url)
        .ok()
        .and_then(|url| {
            url.host_str().map(|host| match url.port() {
                Some(port) => format!("{}:{}", host, port),
                None => host.to_string(),
            })
        })
        .unwrap_or_else(|| "crawl_results".to_string());

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    format!("{}_{}.{}", clean_filename(&domain), timestamp, format.extension())
}

/// Replaces characters that are unsafe in filenames
///
/// Dots and reserved characters become underscores, runs of underscores
/// collapse, and the result is capped at 50 characters.
pub fn clean_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .take(MAX_NAME_LEN)
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' | '.' => '_',
            c if c.is_control() || c.is_whitespace() => '_',
            c => c,
        })
        .collect();

    let cleaned = replaced
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned
    }
}
