//! Sitemap byte sources
//!
//! Opens sitemap documents over HTTP or from the local filesystem as
//! streaming readers that decompress gzip transparently.

use crate::crawler::{send_with_retry, RetryPolicy};
use crate::CrawlError;
use flate2::read::GzDecoder;
use futures::TryStreamExt;
use reqwest::header::RANGE;
use reqwest::{Client, StatusCode};
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::io::{StreamReader, SyncIoBridge};
use tracing::debug;
use url::Url;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// An open sitemap document, read incrementally
///
/// Reading blocks: remote bodies are pulled from the async response
/// through [`SyncIoBridge`], so the reader must be consumed on a blocking
/// thread (`tokio::task::spawn_blocking`).
pub struct SitemapReader {
    raw: Box<dyn Read + Send>,
}

impl SitemapReader {
    pub fn new(raw: impl Read + Send + 'static) -> Self {
        Self { raw: Box::new(raw) }
    }

    /// Returns a reader over the decompressed document
    ///
    /// Bodies starting with the gzip magic number are decoded with
    /// `flate2`; anything else passes through.
    pub fn into_buf_read(self) -> io::Result<Box<dyn BufRead + Send>> {
        let mut buffered = BufReader::new(self.raw);
        if buffered.fill_buf()?.starts_with(&GZIP_MAGIC) {
            Ok(Box::new(BufReader::new(GzDecoder::new(buffered))))
        } else {
            Ok(Box::new(buffered))
        }
    }

    /// Reads the whole decompressed document as text, invalid UTF-8 replaced
    ///
    /// A corrupt gzip stream yields whatever was decoded before the error.
    pub fn into_text_lossy(self) -> io::Result<String> {
        let mut bytes = Vec::new();
        let _ = self.into_buf_read()?.read_to_end(&mut bytes);
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Where a sitemap location points
enum Location {
    Remote(Url),
    Local(PathBuf),
}

impl Location {
    fn parse(location: &str) -> Self {
        let location = location.trim();
        match Url::parse(location) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Self::Remote(url),
            Ok(url) if url.scheme() == "file" => match url.to_file_path() {
                Ok(path) => Self::Local(path),
                Err(()) => Self::Local(PathBuf::from(location)),
            },
            _ => Self::Local(PathBuf::from(location)),
        }
    }
}

/// Loads sitemap documents
#[derive(Debug, Clone)]
pub struct SitemapFetcher {
    client: Client,
    timeout: Duration,
    retry: RetryPolicy,
}

impl SitemapFetcher {
    /// `timeout` bounds each sitemap request, body included
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            retry: RetryPolicy::NONE,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Opens a sitemap document for streaming
    ///
    /// `location` is an http(s) URL, a `file://` URL or a filesystem path.
    /// Only the response head is awaited here; the body is read as the
    /// returned reader is consumed. Any non-2xx status is a `FetchFailed`
    /// error.
    pub async fn open(&self, location: &str) -> Result<SitemapReader, CrawlError> {
        match Location::parse(location) {
            Location::Remote(url) => {
                debug!(url = %url, "Fetching sitemap");
                let request = self.client.get(url.clone()).timeout(self.timeout);
                let response = send_with_retry(request, self.retry)
                    .await
                    .map_err(|e| CrawlError::fetch_failed(url.as_str(), e))?;

                let status = response.status();
                if !status.is_success() {
                    return Err(CrawlError::fetch_failed(
                        url.as_str(),
                        format!("HTTP {}", status.as_u16()),
                    ));
                }

                let body = response
                    .bytes_stream()
                    .map_err(|e| io::Error::new(io::ErrorKind::Other, e));
                let reader = StreamReader::new(Box::pin(body));
                Ok(SitemapReader::new(SyncIoBridge::new(reader)))
            }
            Location::Local(path) => {
                debug!(path = %path.display(), "Reading sitemap file");
                let file = tokio::fs::File::open(&path)
                    .await
                    .map_err(|e| CrawlError::fetch_failed(path.display().to_string(), e))?;
                Ok(SitemapReader::new(file.into_std().await))
            }
        }
    }

    /// Reads a whole document as text
    pub async fn fetch_text(&self, location: &str) -> Result<String, CrawlError> {
        let reader = self.open(location).await?;
        tokio::task::spawn_blocking(move || reader.into_text_lossy())
            .await?
            .map_err(|e| CrawlError::fetch_failed(location, e))
    }

    /// Reads the first `limit` decompressed bytes of a document
    ///
    /// Uses a `Range` request; servers that ignore it are read only up to
    /// `limit` raw bytes before the response is dropped. A gzip sample is
    /// decoded as far as the truncated stream allows.
    pub async fn sample(&self, location: &str, limit: usize) -> Result<Vec<u8>, CrawlError> {
        let limit = limit.max(1);
        let mut raw = match Location::parse(location) {
            Location::Remote(url) => self.sample_remote(&url, limit).await?,
            Location::Local(_) => {
                let reader = self.open(location).await?;
                return tokio::task::spawn_blocking(move || -> io::Result<Vec<u8>> {
                    let mut sample = Vec::with_capacity(limit);
                    reader
                        .into_buf_read()?
                        .take(limit as u64)
                        .read_to_end(&mut sample)?;
                    Ok(sample)
                })
                .await?
                .map_err(|e| CrawlError::fetch_failed(location, e));
            }
        };

        if !raw.starts_with(&GZIP_MAGIC) {
            raw.truncate(limit);
            return Ok(raw);
        }

        let mut decoded = Vec::new();
        let _ = GzDecoder::new(raw.as_slice())
            .take(limit as u64)
            .read_to_end(&mut decoded);
        Ok(decoded)
    }

    async fn sample_remote(&self, url: &Url, limit: usize) -> Result<Vec<u8>, CrawlError> {
        let request = self
            .client
            .get(url.clone())
            .header(RANGE, format!("bytes=0-{}", limit - 1))
            .timeout(self.timeout);
        let mut response = send_with_retry(request, self.retry)
            .await
            .map_err(|e| CrawlError::fetch_failed(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlError::fetch_failed(
                url.as_str(),
                format!("HTTP {}", status.as_u16()),
            ));
        }

        let mut sample = Vec::with_capacity(limit);
        while sample.len() < limit {
            match response.chunk().await {
                Ok(Some(chunk)) => sample.extend_from_slice(&chunk),
                Ok(None) => break,
                Err(e) if sample.is_empty() => {
                    return Err(CrawlError::fetch_failed(url.as_str(), e));
                }
                Err(_) => break,
            }
        }
        sample.truncate(limit);
        Ok(sample)
    }

    /// Checks whether a sitemap exists at `url`
    ///
    /// Sends HEAD and falls back to a one-byte ranged GET when the server
    /// rejects HEAD. Any 2xx counts; errors count as absent.
    pub async fn exists(&self, url: &Url) -> bool {
        let head = self
            .client
            .head(url.clone())
            .timeout(self.timeout)
            .send()
            .await;

        let status = match head {
            Ok(response)
                if matches!(
                    response.status(),
                    StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
                ) =>
            {
                match self
                    .client
                    .get(url.clone())
                    .header(RANGE, "bytes=0-0")
                    .timeout(self.timeout)
                    .send()
                    .await
                {
                    Ok(response) => response.status(),
                    Err(e) => {
                        debug!(url = %url, error = %e, "Sitemap probe failed");
                        return false;
                    }
                }
            }
            Ok(response) => response.status(),
            Err(e) => {
                debug!(url = %url, error = %e, "Sitemap probe failed");
                return false;
            }
        };

        debug!(url = %url, status = %status, "Probed sitemap location");
        status.is_success()
    }
}
