//! Output writer trait and types
//!
//! This module defines the interface shared by the result formats and the
//! errors they can produce.

use crate::run::CrawlResult;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Unsupported output format '{0}', expected txt, json or csv")]
    UnknownFormat(String),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Renders a run result as file contents
pub trait ResultWriter {
    /// Renders `result`; `base_url` is the location the run started from
    fn render(&self, result: &CrawlResult, base_url: &str) -> OutputResult<String>;
}

/// File format of a saved result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One URL per line
    #[default]
    Text,
    /// URLs plus run metadata
    Json,
    /// `URL,Domain,Path` rows
    Csv,
}

impl OutputFormat {
    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Json => "json",
            Self::Csv => "csv",
        }
    }

    pub fn writer(&self) -> Box<dyn ResultWriter> {
        match self {
            Self::Text => Box::new(super::formats::TextWriter),
            Self::Json => Box::new(super::formats::JsonWriter),
            Self::Csv => Box::new(super::formats::CsvWriter),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = OutputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            other => Err(OutputError::UnknownFormat(other.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
