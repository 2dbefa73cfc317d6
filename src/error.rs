use std::path::PathBuf;
use thiserror::Error;

/// Input, configuration and table-level errors.
///
/// Per-record network and parsing problems never surface here; those are
/// logged and degraded inside the pipeline.
#[derive(Error, Debug)]
pub enum ScraperError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Company name is empty")]
    EmptyCompanyName,
    #[error("Invalid regex pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Failed to read config {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
    #[error("Unknown format '{0}'. Use: json, csv, or text")]
    UnknownFormat(String),
    #[error("Required columns missing from table: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}
