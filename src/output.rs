//! Rendering scraped sites as JSON, CSV or plain text.

use serde::Serialize;
use std::path::Path;
use std::str::FromStr;

use crate::error::ScraperError;
use crate::model::{ExtractionResult, Field};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Csv,
    Text,
}

impl FromStr for OutputFormat {
    type Err = ScraperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "text" | "txt" => Ok(Self::Text),
            other => Err(ScraperError::UnknownFormat(other.to_string())),
        }
    }
}

/// One scraped website.
#[derive(Debug, Clone, Serialize)]
pub struct SiteReport {
    pub url: String,
    #[serde(flatten)]
    pub data: ExtractionResult,
}

pub fn render(reports: &[SiteReport], format: OutputFormat) -> Result<String, ScraperError> {
    match format {
        OutputFormat::Json => format_json(reports),
        OutputFormat::Csv => format_csv(reports),
        OutputFormat::Text => Ok(format_text(reports)),
    }
}

/// Write to `output` when given, otherwise print to stdout.
pub fn write_output(
    reports: &[SiteReport],
    format: OutputFormat,
    output: Option<&Path>,
) -> Result<(), ScraperError> {
    let rendered = render(reports, format)?;
    match output {
        Some(path) => {
            std::fs::write(path, &rendered)?;
            log::info!("Output saved to: {}", path.display());
        }
        None => println!("{}", rendered),
    }
    Ok(())
}

fn format_json(reports: &[SiteReport]) -> Result<String, ScraperError> {
    Ok(serde_json::to_string_pretty(reports)?)
}

fn format_csv(reports: &[SiteReport]) -> Result<String, ScraperError> {
    let mut writer = csv::Writer::from_writer(vec![]);

    let mut header = vec!["url"];
    header.extend(Field::ALL.iter().map(|f| f.default_column()));
    writer.write_record(&header)?;

    for report in reports {
        let mut row = vec![report.url.clone()];
        row.extend(report.data.fields().into_iter().map(|(_, v)| v.unwrap_or_default()));
        writer.write_record(&row)?;
    }

    let bytes = writer.into_inner().map_err(|e| ScraperError::Io(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn format_text(reports: &[SiteReport]) -> String {
    let mut output = String::new();

    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            output.push_str("\n\n");
            output.push_str(&"=".repeat(80));
            output.push_str("\n\n");
        }

        output.push_str(&format!("URL: {}\n", report.url));
        if report.data.is_empty() {
            output.push_str("No contact data found\n");
            continue;
        }

        for (field, value) in report.data.fields() {
            if let Some(value) = value {
                output.push_str(&format!("{}: {}\n", field, value));
            }
        }
    }

    output
}
