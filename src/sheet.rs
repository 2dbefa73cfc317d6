//! CSV company table: read, update cells by header, write back.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::ScraperError;
use crate::model::{CompanyRecord, Field};

pub const DEFAULT_NAME_COLUMN: &str = "FirmaAdı";
pub const DEFAULT_URL_COLUMN: &str = "WebSitesi";

/// Header names used for the input and output columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub name: String,
    pub website: String,
    pub fields: BTreeMap<Field, String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME_COLUMN.to_string(),
            website: DEFAULT_URL_COLUMN.to_string(),
            fields: Field::ALL
                .iter()
                .map(|f| (*f, f.default_column().to_string()))
                .collect(),
        }
    }
}

impl ColumnMapping {
    pub fn column(&self, field: Field) -> &str {
        self.fields
            .get(&field)
            .map(String::as_str)
            .unwrap_or_else(|| field.default_column())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Short rows are padded. Cells beyond the last header are kept under
    /// unnamed columns.
    pub fn new(mut headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let long_rows = rows.iter().filter(|r| r.len() > headers.len()).count();
        if long_rows > 0 {
            let width = rows.iter().map(Vec::len).max().unwrap_or(0);
            log::warn!(
                "{} row(s) have more cells than the {} header(s); keeping {} unnamed column(s)",
                long_rows,
                headers.len(),
                width - headers.len()
            );
            headers.resize(width, String::new());
        }

        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    pub fn read_csv(path: &Path) -> Result<Self, ScraperError> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
        let headers = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();
        let rows = reader
            .records()
            .map(|record| record.map(|r| r.iter().map(str::to_string).collect()))
            .collect::<Result<Vec<Vec<String>>, _>>()?;
        Ok(Self::new(headers, rows))
    }

    pub fn write_csv(&self, path: &Path) -> Result<(), ScraperError> {
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Index of `header`, appending an empty column if it is missing.
    pub fn ensure_column(&mut self, header: &str) -> usize {
        if let Some(index) = self.column_index(header) {
            return index;
        }
        self.headers.push(header.to_string());
        for row in &mut self.rows {
            row.push(String::new());
        }
        self.headers.len() - 1
    }

    /// Fail unless every listed header exists.
    pub fn require_columns(&self, headers: &[&str]) -> Result<(), ScraperError> {
        let missing: Vec<String> = headers
            .iter()
            .filter(|h| self.column_index(h).is_none())
            .map(|h| h.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ScraperError::MissingColumns(missing))
        }
    }

    pub fn get(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    pub fn set(&mut self, row: usize, column: usize, value: impl Into<String>) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cell = value.into();
        }
    }

    /// The company record in `row`, per the mapping's name and URL columns.
    pub fn record(&self, row: usize, mapping: &ColumnMapping) -> Option<CompanyRecord> {
        let name = self.get(row, self.column_index(&mapping.name)?)?;
        let website = self
            .column_index(&mapping.website)
            .and_then(|c| self.get(row, c))
            .map(str::to_string);
        Some(CompanyRecord::new(name.trim(), website))
    }
}

/// `<stem>_updated.csv` next to the input file.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "companies".to_string());
    input.with_file_name(format!("{}_updated.csv", stem))
}
