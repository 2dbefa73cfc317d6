//! Sequential batch over a company table with periodic checkpoints.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::ScraperError;
use crate::extract::ExtractorOptions;
use crate::model::Field;
use crate::sheet::{ColumnMapping, Sheet};
use crate::CompanyScraper;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub columns: ColumnMapping,
    /// Output fields written back to the table.
    pub fields: BTreeSet<Field>,
    pub search_missing: bool,
    /// 0-based rank of the search result to use.
    pub result_index: usize,
    pub extractors: ExtractorOptions,
    /// Write the table after every row whose index is a multiple of this.
    pub checkpoint_every: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            columns: ColumnMapping::default(),
            fields: Field::ALL.into_iter().collect(),
            search_missing: true,
            result_index: 0,
            extractors: ExtractorOptions::default(),
            checkpoint_every: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Empty company name.
    Skipped,
    /// No URL given and none found.
    NoWebsite,
    Scraped,
}

/// Progress for one processed row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordReport {
    pub row: usize,
    pub total: usize,
    pub name: String,
    pub website: Option<String>,
    pub found_via_search: bool,
    pub fields_found: Vec<Field>,
    pub outcome: RecordOutcome,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
    pub found_via_search: usize,
    pub rows_with_data: usize,
    pub stopped: bool,
    pub elapsed: Duration,
}

/// Process every row of `sheet`, writing results in place and to `output`.
///
/// Only a missing required column aborts the batch; per-record failures
/// leave that row's cells untouched. `stop` is checked between records.
pub async fn run_batch<F>(
    scraper: &CompanyScraper,
    sheet: &mut Sheet,
    output: &Path,
    options: &BatchOptions,
    stop: Arc<AtomicBool>,
    mut on_record: F,
) -> Result<BatchSummary, ScraperError>
where
    F: FnMut(&RecordReport),
{
    sheet.require_columns(&[options.columns.name.as_str(), options.columns.website.as_str()])?;
    let website_col = sheet.ensure_column(&options.columns.website);
    let field_cols: Vec<(Field, usize)> = options
        .fields
        .iter()
        .map(|f| (*f, sheet.ensure_column(options.columns.column(*f))))
        .collect();

    let started = Instant::now();
    let total = sheet.len();
    let mut summary = BatchSummary::default();
    log::info!("Processing {} companies -> {}", total, output.display());

    for row in 0..total {
        if stop.load(Ordering::SeqCst) {
            log::warn!("Stop requested, halting before row {}", row + 2);
            summary.stopped = true;
            break;
        }

        let Some(record) = sheet.record(row, &options.columns) else {
            continue;
        };
        let mut report = RecordReport {
            row,
            total,
            name: record.name.clone(),
            website: record.website_url.clone(),
            found_via_search: false,
            fields_found: Vec::new(),
            outcome: RecordOutcome::NoWebsite,
        };

        if !record.has_name() {
            log::warn!("Row {}: company name is empty, skipping", row + 2);
            summary.skipped += 1;
            report.outcome = RecordOutcome::Skipped;
            on_record(&report);
            continue;
        }
        log::info!("Processing: {}", record.name);

        if report.website.is_none() && options.search_missing {
            log::info!(
                "Searching website for {} (result #{})",
                record.name,
                options.result_index + 1
            );
            let found = scraper
                .find_website(&record.name, options.result_index, scraper.config().max_results)
                .await;
            if let Some(url) = &found {
                log::info!("Found site: {}", url);
                sheet.set(row, website_col, url.as_str());
                summary.found_via_search += 1;
                report.found_via_search = true;
            }
            report.website = found;
            tokio::time::sleep(scraper.config().search_delay()).await;
        }

        if let Some(website) = report.website.clone() {
            log::info!("Scraping {} for {}", website, record.name);
            let data = scraper.scrape_with(&website, &options.extractors).await;

            for (field, col) in &field_cols {
                if let Some(value) = data.value(*field).filter(|v| !v.trim().is_empty()) {
                    sheet.set(row, *col, value);
                    report.fields_found.push(*field);
                }
            }
            if report.fields_found.is_empty() {
                log::info!("No data found for {}", record.name);
            } else {
                summary.rows_with_data += 1;
                let names: Vec<String> = report.fields_found.iter().map(Field::to_string).collect();
                log::info!("Found: {}", names.join(", "));
            }
            report.outcome = RecordOutcome::Scraped;

            if options.checkpoint_every > 0 && row % options.checkpoint_every == 0 {
                sheet.write_csv(output)?;
                log::info!("Checkpoint saved: {}", output.display());
            }

            tokio::time::sleep(scraper.config().fetch_delay()).await;
        } else {
            log::warn!("No website found for {}", record.name);
        }

        summary.processed += 1;
        on_record(&report);
    }

    sheet.write_csv(output)?;
    summary.elapsed = started.elapsed();
    log::info!(
        "Batch finished: {} processed, {} skipped, {} with data in {:.1}s",
        summary.processed,
        summary.skipped,
        summary.rows_with_data,
        summary.elapsed.as_secs_f64()
    );
    Ok(summary)
}
