//! Company contact-information extraction.
//!
//! Given a company name and an optional website, finds the website (search
//! engine, social profiles, DNS guesses), scrapes the home and contact pages,
//! and returns email, phone, address, about text and social handles.

pub mod batch;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod generate;
pub mod model;
pub mod output;
pub mod search;
pub mod sheet;
pub mod site;
pub mod social_profile;
pub mod url_utils;

use std::sync::Arc;

pub use config::Config;
pub use error::ScraperError;
pub use extract::ExtractorOptions;
pub use model::{CompanyRecord, ExtractionResult, Field};

use fetcher::HtmlFetcher;
use search::{DnsProbe, DomainProbe, SearchResolver};

/// Entry point bundling configuration, HTTP fetching and DNS probing.
pub struct CompanyScraper {
    config: Config,
    fetcher: HtmlFetcher,
    probe: Arc<dyn DomainProbe>,
}

impl CompanyScraper {
    pub fn new(config: Config) -> Result<Self, ScraperError> {
        Self::with_probe(config, Arc::new(DnsProbe))
    }

    pub fn with_probe(config: Config, probe: Arc<dyn DomainProbe>) -> Result<Self, ScraperError> {
        let fetcher = HtmlFetcher::new(&config)?;
        Ok(Self {
            config,
            fetcher,
            probe,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Find a website for a company with no known URL.
    pub async fn find_website(
        &self,
        company_name: &str,
        result_index: usize,
        max_results: usize,
    ) -> Option<String> {
        SearchResolver::new(&self.fetcher, &self.config, self.probe.as_ref())
            .find_website(company_name, result_index, max_results)
            .await
    }

    /// Scrape with caller-supplied patterns. Invalid patterns are logged and
    /// produce an empty result.
    pub async fn scrape(
        &self,
        url: &str,
        email_pattern: Option<&str>,
        phone_patterns: Option<&[String]>,
    ) -> ExtractionResult {
        match ExtractorOptions::new(email_pattern, phone_patterns) {
            Ok(options) => self.scrape_with(url, &options).await,
            Err(e) => {
                log::error!("Error scraping {}: {}", url, e);
                ExtractionResult::default()
            }
        }
    }

    pub async fn scrape_with(&self, url: &str, options: &ExtractorOptions) -> ExtractionResult {
        site::scrape(&self.fetcher, &self.config, url, options).await
    }

    pub async fn resolve_website_from_social_profile(&self, profile_url: &str) -> Option<String> {
        social_profile::resolve_website_from_social_profile(&self.fetcher, &self.config, profile_url)
            .await
    }

    /// Website (found by search when missing) and scraped data for one record.
    pub async fn process_record(
        &self,
        record: &CompanyRecord,
        result_index: usize,
        options: &ExtractorOptions,
    ) -> (Option<String>, ExtractionResult) {
        if !record.has_name() {
            log::warn!("Skipping record with empty company name");
            return (None, ExtractionResult::default());
        }

        let website = match &record.website_url {
            Some(url) => Some(url.clone()),
            None => {
                self.find_website(&record.name, result_index, self.config.max_results)
                    .await
            }
        };

        let data = match &website {
            Some(url) => self.scrape_with(url, options).await,
            None => ExtractionResult::default(),
        };
        (website, data)
    }
}
