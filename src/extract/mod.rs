//! Heuristic field extractors over parsed HTML.
//!
//! Every extractor is pure and tolerant of malformed markup: a miss yields an
//! empty value, never an error.

pub mod about;
pub mod address;
pub mod email;
pub mod phone;
pub mod social;
pub mod text;

use regex::Regex;
use scraper::Html;

use crate::config::{Config, DEFAULT_EMAIL_PATTERN, DEFAULT_PHONE_PATTERNS};
use crate::error::ScraperError;
use crate::model::ExtractionResult;

pub use about::extract_about;
pub use address::extract_address;
pub use email::extract_emails;
pub use phone::{extract_phones, normalize_phone};
pub use social::{extract_instagram, extract_linkedin};

/// Compiled email and phone patterns.
#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    pub email: Regex,
    pub phones: Vec<Regex>,
}

impl ExtractorOptions {
    /// Compile caller patterns; blank or missing values fall back to the defaults.
    pub fn new(email: Option<&str>, phones: Option<&[String]>) -> Result<Self, ScraperError> {
        let email = match email.map(str::trim).filter(|p| !p.is_empty()) {
            Some(pattern) => compile(pattern)?,
            None => compile(DEFAULT_EMAIL_PATTERN)?,
        };

        let custom: Vec<&str> = phones
            .unwrap_or_default()
            .iter()
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect();
        let phones = if custom.is_empty() {
            DEFAULT_PHONE_PATTERNS
                .iter()
                .map(|p| compile(p))
                .collect::<Result<Vec<_>, _>>()?
        } else {
            custom.into_iter().map(compile).collect::<Result<Vec<_>, _>>()?
        };

        Ok(Self { email, phones })
    }

    pub fn from_config(config: &Config) -> Result<Self, ScraperError> {
        Self::new(Some(&config.email_pattern), Some(&config.phone_patterns))
    }
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            email: Regex::new(DEFAULT_EMAIL_PATTERN).unwrap(),
            phones: DEFAULT_PHONE_PATTERNS
                .iter()
                .map(|p| Regex::new(p).unwrap())
                .collect(),
        }
    }
}

fn compile(pattern: &str) -> Result<Regex, ScraperError> {
    Regex::new(pattern).map_err(|source| ScraperError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Run every extractor over one page. Emails and phones are searched in
/// `text_pool`, which may span more than this page.
pub fn extract_all(document: &Html, text_pool: &str, options: &ExtractorOptions) -> ExtractionResult {
    ExtractionResult {
        emails: extract_emails(text_pool, &options.email),
        phones: extract_phones(text_pool, &options.phones),
        address: extract_address(document),
        about_text: extract_about(document),
        instagram_handle: extract_instagram(document),
        linkedin_url: extract_linkedin(document),
    }
}
