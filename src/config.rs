//! Read-only runtime configuration.
//!
//! A `Config` is built once (defaults, optionally overlaid by a JSON file and
//! CLI flags) and passed by reference into every component.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ScraperError;

pub const DEFAULT_EMAIL_PATTERN: &str = r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}";

pub const DEFAULT_PHONE_PATTERNS: [&str; 3] = [
    r"(?:\+90|0)?\s*\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{2}[-.\s]?\d{2}",
    r"(?:\+90|0)?\s*\d{3}\s*\d{3}\s*\d{2}\s*\d{2}",
    r"(?:\+90|0)?\s*\d{3}\s*\d{3}\s*\d{4}",
];

const DEFAULT_USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Edge/91.0.864.59 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
];

pub const ENV_GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const API_KEY_FILE: &str = "api_key.txt";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Browser User-Agent strings; one is picked at random per request.
    pub user_agents: Vec<String>,
    pub accept: String,
    pub accept_language: String,
    /// Accept-Language sent to the search engine.
    pub search_accept_language: String,
    pub home_timeout_secs: u64,
    pub contact_timeout_secs: u64,
    pub social_timeout_secs: u64,
    pub search_timeout_secs: u64,
    pub search_url: String,
    pub search_referer: String,
    pub max_results: usize,
    pub email_pattern: String,
    pub phone_patterns: Vec<String>,
    /// Uniform random delay between website fetches, in seconds.
    pub delay_min_secs: f64,
    pub delay_max_secs: f64,
    /// Fixed pause after each search-fallback call, in seconds.
    pub search_delay_secs: f64,
    pub checkpoint_every: usize,
    pub generative: GenerativeConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .to_string(),
            accept_language: "en-US,en;q=0.5".to_string(),
            search_accept_language: "tr-TR,tr;q=0.9,en-US;q=0.8,en;q=0.7".to_string(),
            home_timeout_secs: 20,
            contact_timeout_secs: 10,
            social_timeout_secs: 15,
            search_timeout_secs: 15,
            search_url: "https://www.bing.com/search".to_string(),
            search_referer: "https://www.bing.com/".to_string(),
            max_results: 10,
            email_pattern: DEFAULT_EMAIL_PATTERN.to_string(),
            phone_patterns: DEFAULT_PHONE_PATTERNS.iter().map(|s| s.to_string()).collect(),
            delay_min_secs: 1.5,
            delay_max_secs: 3.5,
            search_delay_secs: 2.0,
            checkpoint_every: 5,
            generative: GenerativeConfig::default(),
        }
    }
}

impl Config {
    /// Load a JSON config file; absent keys keep their defaults.
    pub fn load(path: &Path) -> Result<Self, ScraperError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ScraperError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| ScraperError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Delays must be finite, non-negative and `delay_min_secs <= delay_max_secs`.
    pub fn validate(&self) -> Result<(), ScraperError> {
        for (name, secs) in [
            ("delay_min_secs", self.delay_min_secs),
            ("delay_max_secs", self.delay_max_secs),
            ("search_delay_secs", self.search_delay_secs),
        ] {
            if Duration::try_from_secs_f64(secs).is_err() {
                return Err(ScraperError::InvalidConfig(format!(
                    "{} must be a finite, non-negative number of seconds (got {})",
                    name, secs
                )));
            }
        }
        if self.delay_min_secs > self.delay_max_secs {
            return Err(ScraperError::InvalidConfig(format!(
                "delay_min_secs ({}) is greater than delay_max_secs ({})",
                self.delay_min_secs, self.delay_max_secs
            )));
        }
        Ok(())
    }

    /// Config with all pacing delays disabled.
    pub fn without_delays(mut self) -> Self {
        self.delay_min_secs = 0.0;
        self.delay_max_secs = 0.0;
        self.search_delay_secs = 0.0;
        self
    }

    pub fn home_timeout(&self) -> Duration {
        Duration::from_secs(self.home_timeout_secs)
    }

    pub fn contact_timeout(&self) -> Duration {
        Duration::from_secs(self.contact_timeout_secs)
    }

    pub fn social_timeout(&self) -> Duration {
        Duration::from_secs(self.social_timeout_secs)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_secs(self.search_timeout_secs)
    }

    pub fn search_delay(&self) -> Duration {
        Duration::from_secs_f64(self.search_delay_secs.max(0.0))
    }

    /// Pick a random delay in `[delay_min_secs, delay_max_secs]`.
    pub fn fetch_delay(&self) -> Duration {
        use rand::Rng;

        let min = self.delay_min_secs.max(0.0);
        let max = self.delay_max_secs.max(min);
        if max <= min {
            return Duration::from_secs_f64(min);
        }
        Duration::from_secs_f64(rand::thread_rng().gen_range(min..=max))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerativeConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    /// Optional JSON prompt file overriding the built-in templates.
    pub prompt_file: Option<String>,
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            prompt_file: None,
        }
    }
}

impl GenerativeConfig {
    /// Resolve the API key: explicit config value, then `GEMINI_API_KEY`,
    /// then an `api_key.txt` file in the working directory.
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Some(key.trim().to_string());
        }
        if let Ok(key) = std::env::var(ENV_GEMINI_API_KEY) {
            if !key.trim().is_empty() {
                return Some(key.trim().to_string());
            }
        }
        match std::fs::read_to_string(API_KEY_FILE) {
            Ok(contents) if !contents.trim().is_empty() => Some(contents.trim().to_string()),
            Ok(_) => {
                log::error!("API key file {} is empty", API_KEY_FILE);
                None
            }
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"max_results": 5, "search_url": "http://localhost/s"}"#)
                .unwrap();
        assert_eq!(config.max_results, 5);
        assert_eq!(config.search_url, "http://localhost/s");
        assert_eq!(config.user_agents.len(), 3);
        assert_eq!(config.phone_patterns.len(), 3);
        assert_eq!(config.checkpoint_every, 5);
    }

    #[test]
    fn fetch_delay_stays_in_range() {
        let config = Config::default();
        for _ in 0..50 {
            let delay = config.fetch_delay().as_secs_f64();
            assert!((1.5..=3.5).contains(&delay));
        }
    }

    #[test]
    fn bad_delays_are_rejected() {
        assert!(Config::default().validate().is_ok());
        assert!(Config::default().without_delays().validate().is_ok());

        let cases: [(f64, f64, f64); 5] = [
            (1.0, f64::INFINITY, 0.0),
            (f64::NAN, 2.0, 0.0),
            (-1.0, 2.0, 0.0),
            (3.0, 2.0, 0.0),
            (1.0, 2.0, -0.5),
        ];
        for (min, max, search) in cases {
            let config = Config {
                delay_min_secs: min,
                delay_max_secs: max,
                search_delay_secs: search,
                ..Config::default()
            };
            assert!(
                matches!(config.validate(), Err(ScraperError::InvalidConfig(_))),
                "accepted {min}/{max}/{search}"
            );
        }
    }

    #[test]
    fn load_rejects_negative_delay() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"delay_min_secs": -2.0}"#).unwrap();
        assert!(matches!(
            Config::load(file.path()),
            Err(ScraperError::InvalidConfig(_))
        ));
    }

    #[test]
    fn no_delays_means_zero() {
        let config = Config::default().without_delays();
        assert_eq!(config.fetch_delay(), Duration::ZERO);
        assert_eq!(config.search_delay(), Duration::ZERO);
    }
}
