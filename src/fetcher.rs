//! Single-shot HTML fetching with rotating browser headers.

use rand::seq::SliceRandom;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use thiserror::Error;

use crate::config::Config;
use crate::error::ScraperError;

const FALLBACK_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("http status {status}")]
    Http { status: StatusCode },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),
}

impl FetchError {
    pub fn from_reqwest_error(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_builder() {
            Self::InvalidUrl(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Http { status }
        } else {
            Self::Network(err.to_string())
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status } => Some(status.as_u16()),
            _ => None,
        }
    }
}

/// Which header set to send; search requests look like they came from the
/// engine's own front page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderProfile {
    Browser,
    Search,
}

#[derive(Debug, Clone)]
pub struct HtmlFetcher {
    client: Client,
    user_agents: Vec<String>,
    accept: String,
    accept_language: String,
    search_accept_language: String,
    search_referer: String,
}

impl HtmlFetcher {
    pub fn new(config: &Config) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client,
            user_agents: config.user_agents.clone(),
            accept: config.accept.clone(),
            accept_language: config.accept_language.clone(),
            search_accept_language: config.search_accept_language.clone(),
            search_referer: config.search_referer.clone(),
        })
    }

    fn random_user_agent(&self) -> &str {
        self.user_agents
            .choose(&mut rand::thread_rng())
            .map(String::as_str)
            .unwrap_or(FALLBACK_USER_AGENT)
    }

    fn headers(&self, profile: HeaderProfile) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let mut insert = |name: header::HeaderName, value: &str| {
            if let Ok(value) = HeaderValue::from_str(value) {
                headers.insert(name, value);
            }
        };

        insert(header::USER_AGENT, self.random_user_agent());
        insert(header::ACCEPT, &self.accept);
        insert(header::CONNECTION, "keep-alive");
        insert(header::UPGRADE_INSECURE_REQUESTS, "1");
        match profile {
            HeaderProfile::Browser => {
                insert(header::ACCEPT_LANGUAGE, &self.accept_language);
                insert(header::CACHE_CONTROL, "max-age=0");
            }
            HeaderProfile::Search => {
                insert(header::ACCEPT_LANGUAGE, &self.search_accept_language);
                insert(header::REFERER, &self.search_referer);
            }
        }
        headers
    }

    /// GET `url` and return its body. Anything but `200 OK` is an error.
    pub async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        self.fetch_with(url, timeout, HeaderProfile::Browser).await
    }

    pub async fn fetch_with(
        &self,
        url: &str,
        timeout: Duration,
        profile: HeaderProfile,
    ) -> Result<String, FetchError> {
        let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        log::debug!("Fetching: {}", parsed);

        let response = self
            .client
            .get(parsed)
            .headers(self.headers(profile))
            .timeout(timeout)
            .send()
            .await
            .map_err(FetchError::from_reqwest_error)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Http { status });
        }

        response.text().await.map_err(FetchError::from_reqwest_error)
    }
}
