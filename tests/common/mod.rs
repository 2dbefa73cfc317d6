#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use firma_scraper::search::DomainProbe;
use firma_scraper::{CompanyScraper, Config};

/// DNS stand-in that records every lookup and resolves only listed domains.
#[derive(Default)]
pub struct RecordingProbe {
    resolvable: Vec<String>,
    pub seen: Mutex<Vec<String>>,
}

impl RecordingProbe {
    pub fn resolving(domains: &[&str]) -> Self {
        Self {
            resolvable: domains.iter().map(|d| d.to_string()).collect(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl DomainProbe for RecordingProbe {
    async fn resolves(&self, domain: &str) -> bool {
        self.seen.lock().unwrap().push(domain.to_string());
        self.resolvable.iter().any(|d| d == domain)
    }
}

/// Default config with no pacing delays and the search engine on `server`.
pub fn test_config(server: &MockServer) -> Config {
    let mut config = Config::default().without_delays();
    config.search_url = format!("{}/search", server.uri());
    config.home_timeout_secs = 5;
    config.contact_timeout_secs = 5;
    config.social_timeout_secs = 5;
    config.search_timeout_secs = 5;
    config
}

pub fn scraper_with(config: Config, probe: Arc<RecordingProbe>) -> CompanyScraper {
    CompanyScraper::with_probe(config, probe).unwrap()
}

/// Serve `html` with status 200 at `url_path`.
pub async fn mount_page(server: &MockServer, url_path: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(url_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}
