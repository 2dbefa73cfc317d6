//! Website discovery for companies without a known URL.
//!
//! Queries a search engine's HTML results page and falls back, in order, to
//! social-profile resolution, a looser link scan, and DNS probing of guessed
//! domains.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::{Host, Url};

use crate::config::Config;
use crate::fetcher::{HeaderProfile, HtmlFetcher};
use crate::social_profile::{resolve_website_from_social_profile, Platform};
use crate::url_utils::{bare_domain, registrable_domain};

/// Hosts never treated as a company's own website.
const EXCLUDED_HOSTS: [&str; 6] = [
    "bing.com",
    "microsoft.com",
    "facebook.com",
    "linkedin.com",
    "youtube.com",
    "instagram.com",
];

static ALGO_RESULT: Lazy<Selector> = Lazy::new(|| Selector::parse("li.b_algo").unwrap());
static RESULT_ITEM: Lazy<Selector> = Lazy::new(|| Selector::parse("#b_results > li").unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Checks whether a domain name resolves.
#[async_trait]
pub trait DomainProbe: Send + Sync {
    async fn resolves(&self, domain: &str) -> bool;
}

/// System resolver lookup.
#[derive(Debug, Default, Clone, Copy)]
pub struct DnsProbe;

#[async_trait]
impl DomainProbe for DnsProbe {
    async fn resolves(&self, domain: &str) -> bool {
        match tokio::net::lookup_host((domain, 80)).await {
            Ok(mut addrs) => addrs.next().is_some(),
            Err(e) => {
                log::debug!("DNS lookup failed for {}: {}", domain, e);
                false
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCandidate {
    pub url: String,
    pub domain: String,
}

impl SearchCandidate {
    fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            domain: registrable_domain(url).unwrap_or_default(),
        }
    }
}

/// Search hits split into direct website candidates and social profiles,
/// each in result order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPage {
    pub direct: Vec<SearchCandidate>,
    pub social: Vec<SearchCandidate>,
}

pub struct SearchResolver<'a> {
    fetcher: &'a HtmlFetcher,
    config: &'a Config,
    probe: &'a dyn DomainProbe,
}

impl<'a> SearchResolver<'a> {
    pub fn new(fetcher: &'a HtmlFetcher, config: &'a Config, probe: &'a dyn DomainProbe) -> Self {
        Self {
            fetcher,
            config,
            probe,
        }
    }

    /// Find the most plausible website for `company_name`.
    ///
    /// `result_index` selects among name-matching candidates (or among all
    /// candidates when none match) and is clamped to the first entry.
    pub async fn find_website(
        &self,
        company_name: &str,
        result_index: usize,
        max_results: usize,
    ) -> Option<String> {
        let company_name = company_name.trim();
        if company_name.is_empty() {
            log::warn!("Skipping website search: company name is empty");
            return None;
        }

        let query = format!("{} resmi sitesi", company_name);
        log::info!("Searching for: {}", query);

        let scan = self
            .search(&query, max_results)
            .await
            .map(|html| ResultScan::from_html(&html));
        let mut page = scan.as_ref().map(|s| s.page.clone()).unwrap_or_default();

        if page.direct.is_empty() && !page.social.is_empty() {
            log::info!(
                "No direct website for {}, trying {} social profile(s)",
                company_name,
                page.social.len()
            );
            for candidate in &page.social {
                if let Some(site) = self.resolve_social(&candidate.url).await {
                    log::info!("Website found via social media: {}", site);
                    return Some(site);
                }
            }
        }

        if page.direct.is_empty() {
            if let Some(scan) = &scan {
                log::info!("Using fallback link scan for {}", company_name);
                page.direct = scan.loose.clone();
            }
        }

        if page.direct.is_empty() && page.social.is_empty() {
            for url in scan.iter().flat_map(|s| s.social_links.iter()) {
                if let Some(site) = self.resolve_social(url).await {
                    log::info!("Website found via last-resort social link: {}", site);
                    return Some(site);
                }
            }
        }

        if page.direct.is_empty() {
            for domain in domain_guesses(company_name) {
                if self.probe.resolves(&domain).await {
                    let url = format!("http://{}", domain);
                    log::info!("Found domain via DNS lookup: {}", url);
                    return Some(url);
                }
            }
            log::warn!("No search results found for {}", company_name);
            return None;
        }

        for (i, candidate) in page.direct.iter().take(max_results).enumerate() {
            log::info!(
                "Search result #{} for {}: {} - {}",
                i + 1,
                company_name,
                candidate.domain,
                candidate.url
            );
        }

        let chosen = pick_candidate(&page.direct, company_name, result_index)?;
        log::info!("Using {} for {}", chosen.url, company_name);
        Some(chosen.url.clone())
    }

    async fn search(&self, query: &str, max_results: usize) -> Option<String> {
        let mut url = match Url::parse(&self.config.search_url) {
            Ok(url) => url,
            Err(e) => {
                log::error!("Invalid search endpoint {}: {}", self.config.search_url, e);
                return None;
            }
        };
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("count", &max_results.to_string());

        match self
            .fetcher
            .fetch_with(url.as_str(), self.config.search_timeout(), HeaderProfile::Search)
            .await
        {
            Ok(html) => Some(html),
            Err(e) => {
                log::warn!("Search failed for '{}': {}", query, e);
                None
            }
        }
    }

    async fn resolve_social(&self, url: &str) -> Option<String> {
        resolve_website_from_social_profile(self.fetcher, self.config, url).await
    }
}

/// Everything the fallback chain needs from one results page, extracted
/// up front so no parsed document is held across requests.
struct ResultScan {
    page: SearchPage,
    loose: Vec<SearchCandidate>,
    social_links: Vec<String>,
}

impl ResultScan {
    fn from_html(html: &str) -> Self {
        let document = Html::parse_document(html);
        Self {
            page: parse_results(&document),
            loose: loose_results(&document),
            social_links: social_links(&document),
        }
    }
}

fn is_excluded(url: &str) -> bool {
    EXCLUDED_HOSTS.iter().any(|host| url.contains(host))
}

/// Classify the main link of each organic result.
pub fn parse_results(document: &Html) -> SearchPage {
    let mut items: Vec<_> = document.select(&ALGO_RESULT).collect();
    if items.is_empty() {
        items = document.select(&RESULT_ITEM).collect();
    }

    let mut page = SearchPage::default();
    for item in items {
        let Some(href) = item.select(&ANCHOR).next().and_then(|a| a.value().attr("href")) else {
            continue;
        };

        if Platform::is_social_url(href) {
            page.social.push(SearchCandidate::new(href));
        } else if href.starts_with("http") && !is_excluded(href) {
            page.direct.push(SearchCandidate::new(href));
        }
    }
    page
}

/// Any external anchor on the page.
pub fn loose_results(document: &Html) -> Vec<SearchCandidate> {
    document
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.starts_with("http") && !is_excluded(href))
        .map(SearchCandidate::new)
        .collect()
}

fn social_links(document: &Html) -> Vec<String> {
    document
        .select(&ANCHOR)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.starts_with("http") && Platform::is_social_url(href))
        .map(str::to_string)
        .collect()
}

/// Domains tried by DNS probing, in order, IDNA-encoded.
pub fn domain_guesses(company_name: &str) -> [String; 4] {
    let base = simplify_name(company_name);
    [
        format!("{}.com", base),
        format!("{}.com.tr", base),
        format!("www.{}.com", base),
        format!("www.{}.com.tr", base),
    ]
    .map(|guess| ascii_domain(&guess))
}

/// Punycode form of `domain`, or `domain` unchanged when it is not a valid host.
fn ascii_domain(domain: &str) -> String {
    match Host::parse(domain) {
        Ok(Host::Domain(ascii)) => ascii,
        _ => domain.to_string(),
    }
}

fn simplify_name(company_name: &str) -> String {
    company_name.to_lowercase().replace(' ', "")
}

/// Prefer candidates whose domain contains the simplified company name.
pub fn pick_candidate<'c>(
    candidates: &'c [SearchCandidate],
    company_name: &str,
    result_index: usize,
) -> Option<&'c SearchCandidate> {
    let name = simplify_name(company_name.trim());
    let matches: Vec<&SearchCandidate> = candidates
        .iter()
        .filter(|c| {
            bare_domain(&c.url)
                .map(|domain| domain.contains(&name))
                .unwrap_or(false)
        })
        .collect();

    if !matches.is_empty() {
        return matches.get(result_index).or_else(|| matches.first()).copied();
    }
    candidates.get(result_index).or_else(|| candidates.first())
}
