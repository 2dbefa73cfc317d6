//! Recover a company's own website from its Facebook, Instagram or LinkedIn
//! profile page.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;

use crate::config::Config;
use crate::extract::text::{element_text, page_text};
use crate::fetcher::HtmlFetcher;

const SOCIAL_TEXT_DOMAINS: [&str; 5] = ["instagram", "facebook", "twitter", "youtube", "linkedin"];
const MIN_TEXT_DOMAIN_LEN: usize = 6;

static FB_REDIRECT: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="l.facebook.com/l.php"]"#).unwrap());
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static IG_BIO: Lazy<Selector> = Lazy::new(|| Selector::parse("div.-vDIg a").unwrap());
static IG_AGGREGATORS: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"a[href*="linktr.ee"], a[href*="linkin.bio"], a[href*="linkpop.com"]"#).unwrap()
});
static BLANK_TARGET: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"a[target="_blank"]"#).unwrap());
static LI_ACTIONS: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".org-top-card-primary-actions__inner a").unwrap());
static ABSOLUTE_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"a[href*="://"]"#).unwrap());

static WEBSITE_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)website|web site|web sitesi").unwrap());
static TEXT_DOMAIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:https?://)?(?:www\.)?([a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)+)(?:/\S*)?").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Facebook,
    Instagram,
    LinkedIn,
}

impl Platform {
    pub fn detect(url: &str) -> Option<Self> {
        let lower = url.to_lowercase();
        if lower.contains("facebook.com") {
            Some(Self::Facebook)
        } else if lower.contains("instagram.com") {
            Some(Self::Instagram)
        } else if lower.contains("linkedin.com") {
            Some(Self::LinkedIn)
        } else {
            None
        }
    }

    pub fn is_social_url(url: &str) -> bool {
        Self::detect(url).is_some()
    }
}

/// Fetch a profile page and pull the company's outbound website link from it.
///
/// Fetch failures, unsupported platforms and misses are logged and yield `None`.
pub async fn resolve_website_from_social_profile(
    fetcher: &HtmlFetcher,
    config: &Config,
    profile_url: &str,
) -> Option<String> {
    let Some(platform) = Platform::detect(profile_url) else {
        log::warn!("Not a supported social profile: {}", profile_url);
        return None;
    };
    log::info!("Extracting website from social profile: {}", profile_url);

    let html = match fetcher.fetch(profile_url, config.social_timeout()).await {
        Ok(html) => html,
        Err(e) => {
            log::warn!("Could not reach social profile {}: {}", profile_url, e);
            return None;
        }
    };

    let website = website_from_profile(platform, &html);
    match &website {
        Some(site) => log::info!("Website found on {:?} profile: {}", platform, site),
        None => log::info!("No website link on {:?} profile {}", platform, profile_url),
    }
    website
}

/// Platform-specific heuristics over an already fetched profile page.
pub fn website_from_profile(platform: Platform, html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    match platform {
        Platform::Facebook => from_facebook(&document),
        Platform::Instagram => from_instagram(&document),
        Platform::LinkedIn => from_linkedin(&document),
    }
}

fn from_facebook(document: &Html) -> Option<String> {
    let redirected = document
        .select(&FB_REDIRECT)
        .filter_map(|a| a.value().attr("href"))
        .filter(|href| href.contains("u="))
        .find_map(|href| {
            let target = redirect_target(href)?;
            if target.contains("facebook.com") {
                None
            } else {
                Some(target)
            }
        });
    if redirected.is_some() {
        return redirected;
    }

    document
        .select(&ANCHOR)
        .filter(|a| WEBSITE_LABEL.is_match(&element_text(*a)))
        .filter_map(|a| a.value().attr("href"))
        .find(|href| href.contains("http") && !href.contains("facebook.com"))
        .map(str::to_string)
}

/// The `u` parameter of a Facebook link-shim URL.
fn redirect_target(href: &str) -> Option<String> {
    let absolute = if href.starts_with("//") {
        format!("https:{}", href)
    } else {
        href.to_string()
    };
    let parsed = match Url::parse(&absolute) {
        Ok(url) => url,
        Err(e) => {
            log::error!("Facebook redirect link could not be parsed: {}", e);
            return None;
        }
    };
    parsed
        .query_pairs()
        .find(|(key, _)| key == "u")
        .map(|(_, value)| value.into_owned())
        .filter(|v| !v.is_empty())
}

fn from_instagram(document: &Html) -> Option<String> {
    let outbound = |href: &&str| href.contains("http") && !href.contains("instagram.com");

    if let Some(href) = document
        .select(&IG_BIO)
        .filter_map(|a| a.value().attr("href"))
        .find(outbound)
    {
        return Some(href.to_string());
    }

    let mut candidates: Vec<&str> = document
        .select(&IG_AGGREGATORS)
        .filter_map(|a| a.value().attr("href"))
        .collect();
    if candidates.is_empty() {
        candidates = document
            .select(&BLANK_TARGET)
            .filter_map(|a| a.value().attr("href"))
            .collect();
    }
    if let Some(href) = candidates.into_iter().find(|h| outbound(h)) {
        return Some(href.to_string());
    }

    let text = page_text(document);
    TEXT_DOMAIN
        .captures_iter(&text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .find(|domain| {
            let lower = domain.to_lowercase();
            domain.len() >= MIN_TEXT_DOMAIN_LEN
                && !SOCIAL_TEXT_DOMAINS.iter().any(|s| lower.contains(s))
        })
        .map(|domain| format!("http://{}", domain))
}

fn from_linkedin(document: &Html) -> Option<String> {
    if let Some(href) = document
        .select(&LI_ACTIONS)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| !href.is_empty() && !href.contains("linkedin.com"))
    {
        return Some(href.to_string());
    }

    document
        .select(&ABSOLUTE_LINK)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| {
            !href.is_empty()
                && !href.contains("linkedin.com")
                && !href.contains("javascript:")
                && !href.starts_with('#')
        })
        .map(str::to_string)
}
