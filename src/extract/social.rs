use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

/// Instagram paths that are not profiles.
const NON_PROFILE_PATHS: [&str; 6] = ["p", "explore", "reels", "reel", "stories", "tv"];

static INSTAGRAM_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="instagram.com"]"#).unwrap());
static LINKEDIN_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="linkedin.com"]"#).unwrap());
static INSTAGRAM_HANDLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"instagram\.com/([^/?#]+)").unwrap());

/// First Instagram profile handle linked from the page, as `@handle`.
pub fn extract_instagram(document: &Html) -> Option<String> {
    document
        .select(&INSTAGRAM_LINK)
        .filter_map(|link| link.value().attr("href"))
        .filter_map(|href| INSTAGRAM_HANDLE.captures(href))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .find(|handle| !NON_PROFILE_PATHS.contains(&handle.as_str()))
        .map(|handle| {
            if handle.starts_with('@') {
                handle
            } else {
                format!("@{}", handle)
            }
        })
}

/// First LinkedIn company or personal profile link, verbatim.
pub fn extract_linkedin(document: &Html) -> Option<String> {
    document
        .select(&LINKEDIN_LINK)
        .filter_map(|link| link.value().attr("href"))
        .find(|href| href.contains("/company/") || href.contains("/in/"))
        .map(str::to_string)
}
