//! Home page + contact page scraping with merged field extraction.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};

use crate::config::Config;
use crate::extract::text::page_text;
use crate::extract::{extract_all, extract_emails, extract_phones, ExtractorOptions};
use crate::fetcher::HtmlFetcher;
use crate::model::ExtractionResult;
use crate::url_utils::{normalize, resolve_against_root};

static CONTACT_LINK: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        r#"a[href*="contact"], a[href*="iletisim"], a[href*="iletişim"], a[href*="contact-us"]"#,
    )
    .unwrap()
});

/// What the pipeline keeps from the home page.
struct HomePage {
    data: ExtractionResult,
    text: String,
    contact_url: Option<String>,
}

/// Scrape a company site: home page, then at most one contact page whose
/// values take precedence. Never fails; problems yield partial or empty data.
pub async fn scrape(
    fetcher: &HtmlFetcher,
    config: &Config,
    url: &str,
    options: &ExtractorOptions,
) -> ExtractionResult {
    let Some(url) = normalize(url) else {
        log::warn!("Skipping scrape: empty website URL");
        return ExtractionResult::default();
    };
    log::info!("Scraping website: {}", url);

    let html = match fetcher.fetch(&url, config.home_timeout()).await {
        Ok(html) => html,
        Err(e) => {
            log::warn!("Failed to access {}: {}", url, e);
            return ExtractionResult::default();
        }
    };
    let home = read_home_page(&html, &url, options);

    let mut contact_data = ExtractionResult::default();
    let mut contact_text = None;

    // Only the first contact link is ever tried.
    if let Some(contact_url) = &home.contact_url {
        match fetcher.fetch(contact_url, config.contact_timeout()).await {
            Ok(contact_html) => {
                log::debug!("Fetched contact page {}", contact_url);
                let (data, text) = read_contact_page(&contact_html, options);
                contact_data = data;
                contact_text = Some(text);
            }
            Err(e) => log::error!("Error accessing contact page {}: {}", contact_url, e),
        }
    }

    // Home-page emails and phones are searched across both pages.
    let main_data = match contact_text {
        Some(contact_text) => {
            let pool = format!("{} {}", home.text, contact_text);
            ExtractionResult {
                emails: extract_emails(&pool, &options.email),
                phones: extract_phones(&pool, &options.phones),
                ..home.data
            }
        }
        None => home.data,
    };

    let merged = main_data.merge_preferring(contact_data);
    if merged.is_empty() {
        log::info!("No contact data found on {}", url);
    }
    merged
}

fn read_home_page(html: &str, url: &str, options: &ExtractorOptions) -> HomePage {
    let document = Html::parse_document(html);
    let text = page_text(&document);
    let data = extract_all(&document, &text, options);
    let contact_url = find_contact_link(&document, url);
    HomePage {
        data,
        text,
        contact_url,
    }
}

/// About text is taken from the home page only.
fn read_contact_page(html: &str, options: &ExtractorOptions) -> (ExtractionResult, String) {
    let document = Html::parse_document(html);
    let text = page_text(&document);
    let mut data = extract_all(&document, &text, options);
    data.about_text = None;
    (data, text)
}

/// Absolute URL of the first contact-style link on the page.
pub fn find_contact_link(document: &Html, page_url: &str) -> Option<String> {
    let href = document
        .select(&CONTACT_LINK)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())?;
    resolve_against_root(page_url, href)
}
