use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static NON_CONTENT: Lazy<Selector> = Lazy::new(|| Selector::parse("script, style, noscript").unwrap());

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Visible text of the whole document, one space between text nodes.
pub fn page_text(document: &Html) -> String {
    let mut parts = Vec::new();
    collect_text(document.root_element(), &mut parts, &|el| NON_CONTENT.matches(el));
    parts.join(" ")
}

/// Whitespace-collapsed text of an element.
pub fn element_text(element: ElementRef<'_>) -> String {
    text_excluding(element, |el| NON_CONTENT.matches(el))
}

/// Text of `element` with every descendant for which `skip` holds left out.
pub fn text_excluding<F>(element: ElementRef<'_>, skip: F) -> String
where
    F: Fn(&ElementRef<'_>) -> bool,
{
    let mut parts = Vec::new();
    collect_text(element, &mut parts, &skip);
    collapse_whitespace(&parts.join(" "))
}

fn collect_text<'a>(
    element: ElementRef<'a>,
    out: &mut Vec<&'a str>,
    skip: &dyn Fn(&ElementRef<'_>) -> bool,
) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let text: &str = text;
            if !text.trim().is_empty() {
                out.push(text);
            }
        } else if let Some(child_el) = ElementRef::wrap(child) {
            if !skip(&child_el) {
                collect_text(child_el, out, skip);
            }
        }
    }
}

pub fn title(document: &Html) -> Option<String> {
    document
        .select(&TITLE)
        .next()
        .map(|el| collapse_whitespace(&el.text().collect::<String>()))
        .filter(|t| !t.is_empty())
}

/// Leading segment of the page title, usually the company name.
pub fn title_name_fragment(document: &Html) -> Option<String> {
    title(document)
        .and_then(|t| t.split('-').next().map(|s| s.trim().to_string()))
        .filter(|s| !s.is_empty())
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
