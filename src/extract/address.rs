//! Postal address heuristics: structured data first, then a cascade of
//! contact-ish elements.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use super::text::{char_len, collapse_whitespace, element_text};

const ADDRESS_KEYS: [&str; 4] = ["streetAddress", "addressLocality", "addressRegion", "postalCode"];
const STREET_KEYWORDS: [&str; 6] = ["mahalle", "cadde", "sokak", "mah.", "cad.", "sok."];

static LD_JSON: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());

static LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)adres|adress|address").unwrap());
static LABEL_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^.*(?:adres|adress|address)[^:]*:").unwrap());
static LEADING_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^adres[^:]*:\s*").unwrap());
static POSTAL_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\d{5}\b").unwrap());
static MAJOR_CITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(İstanbul|Istanbul|Ankara|İzmir|Izmir|Antalya|Bursa)\b").unwrap()
});
static CONTACT_TAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(tel|telefon|phone|e-mail|email|mail|fax)[^:]*:.*").unwrap()
});

/// Element cascade, in priority order. Entries with a needle only accept
/// elements whose text contains it.
const TARGETS: [(&str, Option<&str>); 17] = [
    ("address", None),
    (".address", None),
    (".contact-address", None),
    (".footer-address", None),
    (r#"div[itemtype="http://schema.org/PostalAddress"]"#, None),
    (r#"div[itemprop="address"]"#, None),
    ("p", Some("Adres")),
    ("div", Some("Adres")),
    ("li", Some("Adres")),
    (".address-info", None),
    (".contact-info", None),
    (".iletisim", None),
    ("#iletisim", None),
    (".iletişim", None),
    ("#iletişim", None),
    (".footer-contact", None),
    (".footer li", Some("Adres")),
];

static TARGET_SELECTORS: Lazy<Vec<(Selector, Option<&'static str>)>> = Lazy::new(|| {
    TARGETS
        .iter()
        .filter_map(|(css, needle)| match Selector::parse(css) {
            Ok(selector) => Some((selector, *needle)),
            Err(e) => {
                log::debug!("Skipping address selector {}: {:?}", css, e);
                None
            }
        })
        .collect()
});

pub fn extract_address(document: &Html) -> Option<String> {
    if let Some(address) = from_structured_data(document) {
        return Some(address);
    }

    for (selector, needle) in TARGET_SELECTORS.iter() {
        for element in document.select(selector) {
            if let Some(needle) = needle {
                if !element.text().any(|t| t.contains(needle)) {
                    continue;
                }
            }
            if let Some(address) = from_element(element) {
                return Some(address);
            }
        }
    }

    None
}

/// `address` objects inside JSON-LD blocks, components joined by spaces.
fn from_structured_data(document: &Html) -> Option<String> {
    for script in document.select(&LD_JSON) {
        let raw: String = script.text().collect();
        let lower = raw.to_lowercase();
        if !lower.contains("address") {
            continue;
        }

        match serde_json::from_str::<Value>(raw.trim()) {
            Ok(value) => {
                if let Some(address) = find_address(&value) {
                    return Some(address);
                }
            }
            Err(e) => log::debug!("Error parsing JSON-LD address data: {}", e),
        }
    }
    None
}

fn find_address(value: &Value) -> Option<String> {
    match value {
        Value::Array(items) => items.iter().find_map(find_address),
        Value::Object(map) => {
            if let Some(address) = map.get("address") {
                let joined = match address {
                    Value::Object(parts) => ADDRESS_KEYS
                        .iter()
                        .filter_map(|key| parts.get(*key))
                        .filter_map(scalar_text)
                        .collect::<Vec<_>>()
                        .join(" "),
                    Value::String(s) => s.trim().to_string(),
                    _ => String::new(),
                };
                if !joined.is_empty() {
                    return Some(joined);
                }
            }
            map.get("@graph").and_then(find_address)
        }
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn from_element(element: ElementRef<'_>) -> Option<String> {
    if let Some(address) = after_label(element) {
        return Some(address);
    }

    let text = element_text(element);

    if POSTAL_CODE.is_match(&text) || MAJOR_CITY.is_match(&text) {
        let cleaned = LEADING_LABEL.replace(&text, "");
        let cleaned = CONTACT_TAIL.replace(&cleaned, "");
        let cleaned = cleaned.trim();
        let len = char_len(cleaned);
        if len > 10 && len < 200 {
            return Some(cleaned.to_string());
        }
    }

    let lower = text.to_lowercase();
    let len = char_len(&text);
    if STREET_KEYWORDS.iter().any(|k| lower.contains(k)) && len > 15 && len < 200 {
        return Some(text);
    }

    None
}

/// Text following an explicit "Adres" label inside `element`.
fn after_label(element: ElementRef<'_>) -> Option<String> {
    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        if !LABEL.is_match(text) {
            continue;
        }
        let Some(parent) = node.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        if matches!(parent.value().name(), "script" | "style") {
            continue;
        }

        let siblings: Vec<String> = parent
            .next_siblings()
            .filter_map(|sibling| {
                if let Some(t) = sibling.value().as_text() {
                    Some(collapse_whitespace(t))
                } else {
                    ElementRef::wrap(sibling).map(element_text)
                }
            })
            .filter(|t| !t.is_empty())
            .collect();

        if !siblings.is_empty() {
            if let Some(found) = siblings.into_iter().find(|t| char_len(t) > 10) {
                return Some(found);
            }
            continue;
        }

        let full = element_text(parent);
        let stripped = LABEL_PREFIX.replace(&full, "");
        if stripped != full {
            let stripped = stripped.trim();
            if !stripped.is_empty() {
                return Some(stripped.to_string());
            }
        }
    }
    None
}
