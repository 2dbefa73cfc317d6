use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::text::{char_len, collapse_whitespace, element_text, text_excluding, title_name_fragment, truncate_chars};

const MIN_SECTION_LEN: usize = 50;
const LONG_SECTION_LEN: usize = 800;
const TRUNCATED_LEN: usize = 500;
const MAX_RELEVANT_SENTENCES: usize = 3;
const MIN_NAV_LINK_LEN: usize = 20;
const MIN_META_LEN: usize = 10;
const MIN_PARAGRAPH_LEN: usize = 100;
const THEME_WORDS: [&str; 5] = ["hakkında", "kuruluş", "tarih", "misyon", "vizyon"];

const SECTIONS: [(&str, Option<&str>); 11] = [
    (".about-us", None),
    (".about", None),
    (".hakkimizda", None),
    ("#about", None),
    ("#hakkimizda", None),
    (".kurumsal", None),
    ("section", Some("Hakkımızda")),
    ("div", Some("Hakkımızda")),
    ("div", Some("Hakkında")),
    ("div", Some("Kurumsal")),
    (r#"div[itemtype="http://schema.org/Organization"]"#, None),
];

static SECTION_SELECTORS: Lazy<Vec<(Selector, Option<&'static str>)>> = Lazy::new(|| {
    SECTIONS
        .iter()
        .map(|(css, needle)| (Selector::parse(css).unwrap(), *needle))
        .collect()
});

static CHROME: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        "nav, .menu, .navbar, .navigation, header, footer, .footer, .header, .sidebar, \
         ul.menu, .social-links, .contact-info, .copyright, form, iframe, script, style, noscript, \
         [class*=\"menu\"], [class*=\"nav\"], [class*=\"social\"], [id*=\"menu\"], [id*=\"nav\"], \
         [class*=\"button\"]",
    )
    .unwrap()
});
static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static META_DESCRIPTION: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());

static BOILERPLATE: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(Hakkımızda|About Us|Kurumsal)\W*",
        r"(Ana Sayfa|Home|Anasayfa)\W*",
        r"(İletişim|Contact|Bize Ulaşın)\W*",
        r"(Ürünler|Products|Ürünlerimiz)\W*",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// "About us" text: dedicated sections, then meta description, then a
/// paragraph naming the company. Never longer than 500 characters plus "...".
pub fn extract_about(document: &Html) -> Option<String> {
    find_about(document).map(bounded)
}

fn find_about(document: &Html) -> Option<String> {
    let name_fragment = title_name_fragment(document);

    for (selector, needle) in SECTION_SELECTORS.iter() {
        for element in document.select(selector) {
            if let Some(needle) = needle {
                if !element.text().any(|t| t.contains(needle)) {
                    continue;
                }
            }
            if let Some(text) = from_section(element, name_fragment.as_deref()) {
                return Some(text);
            }
        }
    }

    if let Some(content) = document
        .select(&META_DESCRIPTION)
        .filter_map(|meta| meta.value().attr("content"))
        .map(collapse_whitespace)
        .find(|c| char_len(c) > MIN_META_LEN)
    {
        return Some(content);
    }

    let fragment = name_fragment.filter(|f| char_len(f) > 3)?;
    document
        .select(&PARAGRAPH)
        .map(element_text)
        .find(|p| p.contains(&fragment) && char_len(p) > MIN_PARAGRAPH_LEN)
}

fn bounded(text: String) -> String {
    if char_len(&text) <= TRUNCATED_LEN {
        return text;
    }
    format!("{}...", truncate_chars(&text, TRUNCATED_LEN))
}

fn is_chrome(element: &ElementRef<'_>) -> bool {
    if CHROME.matches(element) {
        return true;
    }
    ANCHOR.matches(element) && char_len(&element_text(*element)) < MIN_NAV_LINK_LEN
}

fn from_section(element: ElementRef<'_>, name_fragment: Option<&str>) -> Option<String> {
    let text = text_excluding(element, is_chrome);
    if char_len(&text) <= MIN_SECTION_LEN {
        return None;
    }

    let mut text = text;
    for pattern in BOILERPLATE.iter() {
        text = pattern.replace_all(&text, "").into_owned();
    }
    let text = collapse_whitespace(&text);

    if char_len(&text) > LONG_SECTION_LEN {
        return Some(condense(&text, name_fragment));
    }
    Some(text)
}

/// Keep up to three sentences about the company itself, or the first 500
/// characters when none qualify.
fn condense(text: &str, name_fragment: Option<&str>) -> String {
    let name = name_fragment
        .map(|n| n.to_lowercase())
        .filter(|n| !n.is_empty());

    let relevant: Vec<&str> = text
        .split(". ")
        .filter(|sentence| {
            let lower = sentence.to_lowercase();
            name.as_deref().is_some_and(|n| lower.contains(n))
                || THEME_WORDS.iter().any(|w| lower.contains(w))
        })
        .take(MAX_RELEVANT_SENTENCES)
        .collect();

    if relevant.is_empty() {
        format!("{}...", truncate_chars(text, TRUNCATED_LEN))
    } else {
        format!("{}.", relevant.join(". "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filler(words: usize) -> String {
        vec!["lorem ipsum dolor"; words].join(" ")
    }

    #[test]
    fn about_section_without_navigation() {
        let html = Html::parse_document(
            r#"<html><body><section class="about-us">
                <h2>Hakkımızda</h2>
                <nav><a href="/">Anasayfa</a></nav>
                <p>1985 yılında kurulan firmamız endüstriyel makine üretiminde sektörün öncü kuruluşlarından biridir.</p>
                <a href="/iletisim">Bize yazın</a>
                <div class="social-icons"><a href="https://instagram.com/acme">instagram</a></div>
            </section></body></html>"#,
        );
        let about = extract_about(&html).unwrap();
        assert!(about.starts_with("1985 yılında kurulan firmamız"));
        assert!(!about.contains("Anasayfa"));
        assert!(!about.contains("Bize yazın"));
        assert!(!about.contains("instagram"));
    }

    #[test]
    fn long_section_keeps_relevant_sentences() {
        let body = format!(
            "{f}. Acme Makina 1985 yılında kuruldu. {f}. Misyonumuz kaliteli üretimdir. {f}. {f}. {f}",
            f = filler(12)
        );
        let html = Html::parse_document(&format!(
            "<html><head><title>Acme Makina - Anasayfa</title></head>\
             <body><div class='about'><p>{}</p></div></body></html>",
            body
        ));
        let about = extract_about(&html).unwrap();
        assert_eq!(
            about,
            "Acme Makina 1985 yılında kuruldu. Misyonumuz kaliteli üretimdir."
        );
    }

    #[test]
    fn long_section_without_matches_is_truncated() {
        let html = Html::parse_document(&format!(
            "<html><body><div class='about'><p>{}</p></div></body></html>",
            filler(60)
        ));
        let about = extract_about(&html).unwrap();
        assert!(about.ends_with("..."));
        assert_eq!(char_len(&about), TRUNCATED_LEN + 3);
    }

    #[test]
    fn single_long_relevant_sentence_is_capped() {
        let sentence = format!("Firmamızın misyonu {}", vec!["kaliteli üretim"; 160].join(" "));
        let html = Html::parse_document(&format!(
            "<html><body><div class='about'><p>{}</p></div></body></html>",
            sentence
        ));
        let about = extract_about(&html).unwrap();
        assert!(about.starts_with("Firmamızın misyonu kaliteli üretim"));
        assert!(about.ends_with("..."));
        assert_eq!(char_len(&about), TRUNCATED_LEN + 3);
    }

    #[test]
    fn long_meta_description_is_capped() {
        let content = vec!["vana"; 300].join(" ");
        let html = Html::parse_document(&format!(
            r#"<html><head><meta name="description" content="{}"></head><body></body></html>"#,
            content
        ));
        let about = extract_about(&html).unwrap();
        assert_eq!(char_len(&about), TRUNCATED_LEN + 3);
        assert!(content.starts_with(about.trim_end_matches("...")));
    }

    #[test]
    fn meta_description_fallback() {
        let html = Html::parse_document(
            r#"<html><head><meta name="description" content="Endüstriyel vana üreticisi"></head>
               <body><p>kısa</p></body></html>"#,
        );
        assert_eq!(extract_about(&html).as_deref(), Some("Endüstriyel vana üreticisi"));
    }

    #[test]
    fn paragraph_naming_company_fallback() {
        let sentence = "Delta Plastik olarak yirmi yılı aşkın süredir ambalaj sektöründe müşterilerimize yenilikçi çözümler sunuyoruz ve büyümeye devam ediyoruz.";
        let html = Html::parse_document(&format!(
            "<html><head><title>Delta Plastik - Ambalaj</title></head><body><p>Hoş geldiniz</p><p>{}</p></body></html>",
            sentence
        ));
        assert_eq!(extract_about(&html).as_deref(), Some(sentence));
    }

    #[test]
    fn nothing_found() {
        let html = Html::parse_document("<html><body><p>Merhaba</p></body></html>");
        assert_eq!(extract_about(&html), None);
    }
}
