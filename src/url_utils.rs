use url::Url;

/// Canonicalize a raw website string: trim, lower-case, default to `http://`.
///
/// Returns `None` for empty input. Reachability is not checked.
pub fn normalize(raw: &str) -> Option<String> {
    let url = raw.trim().to_lowercase();
    if url.is_empty() {
        return None;
    }

    if url.starts_with("http://") || url.starts_with("https://") {
        Some(url)
    } else {
        Some(format!("http://{}", url))
    }
}

/// Host component of a URL, subdomains included.
pub fn registrable_domain(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    parsed.host_str().map(|host| host.to_string())
}

/// Host with a leading `www.` removed, lower-cased.
pub fn bare_domain(url: &str) -> Option<String> {
    registrable_domain(url).map(|host| {
        let host = host.to_lowercase();
        host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
    })
}

/// Resolve an href found on `page_url` against the site root.
///
/// Absolute http(s) links pass through untouched.
pub fn resolve_against_root(page_url: &str, href: &str) -> Option<String> {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }

    let base = Url::parse(page_url).ok()?;
    if let Some(rest) = href.strip_prefix("//") {
        return Some(format!("{}://{}", base.scheme(), rest));
    }

    let path = format!("/{}", href.trim_start_matches('/'));
    base.join(&path).ok().map(|u| u.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_adds_scheme_and_lowercases() {
        assert_eq!(normalize("Example.COM").as_deref(), Some("http://example.com"));
        assert_eq!(
            normalize("https://Example.com/").as_deref(),
            Some("https://example.com/")
        );
        assert_eq!(normalize("  www.Firma.com.tr ").as_deref(), Some("http://www.firma.com.tr"));
    }

    #[test]
    fn normalize_rejects_empty() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("   "), None);
    }

    #[test]
    fn domain_keeps_subdomains() {
        assert_eq!(
            registrable_domain("https://shop.example.com.tr/a?b=c").as_deref(),
            Some("shop.example.com.tr")
        );
        assert_eq!(registrable_domain("not a url"), None);
        assert_eq!(bare_domain("http://www.acme.com/").as_deref(), Some("acme.com"));
    }

    #[test]
    fn contact_links_resolve_against_root() {
        assert_eq!(
            resolve_against_root("http://acme.com/tr/index.html", "iletisim").as_deref(),
            Some("http://acme.com/iletisim")
        );
        assert_eq!(
            resolve_against_root("http://acme.com/", "/contact-us").as_deref(),
            Some("http://acme.com/contact-us")
        );
        assert_eq!(
            resolve_against_root("http://acme.com/", "https://other.com/contact").as_deref(),
            Some("https://other.com/contact")
        );
        assert_eq!(
            resolve_against_root("https://acme.com/", "//cdn.acme.com/contact").as_deref(),
            Some("https://cdn.acme.com/contact")
        );
    }
}
