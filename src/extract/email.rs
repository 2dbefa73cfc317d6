use regex::Regex;
use std::collections::BTreeSet;

/// All matches of `pattern` in `text`, deduplicated.
pub fn extract_emails(text: &str, pattern: &Regex) -> BTreeSet<String> {
    if text.is_empty() {
        return BTreeSet::new();
    }

    pattern
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .filter(|m| !m.is_empty())
        .collect()
}
