use regex::Regex;
use std::collections::BTreeSet;

/// Run every pattern over `text` and keep candidates that reduce to a
/// 10-digit national number, formatted as `+90 XXX XXX XX XX`.
pub fn extract_phones(text: &str, patterns: &[Regex]) -> BTreeSet<String> {
    if text.is_empty() {
        return BTreeSet::new();
    }

    patterns
        .iter()
        .flat_map(|pattern| pattern.find_iter(text))
        .filter_map(|m| normalize_phone(m.as_str()))
        .collect()
}

/// Canonical display form of a raw phone match, or `None` if it does not
/// carry exactly ten significant digits.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let mut digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 10 {
        return None;
    }

    if digits.starts_with("90") && digits.len() >= 12 {
        digits.drain(..2);
    } else if digits.starts_with('0') {
        digits.drain(..1);
    }

    if digits.len() != 10 {
        return None;
    }

    Some(format!(
        "+90 {} {} {} {}",
        &digits[0..3],
        &digits[3..6],
        &digits[6..8],
        &digits[8..10]
    ))
}
