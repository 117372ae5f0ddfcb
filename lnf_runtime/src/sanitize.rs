//! Log sanitization.
//!
//! Anything that looks like a secret-bearing identifier is replaced by a
//! mask of the form `first>len=N<last`. Known identifier prefixes stay
//! readable so log lines still show which kind of identifier was involved.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::models::identifiers::IDENTIFIER_PREFIXES;

static SENSITIVE_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"\b([a-fA-F0-9]{8,}|[A-Za-z0-9\-_]{12,}|eyJ[A-Za-z0-9\-_]{20,})\b").ok()
});

fn mask(word: &str) -> String {
    let chars: Vec<char> = word.chars().collect();
    match (chars.first(), chars.last()) {
        (Some(first), Some(last)) => format!("{}>len={}<{}", first, chars.len(), last),
        _ => word.to_string(),
    }
}

fn mask_word(word: &str) -> String {
    for prefix in IDENTIFIER_PREFIXES {
        if let Some(suffix) = word.strip_prefix(prefix) {
            if suffix.chars().count() > 3 {
                return format!("{}{}", prefix, mask(suffix));
            }
            return word.to_string();
        }
    }
    if word.chars().count() < 4 {
        return word.to_string();
    }
    mask(word)
}

/// Mask hex strings, long url-safe tokens and JWT-looking values in `text`.
pub fn mask_sensitive(text: &str) -> String {
    match SENSITIVE_PATTERN.as_ref() {
        Some(re) => re
            .replace_all(text, |caps: &Captures| mask_word(&caps[0]))
            .into_owned(),
        None => text.to_string(),
    }
}
