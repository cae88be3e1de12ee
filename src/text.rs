use regex::Regex;
use std::{borrow::Cow, sync::OnceLock};

fn citation_marker() -> &'static Regex {
    static CITATION: OnceLock<Regex> = OnceLock::new();
    CITATION.get_or_init(|| Regex::new("【.*?】").unwrap())
}

/// Removes file-search citation markers such as `【3:1†source】`, leaving the
/// surrounding text untouched.
pub fn strip_citations(text: &str) -> Cow<'_, str> {
    citation_marker().replace_all(text, "")
}

/// Joins a multi-line reply into one line by dropping `\r\n` and `\n`.
pub fn remove_newlines(text: &str) -> String {
    text.replace("\r\n", "").replace('\n', "")
}

/// `None` when the sum overflows `i64`.
pub fn add(a: i64, b: i64) -> Option<i64> {
    a.checked_add(b)
}
