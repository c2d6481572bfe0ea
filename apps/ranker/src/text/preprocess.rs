use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Anything outside letters, digits, whitespace and `. + # -`.
/// Those four survive so tokens like `C++`, `C#` and `Node.js` stay matchable.
static DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9\s.+#\-]").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Cleans noisy PDF/CSV text before skill extraction.
///
/// Steps: NFKD normalization, drop non-ASCII, tabs and NBSP to spaces,
/// disallowed punctuation to spaces, collapse whitespace, trim, lowercase.
pub fn preprocess(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let ascii: String = text
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '\t' { ' ' } else { c })
        .collect();

    let stripped = DISALLOWED.replace_all(&ascii, " ");
    let collapsed = WHITESPACE.replace_all(&stripped, " ");
    collapsed.trim().to_lowercase()
}
