//! Name folding and decomposition
//!
//! Every comparison in the matcher happens on folded names: accents removed,
//! punctuation dropped, whitespace collapsed, lower-cased.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Characters that separate name tokens
///
/// Unicode whitespace plus the ASCII information separators U+001C..=U+001F,
/// which pasted spreadsheet exports use as field and record breaks.
pub fn is_name_space(c: char) -> bool {
    c.is_whitespace() || ('\u{1c}'..='\u{1f}').contains(&c)
}

/// Split on [`is_name_space`], skipping empty tokens
pub fn name_tokens(s: &str) -> impl DoubleEndedIterator<Item = &str> {
    s.split(is_name_space).filter(|t| !t.is_empty())
}

/// Fold a raw name into its comparison form
///
/// Keeps ASCII letters, hyphens and separators only. "Martin Ødegaard" loses
/// the "Ø" entirely since it has no decomposition; "Raúl Jiménez" becomes
/// "raul jimenez".
pub fn normalize(raw: &str) -> String {
    let kept: String = raw
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_ascii_alphabetic() || *c == '-' || is_name_space(*c))
        .collect();

    name_tokens(&kept)
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}

/// [`normalize`] for values that may be missing
pub fn normalize_opt(raw: Option<&str>) -> String {
    raw.map(normalize).unwrap_or_default()
}

/// Split a name into (first, last) tokens of its folded form
///
/// A single token is treated as a surname. Middle tokens are dropped.
pub fn split_parts(full_name: &str) -> (String, String) {
    let folded = normalize(full_name);
    let tokens: Vec<&str> = name_tokens(&folded).collect();

    match tokens.as_slice() {
        [] => (String::new(), String::new()),
        [only] => (String::new(), only.to_string()),
        [first, .., last] => (first.to_string(), last.to_string()),
    }
}

/// First character of the folded name, or empty
pub fn first_initial(name: &str) -> String {
    normalize(name).chars().next().map(String::from).unwrap_or_default()
}
