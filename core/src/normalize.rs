use lazy_static::lazy_static;
use regex::Regex;

/// Punctuation marks that survive normalization and become standalone tokens.
pub const PUNCTUATION: [char; 6] = ['.', ',', ':', ';', '!', '?'];

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("valid regex");
}

#[inline]
pub fn is_punctuation(c: char) -> bool {
    PUNCTUATION.contains(&c)
}

/// Trim, lowercase, drop everything except alphanumerics, whitespace and
/// [`PUNCTUATION`], then collapse whitespace runs to a single space.
pub fn normalize(text: &str) -> String {
    let kept: String = text
        .trim()
        .to_lowercase()
        .chars()
        .filter(|&c| c.is_alphanumeric() || c.is_whitespace() || is_punctuation(c))
        .collect();
    WHITESPACE.replace_all(&kept, " ").into_owned()
}
