use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // A single punctuation mark, or a maximal run of anything that is neither
    // whitespace nor punctuation.
    static ref TOKEN: Regex = Regex::new(r"[.,:;!?]|[^\s.,:;!?]+").expect("valid regex");
}

/// Split text into tokens in left-to-right order. Whitespace separates
/// tokens; each of `. , : ; ! ?` is emitted as its own token.
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN.find_iter(text).map(|m| m.as_str().to_string()).collect()
}
