//! Heuristic affix stripper.
//!
//! Both tables are priority lists: the first entry (in table order) that
//! matches and leaves at least [`MIN_STEM_LEN`] characters is removed. At most
//! one prefix and one suffix are stripped per token, prefix first.

/// Prefixes in priority order.
pub const PREFIXES: &[&str] = &[
    "un", "re", "in", "im", "dis", "en", "non", "over", "mis", "sub", "pre", "inter", "fore", "de",
    "trans", "super", "semi", "anti", "mid", "under",
];

/// Suffixes in priority order.
pub const SUFFIXES: &[&str] = &[
    "ing", "ed", "ly", "es", "s", "ment", "ness", "ful", "less", "ation", "tion", "ity", "al", "er",
    "or", "ive", "ize", "ise", "y",
];

/// Shortest remainder an affix strip may leave behind.
pub const MIN_STEM_LEN: usize = 3;

#[inline]
fn leaves_enough(word: &str, affix: &str) -> bool {
    word.chars().count() >= affix.chars().count() + MIN_STEM_LEN
}

fn strip_prefix(word: &str) -> &str {
    PREFIXES
        .iter()
        .find_map(|p| word.strip_prefix(p).filter(|_| leaves_enough(word, p)))
        .unwrap_or(word)
}

fn strip_suffix(word: &str) -> &str {
    SUFFIXES
        .iter()
        .find_map(|s| word.strip_suffix(s).filter(|_| leaves_enough(word, s)))
        .unwrap_or(word)
}

pub fn stem(token: &str) -> String {
    strip_suffix(strip_prefix(token)).to_string()
}
