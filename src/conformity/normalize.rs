//! Text normalization for comparisons.
//!
//! Two flavours are used: similarity scoring only folds case and whitespace
//! (word order and punctuation still count), equality checks additionally drop
//! everything outside the alphanumeric class (diacritics are alphanumeric).

use once_cell::sync::Lazy;
use regex::Regex;

static WORD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{L}+").expect("letter-run pattern is valid"));

/// Lower-case and collapse whitespace runs to single spaces.
pub fn for_similarity(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lower-case, strip non-alphanumeric characters, collapse whitespace.
pub fn for_equality(text: &str) -> String {
    let stripped: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    for_similarity(&stripped)
}

/// Equality key of a single word ("Cookies." -> "cookies")
pub fn word_key(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Letter runs of `text`, in order ("Cookie-Einstellungen" yields two words)
pub fn words(text: &str) -> impl Iterator<Item = &str> {
    WORD_PATTERN.find_iter(text).map(|m| m.as_str())
}

/// Whether `needle` occurs in `haystack` as whole words, after equality
/// normalization of both.
pub fn contains_phrase(haystack: &str, needle: &str) -> bool {
    let needle = for_equality(needle);
    if needle.is_empty() {
        return false;
    }
    let haystack = format!(" {} ", for_equality(haystack));
    haystack.contains(&format!(" {} ", needle))
}
