use serde::{Deserialize, Serialize};

use super::matcher::{OpTag, SequenceMatcher};
use super::normalize::word_key;

/// One line of word-level evidence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum DiffLine {
    /// Template words the website text lacks
    MissingFromWebsite(String),
    /// Website words the template does not contain
    ExtraOnWebsite(String),
}

impl std::fmt::Display for DiffLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiffLine::MissingFromWebsite(text) => write!(f, "Missing from website: {}", text),
            DiffLine::ExtraOnWebsite(text) => write!(f, "Extra on website: {}", text),
        }
    }
}

struct Word<'t> {
    surface: &'t str,
    key: String,
}

fn tokenize(text: &str) -> Vec<Word<'_>> {
    text.split_whitespace()
        .map(|surface| Word {
            surface,
            key: word_key(surface),
        })
        .filter(|w| !w.key.is_empty())
        .collect()
}

fn join(words: &[Word<'_>]) -> String {
    words
        .iter()
        .map(|w| w.surface)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Word diff of `template` against `actual`.
///
/// Words compare by their equality key (case and punctuation ignored) and are
/// reported in their surface form; each contiguous run becomes one line.
pub fn word_diff(template: &str, actual: &str) -> Vec<DiffLine> {
    let expected = tokenize(template);
    let found = tokenize(actual);
    let expected_keys: Vec<&str> = expected.iter().map(|w| w.key.as_str()).collect();
    let found_keys: Vec<&str> = found.iter().map(|w| w.key.as_str()).collect();

    let mut lines = Vec::new();
    for op in SequenceMatcher::new(&expected_keys, &found_keys).opcodes() {
        let missing = &expected[op.a_start..op.a_end];
        let extra = &found[op.b_start..op.b_end];
        match op.tag {
            OpTag::Equal => {}
            OpTag::Delete => lines.push(DiffLine::MissingFromWebsite(join(missing))),
            OpTag::Insert => lines.push(DiffLine::ExtraOnWebsite(join(extra))),
            OpTag::Replace => {
                lines.push(DiffLine::MissingFromWebsite(join(missing)));
                lines.push(DiffLine::ExtraOnWebsite(join(extra)));
            }
        }
    }
    lines
}
