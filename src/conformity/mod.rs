//! Text-Conformity Engine.
//!
//! Compares a scraped text fragment against a reference template:
//!
//! - `normalize`: case/whitespace folding and equality keys
//! - `matcher`: Ratcliff/Obershelp block matching (similarity + diff)
//! - `diff`: word-level "missing"/"extra" evidence
//! - `lexicon`: known words for spelling-anomaly detection
//!
//! Nothing here touches the network; a comparison never fails; unusable
//! input yields a zero-similarity result with explanatory evidence.

mod diff;
pub mod lexicon;
pub mod matcher;
pub mod normalize;

pub use diff::{DiffLine, word_diff};
pub use lexicon::{GERMAN_WORDS, LEGAL_TERMS, Lexicon};

use std::collections::BTreeSet;
use std::fmt::Write as _;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::ConformityConfig;

/// Evidence string for an empty/unextractable fragment
pub const NO_COMPARABLE_TEXT: &str = "No comparable text: the website text is empty or could not be extracted";
/// Evidence string for an empty template
pub const NO_TEMPLATE_TEXT: &str = "No comparable text: the reference template is empty";

/// Outcome of one template comparison. Recomputed on every call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextComparisonResult {
    /// Block-matching similarity, 0.0 - 100.0
    pub similarity_percent: f64,
    /// Exact match and no flagged words
    pub conform: bool,
    pub diff: Vec<DiffLine>,
    /// Probable misspellings found in the website text
    pub misspelled_words: BTreeSet<String>,
    /// Set when the comparison could not be performed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TextComparisonResult {
    fn not_comparable(note: &str) -> Self {
        Self {
            similarity_percent: 0.0,
            conform: false,
            diff: Vec::new(),
            misspelled_words: BTreeSet::new(),
            note: Some(note.to_string()),
        }
    }

    /// Whether a comparison actually took place
    pub fn is_comparable(&self) -> bool {
        self.note.is_none()
    }

    /// Human-readable evidence: similarity, differences, flagged words
    pub fn evidence(&self) -> String {
        let mut out = String::new();
        if let Some(note) = &self.note {
            let _ = writeln!(out, "{}", note);
        }
        let _ = writeln!(out, "Similarity: {:.2}%", self.similarity_percent);

        if self.is_comparable() {
            if self.diff.is_empty() {
                let _ = writeln!(out, "Differences: none");
            } else {
                let _ = writeln!(out, "Differences:");
                for line in &self.diff {
                    let _ = writeln!(out, "- {}", line);
                }
            }

            if self.misspelled_words.is_empty() {
                let _ = writeln!(out, "No spelling anomalies found in the website text");
            } else {
                let _ = writeln!(out, "Probable spelling mistakes in the website text:");
                for word in &self.misspelled_words {
                    let _ = writeln!(out, "- {}", word);
                }
            }
        }

        out.trim_end().to_string()
    }
}

/// Scores website text against reference templates
#[derive(Debug, Clone, Default)]
pub struct ConformityEngine {
    lexicon: Lexicon,
}

impl ConformityEngine {
    pub fn new(lexicon: Lexicon) -> Self {
        Self { lexicon }
    }

    /// Build the engine from configuration: the configured dictionary, then
    /// the bundled vocabularies that are switched on, then extra words.
    pub fn from_config(config: &ConformityConfig) -> Result<Self> {
        let mut lexicon = match &config.dictionary_path {
            Some(path) => Lexicon::load(path)?,
            None => Lexicon::new(),
        };
        if config.include_german_words {
            lexicon.merge(Lexicon::from_word_list(GERMAN_WORDS));
        }
        if config.include_legal_terms {
            lexicon.extend(LEGAL_TERMS.iter().copied());
        }
        lexicon.extend(config.extra_words.iter().map(String::as_str));
        Ok(Self::new(lexicon))
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    /// Similarity of two fragments as a percentage (case/whitespace folded)
    pub fn similarity(&self, template: &str, actual: &str) -> f64 {
        matcher::char_ratio(
            &normalize::for_similarity(template),
            &normalize::for_similarity(actual),
        ) * 100.0
    }

    /// Words of `actual` that look like misspellings.
    ///
    /// Only words carrying a non-ASCII letter, or already known to the
    /// lexicon, are candidates; brand names, numbers and punctuation never
    /// are. A candidate is flagged when the lexicon does not know it.
    pub fn misspelled_words(&self, actual: &str) -> BTreeSet<String> {
        normalize::words(actual)
            .filter(|w| !w.is_ascii() || self.lexicon.contains(w))
            .filter(|w| !self.lexicon.contains(w))
            .map(String::from)
            .collect()
    }

    pub fn compare(&self, template: &str, actual: &str) -> TextComparisonResult {
        if actual.trim().is_empty() {
            return TextComparisonResult::not_comparable(NO_COMPARABLE_TEXT);
        }
        if template.trim().is_empty() {
            return TextComparisonResult::not_comparable(NO_TEMPLATE_TEXT);
        }

        let similarity_percent = self.similarity(template, actual);
        let misspelled_words = self.misspelled_words(actual);
        let conform = similarity_percent >= 100.0 && misspelled_words.is_empty();

        TextComparisonResult {
            similarity_percent,
            conform,
            diff: word_diff(template, actual),
            misspelled_words,
            note: None,
        }
    }
}
