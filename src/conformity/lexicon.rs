use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use tracing::debug;

/// Legal and consent vocabulary missing from general-purpose German word lists
pub const LEGAL_TERMS: &[&str] = &[
    "Drittunternehmen",
    "Einwilligungsbedürftige",
    "Datenschutzerklärung",
    "Rechtsgrundlagen",
    "Einwilligung",
    "Zweck",
    "ID",
    "Datenschutzinformationen",
    "zuzuschneiden",
    "Onlineangeboten",
    "Marketingbemühungen",
    "Auswertungsmöglichkeiten",
    "Schaltfläche",
    "Überwachungszwecken",
    "Rechtsbehelfsmöglichkeiten",
];

/// Bundled German vocabulary: words with umlauts or sharp s in their common
/// inflected forms, one per line.
pub const GERMAN_WORDS: &str = include_str!("german_words.txt");

/// Known-word dictionary for spelling-anomaly detection.
///
/// Plain word lists are matched case-insensitively. A hunspell dictionary
/// (`.aff` + `.dic`) additionally accepts every form its affix rules derive.
#[derive(Clone, Default)]
pub struct Lexicon {
    words: HashSet<String>,
    hunspell: Option<Arc<spellbook::Dictionary>>,
}

impl fmt::Debug for Lexicon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lexicon")
            .field("words", &self.words.len())
            .field("hunspell", &self.hunspell.is_some())
            .finish()
    }
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lexicon seeded with [`LEGAL_TERMS`]
    pub fn with_legal_terms() -> Self {
        let mut lexicon = Self::new();
        lexicon.extend(LEGAL_TERMS.iter().copied());
        lexicon
    }

    /// Lexicon seeded with [`GERMAN_WORDS`] and [`LEGAL_TERMS`]
    pub fn german() -> Self {
        let mut lexicon = Self::from_word_list(GERMAN_WORDS);
        lexicon.extend(LEGAL_TERMS.iter().copied());
        lexicon
    }

    /// Parse a word list: one word per line. A leading entry count and
    /// `/FLAGS` suffixes (hunspell `.dic` without its `.aff`) are tolerated,
    /// but only the stems are known then. Blank lines and `#` comments are
    /// skipped.
    pub fn from_word_list(content: &str) -> Self {
        let mut lexicon = Self::new();
        let has_count_header = content.lines().next().is_some_and(|first| {
            let first = first.trim();
            !first.is_empty() && first.chars().all(|c| c.is_ascii_digit())
        });

        for line in content.lines().skip(usize::from(has_count_header)) {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let word = line.split('/').next().unwrap_or(line).trim();
            lexicon.insert(word);
        }

        lexicon
    }

    /// Build from hunspell affix and dictionary sources
    pub fn from_hunspell(aff: &str, dic: &str) -> Result<Self> {
        let dictionary = spellbook::Dictionary::new(aff, dic)
            .map_err(|e| anyhow!("Failed to parse hunspell dictionary: {}", e))?;
        Ok(Self {
            words: HashSet::new(),
            hunspell: Some(Arc::new(dictionary)),
        })
    }

    /// Load a dictionary file. A `.dic` with a sibling `.aff` is read as a
    /// hunspell dictionary, anything else as a word list.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read word list: {:?}", path))?;

        let aff_path = path.with_extension("aff");
        let is_dic = path.extension().is_some_and(|ext| ext == "dic");
        if is_dic && aff_path.exists() {
            let aff = std::fs::read_to_string(&aff_path)
                .with_context(|| format!("Failed to read affix file: {:?}", aff_path))?;
            let lexicon = Self::from_hunspell(&aff, &content)
                .with_context(|| format!("Invalid hunspell dictionary: {:?}", path))?;
            debug!("Loaded hunspell dictionary {:?}", path);
            return Ok(lexicon);
        }

        let lexicon = Self::from_word_list(&content);
        debug!("Loaded {} words from {:?}", lexicon.len(), path);
        Ok(lexicon)
    }

    pub fn insert(&mut self, word: &str) {
        if !word.is_empty() {
            self.words.insert(word.to_lowercase());
        }
    }

    pub fn extend<'w, I>(&mut self, words: I)
    where
        I: IntoIterator<Item = &'w str>,
    {
        for word in words {
            self.insert(word);
        }
    }

    /// Merge another lexicon's words; its hunspell dictionary is taken when
    /// this one has none.
    pub fn merge(&mut self, other: Lexicon) {
        self.words.extend(other.words);
        if self.hunspell.is_none() {
            self.hunspell = other.hunspell;
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        if self.words.contains(&word.to_lowercase()) {
            return true;
        }
        self.hunspell
            .as_ref()
            .is_some_and(|dictionary| dictionary.check(word))
    }

    /// Number of listed words (hunspell entries are not counted)
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.hunspell.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const AFF: &str = "SET UTF-8\n\nSFX N Y 2\nSFX N 0 e .\nSFX N 0 en .\n";
    const DIC: &str = "2\nGerät/N\nüber\n";

    #[test]
    fn test_lookup_is_case_insensitive() {
        let lexicon = Lexicon::with_legal_terms();
        assert!(lexicon.contains("datenschutzerklärung"));
        assert!(lexicon.contains("SCHALTFLÄCHE"));
        assert!(!lexicon.contains("Datenschutzerklaerung"));
    }

    #[test]
    fn test_dic_without_affixes_keeps_stems() {
        let lexicon = Lexicon::from_word_list("3\nGerät/SN\nfür\n# comment\n\nÄnderung/P\n");
        assert_eq!(lexicon.len(), 3);
        assert!(lexicon.contains("gerät"));
        assert!(lexicon.contains("Änderung"));
        assert!(!lexicon.contains("3"));
    }

    #[test]
    fn test_plain_word_list() {
        let lexicon = Lexicon::from_word_list("Webseite\nverwenden\n");
        assert!(lexicon.contains("webseite"));
        assert!(lexicon.contains("Verwenden"));
    }

    #[test]
    fn test_hunspell_accepts_inflected_forms() {
        let lexicon = Lexicon::from_hunspell(AFF, DIC).unwrap();
        assert!(lexicon.contains("Gerät"));
        assert!(lexicon.contains("Geräte"));
        assert!(lexicon.contains("Geräten"));
        assert!(lexicon.contains("über"));
        assert!(!lexicon.contains("Gerätü"));
        assert!(!lexicon.is_empty());
    }

    #[test]
    fn test_load_dic_with_sibling_aff_uses_affix_rules() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("de.aff"), AFF).unwrap();
        std::fs::write(dir.path().join("de.dic"), DIC).unwrap();

        let lexicon = Lexicon::load(&dir.path().join("de.dic")).unwrap();
        assert!(lexicon.contains("Geräte"));
    }

    #[test]
    fn test_bundled_german_words() {
        let lexicon = Lexicon::german();
        assert!(lexicon.contains("Gerät"));
        assert!(lexicon.contains("können"));
        assert!(lexicon.contains("Einwilligungsbedürftige"));
        assert!(!lexicon.contains("kömnen"));
    }

    #[test]
    fn test_merge_keeps_both_sources() {
        let mut lexicon = Lexicon::with_legal_terms();
        lexicon.merge(Lexicon::from_hunspell(AFF, DIC).unwrap());
        assert!(lexicon.contains("Schaltfläche"));
        assert!(lexicon.contains("Geräten"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "nachträglich").unwrap();
        let lexicon = Lexicon::load(file.path()).unwrap();
        assert!(lexicon.contains("Nachträglich"));
    }

    #[test]
    fn test_load_missing_file_errors() {
        assert!(Lexicon::load(Path::new("/nonexistent/words.dic")).is_err());
    }
}
