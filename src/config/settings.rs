use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::checks::CheckSettings;
use crate::models::{ComplianceTarget, default_templates};
use crate::orchestrator::{OrchestratorConfig, RouteRule};

/// Main audit configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    pub orchestrator: OrchestratorConfig,
    pub conformity: ConformityConfig,
    pub checks: CheckSettings,
    /// Per-site navigation overrides, first match wins
    pub routes: Vec<RouteRule>,
    /// Reference texts used when the caller supplies none for a key; the
    /// built-in texts fill whatever is still missing
    pub templates: BTreeMap<String, String>,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConformityConfig {
    /// Word list for spelling checks (hunspell .dic or one word per line)
    pub dictionary_path: Option<PathBuf>,
    /// Additional known words
    pub extra_words: Vec<String>,
    /// Add the built-in legal vocabulary
    pub include_legal_terms: bool,
    /// Add the bundled German word list
    pub include_german_words: bool,
}

impl Default for ConformityConfig {
    fn default() -> Self {
        Self {
            dictionary_path: None,
            extra_words: Vec::new(),
            include_legal_terms: true,
            include_german_words: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for JSON reports
    pub reports_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            reports_dir: PathBuf::from("./reports"),
        }
    }
}

impl AuditConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: AuditConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        Ok(config)
    }

    /// Load configuration, falling back to the default location and then to
    /// built-in defaults if no file exists
    pub fn load_or_default(path: Option<&PathBuf>) -> anyhow::Result<Self> {
        match path {
            Some(p) if p.exists() => Self::from_file(p),
            Some(p) => anyhow::bail!("Config file not found: {:?}", p),
            None => match default_config_path() {
                Some(p) if p.exists() => Self::from_file(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Target for `url` carrying the configured templates, then the
    /// built-in ones, as defaults
    pub fn target(&self, url: &str) -> anyhow::Result<ComplianceTarget> {
        let target = ComplianceTarget::new(url)
            .with_context(|| format!("Invalid target url: {}", url))?;
        Ok(target
            .with_default_templates(&self.templates)
            .with_default_templates(&default_templates()))
    }
}

/// `<config dir>/site-conformity/config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("site-conformity").join("config.yaml"))
}
