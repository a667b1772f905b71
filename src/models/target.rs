use std::collections::BTreeMap;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TargetError {
    #[error("target url cannot be empty")]
    EmptyUrl,
    #[error("invalid target url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Input to a run: the site under audit plus the reference texts its
/// checks compare against.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceTarget {
    url: String,
    #[serde(default)]
    templates: BTreeMap<String, String>,
}

impl ComplianceTarget {
    /// Build a target, prepending `https://` when the scheme is missing.
    pub fn new(url: impl AsRef<str>) -> Result<Self, TargetError> {
        Ok(Self {
            url: normalize_url(url.as_ref())?,
            templates: BTreeMap::new(),
        })
    }

    pub fn with_template(mut self, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.templates.insert(key.into(), text.into());
        self
    }

    /// Add every template not already present (caller-supplied texts win)
    pub fn with_default_templates<'a, I>(mut self, defaults: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (key, text) in defaults {
            self.templates
                .entry(key.clone())
                .or_insert_with(|| text.clone());
        }
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn template(&self, key: &str) -> Option<&str> {
        self.templates.get(key).map(String::as_str)
    }

    pub fn templates(&self) -> &BTreeMap<String, String> {
        &self.templates
    }

    /// Host part of the url, used for naming report files
    pub fn host(&self) -> Option<String> {
        Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(String::from))
    }
}

/// Trim, default the scheme to https, and validate.
pub fn normalize_url(raw: &str) -> Result<String, TargetError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(TargetError::EmptyUrl);
    }

    let lower = trimmed.to_ascii_lowercase();
    let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = Url::parse(&candidate).map_err(|e| TargetError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if parsed.host_str().is_none() {
        return Err(TargetError::InvalidUrl {
            url: raw.to_string(),
            reason: "missing host".to_string(),
        });
    }

    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{COOKIE_POLICY_TEMPLATE, NEWSLETTER_CONSENT_TEMPLATE};

    #[test]
    fn test_scheme_is_prepended() {
        let target = ComplianceTarget::new("lorealparis.de").unwrap();
        assert_eq!(target.url(), "https://lorealparis.de");
    }

    #[test]
    fn test_existing_scheme_is_kept() {
        let target = ComplianceTarget::new("  http://example.com/shop ").unwrap();
        assert_eq!(target.url(), "http://example.com/shop");
        assert_eq!(target.host().as_deref(), Some("example.com"));
    }

    #[test]
    fn test_empty_url_rejected() {
        assert_eq!(ComplianceTarget::new("   "), Err(TargetError::EmptyUrl));
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(matches!(
            ComplianceTarget::new("https://"),
            Err(TargetError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_caller_templates_win_over_defaults() {
        let mut defaults = BTreeMap::new();
        defaults.insert(COOKIE_POLICY_TEMPLATE.to_string(), "default".to_string());
        defaults.insert(NEWSLETTER_CONSENT_TEMPLATE.to_string(), "newsletter".to_string());

        let target = ComplianceTarget::new("example.com")
            .unwrap()
            .with_template(COOKIE_POLICY_TEMPLATE, "custom")
            .with_default_templates(&defaults);

        assert_eq!(target.template(COOKIE_POLICY_TEMPLATE), Some("custom"));
        assert_eq!(target.template(NEWSLETTER_CONSENT_TEMPLATE), Some("newsletter"));
        assert_eq!(target.template("impressum"), None);
    }
}
