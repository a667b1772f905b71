use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use super::cookie::{
    COOKIE_BANNER_LINKS, COOKIE_BANNER_TEXT, COOKIE_BANNER_VISIBILITY, COOKIE_SELECTION,
    CookieBannerLinks, CookieBannerText, CookieBannerVisibility, CookieSelection,
    REJECT_WITHOUT_CONSENT, RejectWithoutConsent,
};
use super::footer::{FOOTER_ESSENTIALS, FOOTER_LINK_HEALTH, FooterEssentials, FooterLinkHealth};
use super::imprint::{
    IMPRINT_HORIZONTAL, IMPRINT_LENGTH, IMPRINT_PRESENCE, ImprintHorizontal, ImprintLength,
    ImprintPresence,
};
use super::newsletter::{
    AGE_LIMITATION, AgeLimitation, CLEAR_CTA, ClearCta, NEWSLETTER_MORE_DETAILS, NEWSLETTER_WORDING,
    NewsletterMoreDetails, NewsletterWording,
};
use super::preferences::{
    COOKIE_PREFERENCE_ACCESSIBILITY, COOKIE_PREFERENCE_LINKS, COOKIE_PREFERENCE_MORE_INFO,
    PreferenceAccessibility, PreferenceCenterLinks, PreferenceMoreInfo,
};
use super::{Check, CheckSettings};
use crate::models::{COOKIE_POLICY_TEMPLATE, NEWSLETTER_CONSENT_TEMPLATE, NEWSLETTER_DETAILS_TEMPLATE};

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("check name cannot be empty")]
    EmptyName,
    #[error("check '{0}' is registered twice")]
    DuplicateName(String),
    #[error("check '{0}' has a zero timeout")]
    ZeroTimeout(String),
}

/// Registration of one criterion: what runs, how long it may take, and
/// which template it compares against.
#[derive(Clone)]
pub struct CheckSpec {
    name: String,
    description: String,
    check: Arc<dyn Check>,
    timeout: Option<Duration>,
    template_key: Option<String>,
}

impl std::fmt::Debug for CheckSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckSpec")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .field("template_key", &self.template_key)
            .finish_non_exhaustive()
    }
}

impl CheckSpec {
    pub fn new(name: impl Into<String>, check: impl Check + 'static) -> Self {
        Self::from_arc(name, Arc::new(check))
    }

    pub fn from_arc(name: impl Into<String>, check: Arc<dyn Check>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            check,
            timeout: None,
            template_key: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn requires_template(mut self, key: impl Into<String>) -> Self {
        self.template_key = Some(key.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn check(&self) -> Arc<dyn Check> {
        Arc::clone(&self.check)
    }

    /// Own deadline; `None` means the orchestrator default applies
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn template_key(&self) -> Option<&str> {
        self.template_key.as_deref()
    }
}

/// Ordered, validated set of checks. Outcomes of a run follow this order.
#[derive(Debug, Clone, Default)]
pub struct CheckRegistry {
    specs: Vec<CheckSpec>,
}

impl CheckRegistry {
    pub fn new(specs: Vec<CheckSpec>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for spec in &specs {
            if spec.name.trim().is_empty() {
                return Err(RegistryError::EmptyName);
            }
            if !seen.insert(spec.name.as_str()) {
                return Err(RegistryError::DuplicateName(spec.name.clone()));
            }
            if spec.timeout == Some(Duration::ZERO) {
                return Err(RegistryError::ZeroTimeout(spec.name.clone()));
            }
        }
        Ok(Self { specs })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// The full compliance catalogue, with deadlines sized from `settings`
    pub fn standard(settings: &CheckSettings) -> Self {
        let shared = Arc::new(settings.clone());
        let followed = u32::try_from(settings.max_followed_links)
            .unwrap_or(u32::MAX)
            .saturating_add(1);

        let specs = vec![
            CheckSpec::new(COOKIE_BANNER_VISIBILITY, CookieBannerVisibility::new(shared.clone()))
                .with_description("A visible cookie banner is shown on arrival")
                .with_timeout(settings.check_timeout(1)),
            CheckSpec::new(REJECT_WITHOUT_CONSENT, RejectWithoutConsent::new(shared.clone()))
                .with_description("The banner offers to continue without consent")
                .with_timeout(settings.check_timeout(1)),
            CheckSpec::new(COOKIE_SELECTION, CookieSelection::new(shared.clone()))
                .with_description("All cookie categories are offered and none is preselected")
                .with_timeout(settings.check_timeout(1)),
            CheckSpec::new(COOKIE_BANNER_TEXT, CookieBannerText::new(shared.clone()))
                .with_description("The banner wording matches the cookie policy template")
                .with_timeout(settings.check_timeout(1))
                .requires_template(COOKIE_POLICY_TEMPLATE),
            CheckSpec::new(COOKIE_BANNER_LINKS, CookieBannerLinks::new(shared.clone()))
                .with_description("The banner links to the imprint and the privacy policy")
                .with_timeout(settings.check_timeout(1)),
            CheckSpec::new(
                COOKIE_PREFERENCE_ACCESSIBILITY,
                PreferenceAccessibility::new(shared.clone()),
            )
            .with_description("The banner's settings control opens a preference center")
            .with_timeout(settings.check_timeout(1)),
            CheckSpec::new(COOKIE_PREFERENCE_LINKS, PreferenceCenterLinks::new(shared.clone()))
                .with_description("The preference center links to the imprint and the privacy policy")
                .with_timeout(settings.check_timeout(1)),
            CheckSpec::new(COOKIE_PREFERENCE_MORE_INFO, PreferenceMoreInfo::new(shared.clone()))
                .with_description("Cookie categories can be expanded for more information")
                .with_timeout(settings.check_timeout(1)),
            CheckSpec::new(CLEAR_CTA, ClearCta::new(shared.clone()))
                .with_description("The newsletter sign-up has a clear call to action")
                .with_timeout(settings.check_timeout(2)),
            CheckSpec::new(AGE_LIMITATION, AgeLimitation::new(shared.clone()))
                .with_description("The newsletter sign-up states an age restriction")
                .with_timeout(settings.check_timeout(followed)),
            CheckSpec::new(NEWSLETTER_WORDING, NewsletterWording::new(shared.clone()))
                .with_description("The consent checkbox wording matches the newsletter template")
                .with_timeout(settings.check_timeout(followed))
                .requires_template(NEWSLETTER_CONSENT_TEMPLATE),
            CheckSpec::new(NEWSLETTER_MORE_DETAILS, NewsletterMoreDetails::new(shared.clone()))
                .with_description("The text behind 'more details' matches the newsletter details template")
                .with_timeout(settings.check_timeout(2))
                .requires_template(NEWSLETTER_DETAILS_TEMPLATE),
            CheckSpec::new(FOOTER_ESSENTIALS, FooterEssentials::new(shared.clone()))
                .with_description("Footer links to imprint, privacy policy and cookie settings")
                .with_timeout(settings.check_timeout(1)),
            CheckSpec::new(FOOTER_LINK_HEALTH, FooterLinkHealth::new(shared.clone()))
                .with_description("Every footer link is reachable")
                .with_timeout(settings.check_timeout(2)),
            CheckSpec::new(IMPRINT_PRESENCE, ImprintPresence::new(shared.clone()))
                .with_description("An imprint page names the required details")
                .with_timeout(settings.check_timeout(2)),
            CheckSpec::new(IMPRINT_HORIZONTAL, ImprintHorizontal::new(shared.clone()))
                .with_description("The imprint page needs no horizontal scrolling")
                .with_timeout(settings.check_timeout(2)),
            CheckSpec::new(IMPRINT_LENGTH, ImprintLength::new(shared))
                .with_description("How many screens the imprint page spans")
                .with_timeout(settings.check_timeout(2)),
        ];

        Self { specs }
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CheckSpec> {
        self.specs.iter()
    }

    pub fn get(&self, name: &str) -> Option<&CheckSpec> {
        self.specs.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.name.as_str()).collect()
    }
}
