//! Compliance checks.
//!
//! A check evaluates one criterion on its own page and reports a [`Verdict`]
//! or a [`CheckError`]. The orchestrator owns everything around that call:
//! page lifecycle, deadline, cancellation and panic recovery.

pub mod cookie;
pub mod footer;
pub mod imprint;
pub mod newsletter;
pub mod preferences;
pub mod registry;
pub mod settings;

pub use registry::{CheckRegistry, CheckSpec, RegistryError};
pub use settings::{CheckSettings, FooterLinkRule, SelectorProfile};

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::conformity::ConformityEngine;
use crate::driver::{DriverError, Element, LinkChecker, Page, LinkError};
use crate::models::{ComplianceTarget, ErrorKind};

#[derive(Debug, Clone, Error)]
pub enum CheckError {
    #[error("navigation failed: {0}")]
    Navigation(String),

    /// A negative result rather than a fault: the page lacks the element
    #[error("{0}")]
    ElementNotFound(String),

    #[error("text extraction failed: {0}")]
    Extraction(String),

    #[error("comparison failed: {0}")]
    Comparison(String),

    #[error("check exceeded its {0:?} deadline")]
    Timeout(Duration),

    #[error("check cancelled before completion")]
    Cancelled,

    #[error("check panicked: {0}")]
    Panicked(String),
}

impl CheckError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CheckError::Navigation(_) => ErrorKind::Navigation,
            CheckError::ElementNotFound(_) => ErrorKind::ElementNotFound,
            CheckError::Extraction(_) => ErrorKind::Extraction,
            CheckError::Comparison(_) => ErrorKind::Comparison,
            CheckError::Timeout(_) => ErrorKind::Timeout,
            CheckError::Cancelled => ErrorKind::Cancelled,
            CheckError::Panicked(_) => ErrorKind::Panicked,
        }
    }
}

impl From<DriverError> for CheckError {
    fn from(err: DriverError) -> Self {
        match err {
            DriverError::Navigation { .. } | DriverError::Timeout(_) => {
                CheckError::Navigation(err.to_string())
            }
            DriverError::Detached(_) | DriverError::Protocol(_) => {
                CheckError::Extraction(err.to_string())
            }
        }
    }
}

impl From<LinkError> for CheckError {
    fn from(err: LinkError) -> Self {
        CheckError::Navigation(err.to_string())
    }
}

/// Result of a check that ran to completion
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub passed: bool,
    pub evidence: String,
}

impl Verdict {
    pub fn pass(evidence: impl Into<String>) -> Self {
        Self {
            passed: true,
            evidence: evidence.into(),
        }
    }

    pub fn fail(evidence: impl Into<String>) -> Self {
        Self {
            passed: false,
            evidence: evidence.into(),
        }
    }
}

/// Everything a check may touch during one run
pub struct CheckContext<'a> {
    pub target: &'a ComplianceTarget,
    /// Where the check starts: the target url, or a route override
    pub entry_url: &'a str,
    pub page: &'a dyn Page,
    pub engine: &'a ConformityEngine,
    pub links: &'a dyn LinkChecker,
    pub cancel: &'a CancellationToken,
}

impl CheckContext<'_> {
    /// Reference text for `key`, or a comparison error when absent/blank
    pub fn template(&self, key: &str) -> Result<&str, CheckError> {
        match self.target.template(key) {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(CheckError::Comparison(format!(
                "no reference template '{}' supplied",
                key
            ))),
        }
    }

    /// Bail out between steps once the run is cancelled
    pub fn ensure_active(&self) -> Result<(), CheckError> {
        if self.cancel.is_cancelled() {
            Err(CheckError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
pub trait Check: Send + Sync {
    async fn run(&self, ctx: &CheckContext<'_>) -> Result<Verdict, CheckError>;
}

// ============================================================================
// Page helpers shared by the standard checks
// ============================================================================

/// Load `url`, retrying on failure, then wait for network idleness.
///
/// An idle wait that times out is not an error: long-polling pages never go
/// idle, and the DOM is usable by then.
pub(crate) async fn open(page: &dyn Page, url: &str, settings: &CheckSettings) -> Result<(), CheckError> {
    let attempts = settings.navigation_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match tokio::time::timeout(settings.navigation_timeout(), page.navigate(url)).await {
            Ok(Ok(())) => {
                if let Err(e) = page.wait_idle(settings.idle_timeout()).await {
                    debug!("{} did not go idle: {}", url, e);
                }
                return Ok(());
            }
            Ok(Err(e)) => last_error = e.to_string(),
            Err(_) => {
                last_error = format!("page load exceeded {:?}", settings.navigation_timeout())
            }
        }
        debug!("Load attempt {}/{} for {} failed: {}", attempt, attempts, url, last_error);
    }

    Err(CheckError::Navigation(format!(
        "{} failed to load after {} attempts: {}",
        url, attempts, last_error
    )))
}

/// `query_all` that treats a selector the driver rejects as matching nothing
pub(crate) async fn query_all_lenient(page: &dyn Page, selector: &str) -> Vec<Box<dyn Element>> {
    match page.query_all(selector).await {
        Ok(elements) => elements,
        Err(e) => {
            debug!("Selector '{}' skipped: {}", selector, e);
            Vec::new()
        }
    }
}

pub(crate) async fn text_or_empty(element: &dyn Element) -> String {
    element.text().await.unwrap_or_default()
}

pub(crate) async fn attribute_or_empty(element: &dyn Element, name: &str) -> String {
    element.attribute(name).await.ok().flatten().unwrap_or_default()
}

/// Text, placeholder and aria-label of a control, space-joined
pub(crate) async fn control_text(element: &dyn Element) -> String {
    let parts = [
        text_or_empty(element).await,
        attribute_or_empty(element, "placeholder").await,
        attribute_or_empty(element, "aria-label").await,
    ];
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) async fn is_visible(element: &dyn Element) -> bool {
    element.is_visible().await.unwrap_or(false)
}

/// Absolute URL for a link target; scripts, mail and phone links yield `None`.
pub(crate) fn resolve_href(base: &str, href: &str) -> Option<String> {
    let href = href.trim();
    let lower = href.to_ascii_lowercase();
    if href.is_empty()
        || href.starts_with('#')
        || ["javascript:", "mailto:", "tel:"]
            .iter()
            .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }
    let mut url = Url::parse(base).ok()?.join(href).ok()?;
    url.set_fragment(None);
    Some(url.to_string())
}

/// Resolved `href` of every link on the page, in document order, deduplicated
pub(crate) async fn page_links(page: &dyn Page, selector: &str) -> Vec<String> {
    let base = match page.current_url().await {
        Ok(url) => url,
        Err(e) => {
            debug!("Current url unavailable: {}", e);
            return Vec::new();
        }
    };

    let mut links: Vec<String> = Vec::new();
    for element in query_all_lenient(page, selector).await {
        let href = attribute_or_empty(element.as_ref(), "href").await;
        if let Some(url) = resolve_href(&base, &href) {
            if !links.contains(&url) {
                links.push(url);
            }
        }
    }
    links
}

fn mentions_any(url: &str, keywords: &[String]) -> bool {
    let lower = url.to_lowercase();
    keywords.iter().any(|k| lower.contains(&k.to_lowercase()))
}

/// Links worth following for newsletter checks, capped at `max_followed_links`.
/// Legal pages are skipped even when they mention a newsletter keyword.
pub(crate) async fn newsletter_links(page: &dyn Page, settings: &CheckSettings) -> Vec<String> {
    page_links(page, &settings.selectors.links)
        .await
        .into_iter()
        .filter(|url| !mentions_any(url, &settings.newsletter_ignore_keywords))
        .filter(|url| mentions_any(url, &settings.newsletter_link_keywords))
        .take(settings.max_followed_links)
        .collect()
}
