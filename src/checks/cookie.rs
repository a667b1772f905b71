//! Cookie banner criteria.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{
    Check, CheckContext, CheckError, CheckSettings, Verdict, attribute_or_empty, is_visible, open,
    query_all_lenient, resolve_href, text_or_empty,
};
use crate::conformity::normalize::{for_equality, for_similarity, word_key};
use crate::driver::{Page, Rect};
use crate::models::COOKIE_POLICY_TEMPLATE;

pub const COOKIE_BANNER_VISIBILITY: &str = "Cookie Banner Visibility";
pub const REJECT_WITHOUT_CONSENT: &str = "Reject Without Consent";
pub const COOKIE_SELECTION: &str = "Cookie Selection";
pub const COOKIE_BANNER_TEXT: &str = "Cookie Banner Text";
pub const COOKIE_BANNER_LINKS: &str = "Cookie Banner Links";

pub(super) struct Banner {
    selector: String,
    rect: Rect,
    text: String,
}

/// First visible, banner-sized element whose text mentions a banner keyword
pub(super) async fn find_banner(page: &dyn Page, settings: &CheckSettings) -> Option<Banner> {
    for selector in &settings.selectors.banner {
        for element in query_all_lenient(page, selector).await {
            if !is_visible(element.as_ref()).await {
                continue;
            }
            let Some(rect) = element.bounding_box().await.ok().flatten() else {
                continue;
            };
            if !rect.exceeds(settings.banner_min_width, settings.banner_min_height) {
                continue;
            }
            let text = text_or_empty(element.as_ref()).await;
            let lower = text.to_lowercase();
            if settings
                .banner_keywords
                .iter()
                .any(|k| lower.contains(&k.to_lowercase()))
            {
                debug!("Banner candidate '{}' at {}", selector, rect);
                return Some(Banner {
                    selector: selector.clone(),
                    rect,
                    text,
                });
            }
        }
    }
    None
}

pub(super) fn no_banner() -> CheckError {
    CheckError::ElementNotFound("No visible cookie banner found".to_string())
}

pub struct CookieBannerVisibility {
    settings: Arc<CheckSettings>,
}

impl CookieBannerVisibility {
    pub fn new(settings: Arc<CheckSettings>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Check for CookieBannerVisibility {
    async fn run(&self, ctx: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        open(ctx.page, ctx.entry_url, &self.settings).await?;
        let banner = find_banner(ctx.page, &self.settings).await.ok_or_else(no_banner)?;
        Ok(Verdict::pass(format!(
            "Cookie banner detected with selector '{}' ({})",
            banner.selector, banner.rect
        )))
    }
}

/// A visible control offering to continue without consent
pub struct RejectWithoutConsent {
    settings: Arc<CheckSettings>,
}

impl RejectWithoutConsent {
    pub fn new(settings: Arc<CheckSettings>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Check for RejectWithoutConsent {
    async fn run(&self, ctx: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        open(ctx.page, ctx.entry_url, &self.settings).await?;

        for selector in &self.settings.selectors.reject_controls {
            for control in query_all_lenient(ctx.page, selector).await {
                let text = for_similarity(&text_or_empty(control.as_ref()).await);
                let Some(phrase) = self
                    .settings
                    .reject_phrases
                    .iter()
                    .find(|p| text.contains(&for_similarity(p)))
                else {
                    continue;
                };
                if !is_visible(control.as_ref()).await {
                    continue;
                }
                let location = match control.bounding_box().await.ok().flatten() {
                    Some(rect) => format!("Location: {}", rect),
                    None => "Location unknown".to_string(),
                };
                return Ok(Verdict::pass(format!(
                    "'{}' control found and clickable. {}.",
                    phrase, location
                )));
            }
        }

        Err(CheckError::ElementNotFound(format!(
            "No clickable control offering '{}' found",
            self.settings
                .reject_phrases
                .first()
                .map(String::as_str)
                .unwrap_or("reject without consent")
        )))
    }
}

/// Every expected cookie category offered, none preselected
pub struct CookieSelection {
    settings: Arc<CheckSettings>,
}

impl CookieSelection {
    pub fn new(settings: Arc<CheckSettings>) -> Self {
        Self { settings }
    }
}

/// Click the first visible cookie-settings control and let the page settle
pub(super) async fn open_cookie_settings(page: &dyn Page, settings: &CheckSettings) -> Result<(), CheckError> {
    for selector in &settings.selectors.cookie_settings {
        if let Some(button) = page.query(selector).await.ok().flatten() {
            if is_visible(button.as_ref()).await {
                button.click().await?;
                if let Err(e) = page.wait_idle(settings.idle_timeout()).await {
                    debug!("Cookie settings did not go idle: {}", e);
                }
                return Ok(());
            }
        }
    }
    Err(CheckError::ElementNotFound(
        "No cookie settings control found".to_string(),
    ))
}

struct Anchor {
    text: String,
    url: Option<String>,
    visible: bool,
}

/// Imprint and privacy policy links inside `scope`. A category passes when
/// one of its links is visible and points somewhere.
pub(super) async fn legal_links(page: &dyn Page, scope: &str, settings: &CheckSettings) -> (bool, Vec<String>) {
    let base = page.current_url().await.unwrap_or_default();
    let mut anchors = Vec::new();
    for element in query_all_lenient(page, &format!("{} a", scope)).await {
        let element = element.as_ref();
        let href = attribute_or_empty(element, "href").await;
        anchors.push(Anchor {
            text: text_or_empty(element).await.to_lowercase(),
            url: resolve_href(&base, &href),
            visible: is_visible(element).await,
        });
    }

    let mut passed = true;
    let mut evidence = Vec::with_capacity(2);
    for (category, texts) in [
        ("imprint", &settings.imprint_link_texts),
        ("privacy policy", &settings.privacy_link_texts),
    ] {
        let matching: Vec<&Anchor> = anchors
            .iter()
            .filter(|a| texts.iter().any(|t| a.text.contains(&t.to_lowercase())))
            .collect();
        let clickable = matching
            .iter()
            .find_map(|a| if a.visible { a.url.as_deref() } else { None });

        let status = match clickable {
            Some(url) => format!("clickable, {}", url),
            None if matching.is_empty() => "missing".to_string(),
            None => "not clickable".to_string(),
        };
        passed &= clickable.is_some();
        evidence.push(format!("- {} link: {}", category, status));
    }
    (passed, evidence)
}

async fn label_keys(page: &dyn Page, selector: &str) -> Vec<String> {
    let mut keys = Vec::new();
    for label in query_all_lenient(page, selector).await {
        let key = for_equality(&text_or_empty(label.as_ref()).await);
        if !key.is_empty() {
            keys.push(key);
        }
    }
    keys
}

#[async_trait]
impl Check for CookieSelection {
    async fn run(&self, ctx: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        open(ctx.page, ctx.entry_url, &self.settings).await?;
        open_cookie_settings(ctx.page, &self.settings).await?;

        let offered = label_keys(ctx.page, &self.settings.selectors.option_label).await;
        let preselected = label_keys(ctx.page, &self.settings.selectors.preselected_option).await;

        let mut evidence = vec!["Cookie options:".to_string()];
        let mut passed = !self.settings.expected_cookie_options.is_empty();
        for option in &self.settings.expected_cookie_options {
            let key = for_equality(option);
            let status = if !offered.contains(&key) {
                passed = false;
                "missing"
            } else if preselected.contains(&key) {
                passed = false;
                "preselected"
            } else {
                "unchecked"
            };
            evidence.push(format!("- {}: {}", option, status));
        }
        evidence.push(if passed {
            "All required cookie options are present and none are preselected.".to_string()
        } else {
            "Some required cookie options are missing or preselected.".to_string()
        });

        Ok(Verdict {
            passed,
            evidence: evidence.join("\n"),
        })
    }
}

/// Banner wording compared with the `cookie_policy` template
pub struct CookieBannerText {
    settings: Arc<CheckSettings>,
}

impl CookieBannerText {
    pub fn new(settings: Arc<CheckSettings>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Check for CookieBannerText {
    async fn run(&self, ctx: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        let template = ctx.template(COOKIE_POLICY_TEMPLATE)?;
        open(ctx.page, ctx.entry_url, &self.settings).await?;
        let banner = find_banner(ctx.page, &self.settings).await.ok_or_else(no_banner)?;

        let (actual, note) = match template_span(&banner.text, template, self.settings.banner_anchor_words) {
            Some(span) => (span, None),
            None => (
                banner.text.trim().to_string(),
                Some("Template opening words not found; compared the whole banner text"),
            ),
        };

        let result = ctx.engine.compare(template, &actual);
        let mut evidence = String::new();
        if let Some(note) = note {
            evidence.push_str(note);
            evidence.push('\n');
        }
        evidence.push_str(&result.evidence());

        Ok(Verdict {
            passed: result.conform,
            evidence,
        })
    }
}

/// Imprint and privacy policy reachable from the banner itself
pub struct CookieBannerLinks {
    settings: Arc<CheckSettings>,
}

impl CookieBannerLinks {
    pub fn new(settings: Arc<CheckSettings>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Check for CookieBannerLinks {
    async fn run(&self, ctx: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        open(ctx.page, ctx.entry_url, &self.settings).await?;
        let banner = find_banner(ctx.page, &self.settings).await.ok_or_else(no_banner)?;

        let (passed, lines) = legal_links(ctx.page, &banner.selector, &self.settings).await;
        let mut evidence = vec![format!("Links in cookie banner '{}':", banner.selector)];
        evidence.extend(lines);
        Ok(Verdict {
            passed,
            evidence: evidence.join("\n"),
        })
    }
}

/// The stretch of `text` running from the template's first `anchor` words
/// through its last `anchor` words.
///
/// Words match by equality key, so case and punctuation around the anchors
/// do not matter, and punctuation-only tokens are skipped on both sides.
/// When the closing words are missing the span runs to the end of `text`;
/// when the opening words are missing there is no span.
fn template_span(text: &str, template: &str, anchor: usize) -> Option<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    // keys[i] is the key of words[positions[i]]
    let (keys, positions): (Vec<String>, Vec<usize>) = words
        .iter()
        .enumerate()
        .map(|(i, w)| (word_key(w), i))
        .filter(|(key, _)| !key.is_empty())
        .unzip();
    let template_keys: Vec<String> = template
        .split_whitespace()
        .map(word_key)
        .filter(|k| !k.is_empty())
        .collect();
    if template_keys.is_empty() {
        return None;
    }

    let n = anchor.clamp(1, template_keys.len());
    let head = &template_keys[..n];
    let tail = &template_keys[template_keys.len() - n..];

    let start = keys.windows(n).position(|w| w == head)?;
    let end = keys[start..]
        .windows(n)
        .position(|w| w == tail)
        .map(|offset| positions[start + offset + n - 1] + 1)
        .unwrap_or(words.len());

    Some(words[positions[start]..end].join(" "))
}
