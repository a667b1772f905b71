//! Newsletter sign-up criteria.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{
    Check, CheckContext, CheckError, CheckSettings, Verdict, control_text, newsletter_links, open,
    query_all_lenient, text_or_empty,
};
use crate::conformity::normalize::{contains_phrase, word_key};
use crate::driver::{Element, Page};
use crate::models::{NEWSLETTER_CONSENT_TEMPLATE, NEWSLETTER_DETAILS_TEMPLATE};

pub const CLEAR_CTA: &str = "Clear CTA";
pub const AGE_LIMITATION: &str = "Age Limitation";
pub const NEWSLETTER_WORDING: &str = "Newsletter Wording";
pub const NEWSLETTER_MORE_DETAILS: &str = "Newsletter More Details";

fn is_newsletter_url(url: &str, settings: &CheckSettings) -> bool {
    let lower = url.to_lowercase();
    settings
        .newsletter_url_keywords
        .iter()
        .any(|k| lower.contains(&k.to_lowercase()))
}

/// Open the entry page and, unless it already is one, move on to the first
/// newsletter link it offers. Returns the url that ended up loaded.
async fn open_newsletter_page(ctx: &CheckContext<'_>, settings: &CheckSettings) -> Result<String, CheckError> {
    open(ctx.page, ctx.entry_url, settings).await?;
    if is_newsletter_url(ctx.entry_url, settings) {
        return Ok(ctx.entry_url.to_string());
    }

    if let Some(link) = newsletter_links(ctx.page, settings).await.into_iter().next() {
        ctx.ensure_active()?;
        debug!("Following newsletter link {}", link);
        open(ctx.page, &link, settings).await?;
        return Ok(link);
    }
    Ok(ctx.entry_url.to_string())
}

/// A sign-up control labelled with an unambiguous call to action
pub struct ClearCta {
    settings: Arc<CheckSettings>,
}

impl ClearCta {
    pub fn new(settings: Arc<CheckSettings>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Check for ClearCta {
    async fn run(&self, ctx: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        let url = open_newsletter_page(ctx, &self.settings).await?;

        for control in query_all_lenient(ctx.page, &self.settings.selectors.scan).await {
            let text = control_text(control.as_ref()).await;
            if let Some(phrase) = self
                .settings
                .cta_phrases
                .iter()
                .find(|p| contains_phrase(&text, p))
            {
                return Ok(Verdict::pass(format!("Found CTA: '{}' on {}", phrase, url)));
            }
        }

        Err(CheckError::ElementNotFound(format!("No clear CTA found on {}", url)))
    }
}

/// Age restriction stated on the sign-up path
pub struct AgeLimitation {
    settings: Arc<CheckSettings>,
}

impl AgeLimitation {
    pub fn new(settings: Arc<CheckSettings>) -> Self {
        Self { settings }
    }

    async fn scan(&self, page: &dyn Page) -> Option<String> {
        for control in query_all_lenient(page, &self.settings.selectors.scan).await {
            let text = control_text(control.as_ref()).await.to_lowercase();
            if let Some(phrase) = self
                .settings
                .age_phrases
                .iter()
                .find(|p| text.contains(&p.to_lowercase()))
            {
                return Some(phrase.clone());
            }
        }
        None
    }
}

#[async_trait]
impl Check for AgeLimitation {
    async fn run(&self, ctx: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        open(ctx.page, ctx.entry_url, &self.settings).await?;
        if let Some(phrase) = self.scan(ctx.page).await {
            return Ok(Verdict::pass(format!(
                "Age limitation found: '{}' on {}",
                phrase, ctx.entry_url
            )));
        }

        for link in newsletter_links(ctx.page, &self.settings).await {
            ctx.ensure_active()?;
            if let Err(e) = open(ctx.page, &link, &self.settings).await {
                debug!("Skipping {}: {}", link, e);
                continue;
            }
            if let Some(phrase) = self.scan(ctx.page).await {
                return Ok(Verdict::pass(format!(
                    "Age limitation found: '{}' on {}",
                    phrase, link
                )));
            }
        }

        Err(CheckError::ElementNotFound(
            "No age limitation or relevant newsletter link found".to_string(),
        ))
    }
}

/// Consent checkbox wording compared with the `newsletter_consent` template
pub struct NewsletterWording {
    settings: Arc<CheckSettings>,
}

impl NewsletterWording {
    pub fn new(settings: Arc<CheckSettings>) -> Self {
        Self { settings }
    }

    /// Checkbox labels plus body lines sharing at least one word with the
    /// template
    async fn candidates(&self, page: &dyn Page, template_words: &HashSet<String>) -> Vec<String> {
        let mut texts = Vec::new();
        for label in query_all_lenient(page, &self.settings.selectors.checkbox_label).await {
            texts.push(text_or_empty(label.as_ref()).await);
        }
        if let Some(body) = page.query(&self.settings.selectors.body).await.ok().flatten() {
            let body = text_or_empty(body.as_ref()).await;
            texts.extend(body.lines().map(String::from));
        }

        let mut candidates: Vec<String> = Vec::new();
        for text in texts {
            let text = text.trim();
            if text.is_empty() || candidates.iter().any(|c| c == text) {
                continue;
            }
            if text
                .split_whitespace()
                .any(|w| template_words.contains(&word_key(w)))
            {
                candidates.push(text.to_string());
            }
        }
        candidates
    }
}

#[async_trait]
impl Check for NewsletterWording {
    async fn run(&self, ctx: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        let template = ctx.template(NEWSLETTER_CONSENT_TEMPLATE)?;
        let template_words: HashSet<String> = template
            .split_whitespace()
            .map(word_key)
            .filter(|k| !k.is_empty())
            .collect();

        open(ctx.page, ctx.entry_url, &self.settings).await?;
        let mut source = ctx.entry_url.to_string();
        let mut candidates = self.candidates(ctx.page, &template_words).await;

        if candidates.is_empty() {
            for link in newsletter_links(ctx.page, &self.settings).await {
                ctx.ensure_active()?;
                if let Err(e) = open(ctx.page, &link, &self.settings).await {
                    debug!("Skipping {}: {}", link, e);
                    continue;
                }
                candidates = self.candidates(ctx.page, &template_words).await;
                if !candidates.is_empty() {
                    source = link;
                    break;
                }
            }
        }

        let best = candidates
            .iter()
            .map(|c| (ctx.engine.similarity(template, c), c))
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, c)| c)
            .ok_or_else(|| {
                CheckError::ElementNotFound("No newsletter consent text found".to_string())
            })?;

        let result = ctx.engine.compare(template, best);
        Ok(Verdict {
            passed: result.conform,
            evidence: format!("Closest consent text on {}:\n{}\n{}", source, best, result.evidence()),
        })
    }
}

/// The long consent text behind a "more details" control, compared with the
/// `newsletter_details` template
pub struct NewsletterMoreDetails {
    settings: Arc<CheckSettings>,
}

impl NewsletterMoreDetails {
    pub fn new(settings: Arc<CheckSettings>) -> Self {
        Self { settings }
    }

    async fn first_match(&self, page: &dyn Page, selectors: &[String]) -> Option<Box<dyn Element>> {
        for selector in selectors {
            if let Some(element) = page.query(selector).await.ok().flatten() {
                return Some(element);
            }
        }
        None
    }
}

#[async_trait]
impl Check for NewsletterMoreDetails {
    async fn run(&self, ctx: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        let template = ctx.template(NEWSLETTER_DETAILS_TEMPLATE)?;
        let url = open_newsletter_page(ctx, &self.settings).await?;

        // Hidden controls are clicked too; sites often collapse them with CSS
        let button = self
            .first_match(ctx.page, &self.settings.selectors.more_details_button)
            .await
            .ok_or_else(|| {
                CheckError::ElementNotFound(format!("No more details control found on {}", url))
            })?;
        button.click().await?;
        if let Err(e) = ctx.page.wait_idle(self.settings.idle_timeout()).await {
            debug!("More details did not go idle: {}", e);
        }

        let content = match self
            .first_match(ctx.page, &self.settings.selectors.more_details_content)
            .await
        {
            Some(element) => text_or_empty(element.as_ref()).await,
            None => String::new(),
        };
        if content.trim().is_empty() {
            return Err(CheckError::ElementNotFound(format!(
                "More details content did not become visible on {}",
                url
            )));
        }

        let result = ctx.engine.compare(template, content.trim());
        Ok(Verdict {
            passed: result.conform,
            evidence: format!("More details text on {}:\n{}", url, result.evidence()),
        })
    }
}
