//! Preference center criteria: reachable from the banner, linking to the
//! legal pages, and explaining each cookie category.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::cookie::{find_banner, legal_links, no_banner, open_cookie_settings};
use super::{Check, CheckContext, CheckError, CheckSettings, Verdict, is_visible, open, query_all_lenient};
use crate::driver::Page;

pub const COOKIE_PREFERENCE_ACCESSIBILITY: &str = "Cookie Preference Accessibility";
pub const COOKIE_PREFERENCE_LINKS: &str = "Cookie Preference Center Links";
pub const COOKIE_PREFERENCE_MORE_INFO: &str = "Cookie Preference Center More Info";

/// Selector of the first visible preference center container
async fn find_preference_center(page: &dyn Page, settings: &CheckSettings) -> Option<String> {
    for selector in &settings.selectors.preference_center {
        for element in query_all_lenient(page, selector).await {
            if is_visible(element.as_ref()).await {
                debug!("Preference center matched '{}'", selector);
                return Some(selector.clone());
            }
        }
    }
    None
}

async fn click_preferences(page: &dyn Page, settings: &CheckSettings) -> Result<(), CheckError> {
    open_cookie_settings(page, settings).await.map_err(|e| match e {
        CheckError::ElementNotFound(_) => CheckError::ElementNotFound(
            "No 'Cookie-Einstellungen' or preference center control found".to_string(),
        ),
        other => other,
    })
}

/// The banner's settings control opens a preference center
pub struct PreferenceAccessibility {
    settings: Arc<CheckSettings>,
}

impl PreferenceAccessibility {
    pub fn new(settings: Arc<CheckSettings>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Check for PreferenceAccessibility {
    async fn run(&self, ctx: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        open(ctx.page, ctx.entry_url, &self.settings).await?;
        find_banner(ctx.page, &self.settings).await.ok_or_else(no_banner)?;
        ctx.ensure_active()?;
        click_preferences(ctx.page, &self.settings).await?;

        Ok(match find_preference_center(ctx.page, &self.settings).await {
            Some(selector) => Verdict::pass(format!(
                "Preference center opened from the cookie banner ('{}')",
                selector
            )),
            None => Verdict::fail("The cookie settings control was clicked, but no preference center opened"),
        })
    }
}

/// Imprint and privacy policy linked from inside the preference center
pub struct PreferenceCenterLinks {
    settings: Arc<CheckSettings>,
}

impl PreferenceCenterLinks {
    pub fn new(settings: Arc<CheckSettings>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Check for PreferenceCenterLinks {
    async fn run(&self, ctx: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        open(ctx.page, ctx.entry_url, &self.settings).await?;
        click_preferences(ctx.page, &self.settings).await?;
        let center = find_preference_center(ctx.page, &self.settings)
            .await
            .ok_or_else(|| CheckError::ElementNotFound("No preference center opened".to_string()))?;

        let (passed, lines) = legal_links(ctx.page, &center, &self.settings).await;
        let mut evidence = vec![format!("Links in preference center '{}':", center)];
        evidence.extend(lines);
        Ok(Verdict {
            passed,
            evidence: evidence.join("\n"),
        })
    }
}

/// "More information" expanders for the cookie categories
pub struct PreferenceMoreInfo {
    settings: Arc<CheckSettings>,
}

impl PreferenceMoreInfo {
    pub fn new(settings: Arc<CheckSettings>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Check for PreferenceMoreInfo {
    async fn run(&self, ctx: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        open(ctx.page, ctx.entry_url, &self.settings).await?;
        click_preferences(ctx.page, &self.settings).await?;

        for selector in &self.settings.selectors.more_info {
            let mut visible = 0;
            for control in query_all_lenient(ctx.page, selector).await {
                if is_visible(control.as_ref()).await {
                    visible += 1;
                }
            }
            if visible > 0 {
                return Ok(Verdict::pass(format!(
                    "Found {} 'More information' controls ('{}') for {} expected cookie categories",
                    visible,
                    selector,
                    self.settings.expected_cookie_options.len()
                )));
            }
        }

        Ok(Verdict::fail(
            "No 'More information' controls found in the preference center",
        ))
    }
}
