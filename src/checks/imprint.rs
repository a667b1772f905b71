use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use super::{
    Check, CheckContext, CheckError, CheckSettings, Verdict, open, page_links, query_all_lenient,
    text_or_empty,
};
use crate::conformity::normalize::for_equality;
use crate::driver::Page;

pub const IMPRINT_PRESENCE: &str = "Imprint Presence";
pub const IMPRINT_HORIZONTAL: &str = "Imprint Horizontal";
pub const IMPRINT_LENGTH: &str = "Imprint Length";

fn same_host(a: &str, b: &str) -> bool {
    match (Url::parse(a), Url::parse(b)) {
        (Ok(a), Ok(b)) => a.host_str() == b.host_str(),
        _ => false,
    }
}

fn href_matches(url: &str, keywords: &[String]) -> bool {
    let lower = url.to_lowercase();
    keywords.iter().any(|k| lower.contains(&k.to_lowercase()))
}

/// Imprint link on the same site first, then weaker hints anywhere.
fn pick_imprint_link<'l>(base: &str, links: &'l [String], settings: &CheckSettings) -> Option<&'l String> {
    links
        .iter()
        .find(|l| same_host(base, l) && href_matches(l, &settings.imprint_high_priority))
        .or_else(|| {
            links
                .iter()
                .find(|l| href_matches(l, &settings.imprint_low_priority))
        })
}

/// Load the entry page, pick its imprint link and load that. Links are
/// judged against the url the entry page ended up on after redirects.
async fn open_imprint(ctx: &CheckContext<'_>, settings: &CheckSettings) -> Result<String, CheckError> {
    open(ctx.page, ctx.entry_url, settings).await?;
    let base = match ctx.page.current_url().await {
        Ok(url) => url,
        Err(e) => {
            debug!("Current url unavailable, using {}: {}", ctx.entry_url, e);
            ctx.entry_url.to_string()
        }
    };
    let links = page_links(ctx.page, &settings.selectors.links).await;
    let imprint_url = pick_imprint_link(&base, &links, settings)
        .cloned()
        .ok_or_else(|| CheckError::ElementNotFound("No imprint link found".to_string()))?;

    ctx.ensure_active()?;
    open(ctx.page, &imprint_url, settings).await?;
    Ok(imprint_url)
}

/// First heading naming the page as an imprint
async fn imprint_heading(page: &dyn Page, settings: &CheckSettings) -> Option<String> {
    for heading in query_all_lenient(page, &settings.selectors.headings).await {
        let text = text_or_empty(heading.as_ref()).await;
        let lower = text.to_lowercase();
        if settings
            .imprint_heading_keywords
            .iter()
            .any(|k| lower.contains(&k.to_lowercase()))
        {
            return Some(text.trim().to_string());
        }
    }
    None
}

/// A reachable imprint page mentioning every configured term
pub struct ImprintPresence {
    settings: Arc<CheckSettings>,
}

impl ImprintPresence {
    pub fn new(settings: Arc<CheckSettings>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Check for ImprintPresence {
    async fn run(&self, ctx: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        let imprint_url = open_imprint(ctx, &self.settings).await?;
        let body = ctx
            .page
            .query(&self.settings.selectors.body)
            .await?
            .ok_or_else(|| CheckError::Extraction(format!("{} has no readable body", imprint_url)))?;
        let text = for_equality(&text_or_empty(body.as_ref()).await);

        let mut passed = true;
        let mut evidence = vec![format!("Imprint found at {}", imprint_url)];
        for term in &self.settings.imprint_terms {
            let found = text.contains(&for_equality(term));
            passed &= found;
            evidence.push(format!("- {}: {}", term, if found { "found" } else { "not found" }));
        }

        Ok(Verdict {
            passed,
            evidence: evidence.join("\n"),
        })
    }
}

/// The imprint fits the viewport width
pub struct ImprintHorizontal {
    settings: Arc<CheckSettings>,
}

impl ImprintHorizontal {
    pub fn new(settings: Arc<CheckSettings>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Check for ImprintHorizontal {
    async fn run(&self, ctx: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        let imprint_url = open_imprint(ctx, &self.settings).await?;
        let metrics = ctx.page.metrics().await?;

        let mut evidence = vec![format!("Imprint at {}", imprint_url)];
        evidence.push(match imprint_heading(ctx.page, &self.settings).await {
            Some(heading) => format!("- Headline: {}", heading),
            None => "- No headline naming the imprint found".to_string(),
        });

        let passed = !metrics.overflows_horizontally();
        evidence.push(if passed {
            "- No horizontal scrollbar".to_string()
        } else {
            format!(
                "- Horizontal scrollbar: content is {}px wide in a {}px viewport",
                metrics.content_width, metrics.viewport_width
            )
        });

        Ok(Verdict {
            passed,
            evidence: evidence.join("\n"),
        })
    }
}

/// Imprint height in screens; only fails when `imprint_max_screens` is set
pub struct ImprintLength {
    settings: Arc<CheckSettings>,
}

impl ImprintLength {
    pub fn new(settings: Arc<CheckSettings>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Check for ImprintLength {
    async fn run(&self, ctx: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        let imprint_url = open_imprint(ctx, &self.settings).await?;
        let metrics = ctx.page.metrics().await?;
        let screens = metrics.screens();

        let mut evidence = format!(
            "Imprint at {} is {}px tall in a {}px viewport ({:.1} screens)",
            imprint_url, metrics.content_height, metrics.viewport_height, screens
        );
        let passed = match self.settings.imprint_max_screens {
            Some(max) if screens > max => {
                evidence.push_str(&format!("\nLonger than the allowed {:.1} screens", max));
                false
            }
            _ => true,
        };

        Ok(Verdict { passed, evidence })
    }
}
