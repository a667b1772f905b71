//! Footer criteria: required legal links and their reachability.

use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};

use super::{
    Check, CheckContext, CheckError, CheckSettings, FooterLinkRule, Verdict, attribute_or_empty,
    open, page_links, query_all_lenient, text_or_empty,
};
use crate::driver::Page;

pub const FOOTER_ESSENTIALS: &str = "Footer Essentials";
pub const FOOTER_LINK_HEALTH: &str = "Footer Link Health";

/// Concurrent status lookups per check
const STATUS_CONCURRENCY: usize = 8;

struct FooterLink {
    text: String,
    href: String,
    onclick: String,
}

impl FooterLink {
    /// Keyword in the text, plus a matching href or a script handler
    fn satisfies(&self, rule: &FooterLinkRule) -> bool {
        let keyword = rule
            .keywords
            .iter()
            .any(|k| self.text.contains(&k.to_lowercase()));
        if !keyword {
            return false;
        }
        rule.href_patterns.is_empty()
            || rule
                .href_patterns
                .iter()
                .any(|p| self.href.contains(&p.to_lowercase()))
            || !self.onclick.is_empty()
    }
}

async fn footer_links(page: &dyn Page, selector: &str) -> Vec<FooterLink> {
    let mut links = Vec::new();
    for element in query_all_lenient(page, selector).await {
        let element = element.as_ref();
        links.push(FooterLink {
            text: text_or_empty(element).await.trim().to_lowercase(),
            href: attribute_or_empty(element, "href").await.to_lowercase(),
            onclick: attribute_or_empty(element, "onclick").await,
        });
    }
    links
}

pub struct FooterEssentials {
    settings: Arc<CheckSettings>,
}

impl FooterEssentials {
    pub fn new(settings: Arc<CheckSettings>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Check for FooterEssentials {
    async fn run(&self, ctx: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        open(ctx.page, ctx.entry_url, &self.settings).await?;
        let links = footer_links(ctx.page, &self.settings.selectors.footer_links).await;
        if links.is_empty() {
            return Err(CheckError::ElementNotFound("No footer links found".to_string()));
        }

        let mut passed = true;
        let mut evidence = Vec::with_capacity(self.settings.footer_links.len());
        for rule in &self.settings.footer_links {
            let present = links.iter().any(|l| l.satisfies(rule));
            passed &= present;
            evidence.push(format!(
                "- {} link: {}",
                rule.category,
                if present { "present" } else { "missing" }
            ));
        }

        Ok(Verdict {
            passed,
            evidence: evidence.join("\n"),
        })
    }
}

/// Every footer link answers with a non-error status
pub struct FooterLinkHealth {
    settings: Arc<CheckSettings>,
}

impl FooterLinkHealth {
    pub fn new(settings: Arc<CheckSettings>) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Check for FooterLinkHealth {
    async fn run(&self, ctx: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        open(ctx.page, ctx.entry_url, &self.settings).await?;
        let urls = page_links(ctx.page, &self.settings.selectors.footer_links).await;
        if urls.is_empty() {
            return Err(CheckError::ElementNotFound("No footer links found".to_string()));
        }
        ctx.ensure_active()?;

        let links = ctx.links;
        let lookups: Vec<_> = urls
            .iter()
            .cloned()
            .map(move |url| async move {
                let status = links.status(&url).await;
                (url, status)
            })
            .collect();
        let results: Vec<_> = stream::iter(lookups)
            .buffered(STATUS_CONCURRENCY)
            .collect()
            .await;

        let broken: Vec<String> = results
            .into_iter()
            .filter_map(|(url, status)| match status {
                Ok(code) if code < 400 => None,
                Ok(code) => Some(format!("- {}: HTTP {}", url, code)),
                Err(e) => Some(format!("- {}: {}", url, e)),
            })
            .collect();

        if broken.is_empty() {
            Ok(Verdict::pass(format!(
                "All {} footer links are reachable",
                urls.len()
            )))
        } else {
            Ok(Verdict::fail(format!(
                "{} of {} footer links are broken:\n{}",
                broken.len(),
                urls.len(),
                broken.join("\n")
            )))
        }
    }
}
