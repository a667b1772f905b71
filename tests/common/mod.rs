//! In-memory browser and link checker for integration tests.
//!
//! A `FakeSite` maps urls to pages; a page maps exact selector strings to the
//! elements a query for that selector returns. Elements built with
//! `revealing(key)` make the page's `with_revealed(key, ..)` elements appear
//! once clicked.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use site_conformity::{
    DriverError, Element, LinkChecker, Page, PageDriver, PageMetrics, LinkError, Rect,
};

#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub text: String,
    pub attributes: HashMap<String, String>,
    pub visible: bool,
    pub rect: Option<Rect>,
    /// Key of the hidden content a click shows
    pub reveals: Option<String>,
}

impl FakeElement {
    pub fn visible(text: &str) -> Self {
        Self {
            text: text.to_string(),
            visible: true,
            rect: Some(Rect::new(0.0, 0.0, 120.0, 40.0)),
            ..Self::default()
        }
    }

    pub fn hidden(text: &str) -> Self {
        Self {
            text: text.to_string(),
            ..Self::default()
        }
    }

    pub fn banner(text: &str) -> Self {
        Self::visible(text).sized(800.0, 200.0)
    }

    pub fn link(text: &str, href: &str) -> Self {
        Self::visible(text).with_attr("href", href)
    }

    pub fn sized(mut self, width: f64, height: f64) -> Self {
        self.rect = Some(Rect::new(0.0, 600.0, width, height));
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn revealing(mut self, key: &str) -> Self {
        self.reveals = Some(key.to_string());
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    elements: HashMap<String, Vec<FakeElement>>,
    revealed: HashMap<String, Vec<(String, FakeElement)>>,
    metrics: Option<PageMetrics>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, selector: &str, element: FakeElement) -> Self {
        self.elements
            .entry(selector.to_string())
            .or_default()
            .push(element);
        self
    }

    pub fn with_body(self, text: &str) -> Self {
        self.with("body", FakeElement::visible(text))
    }

    /// `element` matches `selector` only after a `revealing(key)` click
    pub fn with_revealed(mut self, key: &str, selector: &str, element: FakeElement) -> Self {
        self.revealed
            .entry(key.to_string())
            .or_default()
            .push((selector.to_string(), element));
        self
    }

    /// Body size in a 1280x720 viewport
    pub fn with_content_size(mut self, width: f64, height: f64) -> Self {
        self.metrics = Some(PageMetrics {
            viewport_width: 1280.0,
            viewport_height: 720.0,
            content_width: width,
            content_height: height,
        });
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeSite {
    pages: HashMap<String, FakePage>,
    redirects: HashMap<String, String>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    /// Loading `from` ends up on `to`
    pub fn redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }
}

/// Counts pages handed out and closed
#[derive(Debug, Default)]
pub struct PageCounters {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub navigations: AtomicUsize,
}

impl PageCounters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct FakeDriver {
    site: Arc<FakeSite>,
    pub counters: Arc<PageCounters>,
}

impl FakeDriver {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site: Arc::new(site),
            counters: Arc::new(PageCounters::default()),
        }
    }

    pub fn empty() -> Self {
        Self::new(FakeSite::new())
    }
}

#[async_trait]
impl PageDriver for FakeDriver {
    async fn new_page(&self) -> Result<Box<dyn Page>, DriverError> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeBrowserPage {
            site: Arc::clone(&self.site),
            current: Mutex::new(None),
            clicked: Arc::new(Mutex::new(HashSet::new())),
            counters: Arc::clone(&self.counters),
        }))
    }
}

struct FakeBrowserPage {
    site: Arc<FakeSite>,
    current: Mutex<Option<String>>,
    /// Reveal keys clicked since the last navigation
    clicked: Arc<Mutex<HashSet<String>>>,
    counters: Arc<PageCounters>,
}

impl FakeBrowserPage {
    fn loaded(&self) -> Option<FakePage> {
        let current = self.current.lock().unwrap().clone()?;
        self.site.pages.get(&current).cloned()
    }
}

#[async_trait]
impl Page for FakeBrowserPage {
    async fn navigate(&self, url: &str) -> Result<(), DriverError> {
        self.counters.navigations.fetch_add(1, Ordering::SeqCst);
        let landed = self.site.redirects.get(url).map(String::as_str).unwrap_or(url);
        if !self.site.pages.contains_key(landed) {
            return Err(DriverError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            });
        }
        *self.current.lock().unwrap() = Some(landed.to_string());
        self.clicked.lock().unwrap().clear();
        Ok(())
    }

    async fn wait_idle(&self, _timeout: Duration) -> Result<(), DriverError> {
        Ok(())
    }

    async fn current_url(&self) -> Result<String, DriverError> {
        self.current
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| DriverError::Protocol("no page loaded".to_string()))
    }

    async fn query(&self, selector: &str) -> Result<Option<Box<dyn Element>>, DriverError> {
        Ok(self.query_all(selector).await?.into_iter().next())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn Element>>, DriverError> {
        let Some(page) = self.loaded() else {
            return Ok(Vec::new());
        };
        let mut elements = page.elements.get(selector).cloned().unwrap_or_default();
        let clicked = self.clicked.lock().unwrap().clone();
        for key in &clicked {
            for (revealed_selector, element) in page.revealed.get(key).into_iter().flatten() {
                if revealed_selector == selector {
                    elements.push(element.clone());
                }
            }
        }
        Ok(elements
            .into_iter()
            .map(|element| {
                Box::new(FakeHandle {
                    element,
                    clicked: Arc::clone(&self.clicked),
                }) as Box<dyn Element>
            })
            .collect())
    }

    async fn metrics(&self) -> Result<PageMetrics, DriverError> {
        let page = self
            .loaded()
            .ok_or_else(|| DriverError::Protocol("no page loaded".to_string()))?;
        Ok(page.metrics.unwrap_or(PageMetrics {
            viewport_width: 1280.0,
            viewport_height: 720.0,
            content_width: 1280.0,
            content_height: 720.0,
        }))
    }

    async fn close(&self) -> Result<(), DriverError> {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// An element as handed out by a page; clicks are recorded on that page
struct FakeHandle {
    element: FakeElement,
    clicked: Arc<Mutex<HashSet<String>>>,
}

#[async_trait]
impl Element for FakeHandle {
    async fn text(&self) -> Result<String, DriverError> {
        Ok(self.element.text.clone())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError> {
        Ok(self.element.attributes.get(name).cloned())
    }

    async fn click(&self) -> Result<(), DriverError> {
        if let Some(key) = &self.element.reveals {
            self.clicked.lock().unwrap().insert(key.clone());
        }
        Ok(())
    }

    async fn is_visible(&self) -> Result<bool, DriverError> {
        Ok(self.element.visible)
    }

    async fn bounding_box(&self) -> Result<Option<Rect>, DriverError> {
        Ok(self.element.rect)
    }
}

/// Link checker answering from a fixed table; unknown urls fail to connect
#[derive(Debug, Default)]
pub struct FakeLinks {
    statuses: HashMap<String, u16>,
}

impl FakeLinks {
    pub fn new(statuses: &[(&str, u16)]) -> Self {
        Self {
            statuses: statuses
                .iter()
                .map(|(url, status)| (url.to_string(), *status))
                .collect(),
        }
    }
}

#[async_trait]
impl LinkChecker for FakeLinks {
    async fn status(&self, url: &str) -> Result<u16, LinkError> {
        self.statuses
            .get(url)
            .copied()
            .ok_or_else(|| LinkError::Request {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            })
    }
}
