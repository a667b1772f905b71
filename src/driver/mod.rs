//! Narrow interface to the browser-automation layer.
//!
//! The crate never drives a browser itself: checks talk to a [`PageDriver`]
//! that hands out isolated [`Page`]s, and link health goes through a
//! [`LinkChecker`]. Both are consumed as trait objects so tests can swap in
//! in-memory fakes.

mod http;

pub use http::HttpLinkChecker;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("driver operation timed out after {0:?}")]
    Timeout(Duration),

    /// The element or page went away between lookup and use
    #[error("element detached: {0}")]
    Detached(String),

    #[error("driver protocol error: {0}")]
    Protocol(String),
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("invalid link url '{0}'")]
    InvalidUrl(String),

    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },
}

/// Element geometry in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Strictly larger than `min_width` x `min_height`
    pub fn exceeds(&self, min_width: f64, min_height: f64) -> bool {
        self.width > min_width && self.height > min_height
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "top={}, left={}, width={}, height={}",
            self.y, self.x, self.width, self.height
        )
    }
}

/// Viewport and document dimensions of a loaded page, in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageMetrics {
    pub viewport_width: f64,
    pub viewport_height: f64,
    /// Scroll width of the document body
    pub content_width: f64,
    /// Scroll height of the document body
    pub content_height: f64,
}

impl PageMetrics {
    /// The body is wider than the viewport, so a horizontal scrollbar shows
    pub fn overflows_horizontally(&self) -> bool {
        self.content_width > self.viewport_width
    }

    /// Document height in viewport heights
    pub fn screens(&self) -> f64 {
        if self.viewport_height > 0.0 {
            self.content_height / self.viewport_height
        } else {
            0.0
        }
    }
}

/// Source of isolated browser pages
#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn new_page(&self) -> Result<Box<dyn Page>, DriverError>;
}

/// One browser page, owned by exactly one check at a time
#[async_trait]
pub trait Page: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<(), DriverError>;

    /// Wait until the network has been idle, or `timeout` elapses
    async fn wait_idle(&self, timeout: Duration) -> Result<(), DriverError>;

    /// URL currently loaded (after redirects)
    async fn current_url(&self) -> Result<String, DriverError>;

    async fn query(&self, selector: &str) -> Result<Option<Box<dyn Element>>, DriverError>;

    async fn query_all(&self, selector: &str) -> Result<Vec<Box<dyn Element>>, DriverError>;

    async fn metrics(&self) -> Result<PageMetrics, DriverError>;

    async fn close(&self) -> Result<(), DriverError>;
}

#[async_trait]
pub trait Element: Send + Sync {
    /// Rendered text content
    async fn text(&self) -> Result<String, DriverError>;

    async fn attribute(&self, name: &str) -> Result<Option<String>, DriverError>;

    async fn click(&self) -> Result<(), DriverError>;

    async fn is_visible(&self) -> Result<bool, DriverError>;

    async fn bounding_box(&self) -> Result<Option<Rect>, DriverError>;
}

/// HTTP status lookup for link-health checks
#[async_trait]
pub trait LinkChecker: Send + Sync {
    async fn status(&self, url: &str) -> Result<u16, LinkError>;
}
