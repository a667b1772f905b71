//! Per-site navigation overrides.
//!
//! Some sites keep the page a criterion is about somewhere the generic
//! navigation never reaches (a newsletter form on a partner domain, say).
//! Rather than branching inside checks, such cases are rules in an ordered
//! table consulted once per check before it runs.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::normalize_url;

#[derive(Debug, Error, PartialEq)]
pub enum RouteError {
    #[error("invalid route pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("invalid route target '{url}': {reason}")]
    InvalidRedirect { url: String, reason: String },
}

/// Configured form of a route
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RouteRule {
    /// Regex matched against the normalized target url
    pub pattern: String,
    /// Criteria the rule applies to; empty means every criterion
    #[serde(default)]
    pub criteria: Vec<String>,
    /// Entry url used instead of the target url
    pub navigate_to: String,
}

#[derive(Debug, Clone)]
struct CompiledRoute {
    pattern: Regex,
    criteria: Vec<String>,
    navigate_to: String,
}

impl CompiledRoute {
    fn applies(&self, url: &str, criterion: &str) -> bool {
        (self.criteria.is_empty() || self.criteria.iter().any(|c| c == criterion))
            && self.pattern.is_match(url)
    }
}

/// Ordered route rules; the first applicable rule wins
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<CompiledRoute>,
}

impl RouteTable {
    pub fn new(rules: &[RouteRule]) -> Result<Self, RouteError> {
        let routes = rules
            .iter()
            .map(|rule| {
                let pattern = Regex::new(&rule.pattern).map_err(|e| RouteError::InvalidPattern {
                    pattern: rule.pattern.clone(),
                    reason: e.to_string(),
                })?;
                let navigate_to =
                    normalize_url(&rule.navigate_to).map_err(|e| RouteError::InvalidRedirect {
                        url: rule.navigate_to.clone(),
                        reason: e.to_string(),
                    })?;
                Ok(CompiledRoute {
                    pattern,
                    criteria: rule.criteria.clone(),
                    navigate_to,
                })
            })
            .collect::<Result<Vec<_>, RouteError>>()?;
        Ok(Self { routes })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Entry url for `criterion` when auditing `url`
    pub fn resolve<'a>(&'a self, url: &'a str, criterion: &str) -> &'a str {
        self.routes
            .iter()
            .find(|r| r.applies(url, criterion))
            .map(|r| r.navigate_to.as_str())
            .unwrap_or(url)
    }
}
