//! Check Orchestrator.
//!
//! Fans a registry out into one tokio task per check, isolates every
//! failure at the task boundary, and folds the outcomes into a report in
//! registry order. Each task owns its page; the page is closed on every exit
//! path, including timeout, panic and cancellation.

pub mod routing;

pub use routing::{RouteError, RouteRule, RouteTable};

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::FutureExt;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::checks::{Check, CheckContext, CheckError, CheckRegistry, Verdict};
use crate::conformity::ConformityEngine;
use crate::driver::{LinkChecker, Page, PageDriver};
use crate::models::{ComplianceReport, ComplianceTarget, CriterionOutcome, ErrorInfo, aggregate};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Deadline for checks registered without their own
    pub default_timeout_secs: u64,
    /// Checks evaluated at the same time
    pub max_parallel: usize,
    /// Pages being opened at the same time
    pub page_open_permits: usize,
    pub page_close_timeout_secs: u64,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: 90,
            max_parallel: 8,
            page_open_permits: 1,
            page_close_timeout_secs: 5,
        }
    }
}

impl OrchestratorConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    pub fn page_close_timeout(&self) -> Duration {
        Duration::from_secs(self.page_close_timeout_secs)
    }
}

/// Runs registries against targets. Holds no per-run state, so one instance
/// serves any number of concurrent runs.
#[derive(Clone)]
pub struct Orchestrator {
    driver: Arc<dyn PageDriver>,
    links: Arc<dyn LinkChecker>,
    engine: Arc<ConformityEngine>,
    routes: Arc<RouteTable>,
    config: OrchestratorConfig,
    page_gate: Arc<Semaphore>,
    parallel_gate: Arc<Semaphore>,
}

impl Orchestrator {
    pub fn new(
        driver: Arc<dyn PageDriver>,
        links: Arc<dyn LinkChecker>,
        engine: Arc<ConformityEngine>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            driver,
            links,
            engine,
            routes: Arc::new(RouteTable::empty()),
            page_gate: Arc::new(Semaphore::new(config.page_open_permits.max(1))),
            parallel_gate: Arc::new(Semaphore::new(config.max_parallel.max(1))),
            config,
        }
    }

    pub fn with_routes(mut self, routes: RouteTable) -> Self {
        self.routes = Arc::new(routes);
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run every registered check against `target` and aggregate the outcomes.
    ///
    /// Always yields a report with exactly one outcome per registered check,
    /// in registry order. Cancelling `cancel` (or dropping this future)
    /// stops all in-flight checks; unfinished ones are recorded as cancelled.
    pub async fn run_all(
        &self,
        registry: &CheckRegistry,
        target: ComplianceTarget,
        cancel: &CancellationToken,
    ) -> ComplianceReport {
        let started_at = Utc::now();
        let clock = Instant::now();
        info!("Auditing {} with {} checks", target.url(), registry.len());

        let run_token = cancel.child_token();
        let _stop_on_drop = run_token.clone().drop_guard();
        let target = Arc::new(target);

        let (names, handles): (Vec<String>, Vec<_>) = registry
            .iter()
            .map(|spec| {
                let unit = CheckUnit {
                    name: spec.name().to_string(),
                    check: spec.check(),
                    timeout: spec.timeout().unwrap_or_else(|| self.config.default_timeout()),
                    entry_url: self.routes.resolve(target.url(), spec.name()).to_string(),
                    target: Arc::clone(&target),
                    driver: Arc::clone(&self.driver),
                    links: Arc::clone(&self.links),
                    engine: Arc::clone(&self.engine),
                    page_gate: Arc::clone(&self.page_gate),
                    parallel_gate: Arc::clone(&self.parallel_gate),
                    close_timeout: self.config.page_close_timeout(),
                    cancel: run_token.clone(),
                };
                (spec.name().to_string(), tokio::spawn(unit.execute()))
            })
            .unzip();

        let outcomes: Vec<CriterionOutcome> = join_all(handles)
            .await
            .into_iter()
            .zip(names)
            .map(|(joined, name)| match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Task for '{}' did not complete: {}", name, e);
                    let err = CheckError::Panicked(e.to_string());
                    CriterionOutcome::errored(name, ErrorInfo::from(&err))
                }
            })
            .collect();

        let target = Arc::try_unwrap(target).unwrap_or_else(|shared| (*shared).clone());
        let report = aggregate(target, outcomes, started_at, clock.elapsed());
        info!(
            "Audit of {} finished: {}/{} criteria passed, conform: {}",
            report.target().url(),
            report.passed_count(),
            report.outcomes().len(),
            report.conformity_label()
        );
        report
    }
}

/// One check's run: owned handles only, so it can live on its own task
struct CheckUnit {
    name: String,
    check: Arc<dyn Check>,
    timeout: Duration,
    entry_url: String,
    target: Arc<ComplianceTarget>,
    driver: Arc<dyn PageDriver>,
    links: Arc<dyn LinkChecker>,
    engine: Arc<ConformityEngine>,
    page_gate: Arc<Semaphore>,
    parallel_gate: Arc<Semaphore>,
    close_timeout: Duration,
    cancel: CancellationToken,
}

impl CheckUnit {
    async fn execute(self) -> CriterionOutcome {
        let clock = Instant::now();
        let result = self.guarded().await;
        let elapsed = clock.elapsed();

        match &result {
            Ok(verdict) => debug!(
                "'{}' finished in {:?}: {}",
                self.name,
                elapsed,
                if verdict.passed { "passed" } else { "failed" }
            ),
            Err(e @ (CheckError::Timeout(_) | CheckError::Panicked(_))) => {
                warn!("'{}' recovered from failure: {}", self.name, e)
            }
            Err(e) => debug!("'{}' finished in {:?} with error: {}", self.name, elapsed, e),
        }

        CriterionOutcome::from_check_result(&self.name, result)
            .with_duration_ms(elapsed.as_millis().try_into().unwrap_or(u64::MAX))
    }

    async fn guarded(&self) -> Result<Verdict, CheckError> {
        let _slot = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(CheckError::Cancelled),
            permit = self.parallel_gate.acquire() => permit.map_err(|_| CheckError::Cancelled)?,
        };

        let mut page: Option<Box<dyn Page>> = None;
        let result = {
            let work = AssertUnwindSafe(self.evaluate(&mut page)).catch_unwind();
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(CheckError::Cancelled),
                finished = tokio::time::timeout(self.timeout, work) => match finished {
                    Ok(Ok(result)) => result,
                    Ok(Err(panic)) => Err(CheckError::Panicked(panic_message(panic.as_ref()))),
                    Err(_) => Err(CheckError::Timeout(self.timeout)),
                },
            }
        };

        if let Some(page) = page.take() {
            self.release(page).await;
        }
        result
    }

    /// Open a page (one opener at a time) and run the check on it. The page
    /// is parked in `slot` so the caller can close it whatever happens here.
    async fn evaluate(&self, slot: &mut Option<Box<dyn Page>>) -> Result<Verdict, CheckError> {
        let opened = {
            let _permit = self
                .page_gate
                .acquire()
                .await
                .map_err(|_| CheckError::Cancelled)?;
            self.driver.new_page().await?
        };
        let page: &dyn Page = &**slot.insert(opened);

        let ctx = CheckContext {
            target: &self.target,
            entry_url: &self.entry_url,
            page,
            engine: &self.engine,
            links: self.links.as_ref(),
            cancel: &self.cancel,
        };
        self.check.run(&ctx).await
    }

    async fn release(&self, page: Box<dyn Page>) {
        match tokio::time::timeout(self.close_timeout, page.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Closing page of '{}' failed: {}", self.name, e),
            Err(_) => warn!(
                "Closing page of '{}' exceeded {:?}",
                self.name, self.close_timeout
            ),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
