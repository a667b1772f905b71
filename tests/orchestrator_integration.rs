//! Integration tests for the check orchestrator.
//!
//! These tests verify:
//! - One outcome per registered check, in registry order
//! - Failure isolation for errors, panics and timeouts
//! - Cancellation and page release on every exit path
//! - Route overrides and the audit facade

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use common::{FakeDriver, FakeLinks};
use site_conformity::{
    Auditor, Check, CheckContext, CheckError, CheckRegistry, CheckSpec, ComplianceTarget,
    ConformityEngine, ErrorKind, JsonReportSink, Orchestrator, OrchestratorConfig, OutputConfig,
    RouteRule, RouteTable, Verdict,
};

// ============================================================================
// Test checks
// ============================================================================

struct Pass;

#[async_trait]
impl Check for Pass {
    async fn run(&self, _ctx: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        Ok(Verdict::pass("ok"))
    }
}

struct Fail(CheckError);

#[async_trait]
impl Check for Fail {
    async fn run(&self, _ctx: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        Err(self.0.clone())
    }
}

struct Panics;

#[async_trait]
impl Check for Panics {
    async fn run(&self, _ctx: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        panic!("selector engine crashed");
    }
}

/// Sleeps, then passes with its own label as evidence
struct Sleeps(Duration, &'static str);

#[async_trait]
impl Check for Sleeps {
    async fn run(&self, _ctx: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        tokio::time::sleep(self.0).await;
        Ok(Verdict::pass(self.1))
    }
}

/// Reports the entry url it was given
struct EchoEntry;

#[async_trait]
impl Check for EchoEntry {
    async fn run(&self, ctx: &CheckContext<'_>) -> Result<Verdict, CheckError> {
        Ok(Verdict::pass(ctx.entry_url))
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn orchestrator(driver: Arc<FakeDriver>) -> Orchestrator {
    Orchestrator::new(
        driver,
        Arc::new(FakeLinks::default()),
        Arc::new(ConformityEngine::default()),
        OrchestratorConfig::default(),
    )
}

fn target() -> ComplianceTarget {
    ComplianceTarget::new("shop.example").unwrap()
}

fn registry(specs: Vec<CheckSpec>) -> CheckRegistry {
    CheckRegistry::new(specs).unwrap()
}

// ============================================================================
// Completeness, ordering and isolation
// ============================================================================

#[tokio::test]
async fn test_every_check_yields_one_outcome_in_registry_order() {
    let driver = Arc::new(FakeDriver::empty());
    let registry = registry(vec![
        CheckSpec::new("slow", Sleeps(Duration::from_millis(120), "slow")),
        CheckSpec::new("fast", Sleeps(Duration::from_millis(5), "fast")),
        CheckSpec::new("medium", Sleeps(Duration::from_millis(60), "medium")),
    ]);

    let report = orchestrator(driver)
        .run_all(&registry, target(), &CancellationToken::new())
        .await;

    let names: Vec<_> = report.outcomes().iter().map(|o| o.name()).collect();
    assert_eq!(names, vec!["slow", "fast", "medium"]);
    let evidence: Vec<_> = report.outcomes().iter().map(|o| o.evidence()).collect();
    assert_eq!(evidence, vec!["slow", "fast", "medium"]);
    assert!(report.overall_pass());
}

#[tokio::test]
async fn test_outcome_order_is_independent_of_completion_order() {
    let names = ["alpha", "beta", "gamma", "delta"];
    let mut runs = Vec::new();

    for delays in [[10u64, 80, 40, 120], [120, 40, 80, 10]] {
        let specs = names
            .iter()
            .zip(delays)
            .map(|(name, delay)| CheckSpec::new(*name, Sleeps(Duration::from_millis(delay), *name)))
            .collect();
        let report = orchestrator(Arc::new(FakeDriver::empty()))
            .run_all(&registry(specs), target(), &CancellationToken::new())
            .await;

        let order: Vec<String> = report.outcomes().iter().map(|o| o.name().to_string()).collect();
        runs.push(order);
    }

    assert_eq!(runs[0], names);
    assert_eq!(runs[0], runs[1]);
}

#[tokio::test]
async fn test_checks_run_concurrently() {
    let driver = Arc::new(FakeDriver::empty());
    let specs = (0..4)
        .map(|i| CheckSpec::new(format!("check-{}", i), Sleeps(Duration::from_millis(200), "done")))
        .collect();

    let clock = Instant::now();
    let report = orchestrator(driver)
        .run_all(&registry(specs), target(), &CancellationToken::new())
        .await;

    assert_eq!(report.outcomes().len(), 4);
    assert!(clock.elapsed() < Duration::from_millis(700), "took {:?}", clock.elapsed());
}

#[tokio::test]
async fn test_failing_and_panicking_checks_do_not_affect_siblings() {
    let driver = Arc::new(FakeDriver::empty());
    let registry = registry(vec![
        CheckSpec::new("first", Pass),
        CheckSpec::new("unreachable", Fail(CheckError::Navigation("dns failure".into()))),
        CheckSpec::new("panics", Panics),
        CheckSpec::new("missing", Fail(CheckError::ElementNotFound("No banner".into()))),
        CheckSpec::new("last", Pass),
    ]);

    let report = orchestrator(driver.clone())
        .run_all(&registry, target(), &CancellationToken::new())
        .await;

    assert_eq!(report.outcomes().len(), 5);
    assert!(!report.overall_pass());
    assert!(report.outcome("first").unwrap().is_passed());
    assert!(report.outcome("last").unwrap().is_passed());

    let unreachable = report.outcome("unreachable").unwrap();
    assert_eq!(unreachable.error_kind(), Some(ErrorKind::Navigation));

    let panics = report.outcome("panics").unwrap();
    assert!(!panics.is_passed());
    assert_eq!(panics.error_kind(), Some(ErrorKind::Panicked));
    assert!(panics.evidence().contains("selector engine crashed"));

    let missing = report.outcome("missing").unwrap();
    assert!(!missing.is_passed());
    assert!(missing.error().is_none());
    assert_eq!(missing.evidence(), "No banner");

    assert_eq!(driver.counters.opened(), 5);
    assert_eq!(driver.counters.closed(), 5);
}

#[tokio::test]
async fn test_check_exceeding_deadline_is_recorded_as_timeout() {
    let driver = Arc::new(FakeDriver::empty());
    let registry = registry(vec![
        CheckSpec::new("one", Pass),
        CheckSpec::new("two", Sleeps(Duration::from_secs(10), "never"))
            .with_timeout(Duration::from_millis(50)),
        CheckSpec::new("three", Pass),
    ]);

    let clock = Instant::now();
    let report = orchestrator(driver.clone())
        .run_all(&registry, target(), &CancellationToken::new())
        .await;

    assert!(clock.elapsed() < Duration::from_secs(5));
    assert_eq!(report.outcomes().len(), 3);
    assert!(report.outcomes()[0].is_passed());
    assert_eq!(report.outcomes()[1].error_kind(), Some(ErrorKind::Timeout));
    assert!(!report.outcomes()[1].is_passed());
    assert!(report.outcomes()[2].is_passed());
    assert_eq!(driver.counters.closed(), driver.counters.opened());
}

#[tokio::test]
async fn test_default_timeout_applies_without_own_deadline() {
    let driver = Arc::new(FakeDriver::empty());
    let config = OrchestratorConfig {
        default_timeout_secs: 1,
        ..OrchestratorConfig::default()
    };
    let orchestrator = Orchestrator::new(
        driver,
        Arc::new(FakeLinks::default()),
        Arc::new(ConformityEngine::default()),
        config,
    );
    let registry = registry(vec![CheckSpec::new("hangs", Sleeps(Duration::from_secs(30), "never"))]);

    let report = orchestrator
        .run_all(&registry, target(), &CancellationToken::new())
        .await;
    assert_eq!(report.outcomes()[0].error_kind(), Some(ErrorKind::Timeout));
}

#[tokio::test]
async fn test_empty_registry_is_not_conformant() {
    let driver = Arc::new(FakeDriver::empty());
    let report = orchestrator(driver.clone())
        .run_all(&CheckRegistry::empty(), target(), &CancellationToken::new())
        .await;

    assert!(report.outcomes().is_empty());
    assert!(!report.overall_pass());
    assert_eq!(driver.counters.opened(), 0);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancellation_records_unfinished_checks() {
    let driver = Arc::new(FakeDriver::empty());
    let registry = registry(vec![
        CheckSpec::new("quick", Pass),
        CheckSpec::new("stuck-a", Sleeps(Duration::from_secs(30), "never")),
        CheckSpec::new("stuck-b", Sleeps(Duration::from_secs(30), "never")),
    ]);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let clock = Instant::now();
    let report = orchestrator(driver.clone())
        .run_all(&registry, target(), &cancel)
        .await;

    assert!(clock.elapsed() < Duration::from_secs(5));
    assert_eq!(report.outcomes().len(), 3);
    assert!(report.outcome("quick").unwrap().is_passed());
    for name in ["stuck-a", "stuck-b"] {
        let outcome = report.outcome(name).unwrap();
        assert!(!outcome.is_passed());
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Cancelled));
    }
    assert_eq!(driver.counters.closed(), driver.counters.opened());
}

#[tokio::test]
async fn test_already_cancelled_run_opens_no_pages() {
    let driver = Arc::new(FakeDriver::empty());
    let registry = registry(vec![CheckSpec::new("a", Pass), CheckSpec::new("b", Pass)]);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = orchestrator(driver.clone())
        .run_all(&registry, target(), &cancel)
        .await;

    assert!(
        report
            .outcomes()
            .iter()
            .all(|o| o.error_kind() == Some(ErrorKind::Cancelled))
    );
    assert_eq!(driver.counters.opened(), 0);
}

// ============================================================================
// Reentrancy, routing and the audit facade
// ============================================================================

#[tokio::test]
async fn test_concurrent_runs_do_not_interfere() {
    let driver = Arc::new(FakeDriver::empty());
    let orchestrator = orchestrator(driver);
    let passing = registry(vec![CheckSpec::new("a", Sleeps(Duration::from_millis(50), "a"))]);
    let failing = registry(vec![CheckSpec::new("b", Panics)]);
    let cancel = CancellationToken::new();

    let (first, second) = tokio::join!(
        orchestrator.run_all(&passing, ComplianceTarget::new("one.example").unwrap(), &cancel),
        orchestrator.run_all(&failing, ComplianceTarget::new("two.example").unwrap(), &cancel),
    );

    assert!(first.overall_pass());
    assert_eq!(first.target().url(), "https://one.example");
    assert!(!second.overall_pass());
    assert_eq!(second.target().url(), "https://two.example");
}

#[tokio::test]
async fn test_routes_override_entry_url_per_criterion() {
    let driver = Arc::new(FakeDriver::empty());
    let routes = RouteTable::new(&[RouteRule {
        pattern: r"shop\.example".to_string(),
        criteria: vec!["routed".to_string()],
        navigate_to: "https://newsletter.example/anmeldung".to_string(),
    }])
    .unwrap();
    let orchestrator = orchestrator(driver).with_routes(routes);
    let registry = registry(vec![
        CheckSpec::new("routed", EchoEntry),
        CheckSpec::new("plain", EchoEntry),
    ]);

    let report = orchestrator
        .run_all(&registry, target(), &CancellationToken::new())
        .await;

    assert_eq!(
        report.outcome("routed").unwrap().evidence(),
        "https://newsletter.example/anmeldung"
    );
    assert_eq!(report.outcome("plain").unwrap().evidence(), "https://shop.example");
}

#[tokio::test]
async fn test_auditor_writes_report_through_sink() {
    let temp = tempfile::TempDir::new().unwrap();
    let driver = Arc::new(FakeDriver::empty());
    let sink = Arc::new(JsonReportSink::new(OutputConfig {
        reports_dir: temp.path().to_path_buf(),
    }));
    let auditor = Auditor::new(
        orchestrator(driver),
        registry(vec![CheckSpec::new("a", Pass)]),
        sink.clone(),
    );

    let report = auditor
        .audit(target(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(report.overall_pass());
    assert!(sink.path_for(&report).exists());
}
