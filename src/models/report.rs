use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::outcome::CriterionOutcome;
use super::target::ComplianceTarget;

/// Final verdict for one target. Built once by [`aggregate`] and never
/// mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComplianceReport {
    target: ComplianceTarget,
    outcomes: Vec<CriterionOutcome>,
    overall_pass: bool,
    started_at: DateTime<Utc>,
    duration_ms: u64,
}

/// Merge per-criterion outcomes into a report.
///
/// Outcomes keep the order they were given in (registry order), so two runs
/// against an unchanged site list their evidence identically. A report with
/// no outcomes is never conformant: zero evaluated criteria means a degraded
/// run, not compliance.
pub fn aggregate(
    target: ComplianceTarget,
    outcomes: Vec<CriterionOutcome>,
    started_at: DateTime<Utc>,
    duration: Duration,
) -> ComplianceReport {
    let overall_pass = !outcomes.is_empty() && outcomes.iter().all(CriterionOutcome::is_passed);

    ComplianceReport {
        target,
        outcomes,
        overall_pass,
        started_at,
        duration_ms: duration.as_millis().try_into().unwrap_or(u64::MAX),
    }
}

impl ComplianceReport {
    pub fn target(&self) -> &ComplianceTarget {
        &self.target
    }

    pub fn outcomes(&self) -> &[CriterionOutcome] {
        &self.outcomes
    }

    pub fn outcome(&self, name: &str) -> Option<&CriterionOutcome> {
        self.outcomes.iter().find(|o| o.name() == name)
    }

    pub fn overall_pass(&self) -> bool {
        self.overall_pass
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_passed()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &CriterionOutcome> {
        self.outcomes.iter().filter(|o| !o.is_passed())
    }

    /// "Yes"/"No" conformity label, as shown in persisted reports
    pub fn conformity_label(&self) -> &'static str {
        if self.overall_pass { "Yes" } else { "No" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ErrorInfo, ErrorKind};

    fn target() -> ComplianceTarget {
        ComplianceTarget::new("example.com").unwrap()
    }

    #[test]
    fn test_all_passed_is_conformant() {
        let report = aggregate(
            target(),
            vec![
                CriterionOutcome::passed("a", "ok"),
                CriterionOutcome::passed("b", "ok"),
            ],
            Utc::now(),
            Duration::from_millis(12),
        );
        assert!(report.overall_pass());
        assert_eq!(report.conformity_label(), "Yes");
        assert_eq!(report.passed_count(), 2);
        assert_eq!(report.duration(), Duration::from_millis(12));
    }

    #[test]
    fn test_one_failure_fails_report() {
        let report = aggregate(
            target(),
            vec![
                CriterionOutcome::passed("a", "ok"),
                CriterionOutcome::errored("b", ErrorInfo::new(ErrorKind::Navigation, "dns")),
                CriterionOutcome::passed("c", "ok"),
            ],
            Utc::now(),
            Duration::ZERO,
        );
        assert!(!report.overall_pass());
        assert_eq!(report.failed().count(), 1);
        assert_eq!(
            report.outcome("b").and_then(|o| o.error_kind()),
            Some(ErrorKind::Navigation)
        );
    }

    #[test]
    fn test_empty_outcomes_never_pass() {
        let report = aggregate(target(), Vec::new(), Utc::now(), Duration::ZERO);
        assert!(!report.overall_pass());
        assert!(report.outcomes().is_empty());
    }

    #[test]
    fn test_order_is_preserved() {
        let names = ["z", "a", "m"];
        let outcomes = names
            .iter()
            .map(|n| CriterionOutcome::passed(*n, "ok"))
            .collect();
        let report = aggregate(target(), outcomes, Utc::now(), Duration::ZERO);
        let got: Vec<_> = report.outcomes().iter().map(|o| o.name()).collect();
        assert_eq!(got, names);
    }

    #[test]
    fn test_report_json_roundtrip_keeps_verdict() {
        let report = aggregate(
            target(),
            vec![CriterionOutcome::failed("a", "missing")],
            Utc::now(),
            Duration::from_secs(2),
        );
        let json = serde_json::to_string(&report).unwrap();
        let back: ComplianceReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }
}
