use serde::{Deserialize, Serialize};

use crate::checks::{CheckError, Verdict};

/// Classified failure attached to an outcome
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Target unreachable, DNS failure, or page load timeout
    Navigation,
    /// Expected element absent
    ElementNotFound,
    /// Text could not be read from a found element
    Extraction,
    /// Malformed or empty template/actual text
    Comparison,
    /// The check exceeded its deadline
    Timeout,
    /// The run was cancelled by the caller
    Cancelled,
    /// The check panicked
    Panicked,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorKind::Navigation => "navigation",
            ErrorKind::ElementNotFound => "element not found",
            ErrorKind::Extraction => "extraction",
            ErrorKind::Comparison => "comparison",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Panicked => "panicked",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<&CheckError> for ErrorInfo {
    fn from(err: &CheckError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

/// Recorded pass/fail and evidence for one criterion in one run.
///
/// Fields are private: an outcome is written once by the check boundary and
/// only read afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CriterionOutcome {
    name: String,
    passed: bool,
    evidence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<ErrorInfo>,
    #[serde(default)]
    duration_ms: u64,
}

impl CriterionOutcome {
    pub fn passed(name: impl Into<String>, evidence: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            evidence: evidence.into(),
            error: None,
            duration_ms: 0,
        }
    }

    pub fn failed(name: impl Into<String>, evidence: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: false,
            evidence: evidence.into(),
            error: None,
            duration_ms: 0,
        }
    }

    /// Failed outcome carrying a classified error
    pub fn errored(name: impl Into<String>, error: ErrorInfo) -> Self {
        Self {
            name: name.into(),
            passed: false,
            evidence: error.message.clone(),
            error: Some(error),
            duration_ms: 0,
        }
    }

    /// Adapter at the check boundary: every check result, whatever went
    /// wrong inside it, becomes exactly one outcome.
    ///
    /// A missing element is a meaningful negative result rather than a
    /// system error, so it yields a failed outcome without `error`.
    pub fn from_check_result(name: impl Into<String>, result: Result<Verdict, CheckError>) -> Self {
        match result {
            Ok(verdict) if verdict.passed => Self::passed(name, verdict.evidence),
            Ok(verdict) => Self::failed(name, verdict.evidence),
            Err(CheckError::ElementNotFound(what)) => Self::failed(name, what),
            Err(err) => Self::errored(name, ErrorInfo::from(&err)),
        }
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_passed(&self) -> bool {
        self.passed
    }

    pub fn evidence(&self) -> &str {
        &self.evidence
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_passing_verdict_maps_to_passed_outcome() {
        let outcome =
            CriterionOutcome::from_check_result("Clear CTA", Ok(Verdict::pass("Found CTA: 'anmelden'")));
        assert!(outcome.is_passed());
        assert_eq!(outcome.evidence(), "Found CTA: 'anmelden'");
        assert!(outcome.error().is_none());
    }

    #[test]
    fn test_element_not_found_is_a_plain_negative_result() {
        let outcome = CriterionOutcome::from_check_result(
            "Cookie Banner Visibility",
            Err(CheckError::ElementNotFound("No visible cookie banner found".into())),
        );
        assert!(!outcome.is_passed());
        assert_eq!(outcome.evidence(), "No visible cookie banner found");
        assert!(outcome.error().is_none());
    }

    #[test]
    fn test_other_errors_are_classified() {
        let outcome = CriterionOutcome::from_check_result(
            "Age Limitation",
            Err(CheckError::Timeout(Duration::from_secs(3))),
        );
        assert!(!outcome.is_passed());
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Timeout));
        assert!(outcome.evidence().contains("deadline"));
    }

    #[test]
    fn test_outcome_serialization_skips_empty_error() {
        let outcome = CriterionOutcome::passed("Footer Essentials", "all present");
        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["passed"], true);
    }
}
