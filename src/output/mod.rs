pub mod files;

pub use files::*;

use std::fmt::Write as _;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::ComplianceReport;

/// Trait for persisting or rendering finished reports
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn accept(&self, report: &ComplianceReport) -> Result<()>;
}

/// Plain-text summary: header, then one block per criterion in report order
pub fn render_summary(report: &ComplianceReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Target: {}", report.target().url());
    let _ = writeln!(
        out,
        "Checked: {}",
        report.started_at().format("%Y-%m-%d %H:%M:%S UTC")
    );
    let _ = writeln!(out, "Duration: {:.1}s", report.duration().as_secs_f64());
    let _ = writeln!(
        out,
        "Conform: {} ({}/{} criteria passed)",
        report.conformity_label(),
        report.passed_count(),
        report.outcomes().len()
    );

    for outcome in report.outcomes() {
        let status = match outcome.error() {
            _ if outcome.is_passed() => "PASS".to_string(),
            Some(error) => format!("ERROR ({})", error.kind),
            None => "FAIL".to_string(),
        };
        let _ = writeln!(out);
        let _ = writeln!(out, "[{}] {}", status, outcome.name());
        for line in outcome.evidence().lines() {
            let _ = writeln!(out, "    {}", line);
        }
    }

    out
}
