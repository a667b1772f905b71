use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::fs;
use tracing::info;

use crate::config::OutputConfig;
use crate::models::ComplianceReport;
use crate::slug::report_file_name;

use super::ReportSink;

/// Writes each report as a pretty-printed JSON document
pub struct JsonReportSink {
    config: OutputConfig,
}

impl JsonReportSink {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Where `report` is (or will be) written
    pub fn path_for(&self, report: &ComplianceReport) -> PathBuf {
        self.config
            .reports_dir
            .join(report_file_name(report.target(), report.started_at()))
    }

    async fn ensure_reports_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.config.reports_dir)
            .await
            .context("Failed to create reports directory")
    }
}

#[async_trait]
impl ReportSink for JsonReportSink {
    async fn accept(&self, report: &ComplianceReport) -> Result<()> {
        self.ensure_reports_dir().await?;

        let path = self.path_for(report);
        let json = serde_json::to_string_pretty(report).context("Failed to serialize report")?;
        fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write report: {:?}", path))?;

        info!("Wrote report: {:?}", path);
        Ok(())
    }
}

/// Read a report previously written by [`JsonReportSink`]
pub async fn read_report(path: &Path) -> Result<ComplianceReport> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read report: {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse report: {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ComplianceTarget, CriterionOutcome, aggregate};
    use chrono::Utc;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_report_written_and_read_back() {
        let temp = TempDir::new().unwrap();
        let sink = JsonReportSink::new(OutputConfig {
            reports_dir: temp.path().join("reports"),
        });
        let report = aggregate(
            ComplianceTarget::new("shop.example").unwrap(),
            vec![CriterionOutcome::failed("Clear CTA", "No clear CTA found")],
            Utc::now(),
            Duration::from_millis(40),
        );

        sink.accept(&report).await.unwrap();

        let path = sink.path_for(&report);
        assert!(path.exists());
        assert!(
            path.file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("shop-example-")
        );
        let loaded = read_report(&path).await.unwrap();
        assert_eq!(loaded.outcomes(), report.outcomes());
        assert!(!loaded.overall_pass());
    }
}
