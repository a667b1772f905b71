use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::checks::CheckRegistry;
use crate::models::{ComplianceReport, ComplianceTarget};
use crate::orchestrator::Orchestrator;
use crate::output::ReportSink;

/// Orchestrator, registry and sink wired together: one call per audit.
pub struct Auditor {
    orchestrator: Orchestrator,
    registry: CheckRegistry,
    sink: Arc<dyn ReportSink>,
}

impl Auditor {
    pub fn new(orchestrator: Orchestrator, registry: CheckRegistry, sink: Arc<dyn ReportSink>) -> Self {
        Self {
            orchestrator,
            registry,
            sink,
        }
    }

    pub fn registry(&self) -> &CheckRegistry {
        &self.registry
    }

    /// Run all checks and hand the report to the sink
    pub async fn audit(&self, target: ComplianceTarget, cancel: &CancellationToken) -> Result<ComplianceReport> {
        let report = self.orchestrator.run_all(&self.registry, target, cancel).await;
        self.sink
            .accept(&report)
            .await
            .context("Report sink rejected the report")?;
        Ok(report)
    }
}
