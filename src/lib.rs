pub mod auditor;
pub mod checks;
pub mod config;
pub mod conformity;
pub mod driver;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod slug;

// Re-export main types
pub use auditor::Auditor;
pub use checks::{Check, CheckContext, CheckError, CheckRegistry, CheckSettings, CheckSpec, Verdict};
pub use config::{AuditConfig, ConformityConfig, OutputConfig};
pub use conformity::{ConformityEngine, DiffLine, Lexicon, TextComparisonResult};
pub use driver::{
    DriverError, Element, HttpLinkChecker, LinkChecker, Page, PageDriver, PageMetrics, LinkError, Rect,
};
pub use models::{
    ComplianceReport, ComplianceTarget, CriterionOutcome, ErrorInfo, ErrorKind, aggregate,
};
pub use orchestrator::{Orchestrator, OrchestratorConfig, RouteRule, RouteTable};
pub use output::{JsonReportSink, ReportSink, render_summary};

// Re-export slug utilities
pub use slug::{slugify, slugify_truncate};
