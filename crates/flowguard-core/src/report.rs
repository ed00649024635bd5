//! report.json written by `flowguard check`
//!
//! Editors and CI read this file, so its shape only changes with a version
//! bump: new optional fields raise `minor`, anything else raises `major`.

use serde::{Deserialize, Serialize};
use crate::diagnostic::{Diagnostic, Severity};

/// `major.minor` of the report format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportVersion {
    pub major: u32,
    pub minor: u32,
}

impl ReportVersion {
    pub const CURRENT: ReportVersion = ReportVersion { major: 1, minor: 0 };
}

impl std::fmt::Display for ReportVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Counts shown at the top of the report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub total: usize,
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,

    /// Nodes in the active document
    pub nodes_checked: usize,

    /// Selector groups the rule set ran against
    pub groups_checked: usize,
}

impl ReportSummary {
    fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.errors += 1,
            Severity::Warn => self.warnings += 1,
            Severity::Info => self.info += 1,
        }
        self.total += 1;
    }
}

/// Asset and rule findings for one diagram, in the order they were found
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub version: ReportVersion,

    /// RFC 3339, UTC
    pub timestamp: String,

    pub summary: ReportSummary,

    /// Asset issues first, then rule warnings
    pub diagnostics: Vec<Diagnostic>,

    /// Base URL, active file and rule set version the check ran with
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Report {
    pub fn new() -> Self {
        Self {
            version: ReportVersion::CURRENT,
            timestamp: chrono::Utc::now().to_rfc3339(),
            summary: ReportSummary::default(),
            diagnostics: Vec::new(),
            metadata: None,
        }
    }

    pub fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        let mut report = Self::new();
        diagnostics.into_iter().for_each(|diagnostic| report.add_diagnostic(diagnostic));
        report
    }

    pub fn add_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.summary.record(diagnostic.severity);
        self.diagnostics.push(diagnostic);
    }

    /// Whether `flowguard check` should fail
    pub fn has_errors(&self) -> bool {
        self.summary.errors > 0
    }

    /// Pretty-printed report.json
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::new()
    }
}
