//! flowguard core
//!
//! Stable domain types shared by every crate: diagnostic codes, the report
//! format, configuration, and the group rule set.
//! Never rename diagnostic codes - they are part of the public API.

pub mod diagnostic;
pub mod report;
pub mod config;
pub mod rules;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use report::{Report, ReportSummary, ReportVersion};
pub use config::{AssetPolicy, AssetsConfig, Config, ConfigError, PreviewConfig, SeverityThreshold, DEFAULT_PADDING};
pub use rules::{BlacklistRule, ConflictRule, RulesConfig, SHIKIGAMI_LIBRARY, YUHUN_LIBRARY};
