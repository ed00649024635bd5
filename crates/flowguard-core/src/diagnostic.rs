//! Diagnostic codes and error reporting
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! The editor UI keys highlighting and help text off these strings.
//! NEVER rename or remove codes - add new ones with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Asset references
    /// A `file:` URL that only resolves on the author's machine
    FileUrl,

    /// A `blob:` URL that dies with the browser session that created it
    BlobUrl,

    /// A root-relative path outside the deployment-scoped asset namespace
    NonStandardAbsolutePath,

    // Group composition rules
    /// A shikigami carries a yuhun set listed in the blacklist
    ShikigamiYuhunBlacklist,

    /// Two shikigami configured as conflicting share a group
    ShikigamiConflict,

    /// A group has shikigami but none from the fire whitelist
    MissingFireShikigami,
}

impl DiagnosticCode {
    /// Every registered code
    pub const ALL: [DiagnosticCode; 6] = [
        Self::FileUrl,
        Self::BlobUrl,
        Self::NonStandardAbsolutePath,
        Self::ShikigamiYuhunBlacklist,
        Self::ShikigamiConflict,
        Self::MissingFireShikigami,
    ];

    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileUrl => "FILE_URL",
            Self::BlobUrl => "BLOB_URL",
            Self::NonStandardAbsolutePath => "NON_STANDARD_ABSOLUTE_PATH",
            Self::ShikigamiYuhunBlacklist => "SHIKIGAMI_YUHUN_BLACKLIST",
            Self::ShikigamiConflict => "SHIKIGAMI_CONFLICT",
            Self::MissingFireShikigami => "MISSING_FIRE_SHIKIGAMI",
        }
    }

    /// Severity used when no override is configured
    ///
    /// `file:` and `blob:` references never render on the public site, so they
    /// block. Rule hits are warnings; the coverage hint is advisory only.
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::FileUrl | Self::BlobUrl => Severity::Error,
            Self::NonStandardAbsolutePath
            | Self::ShikigamiYuhunBlacklist
            | Self::ShikigamiConflict => Severity::Warn,
            Self::MissingFireShikigami => Severity::Info,
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - should be reviewed but not blocking
    Warn,

    /// Error - blocking issue, the diagram will not render as authored
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic message with structured metadata
///
/// This is the report-level view shared by asset issues and rule warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Offending URL for asset issues
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Group the warning belongs to, for rule warnings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,

    /// Nodes to highlight in the editor
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_ids: Vec<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            url: None,
            group_id: None,
            node_ids: Vec::new(),
        }
    }

    /// Set the offending URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Set the group and the nodes that make it up
    pub fn with_group(mut self, group_id: impl Into<String>, node_ids: Vec<String>) -> Self {
        self.group_id = Some(group_id.into());
        self.node_ids = node_ids;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_code_stability() {
        // The editor matches on these exact strings
        assert_eq!(DiagnosticCode::FileUrl.as_str(), "FILE_URL");
        assert_eq!(DiagnosticCode::NonStandardAbsolutePath.as_str(), "NON_STANDARD_ABSOLUTE_PATH");
        assert_eq!(DiagnosticCode::MissingFireShikigami.as_str(), "MISSING_FIRE_SHIKIGAMI");
    }

    #[test]
    fn serde_name_matches_as_str() {
        for code in DiagnosticCode::ALL {
            let json = serde_json::to_string(&code).unwrap();
            assert_eq!(json, format!("\"{}\"", code.as_str()));
        }
    }

    #[test]
    fn coverage_hint_is_advisory() {
        assert_eq!(DiagnosticCode::MissingFireShikigami.default_severity(), Severity::Info);
        assert_eq!(DiagnosticCode::BlobUrl.default_severity(), Severity::Error);
    }

    #[test]
    fn diagnostic_serialization() {
        let diag = Diagnostic::new(
            DiagnosticCode::ShikigamiConflict,
            Severity::Warn,
            "千姬 and 腹肌清姬 in one team",
        )
        .with_group("g1", vec!["n1".to_string(), "n2".to_string()]);

        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("SHIKIGAMI_CONFLICT"));
        assert!(json.contains("\"warn\""));
        assert!(json.contains("\"node_ids\":[\"n1\",\"n2\"]"));
        assert!(!json.contains("\"url\""));
    }
}
