//! Configuration schema (flowguard.toml)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::diagnostic::{DiagnosticCode, Severity};
use crate::rules::RulesConfig;

/// Default margin between the diagram bounding box and the preview origin
pub const DEFAULT_PADDING: f64 = 80.0;

/// What to do with `file:` and `blob:` references when rewriting for render
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetPolicy {
    /// Swap them for an inline "asset missing" placeholder
    #[default]
    Degrade,

    /// Leave them alone so the breakage is visible
    Strict,
}

impl std::fmt::Display for AssetPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Degrade => write!(f, "degrade"),
            Self::Strict => write!(f, "strict"),
        }
    }
}

impl std::str::FromStr for AssetPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "degrade" => Ok(Self::Degrade),
            "strict" => Ok(Self::Strict),
            other => Err(ConfigError::InvalidValue(format!(
                "unknown asset policy '{}' (expected 'degrade' or 'strict')",
                other
            ))),
        }
    }
}

/// Asset URL handling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Deployment base path the site is served under
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Rewrite policy for local references
    #[serde(default)]
    pub policy: AssetPolicy,
}

fn default_base_url() -> String {
    "/".to_string()
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            policy: AssetPolicy::default(),
        }
    }
}

/// Preview framing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Margin in diagram units
    #[serde(default = "default_padding")]
    pub padding: f64,
}

fn default_padding() -> f64 {
    DEFAULT_PADDING
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            padding: DEFAULT_PADDING,
        }
    }
}

/// Severity threshold overrides for specific diagnostic codes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeverityThreshold {
    /// Map of diagnostic code to severity override
    #[serde(default)]
    pub overrides: HashMap<String, Severity>,
}

impl SeverityThreshold {
    /// Get severity for a diagnostic code, or its default
    pub fn get_severity(&self, code: DiagnosticCode) -> Severity {
        self.overrides
            .get(code.as_str())
            .copied()
            .unwrap_or_else(|| code.default_severity())
    }

    /// Set severity override for a code
    pub fn set_override(&mut self, code: DiagnosticCode, severity: Severity) {
        self.overrides.insert(code.as_str().to_string(), severity);
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Asset URL handling
    #[serde(default)]
    pub assets: AssetsConfig,

    /// Preview framing
    #[serde(default)]
    pub preview: PreviewConfig,

    /// Severity thresholds
    #[serde(default)]
    pub severity: SeverityThreshold,

    /// Group rule set
    #[serde(default)]
    pub rules: RulesConfig,
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Reject values the pipeline cannot use
    pub fn validate(&self) -> Result<(), ConfigError> {
        let padding = self.preview.padding;
        if !padding.is_finite() || padding < 0.0 {
            return Err(ConfigError::InvalidValue(format!(
                "preview.padding must be a finite, non-negative number (got {})",
                padding
            )));
        }

        for code in self.severity.overrides.keys() {
            if !DiagnosticCode::ALL.iter().any(|known| known.as_str() == code) {
                return Err(ConfigError::InvalidValue(format!(
                    "unknown diagnostic code in severity.overrides: {}",
                    code
                )));
            }
        }

        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.assets.base_url, "/");
        assert_eq!(config.assets.policy, AssetPolicy::Degrade);
        assert_eq!(config.preview.padding, 80.0);
        assert_eq!(config.rules, RulesConfig::default());
    }

    #[test]
    fn severity_override() {
        let mut threshold = SeverityThreshold::default();
        assert_eq!(threshold.get_severity(DiagnosticCode::MissingFireShikigami), Severity::Info);

        threshold.set_override(DiagnosticCode::MissingFireShikigami, Severity::Error);
        assert_eq!(threshold.get_severity(DiagnosticCode::MissingFireShikigami), Severity::Error);
    }

    #[test]
    fn partial_toml() {
        let config = Config::from_toml(
            r#"
            [assets]
            base_url = "/wiki/"
            policy = "strict"

            [severity.overrides]
            MISSING_FIRE_SHIKIGAMI = "warn"

            [rules]
            fireShikigamiWhitelist = ["座敷童子"]
            "#,
        )
        .unwrap();

        assert_eq!(config.assets.base_url, "/wiki/");
        assert_eq!(config.assets.policy, AssetPolicy::Strict);
        assert_eq!(config.preview.padding, DEFAULT_PADDING);
        assert_eq!(
            config.severity.get_severity(DiagnosticCode::MissingFireShikigami),
            Severity::Warn
        );
        assert_eq!(config.rules.fire_shikigami_whitelist, vec!["座敷童子".to_string()]);
        assert!(config.rules.shikigami_conflict_pairs.is_empty());
    }

    #[test]
    fn negative_padding_rejected() {
        let err = Config::from_toml("[preview]\npadding = -4.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn unknown_override_rejected() {
        let err = Config::from_toml("[severity.overrides]\nNOT_A_CODE = \"warn\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn policy_from_str() {
        assert_eq!("Strict".parse::<AssetPolicy>().unwrap(), AssetPolicy::Strict);
        assert_eq!(" degrade ".parse::<AssetPolicy>().unwrap(), AssetPolicy::Degrade);
        assert!("lenient".parse::<AssetPolicy>().is_err());
    }

    #[test]
    fn config_toml_roundtrip() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed = Config::from_toml(&toml).unwrap();
        assert_eq!(config, parsed);
    }
}
