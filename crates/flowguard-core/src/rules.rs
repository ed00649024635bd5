//! Group rule set (rules.json / `[rules]` in flowguard.toml)
//!
//! Field names are camelCase because authors keep rule sets next to the
//! diagrams they validate, in the same JSON dialect.

use serde::{Deserialize, Serialize};
use std::path::Path;
use crate::config::ConfigError;

/// Library tag for playable units (category A)
pub const SHIKIGAMI_LIBRARY: &str = "shikigami";

/// Library tag for equipment sets (category B)
pub const YUHUN_LIBRARY: &str = "yuhun";

/// A shikigami that should not carry a given yuhun set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlacklistRule {
    pub shikigami: String,
    pub yuhun: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl BlacklistRule {
    pub fn new(shikigami: impl Into<String>, yuhun: impl Into<String>) -> Self {
        Self {
            shikigami: shikigami.into(),
            yuhun: yuhun.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Configured message, or the generated one when absent or blank
    pub fn message(&self) -> String {
        match self.message.as_deref().map(str::trim) {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => format!("规则冲突：{} 不建议携带 {}。", self.shikigami, self.yuhun),
        }
    }
}

/// Two shikigami that should not share a group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRule {
    pub left: String,
    pub right: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ConflictRule {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Configured message, or the generated one when absent or blank
    pub fn message(&self) -> String {
        match self.message.as_deref().map(str::trim) {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => format!("规则冲突：{} 与 {} 不建议同队。", self.left, self.right),
        }
    }
}

/// Rule set evaluated against every selector group
///
/// Validation only ever borrows this; callers that want the shipped rules use
/// `RulesConfig::default()`. A loaded rule set is taken as written: lists it
/// leaves out are empty, not the shipped ones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulesConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Shikigami that satisfy the coverage requirement
    #[serde(default)]
    pub fire_shikigami_whitelist: Vec<String>,

    /// Cross-category (shikigami, yuhun) pairs
    #[serde(default)]
    pub shikigami_yuhun_blacklist: Vec<BlacklistRule>,

    /// Same-category (shikigami, shikigami) pairs
    #[serde(default)]
    pub shikigami_conflict_pairs: Vec<ConflictRule>,
}

fn default_version() -> u32 {
    1
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            fire_shikigami_whitelist: ["辉夜姬", "因幡辉夜姬", "追月神", "座敷童子", "千姬", "帝释天", "食灵"]
                .into_iter()
                .map(String::from)
                .collect(),
            shikigami_yuhun_blacklist: vec![
                BlacklistRule::new("辉夜姬", "破势").with_message("规则冲突：辉夜姬通常不建议携带破势。"),
            ],
            shikigami_conflict_pairs: vec![
                ConflictRule::new("千姬", "腹肌清姬").with_message("规则冲突：千姬与腹肌清姬不建议同队。"),
                ConflictRule::new("千姬", "蝮骨清姬").with_message("规则冲突：千姬与蝮骨清姬不建议同队。"),
            ],
        }
    }
}

impl RulesConfig {
    /// Whether a shikigami name is on the fire whitelist
    pub fn is_fire_shikigami(&self, name: &str) -> bool {
        self.fire_shikigami_whitelist.iter().any(|entry| entry == name)
    }

    /// Parse a rule set from JSON
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Parse a rule set from TOML
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load a rule set; `.json` files are JSON, everything else TOML
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Self::from_json(&contents)
        } else {
            Self::from_toml(&contents)
        }
    }
}
