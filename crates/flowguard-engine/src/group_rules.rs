//! Group composition rules
//!
//! Selector nodes that share a `meta.groupId` form one team. Each team is
//! checked against the configured rule set:
//! - blacklisted (shikigami, yuhun) pairings
//! - conflicting shikigami pairs
//! - the fire coverage requirement
//!
//! Warnings are advisory; nothing here rejects a document.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use flowguard_core::{Diagnostic, DiagnosticCode, RulesConfig, SeverityThreshold, SHIKIGAMI_LIBRARY, YUHUN_LIBRARY};
use flowguard_graph::{GraphDocument, Node};

const MISSING_FIRE_MESSAGE: &str = "规则提示：当前分组未检测到鬼火式神，建议补充供火位。";

/// Avatar path markers, checked in this order
const AVATAR_MARKERS: [(&str, &str); 2] = [("/Yuhun/", YUHUN_LIBRARY), ("/Shikigami/", SHIKIGAMI_LIBRARY)];

/// Codes the rule engine can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RuleWarningCode {
    ShikigamiYuhunBlacklist,
    ShikigamiConflict,
    MissingFireShikigami,
}

impl RuleWarningCode {
    /// Stable code string, shared with the report
    pub fn as_str(&self) -> &'static str {
        DiagnosticCode::from(*self).as_str()
    }
}

impl std::fmt::Display for RuleWarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<RuleWarningCode> for DiagnosticCode {
    fn from(code: RuleWarningCode) -> Self {
        match code {
            RuleWarningCode::ShikigamiYuhunBlacklist => DiagnosticCode::ShikigamiYuhunBlacklist,
            RuleWarningCode::ShikigamiConflict => DiagnosticCode::ShikigamiConflict,
            RuleWarningCode::MissingFireShikigami => DiagnosticCode::MissingFireShikigami,
        }
    }
}

/// One rule hit for one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleWarning {
    pub code: RuleWarningCode,
    pub group_id: String,
    /// Every node of the group, for highlighting
    pub node_ids: Vec<String>,
    pub message: String,
}

impl RuleWarning {
    fn new(code: RuleWarningCode, group: &GroupSummary, message: String) -> Self {
        Self {
            code,
            group_id: group.group_id.clone(),
            node_ids: group.node_ids.clone(),
            message,
        }
    }

    /// Report-level view, severity resolved through the overrides
    pub fn to_diagnostic(&self, severity: &SeverityThreshold) -> Diagnostic {
        let code = DiagnosticCode::from(self.code);
        Diagnostic::new(code, severity.get_severity(code), self.message.clone())
            .with_group(self.group_id.clone(), self.node_ids.clone())
    }
}

/// Asset class of a selected entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Playable unit
    Shikigami,
    /// Equipment set
    Yuhun,
}

impl Category {
    /// Category for a library tag; unknown tags have none
    pub fn from_library(library: &str) -> Option<Self> {
        match library {
            SHIKIGAMI_LIBRARY => Some(Self::Shikigami),
            YUHUN_LIBRARY => Some(Self::Yuhun),
            _ => None,
        }
    }
}

/// Library tag implied by an avatar path, if any
pub fn library_from_avatar(avatar: &str) -> Option<&'static str> {
    AVATAR_MARKERS
        .iter()
        .find(|(marker, _)| avatar.contains(marker))
        .map(|(_, library)| *library)
}

/// Library tag of a selector node
///
/// The first source that yields a value wins, even if that value is not a
/// known category: explicit `assetLibrary`, then the avatar path, then the
/// entry's own `library` field.
pub fn infer_library<'a>(node: &Node<'a>) -> Option<&'a str> {
    if let Some(tag) = node.asset_library() {
        return Some(tag);
    }

    let selection = node.selection().unwrap_or_default();
    selection
        .avatar
        .and_then(library_from_avatar)
        .or(selection.library)
}

/// Category of a selector node, when it can be inferred
pub fn infer_category(node: &Node<'_>) -> Option<Category> {
    infer_library(node).and_then(Category::from_library)
}

/// Composition of one group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub group_id: String,
    pub node_ids: Vec<String>,
    /// Category A names, in node order
    pub shikigami: Vec<String>,
    /// Category B names, in node order
    pub yuhun: Vec<String>,
}

impl GroupSummary {
    fn new(group_id: &str) -> Self {
        Self {
            group_id: group_id.to_string(),
            ..Self::default()
        }
    }

    fn has_shikigami(&self, name: &str) -> bool {
        self.shikigami.iter().any(|entry| entry == name)
    }

    fn has_yuhun(&self, name: &str) -> bool {
        self.yuhun.iter().any(|entry| entry == name)
    }
}

/// Selector groups of a document, in order of first appearance
///
/// Nodes need a non-blank group id and a non-blank selected name to count.
pub fn collect_groups(doc: &GraphDocument) -> Vec<GroupSummary> {
    let mut groups: IndexMap<&str, GroupSummary> = IndexMap::new();

    for node in doc.nodes().filter(Node::is_selector) {
        let Some(group_id) = node.group_id() else {
            continue;
        };
        let Some(name) = node.selection().and_then(|selection| selection.name) else {
            continue;
        };

        let group = groups
            .entry(group_id)
            .or_insert_with(|| GroupSummary::new(group_id));

        if let Some(id) = node.id() {
            group.node_ids.push(id.to_string());
        }

        match infer_category(&node) {
            Some(Category::Shikigami) => group.shikigami.push(name.to_string()),
            Some(Category::Yuhun) => group.yuhun.push(name.to_string()),
            None => {
                tracing::trace!(group_id, name, "selector entry has no known category");
            }
        }
    }

    groups.into_values().collect()
}

/// Evaluates a rule set against every group of a document
#[derive(Debug, Clone, Copy)]
pub struct GroupRuleValidator<'c> {
    config: &'c RulesConfig,
}

impl<'c> GroupRuleValidator<'c> {
    pub fn new(config: &'c RulesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'c RulesConfig {
        self.config
    }

    /// All warnings, grouped by group and ordered by rule within a group
    pub fn validate(&self, doc: &GraphDocument) -> Vec<RuleWarning> {
        self.evaluate(&collect_groups(doc))
    }

    /// Warnings for groups already collected with [`collect_groups`]
    pub fn evaluate(&self, groups: &[GroupSummary]) -> Vec<RuleWarning> {
        let warnings: Vec<RuleWarning> = groups
            .iter()
            .flat_map(|group| self.evaluate_group(group))
            .collect();

        tracing::debug!(
            groups = groups.len(),
            warnings = warnings.len(),
            rules_version = self.config.version,
            "group rules evaluated"
        );

        warnings
    }

    /// Warnings for a single group
    pub fn evaluate_group(&self, group: &GroupSummary) -> Vec<RuleWarning> {
        let mut warnings = Vec::new();

        for rule in &self.config.shikigami_yuhun_blacklist {
            if group.has_shikigami(&rule.shikigami) && group.has_yuhun(&rule.yuhun) {
                warnings.push(RuleWarning::new(
                    RuleWarningCode::ShikigamiYuhunBlacklist,
                    group,
                    rule.message(),
                ));
            }
        }

        for rule in &self.config.shikigami_conflict_pairs {
            if group.has_shikigami(&rule.left) && group.has_shikigami(&rule.right) {
                warnings.push(RuleWarning::new(
                    RuleWarningCode::ShikigamiConflict,
                    group,
                    rule.message(),
                ));
            }
        }

        let has_fire = group.shikigami.iter().any(|name| self.config.is_fire_shikigami(name));
        if !group.shikigami.is_empty() && !has_fire {
            warnings.push(RuleWarning::new(
                RuleWarningCode::MissingFireShikigami,
                group,
                MISSING_FIRE_MESSAGE.to_string(),
            ));
        }

        warnings
    }
}

/// Validate `doc` against `config`, or the shipped rules when `None`
pub fn validate_groups(doc: &GraphDocument, config: Option<&RulesConfig>) -> Vec<RuleWarning> {
    match config {
        Some(config) => GroupRuleValidator::new(config).validate(doc),
        None => {
            let defaults = RulesConfig::default();
            GroupRuleValidator::new(&defaults).validate(doc)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowguard_core::{BlacklistRule, ConflictRule};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn selector(id: &str, group: &str, name: &str, library: &str) -> Value {
        json!({
            "id": id,
            "type": "assetSelector",
            "properties": {
                "assetLibrary": library,
                "meta": {"groupId": group},
                "selectedAsset": {"name": name}
            }
        })
    }

    fn doc(nodes: Vec<Value>) -> GraphDocument {
        GraphDocument::new(nodes, vec![])
    }

    fn codes(warnings: &[RuleWarning]) -> Vec<RuleWarningCode> {
        warnings.iter().map(|warning| warning.code).collect()
    }

    #[test]
    fn blacklist_pairing() {
        let warnings = validate_groups(
            &doc(vec![
                selector("n1", "g1", "辉夜姬", "shikigami"),
                selector("n2", "g1", "破势", "yuhun"),
            ]),
            None,
        );

        assert_eq!(codes(&warnings), vec![RuleWarningCode::ShikigamiYuhunBlacklist]);
        assert_eq!(warnings[0].group_id, "g1");
        assert_eq!(warnings[0].node_ids, vec!["n1", "n2"]);
        assert_eq!(warnings[0].message, "规则冲突：辉夜姬通常不建议携带破势。");
    }

    #[test]
    fn conflict_pair() {
        let warnings = validate_groups(
            &doc(vec![
                selector("n1", "g1", "千姬", "shikigami"),
                selector("n2", "g1", "腹肌清姬", "shikigami"),
            ]),
            None,
        );
        assert_eq!(codes(&warnings), vec![RuleWarningCode::ShikigamiConflict]);
    }

    #[test]
    fn missing_fire_shikigami() {
        let warnings = validate_groups(&doc(vec![selector("n1", "g1", "酒吞童子", "shikigami")]), None);
        assert_eq!(codes(&warnings), vec![RuleWarningCode::MissingFireShikigami]);
        assert_eq!(warnings[0].message, MISSING_FIRE_MESSAGE);
    }

    #[test]
    fn no_shikigami_no_coverage_warning() {
        let config = RulesConfig {
            fire_shikigami_whitelist: vec![],
            ..RulesConfig::default()
        };
        let warnings = validate_groups(&doc(vec![selector("n1", "g1", "破势", "yuhun")]), Some(&config));
        assert!(warnings.is_empty());
    }

    #[test]
    fn rules_are_independent_and_ordered() {
        let config = RulesConfig {
            version: 3,
            fire_shikigami_whitelist: vec!["座敷童子".to_string()],
            shikigami_yuhun_blacklist: vec![BlacklistRule::new("茨木童子", "狂骨")],
            shikigami_conflict_pairs: vec![ConflictRule::new("茨木童子", "酒吞童子")],
        };
        let warnings = GroupRuleValidator::new(&config).validate(&doc(vec![
            selector("n1", "g1", "茨木童子", "shikigami"),
            selector("n2", "g1", "狂骨", "yuhun"),
            selector("n3", "g1", "酒吞童子", "shikigami"),
        ]));

        assert_eq!(
            codes(&warnings),
            vec![
                RuleWarningCode::ShikigamiYuhunBlacklist,
                RuleWarningCode::ShikigamiConflict,
                RuleWarningCode::MissingFireShikigami,
            ]
        );
        assert_eq!(warnings[0].message, "规则冲突：茨木童子 不建议携带 狂骨。");
        assert_eq!(warnings[1].message, "规则冲突：茨木童子 与 酒吞童子 不建议同队。");
        assert!(warnings.iter().all(|warning| warning.node_ids == vec!["n1", "n2", "n3"]));
    }

    #[test]
    fn groups_are_isolated() {
        let warnings = validate_groups(
            &doc(vec![
                selector("n1", "g1", "辉夜姬", "shikigami"),
                selector("n2", "g2", "破势", "yuhun"),
            ]),
            None,
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn ineligible_nodes_excluded() {
        let mut wrong_type = selector("n1", "g1", "酒吞童子", "shikigami");
        wrong_type["type"] = json!("text");
        let blank_group = selector("n2", "  ", "酒吞童子", "shikigami");
        let blank_name = selector("n3", "g1", " ", "shikigami");

        let groups = collect_groups(&doc(vec![wrong_type, blank_group, blank_name, json!(null)]));
        assert!(groups.is_empty());
    }

    #[test]
    fn unclassified_names_only_add_node_ids() {
        let groups = collect_groups(&doc(vec![
            selector("n1", "g1", "千姬", "shikigami"),
            selector("n2", "g1", "御魂A", "onmyoji"),
        ]));
        assert_eq!(
            groups,
            vec![GroupSummary {
                group_id: "g1".to_string(),
                node_ids: vec!["n1".to_string(), "n2".to_string()],
                shikigami: vec!["千姬".to_string()],
                yuhun: vec![],
            }]
        );
    }

    #[test]
    fn groups_in_first_appearance_order() {
        let groups = collect_groups(&doc(vec![
            selector("n1", "b", "千姬", "shikigami"),
            selector("n2", "a", "千姬", "shikigami"),
            selector("n3", "b", "破势", "yuhun"),
        ]));
        let ids: Vec<&str> = groups.iter().map(|group| group.group_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(groups[0].node_ids, vec!["n1", "n3"]);
    }

    #[test]
    fn category_from_avatar_path() {
        let yuhun = json!({
            "type": "assetSelector",
            "properties": {"selectedAsset": {"name": "破势", "avatar": "/assets/Yuhun/poshi.png", "library": "shikigami"}}
        });
        assert_eq!(infer_category(&Node::new(&yuhun)), Some(Category::Yuhun));

        let shikigami = json!({
            "properties": {"selectedAsset": {"avatar": "/assets/Shikigami/ssr/a.png"}}
        });
        assert_eq!(infer_category(&Node::new(&shikigami)), Some(Category::Shikigami));
    }

    #[test]
    fn category_from_entry_library() {
        let raw = json!({"properties": {"selectedAsset": {"avatar": "/assets/other/a.png", "library": "yuhun"}}});
        assert_eq!(infer_category(&Node::new(&raw)), Some(Category::Yuhun));
    }

    #[test]
    fn explicit_tag_wins_even_when_unknown() {
        let raw = json!({
            "properties": {
                "assetLibrary": "onmyoji",
                "selectedAsset": {"avatar": "/assets/Shikigami/a.png"}
            }
        });
        assert_eq!(infer_library(&Node::new(&raw)), Some("onmyoji"));
        assert_eq!(infer_category(&Node::new(&raw)), None);
    }

    #[test]
    fn node_without_id_still_counts_names() {
        let mut raw = selector("n1", "g1", "酒吞童子", "shikigami");
        raw.as_object_mut().unwrap().remove("id");
        let warnings = validate_groups(&doc(vec![raw]), None);
        assert_eq!(codes(&warnings), vec![RuleWarningCode::MissingFireShikigami]);
        assert!(warnings[0].node_ids.is_empty());
    }

    #[test]
    fn warning_serializes_camel_case() {
        let warnings = validate_groups(&doc(vec![selector("n1", "g1", "酒吞童子", "shikigami")]), None);
        let json = serde_json::to_value(&warnings[0]).unwrap();
        assert_eq!(json["code"], json!("MISSING_FIRE_SHIKIGAMI"));
        assert_eq!(json["groupId"], json!("g1"));
        assert_eq!(json["nodeIds"], json!(["n1"]));
    }

    #[test]
    fn code_strings_match_serialized_codes() {
        for code in [
            RuleWarningCode::ShikigamiYuhunBlacklist,
            RuleWarningCode::ShikigamiConflict,
            RuleWarningCode::MissingFireShikigami,
        ] {
            assert_eq!(serde_json::to_value(code).unwrap(), json!(code.as_str()));
            assert_eq!(code.to_string(), DiagnosticCode::from(code).as_str());
        }
    }

    #[test]
    fn evaluate_matches_validate() {
        let document = doc(vec![
            selector("n1", "g1", "辉夜姬", "shikigami"),
            selector("n2", "g1", "破势", "yuhun"),
            selector("n3", "g2", "酒吞童子", "shikigami"),
        ]);
        let rules = RulesConfig::default();
        let validator = GroupRuleValidator::new(&rules);

        let groups = collect_groups(&document);
        assert_eq!(validator.evaluate(&groups), validator.validate(&document));
    }
}
