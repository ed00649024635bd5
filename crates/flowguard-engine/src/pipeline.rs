//! End-to-end passes over a diagram source
//!
//! `FlowCheck` wires the passes together the way the site uses them: a render
//! path (extract, rewrite, frame) and an editor check path (extract, diagnose
//! assets, validate groups, build a report).

use serde_json::{json, Value};

use flowguard_core::{Config, Report};
use flowguard_graph::{ContainerExtractor, GraphDocument};

use crate::asset_urls::{AssetIssue, AssetUrlProcessor};
use crate::group_rules::{collect_groups, GroupRuleValidator, RuleWarning};
use crate::preview::ViewportNormalizer;

/// Everything the editor shows for one document
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub document: GraphDocument,
    pub asset_issues: Vec<AssetIssue>,
    pub rule_warnings: Vec<RuleWarning>,
    pub groups_checked: usize,
}

/// Pipeline bound to one configuration
#[derive(Debug, Clone)]
pub struct FlowCheck<'c> {
    config: &'c Config,
    assets: AssetUrlProcessor,
    normalizer: ViewportNormalizer,
}

impl<'c> FlowCheck<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self {
            config,
            assets: AssetUrlProcessor::new(&config.assets.base_url),
            normalizer: ViewportNormalizer::new(config.preview.padding),
        }
    }

    pub fn config(&self) -> &'c Config {
        self.config
    }

    /// Extract, rewrite asset URLs with the configured policy, and frame
    pub fn prepare_for_render(&self, input: &Value) -> GraphDocument {
        let document = ContainerExtractor::extract(input);
        let rewritten = self.assets.rewrite_document(&document, self.config.assets.policy);
        self.normalizer.normalize(&rewritten)
    }

    /// Extract and run both diagnostic passes
    pub fn inspect(&self, input: &Value) -> CheckOutcome {
        let document = ContainerExtractor::extract(input);
        let asset_issues = self.assets.collect_document_issues(&document);
        let groups = collect_groups(&document);
        let rule_warnings = GroupRuleValidator::new(&self.config.rules).evaluate(&groups);
        let groups_checked = groups.len();

        CheckOutcome {
            document,
            asset_issues,
            rule_warnings,
            groups_checked,
        }
    }

    /// Report with asset issues first, then rule warnings
    pub fn check(&self, input: &Value) -> Report {
        let outcome = self.inspect(input);
        let severity = &self.config.severity;

        let diagnostics = outcome
            .asset_issues
            .iter()
            .map(|issue| issue.to_diagnostic(severity))
            .chain(outcome.rule_warnings.iter().map(|warning| warning.to_diagnostic(severity)))
            .collect();

        let mut report = Report::from_diagnostics(diagnostics);
        report.summary.nodes_checked = outcome.document.nodes.len();
        report.summary.groups_checked = outcome.groups_checked;
        report.metadata = Some(json!({
            "baseUrl": self.assets.base_url(),
            "activeFileId": ContainerExtractor::active_file_id(input),
            "rulesVersion": self.config.rules.version,
        }));

        tracing::debug!(
            total = report.summary.total,
            errors = report.summary.errors,
            warnings = report.summary.warnings,
            "check finished"
        );

        report
    }
}
