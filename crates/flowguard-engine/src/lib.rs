//! flowguard engine - diagram post-processing and validation
//!
//! This crate implements the passes run on every extracted diagram:
//! - Asset URL rewriting and diagnosis
//! - Viewport normalization for previews
//! - Group composition rules
//! - The `FlowCheck` pipeline that ties them to a `Config`
//!
//! Every pass is a pure function of its inputs and never fails.

pub mod asset_urls;
pub mod preview;
pub mod group_rules;
pub mod pipeline;

pub use asset_urls::{
    collect_asset_issues, is_asset_url, rewrite_asset_urls, AssetIssue, AssetIssueCode, AssetUrlProcessor,
    PLACEHOLDER_IMAGE,
};
pub use preview::{normalize_for_preview, ViewportNormalizer};
pub use group_rules::{
    collect_groups, infer_category, validate_groups, Category, GroupRuleValidator, GroupSummary, RuleWarning,
    RuleWarningCode,
};
pub use pipeline::{CheckOutcome, FlowCheck};
