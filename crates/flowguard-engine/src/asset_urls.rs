//! Asset URL rewriting and diagnosis
//!
//! Diagrams reference images by root-relative `/assets/...` paths, which only
//! resolve when the site is served from `/`. Authors also paste `file:` and
//! `blob:` URLs that work in their own browser and nowhere else.
//!
//! Both walks visit every string in a JSON value depth-first while tracking a
//! key path (`nodes[0].properties.selectedAsset.avatar`). Only strings the
//! classifier accepts are ever rewritten or inspected.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use flowguard_core::{AssetPolicy, Diagnostic, DiagnosticCode, SeverityThreshold};
use flowguard_graph::GraphDocument;

/// Root-relative prefix of bundled assets
pub const ASSET_PREFIX: &str = "/assets/";

/// Namespace of framework-generated build assets, always valid
pub const FRAMEWORK_ASSET_PREFIX: &str = "/_nuxt/";

/// Property names whose string values are URLs regardless of content
pub const URL_KEYS: [&str; 7] = ["avatar", "src", "url", "href", "image", "imageUrl", "backgroundImage"];

/// Inline SVG shown in place of unreachable local references
pub const PLACEHOLDER_IMAGE: &str = concat!(
    "data:image/svg+xml;charset=UTF-8,",
    "%3Csvg%20xmlns%3D%22http%3A%2F%2Fwww.w3.org%2F2000%2Fsvg%22%20width%3D%22220%22%20height%3D%22120%22",
    "%20viewBox%3D%220%200%20220%20120%22%3E",
    "%3Crect%20width%3D%22220%22%20height%3D%22120%22%20fill%3D%22%23f1f5f9%22%2F%3E",
    "%3Crect%20x%3D%221%22%20y%3D%221%22%20width%3D%22218%22%20height%3D%22118%22%20fill%3D%22none%22",
    "%20stroke%3D%22%23cbd5e1%22%2F%3E",
    "%3Ctext%20x%3D%22110%22%20y%3D%2268%22%20font-size%3D%2214%22%20text-anchor%3D%22middle%22",
    "%20fill%3D%22%2364748b%22%3Easset%20missing%3C%2Ftext%3E",
    "%3C%2Fsvg%3E",
);

static FILE_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^file:").expect("file scheme regex must compile"));

static BLOB_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^blob:").expect("blob scheme regex must compile"));

/// Codes an asset walk can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetIssueCode {
    FileUrl,
    BlobUrl,
    NonStandardAbsolutePath,
}

impl AssetIssueCode {
    /// Stable code string, shared with the report
    pub fn as_str(&self) -> &'static str {
        DiagnosticCode::from(*self).as_str()
    }

    fn message(&self) -> &'static str {
        match self {
            Self::FileUrl => "检测到 file:// 本地路径，站点预览无法直接访问该资源。",
            Self::BlobUrl => "检测到 blob: 临时资源链接，刷新或跨端渲染后会失效。",
            Self::NonStandardAbsolutePath => "检测到非标准绝对路径，可能在子路径部署下出现 404。",
        }
    }
}

impl From<AssetIssueCode> for DiagnosticCode {
    fn from(code: AssetIssueCode) -> Self {
        match code {
            AssetIssueCode::FileUrl => DiagnosticCode::FileUrl,
            AssetIssueCode::BlobUrl => DiagnosticCode::BlobUrl,
            AssetIssueCode::NonStandardAbsolutePath => DiagnosticCode::NonStandardAbsolutePath,
        }
    }
}

/// A problematic asset reference; identity is `(code, url)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetIssue {
    pub code: AssetIssueCode,
    pub url: String,
    pub message: String,
}

impl AssetIssue {
    fn new(code: AssetIssueCode, url: &str) -> Self {
        Self {
            code,
            url: url.to_string(),
            message: code.message().to_string(),
        }
    }

    /// Report-level view, severity resolved through the overrides
    pub fn to_diagnostic(&self, severity: &SeverityThreshold) -> Diagnostic {
        let code = DiagnosticCode::from(self.code);
        Diagnostic::new(code, severity.get_severity(code), self.message.clone()).with_url(self.url.clone())
    }
}

/// Whether a string in the walk should be treated as an asset reference
///
/// Matches on content (`/assets/`, `file:`, `blob:`) or on the last segment of
/// the key path being one of [`URL_KEYS`], compared case-insensitively.
pub fn is_asset_url(value: &str, key_path: &str) -> bool {
    if value.is_empty() {
        return false;
    }
    if value.starts_with(ASSET_PREFIX) || is_local_scheme(value) {
        return true;
    }

    let segment = key_path.rsplit('.').next().unwrap_or(key_path);
    URL_KEYS.iter().any(|key| key.eq_ignore_ascii_case(segment))
}

fn is_local_scheme(value: &str) -> bool {
    FILE_SCHEME.is_match(value) || BLOB_SCHEME.is_match(value)
}

/// Base URL guaranteed to end in `/`; empty means `/`
pub fn normalize_base_url(base_url: &str) -> String {
    if base_url.is_empty() {
        return "/".to_string();
    }
    if base_url.ends_with('/') {
        base_url.to_string()
    } else {
        format!("{}/", base_url)
    }
}

fn child_key_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn child_index_path(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}

/// Rewrites or diagnoses asset references for one deployment base URL
#[derive(Debug, Clone)]
pub struct AssetUrlProcessor {
    base_url: String,
    scoped_prefix: String,
}

impl AssetUrlProcessor {
    pub fn new(base_url: &str) -> Self {
        let base_url = normalize_base_url(base_url);
        let scoped_prefix = format!("{}assets/", base_url);
        Self { base_url, scoped_prefix }
    }

    /// Normalized base URL, always ending in `/`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Copy of `input` with asset references rewritten for this deployment
    pub fn rewrite(&self, input: &Value, policy: AssetPolicy) -> Value {
        self.transform(input, policy, "")
    }

    /// Rewrite a document; key paths start at `nodes[i]` / `edges[i]`
    pub fn rewrite_document(&self, doc: &GraphDocument, policy: AssetPolicy) -> GraphDocument {
        let rewrite_all = |items: &[Value], field: &str| -> Vec<Value> {
            items
                .iter()
                .enumerate()
                .map(|(index, item)| self.transform(item, policy, &child_index_path(field, index)))
                .collect()
        };

        GraphDocument::new(rewrite_all(&doc.nodes, "nodes"), rewrite_all(&doc.edges, "edges"))
    }

    /// Deduplicated issues in first-occurrence order
    pub fn collect_issues(&self, input: &Value) -> Vec<AssetIssue> {
        let mut collector = IssueCollector::new(self);
        collector.walk(input, "");
        collector.finish()
    }

    /// Issues across a document's nodes, then its edges
    pub fn collect_document_issues(&self, doc: &GraphDocument) -> Vec<AssetIssue> {
        let mut collector = IssueCollector::new(self);
        for (index, node) in doc.nodes.iter().enumerate() {
            collector.walk(node, &child_index_path("nodes", index));
        }
        for (index, edge) in doc.edges.iter().enumerate() {
            collector.walk(edge, &child_index_path("edges", index));
        }
        collector.finish()
    }

    fn transform(&self, input: &Value, policy: AssetPolicy, key_path: &str) -> Value {
        match input {
            Value::String(text) if is_asset_url(text, key_path) => {
                Value::String(self.rewrite_url(text, policy))
            }
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(index, item)| self.transform(item, policy, &child_index_path(key_path, index)))
                    .collect(),
            ),
            Value::Object(map) => {
                let mut output = Map::with_capacity(map.len());
                for (key, value) in map {
                    let path = child_key_path(key_path, key);
                    output.insert(key.clone(), self.transform(value, policy, &path));
                }
                Value::Object(output)
            }
            other => other.clone(),
        }
    }

    fn rewrite_url(&self, url: &str, policy: AssetPolicy) -> String {
        if url.starts_with(ASSET_PREFIX) {
            return format!("{}{}", self.base_url, &url[1..]);
        }
        if is_local_scheme(url) {
            return match policy {
                AssetPolicy::Degrade => PLACEHOLDER_IMAGE.to_string(),
                AssetPolicy::Strict => url.to_string(),
            };
        }
        url.to_string()
    }

    fn inspect(&self, url: &str) -> Option<AssetIssueCode> {
        if FILE_SCHEME.is_match(url) {
            return Some(AssetIssueCode::FileUrl);
        }
        if BLOB_SCHEME.is_match(url) {
            return Some(AssetIssueCode::BlobUrl);
        }

        let non_standard = url.starts_with('/')
            && !url.starts_with(ASSET_PREFIX)
            && !url.starts_with(&self.scoped_prefix)
            && !url.starts_with(FRAMEWORK_ASSET_PREFIX);

        non_standard.then_some(AssetIssueCode::NonStandardAbsolutePath)
    }
}

struct IssueCollector<'p> {
    processor: &'p AssetUrlProcessor,
    seen: HashSet<(AssetIssueCode, String)>,
    issues: Vec<AssetIssue>,
}

impl<'p> IssueCollector<'p> {
    fn new(processor: &'p AssetUrlProcessor) -> Self {
        Self {
            processor,
            seen: HashSet::new(),
            issues: Vec::new(),
        }
    }

    fn walk(&mut self, input: &Value, key_path: &str) {
        match input {
            Value::String(text) => {
                if !is_asset_url(text, key_path) {
                    return;
                }
                let Some(code) = self.processor.inspect(text) else {
                    return;
                };
                if self.seen.insert((code, text.clone())) {
                    tracing::trace!(path = key_path, url = %text, ?code, "asset issue");
                    self.issues.push(AssetIssue::new(code, text));
                }
            }
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    self.walk(item, &child_index_path(key_path, index));
                }
            }
            Value::Object(map) => {
                for (key, value) in map {
                    self.walk(value, &child_key_path(key_path, key));
                }
            }
            _ => {}
        }
    }

    fn finish(self) -> Vec<AssetIssue> {
        self.issues
    }
}

/// Rewrite every asset reference in `input` for `base_url`
pub fn rewrite_asset_urls(input: &Value, base_url: &str, policy: AssetPolicy) -> Value {
    AssetUrlProcessor::new(base_url).rewrite(input, policy)
}

/// Collect deduplicated asset issues in `input` for `base_url`
pub fn collect_asset_issues(input: &Value, base_url: &str) -> Vec<AssetIssue> {
    AssetUrlProcessor::new(base_url).collect_issues(input)
}
