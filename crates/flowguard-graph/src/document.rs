//! Canonical diagram document and node accessors
//!
//! Nodes and edges stay raw JSON so fields this crate does not know about
//! survive every transform. Reads go through [`Node`], whose accessors are
//! total: a missing or mistyped field yields `None` or the documented default.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Node type tag of selector nodes (one chosen unit or item)
pub const SELECTOR_NODE_TYPE: &str = "assetSelector";

/// Width used when no size field resolves
pub const DEFAULT_NODE_WIDTH: f64 = 180.0;

/// Height used when no size field resolves
pub const DEFAULT_NODE_HEIGHT: f64 = 100.0;

/// The `{nodes, edges}` document every pass works on
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Nodes in rendering order
    #[serde(default)]
    pub nodes: Vec<Value>,

    /// Edges, opaque to every pass
    #[serde(default)]
    pub edges: Vec<Value>,
}

impl GraphDocument {
    pub fn new(nodes: Vec<Value>, edges: Vec<Value>) -> Self {
        Self { nodes, edges }
    }

    /// Document with no nodes and no edges
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// Typed views over the nodes, in document order
    pub fn nodes(&self) -> impl Iterator<Item = Node<'_>> {
        self.nodes.iter().map(Node::new)
    }

    /// The document as a JSON object (`nodes` first, then `edges`)
    pub fn to_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("nodes".to_string(), Value::Array(self.nodes.clone()));
        map.insert("edges".to_string(), Value::Array(self.edges.clone()));
        Value::Object(map)
    }
}

/// Centre position of a node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Resolved node size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

/// The `selectedAsset` record of a selector node
///
/// Each field is trimmed; blank strings read as absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Selection<'a> {
    pub name: Option<&'a str>,
    pub avatar: Option<&'a str>,
    pub library: Option<&'a str>,
}

/// Read-only view of one raw node
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    raw: &'a Value,
}

impl<'a> Node<'a> {
    pub fn new(raw: &'a Value) -> Self {
        Self { raw }
    }

    /// The underlying JSON value
    pub fn raw(&self) -> &'a Value {
        self.raw
    }

    pub fn id(&self) -> Option<&'a str> {
        self.raw.get("id").and_then(Value::as_str)
    }

    pub fn node_type(&self) -> Option<&'a str> {
        self.raw.get("type").and_then(Value::as_str)
    }

    pub fn is_selector(&self) -> bool {
        self.node_type() == Some(SELECTOR_NODE_TYPE)
    }

    pub fn properties(&self) -> Option<&'a Map<String, Value>> {
        self.raw.get("properties").and_then(Value::as_object)
    }

    /// Centre position; non-numeric coordinates read as 0
    pub fn position(&self) -> Position {
        Position {
            x: self.raw.get("x").and_then(coerce_number).unwrap_or(0.0),
            y: self.raw.get("y").and_then(coerce_number).unwrap_or(0.0),
        }
    }

    /// Size from `width`/`height`, then `properties.style`, then `properties`
    ///
    /// The first link that is present decides; if its value is not numeric the
    /// default is used rather than the next link.
    pub fn size(&self) -> Size {
        Size {
            width: self.dimension("width", DEFAULT_NODE_WIDTH),
            height: self.dimension("height", DEFAULT_NODE_HEIGHT),
        }
    }

    /// Top-left corner of the node's bounding box
    pub fn top_left(&self) -> (f64, f64) {
        let Position { x, y } = self.position();
        let Size { width, height } = self.size();
        (x - width / 2.0, y - height / 2.0)
    }

    /// Trimmed, non-empty `properties.meta.groupId`
    pub fn group_id(&self) -> Option<&'a str> {
        self.text_at("/properties/meta/groupId")
    }

    /// Trimmed, non-empty `properties.assetLibrary`
    pub fn asset_library(&self) -> Option<&'a str> {
        self.text_at("/properties/assetLibrary")
    }

    /// `properties.selectedAsset`, when it is an object
    pub fn selection(&self) -> Option<Selection<'a>> {
        let entry = self.raw.pointer("/properties/selectedAsset")?;
        if !entry.is_object() {
            return None;
        }

        Some(Selection {
            name: entry.get("name").and_then(non_blank),
            avatar: entry.get("avatar").and_then(non_blank),
            library: entry.get("library").and_then(non_blank),
        })
    }

    fn dimension(&self, field: &str, default: f64) -> f64 {
        let style = self
            .properties()
            .and_then(|props| props.get("style"))
            .filter(|style| is_truthy(style));

        let candidate = [
            self.raw.get(field),
            style.and_then(|style| style.get(field)),
            self.properties().and_then(|props| props.get(field)),
        ]
        .into_iter()
        .flatten()
        .find(|value| !value.is_null());

        candidate.and_then(coerce_number).unwrap_or(default)
    }

    fn text_at(&self, pointer: &str) -> Option<&'a str> {
        self.raw.pointer(pointer).and_then(non_blank)
    }
}

/// A finite number, or a string that parses to one
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        _ => None,
    }
}

fn non_blank(value: &Value) -> Option<&str> {
    value
        .as_str()
        .map(str::trim)
        .filter(|text| !text.is_empty())
}

// `false`, 0, "" and null do not count as a style record
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
