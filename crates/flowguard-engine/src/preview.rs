//! Viewport normalization for preview rendering
//!
//! Authors place nodes anywhere, negative coordinates included. The preview
//! renderer wants the diagram's bounding box to start `padding` units from the
//! origin, so every node is shifted by the same offset.

use serde_json::Value;

use flowguard_core::DEFAULT_PADDING;
use flowguard_graph::{GraphDocument, Node};

/// Offsets smaller than this on both axes leave the document untouched
const MIN_SHIFT: f64 = 1.0;

/// Shifts node coordinates so the bounding box starts at `padding`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportNormalizer {
    padding: f64,
}

impl Default for ViewportNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_PADDING)
    }
}

impl ViewportNormalizer {
    pub fn new(padding: f64) -> Self {
        Self { padding }
    }

    pub fn padding(&self) -> f64 {
        self.padding
    }

    /// Offset that moves the bounding box's top-left corner to `(padding, padding)`
    ///
    /// `None` when the document has no nodes.
    pub fn offset(&self, doc: &GraphDocument) -> Option<(f64, f64)> {
        let (min_x, min_y) = doc.nodes().map(|node| node.top_left()).fold(
            (f64::INFINITY, f64::INFINITY),
            |(min_x, min_y), (left, top)| (min_x.min(left), min_y.min(top)),
        );

        if !min_x.is_finite() || !min_y.is_finite() {
            return None;
        }

        Some((self.padding - min_x, self.padding - min_y))
    }

    /// Copy of `doc` shifted into the preview frame
    ///
    /// Returns the document unchanged when it is already framed to within a
    /// unit, so normalizing twice equals normalizing once.
    pub fn normalize(&self, doc: &GraphDocument) -> GraphDocument {
        if doc.nodes.is_empty() {
            return GraphDocument::new(Vec::new(), doc.edges.clone());
        }

        let Some((offset_x, offset_y)) = self.offset(doc) else {
            return doc.clone();
        };

        if offset_x.abs() < MIN_SHIFT && offset_y.abs() < MIN_SHIFT {
            tracing::trace!(offset_x, offset_y, "document already framed");
            return doc.clone();
        }

        tracing::debug!(offset_x, offset_y, nodes = doc.nodes.len(), "shifting nodes into preview frame");

        let nodes = doc
            .nodes
            .iter()
            .map(|raw| shift_node(raw, offset_x, offset_y))
            .collect();

        GraphDocument::new(nodes, doc.edges.clone())
    }
}

fn shift_node(raw: &Value, offset_x: f64, offset_y: f64) -> Value {
    let Value::Object(fields) = raw else {
        return raw.clone();
    };

    let position = Node::new(raw).position();
    let mut shifted = fields.clone();
    shifted.insert("x".to_string(), number_value(position.x + offset_x));
    shifted.insert("y".to_string(), number_value(position.y + offset_y));
    Value::Object(shifted)
}

// Whole numbers are written as integers so re-saved documents stay tidy
fn number_value(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

/// Shift `doc` so its bounding box starts `padding` units from the origin
pub fn normalize_for_preview(doc: &GraphDocument, padding: f64) -> GraphDocument {
    ViewportNormalizer::new(padding).normalize(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn empty_document_keeps_edges() {
        let doc = GraphDocument::new(vec![], vec![json!({"id": "e1"})]);
        let normalized = ViewportNormalizer::default().normalize(&doc);
        assert!(normalized.nodes.is_empty());
        assert_eq!(normalized.edges, vec![json!({"id": "e1"})]);
    }

    #[test]
    fn single_default_node_moves_to_padding() {
        let doc = GraphDocument::new(
            vec![json!({"id": "n1", "x": 0, "y": 0, "width": 180, "height": 100})],
            vec![],
        );
        let normalized = normalize_for_preview(&doc, 80.0);
        assert_eq!(normalized.nodes[0]["x"], json!(170));
        assert_eq!(normalized.nodes[0]["y"], json!(130));
    }

    #[test]
    fn normalizing_twice_is_idempotent() {
        let doc = GraphDocument::new(
            vec![
                json!({"id": "a", "x": -400.5, "y": 20, "properties": {"style": {"width": 60}}}),
                json!({"id": "b", "x": "120", "y": -75.25}),
            ],
            vec![json!({"sourceNodeId": "a", "targetNodeId": "b"})],
        );
        let normalizer = ViewportNormalizer::default();
        let once = normalizer.normalize(&doc);
        let twice = normalizer.normalize(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn framed_document_returned_unchanged() {
        let doc = GraphDocument::new(vec![json!({"id": "a", "x": 170.4, "y": 130.6, "label": "keep"})], vec![]);
        assert_eq!(normalize_for_preview(&doc, 80.0), doc);
    }

    #[test]
    fn shift_uses_minimum_per_axis() {
        let doc = GraphDocument::new(
            vec![
                json!({"id": "a", "x": 0, "y": 500, "width": 20, "height": 20}),
                json!({"id": "b", "x": 300, "y": -100, "width": 20, "height": 20}),
            ],
            vec![],
        );
        let normalized = normalize_for_preview(&doc, 10.0);
        // min x bound is -10 (node a), min y bound is -110 (node b)
        assert_eq!(normalized.nodes[0]["x"], json!(20));
        assert_eq!(normalized.nodes[0]["y"], json!(620));
        assert_eq!(normalized.nodes[1]["x"], json!(320));
        assert_eq!(normalized.nodes[1]["y"], json!(20));
    }

    #[test]
    fn other_fields_and_key_order_preserved() {
        let doc = GraphDocument::new(
            vec![json!({"id": "a", "type": "assetSelector", "x": 5, "y": 5, "properties": {"k": [1, 2]}})],
            vec![],
        );
        let normalized = normalize_for_preview(&doc, 80.0);
        let node = normalized.nodes[0].as_object().unwrap();
        let keys: Vec<&String> = node.keys().collect();
        assert_eq!(keys, vec!["id", "type", "x", "y", "properties"]);
        assert_eq!(node["properties"], json!({"k": [1, 2]}));
    }

    #[test]
    fn missing_coordinates_are_written() {
        let doc = GraphDocument::new(vec![json!({"id": "a"}), json!("stray")], vec![]);
        let normalized = normalize_for_preview(&doc, 80.0);
        assert_eq!(normalized.nodes[0]["x"], json!(170));
        assert_eq!(normalized.nodes[0]["y"], json!(130));
        assert_eq!(normalized.nodes[1], json!("stray"));
    }

    #[test]
    fn fractional_results_stay_fractional() {
        let doc = GraphDocument::new(vec![json!({"x": 0, "y": 0}), json!({"x": 0.5, "y": 0})], vec![]);
        let normalized = normalize_for_preview(&doc, 80.0);
        assert_eq!(normalized.nodes[0]["x"], json!(170));
        assert_eq!(normalized.nodes[1]["x"], json!(170.5));
    }
}
