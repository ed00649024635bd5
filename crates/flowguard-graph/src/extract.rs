//! Container extraction
//!
//! Diagram sources come in two shapes: a bare `{nodes, edges}` document, and a
//! multi-document container `{fileList: [{id, graphRawData}], activeFileId}`.
//! Extraction accepts either and never fails; anything it cannot read becomes
//! an empty sequence.

use serde_json::{Map, Value};
use crate::document::GraphDocument;

/// Resolves the canonical document from any JSON value
pub struct ContainerExtractor;

impl ContainerExtractor {
    /// Extract the active `{nodes, edges}` document
    pub fn extract(input: &Value) -> GraphDocument {
        let Some(container) = input.as_object() else {
            tracing::debug!("diagram source is not an object, using empty document");
            return GraphDocument::empty();
        };

        if let Some(entry) = Self::active_entry(container) {
            match entry.get("graphRawData") {
                Some(Value::Object(raw)) => return read_document(raw),
                // An array is a record without `nodes`/`edges`
                Some(Value::Array(_)) => {
                    tracing::debug!("active graphRawData is an array, using empty document");
                    return GraphDocument::empty();
                }
                _ => {
                    tracing::debug!("active fileList entry has no graphRawData object, reading top level");
                }
            }
        }

        read_document(container)
    }

    /// Parse JSON text and extract; unparseable text yields an empty document
    pub fn extract_str(json: &str) -> GraphDocument {
        match serde_json::from_str::<Value>(json) {
            Ok(value) => Self::extract(&value),
            Err(e) => {
                tracing::debug!("diagram source is not valid JSON ({}), using empty document", e);
                GraphDocument::empty()
            }
        }
    }

    /// Ids of the sub-diagrams in a multi-document container
    pub fn file_ids(input: &Value) -> Vec<String> {
        input
            .get("fileList")
            .and_then(Value::as_array)
            .map(|files| {
                files
                    .iter()
                    .filter_map(|file| file.get("id").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Id of the sub-diagram extraction would select
    pub fn active_file_id(input: &Value) -> Option<String> {
        let container = input.as_object()?;
        Self::active_entry(container)?
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// The `fileList` element matching `activeFileId`, else the first one
    fn active_entry(container: &Map<String, Value>) -> Option<&Value> {
        let files = container
            .get("fileList")
            .and_then(Value::as_array)
            .filter(|files| !files.is_empty())?;

        let active_id = container.get("activeFileId").and_then(Value::as_str);

        let matched = active_id.and_then(|active| {
            files
                .iter()
                .find(|file| file.get("id").and_then(Value::as_str) == Some(active))
        });

        if matched.is_none() {
            tracing::debug!(?active_id, "no fileList entry matches activeFileId, using the first");
        }

        matched.or_else(|| files.first())
    }
}

fn read_document(source: &Map<String, Value>) -> GraphDocument {
    GraphDocument::new(read_sequence(source, "nodes"), read_sequence(source, "edges"))
}

fn read_sequence(source: &Map<String, Value>, field: &str) -> Vec<Value> {
    source
        .get(field)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}
