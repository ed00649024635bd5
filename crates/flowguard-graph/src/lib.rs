//! Diagram document model and container extraction
//!
//! This crate handles:
//! - The canonical `{nodes, edges}` document
//! - Total accessors over loosely-shaped node JSON
//! - Resolving the active document from single- and multi-document sources

pub mod document;
pub mod extract;

pub use document::{
    coerce_number, GraphDocument, Node, Position, Selection, Size, DEFAULT_NODE_HEIGHT,
    DEFAULT_NODE_WIDTH, SELECTOR_NODE_TYPE,
};
pub use extract::ContainerExtractor;
