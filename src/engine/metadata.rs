// src/engine/metadata.rs

//! Stage name derivation from node metadata.

use crate::engine::node::Node;

/// Name reported when a block node carries no label metadata.
pub const UNKNOWN_STAGE: &str = "UnknownStage";

/// Derive the display name of the block `node` belongs to.
///
/// Never fails: nodes without label metadata yield [`UNKNOWN_STAGE`].
pub fn stage_name(node: &Node) -> String {
    label_name(node).unwrap_or_else(|| UNKNOWN_STAGE.to_string())
}

/// Like [`stage_name`], but `None` when the node has no label metadata at all.
///
/// Label texts are concatenated in arrival order without a separator, so
/// scripted nodes with several labels read as one line. When that yields
/// nothing, the first label entry is used directly.
pub fn label_name(node: &Node) -> Option<String> {
    let labels: String = node
        .metadata
        .iter()
        .filter(|entry| entry.is_label())
        .map(|entry| entry.name.as_str())
        .collect();

    if !labels.is_empty() {
        return Some(labels);
    }

    node.metadata
        .iter()
        .find(|entry| entry.is_label())
        .map(|entry| entry.name.clone())
}
