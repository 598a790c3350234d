// src/engine/node.rs

//! Value snapshot of one graph node.
//!
//! The host's node objects are live engine handles. Adapters copy the
//! fields below out of them inside the callback and never hold on to the
//! handle itself.

use serde::{Deserialize, Serialize};

/// Structural role of a node in the execution graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NodeKind {
    BlockStart,
    BlockEnd {
        #[serde(rename = "startNodeId")]
        start_node_id: String,
    },
    Other,
}

/// Kind of a metadata entry attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetadataKind {
    Label,
    #[serde(other)]
    Other,
}

/// One label/name pair attached to a node, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub kind: MetadataKind,
    #[serde(default)]
    pub name: String,
}

impl MetadataEntry {
    pub fn label(name: impl Into<String>) -> Self {
        Self {
            kind: MetadataKind::Label,
            name: name.into(),
        }
    }

    pub fn other(name: impl Into<String>) -> Self {
        Self {
            kind: MetadataKind::Other,
            name: name.into(),
        }
    }

    pub fn is_label(&self) -> bool {
        self.kind == MetadataKind::Label
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,

    #[serde(flatten)]
    pub kind: NodeKind,

    /// Id of the nearest still-open block start, `None` at top level.
    #[serde(default)]
    pub enclosing_id: Option<String>,

    #[serde(default)]
    pub is_active: bool,

    #[serde(default)]
    pub error: Option<String>,

    #[serde(default)]
    pub display_name: String,

    #[serde(default)]
    pub function_name: String,

    #[serde(default)]
    pub metadata: Vec<MetadataEntry>,
}

impl Node {
    pub fn block_start(id: impl Into<String>) -> Self {
        Self::with_kind(id, NodeKind::BlockStart)
    }

    pub fn block_end(id: impl Into<String>, start_node_id: impl Into<String>) -> Self {
        Self::with_kind(
            id,
            NodeKind::BlockEnd {
                start_node_id: start_node_id.into(),
            },
        )
    }

    pub fn other(id: impl Into<String>) -> Self {
        Self::with_kind(id, NodeKind::Other)
    }

    fn with_kind(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            enclosing_id: None,
            is_active: true,
            error: None,
            display_name: String::new(),
            function_name: String::new(),
            metadata: Vec::new(),
        }
    }

    pub fn enclosed_by(mut self, enclosing_id: impl Into<String>) -> Self {
        self.enclosing_id = Some(enclosing_id.into());
        self
    }

    pub fn with_label(mut self, name: impl Into<String>) -> Self {
        self.metadata.push(MetadataEntry::label(name));
        self
    }

    pub fn with_metadata(mut self, entry: MetadataEntry) -> Self {
        self.metadata.push(entry);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Short kind name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::BlockStart => "blockStart",
            NodeKind::BlockEnd { .. } => "blockEnd",
            NodeKind::Other => "other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_block_end_from_wire_json() {
        let raw = r#"{
            "id": "7",
            "kind": "blockEnd",
            "startNodeId": "3",
            "enclosingId": "2",
            "isActive": false,
            "displayName": "Stage : End",
            "functionName": "stage",
            "metadata": [{ "kind": "label", "name": "Build" }, { "kind": "timing" }]
        }"#;

        let node: Node = serde_json::from_str(raw).unwrap();

        assert_eq!(
            node.kind,
            NodeKind::BlockEnd {
                start_node_id: "3".to_string()
            }
        );
        assert_eq!(node.enclosing_id.as_deref(), Some("2"));
        assert!(!node.is_active);
        assert_eq!(node.metadata[0], MetadataEntry::label("Build"));
        assert_eq!(node.metadata[1].kind, MetadataKind::Other);
    }

    #[test]
    fn missing_optional_fields_default() {
        let node: Node = serde_json::from_str(r#"{"id":"1","kind":"other"}"#).unwrap();

        assert_eq!(node.kind, NodeKind::Other);
        assert_eq!(node.enclosing_id, None);
        assert!(node.metadata.is_empty());
    }
}
