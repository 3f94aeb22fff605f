use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type NodeId = u64;
pub type PartitionId = u64;
pub type EdgeWeight = u64;

/// Node declaration as it arrives in a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDecl {
    pub id: NodeId,
}

/// Edge declaration as it arrives in a fragment. `is_boundary` marks an edge
/// whose target lives in another worker's partition; it is carried through
/// unchanged, no cross-partition resolution happens on this worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeDecl {
    pub from: NodeId,
    pub to: NodeId,
    pub weight: EdgeWeight,
    pub is_boundary: bool,
}

/// One unit of a streamed partition transfer: zero or more node declarations
/// followed by zero or more edge declarations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    pub nodes: Vec<NodeDecl>,
    pub edges: Vec<EdgeDecl>,
}

impl Fragment {
    pub fn new(nodes: Vec<NodeDecl>, edges: Vec<EdgeDecl>) -> Self {
        Self { nodes, edges }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn entry_count(&self) -> usize {
        self.nodes.len() + self.edges.len()
    }
}

/// Opens a partition transfer. `expected_edge_count` is advisory only; the
/// worker logs a mismatch and never enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionDefinition {
    pub partition_id: PartitionId,
    pub expected_edge_count: Option<u64>,
}

impl PartitionDefinition {
    pub fn new(partition_id: PartitionId) -> Self {
        Self {
            partition_id,
            expected_edge_count: None,
        }
    }

    pub fn with_expected_edges(partition_id: PartitionId, expected_edge_count: u64) -> Self {
        Self {
            partition_id,
            expected_edge_count: Some(expected_edge_count),
        }
    }
}

/// Final acknowledgment for a completed partition transfer. Rejected entries
/// are listed in full so the coordinator learns about every malformed entry,
/// not only the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionAck {
    pub partition_id: PartitionId,
    pub node_count: u64,
    pub edge_count: u64,
    pub per_entry_errors: Vec<EntryError>,
}

/// A single rejected fragment entry. Recoverable by policy: the entry is
/// dropped, the session continues, and the rejection is reported in the ack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum EntryError {
    #[error("duplicate node id {id}")]
    DuplicateNode { id: NodeId },
    #[error("edge {from} -> {to} references unknown node id(s) {missing:?}")]
    UnknownEndpoint {
        from: NodeId,
        to: NodeId,
        missing: Vec<NodeId>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_entry_count() {
        let fragment = Fragment::new(
            vec![NodeDecl { id: 1 }, NodeDecl { id: 2 }],
            vec![EdgeDecl {
                from: 1,
                to: 2,
                weight: 10,
                is_boundary: false,
            }],
        );
        assert!(!fragment.is_empty());
        assert_eq!(fragment.entry_count(), 3);
        assert!(Fragment::default().is_empty());
    }

    #[test]
    fn ack_serializes_for_diagnostics() {
        let ack = PartitionAck {
            partition_id: 7,
            node_count: 2,
            edge_count: 1,
            per_entry_errors: vec![EntryError::DuplicateNode { id: 2 }],
        };
        let json = serde_json::to_string(&ack).unwrap();
        assert!(json.contains("\"partition_id\":7"));
        assert!(json.contains("DuplicateNode"));
    }

    #[test]
    fn entry_error_display_names_missing_ids() {
        let err = EntryError::UnknownEndpoint {
            from: 2,
            to: 3,
            missing: vec![3],
        };
        assert_eq!(err.to_string(), "edge 2 -> 3 references unknown node id(s) [3]");
    }
}
