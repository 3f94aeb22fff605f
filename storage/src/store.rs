use crate::arena::{Edge, Node, NodeArena, NodeHandle};
use graphshard_core::error::{ErrorCode, WorkerError};
use graphshard_core::model::{EdgeWeight, EntryError, NodeId};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("node id {id} is already present")]
    DuplicateId { id: NodeId },
    #[error("edge {from} -> {to} references unknown node id(s) {missing:?}")]
    UnknownEndpoint {
        from: NodeId,
        to: NodeId,
        missing: Vec<NodeId>,
    },
}

impl WorkerError for StoreError {
    fn error_code(&self) -> ErrorCode {
        match self {
            StoreError::DuplicateId { .. } => ErrorCode::AlreadyExists,
            StoreError::UnknownEndpoint { .. } => ErrorCode::NotFound,
        }
    }
}

impl From<StoreError> for EntryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateId { id } => EntryError::DuplicateNode { id },
            StoreError::UnknownEndpoint { from, to, missing } => {
                EntryError::UnknownEndpoint { from, to, missing }
            }
        }
    }
}

/// In-memory adjacency store for one partition.
///
/// Owns all node storage through an append-only arena and keeps an identity
/// index from external node id to the node's stable handle, so endpoint
/// resolution stays O(1) no matter how many edges a fragment stream carries.
/// The store only grows: there is no node or edge removal.
#[derive(Debug, Default)]
pub struct GraphStore {
    arena: NodeArena,
    index: HashMap<NodeId, NodeHandle>,
    edge_count: u64,
    boundary_edge_count: u64,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a node with an empty edge list. A duplicate id is rejected and
    /// the store is left exactly as it was.
    pub fn add_node(&mut self, id: NodeId) -> Result<NodeHandle, StoreError> {
        if self.index.contains_key(&id) {
            return Err(StoreError::DuplicateId { id });
        }
        let handle = self.arena.push(id);
        self.index.insert(id, handle);
        debug!(id, "node added");
        Ok(handle)
    }

    /// Appends an edge to `from`'s outgoing sequence.
    ///
    /// Both endpoints are resolved against the identity index before anything
    /// is mutated; if either is missing the store is untouched and the error
    /// names every missing id.
    pub fn add_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        weight: EdgeWeight,
        is_boundary: bool,
    ) -> Result<(), StoreError> {
        let from_handle = self.index.get(&from).copied();
        let to_handle = self.index.get(&to).copied();

        let (Some(from_handle), Some(to_handle)) = (from_handle, to_handle) else {
            let mut missing = Vec::new();
            if from_handle.is_none() {
                missing.push(from);
            }
            if to_handle.is_none() && !missing.contains(&to) {
                missing.push(to);
            }
            return Err(StoreError::UnknownEndpoint { from, to, missing });
        };

        self.arena.get_mut(from_handle).push_edge(Edge {
            weight,
            target: to_handle,
            is_boundary,
        });
        self.edge_count += 1;
        if is_boundary {
            self.boundary_edge_count += 1;
        }
        debug!(from, to, weight, is_boundary, "edge added");
        Ok(())
    }

    /// Read-only identity resolution.
    pub fn lookup(&self, id: NodeId) -> Option<&Node> {
        self.index.get(&id).map(|handle| self.arena.get(*handle))
    }

    pub fn handle(&self, id: NodeId) -> Option<NodeHandle> {
        self.index.get(&id).copied()
    }

    /// Resolves a handle issued by this store (via `add_node`, `handle`, or
    /// an edge's `target`).
    ///
    /// # Panics
    ///
    /// Panics if `handle` came from a different store and is out of bounds
    /// here. Handles are not transferable between stores.
    pub fn node(&self, handle: NodeHandle) -> &Node {
        self.arena.get(handle)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn node_count(&self) -> u64 {
        self.arena.len() as u64
    }

    pub fn edge_count(&self) -> u64 {
        self.edge_count
    }

    pub fn boundary_edge_count(&self) -> u64 {
        self.boundary_edge_count
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeHandle, &Node)> {
        self.arena.iter()
    }
}
