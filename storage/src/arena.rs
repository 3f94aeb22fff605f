use graphshard_core::model::{EdgeWeight, NodeId};

/// Stable handle to a node in a `NodeArena`.
///
/// A handle is an index into append-only storage. The arena never removes or
/// relocates nodes, so a handle issued once stays usable for the arena's
/// whole lifetime. Edges hold handles, never addresses.
///
/// A handle is only meaningful in the arena that issued it; resolving it
/// against any other arena panics or yields an unrelated node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(usize);

impl NodeHandle {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub weight: EdgeWeight,
    pub target: NodeHandle,
    pub is_boundary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    edges: Vec<Edge>,
}

impl Node {
    fn new(id: NodeId) -> Self {
        Self {
            id,
            edges: Vec::new(),
        }
    }

    /// Outgoing edges in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub(crate) fn push_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }
}

/// Append-only owner of all node storage for one partition.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: NodeId) -> NodeHandle {
        let handle = NodeHandle(self.nodes.len());
        self.nodes.push(Node::new(id));
        handle
    }

    /// Resolves a handle issued by this arena.
    ///
    /// # Panics
    ///
    /// Panics if `handle` came from a different arena and is out of bounds
    /// here.
    pub fn get(&self, handle: NodeHandle) -> &Node {
        &self.nodes[handle.0]
    }

    pub(crate) fn get_mut(&mut self, handle: NodeHandle) -> &mut Node {
        &mut self.nodes[handle.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeHandle, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeHandle(i), node))
    }
}
