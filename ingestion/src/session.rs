use graphshard_core::error::{ErrorCode, WorkerError};
use graphshard_core::model::{
    EntryError, Fragment, PartitionAck, PartitionDefinition, PartitionId,
};
use storage::store::GraphStore;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session for partition {partition_id} is already completed")]
    Closed { partition_id: PartitionId },
}

impl WorkerError for SessionError {
    fn error_code(&self) -> ErrorCode {
        match self {
            SessionError::Closed { .. } => ErrorCode::FailedPrecondition,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Receiving,
    Completed,
}

/// Summary of one applied fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FragmentReport {
    pub nodes_accepted: usize,
    pub edges_accepted: usize,
    pub entries_rejected: usize,
}

/// One partition transfer: `begin` opens the session with a fresh, empty
/// store, fragments are applied strictly in arrival order, `end` seals the
/// session and produces the acknowledgment.
///
/// Entry-level failures (duplicate id, unknown endpoint) never abort the
/// session; they are accumulated and surfaced in the final ack so the
/// coordinator learns about every malformed entry. Only calls arriving after
/// `end` are protocol errors.
///
/// A new partition requires a new session; `begin` is the constructor, so a
/// second begin on the same handle cannot be expressed.
pub struct PartitionSession {
    definition: PartitionDefinition,
    state: SessionState,
    store: GraphStore,
    errors: Vec<EntryError>,
}

impl PartitionSession {
    pub fn begin(definition: PartitionDefinition) -> Self {
        info!(
            partition_id = definition.partition_id,
            expected_edges = definition.expected_edge_count,
            "partition session opened"
        );
        Self {
            definition,
            state: SessionState::Receiving,
            store: GraphStore::new(),
            errors: Vec::new(),
        }
    }

    pub fn partition_id(&self) -> PartitionId {
        self.definition.partition_id
    }

    /// Read access to the shard built so far.
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn is_completed(&self) -> bool {
        self.state == SessionState::Completed
    }

    /// Applies one fragment: all node declarations first, in the order given,
    /// then all edge declarations, in the order given.
    pub fn apply_fragment(&mut self, fragment: Fragment) -> Result<FragmentReport, SessionError> {
        self.ensure_receiving()?;

        let mut report = FragmentReport::default();

        for node in &fragment.nodes {
            match self.store.add_node(node.id) {
                Ok(_) => {
                    report.nodes_accepted += 1;
                }
                Err(err) => {
                    warn!(id = node.id, %err, "node declaration rejected");
                    report.entries_rejected += 1;
                    self.errors.push(err.into());
                }
            }
        }

        for edge in &fragment.edges {
            match self
                .store
                .add_edge(edge.from, edge.to, edge.weight, edge.is_boundary)
            {
                Ok(()) => {
                    report.edges_accepted += 1;
                }
                Err(err) => {
                    warn!(from = edge.from, to = edge.to, %err, "edge declaration rejected");
                    report.entries_rejected += 1;
                    self.errors.push(err.into());
                }
            }
        }

        Ok(report)
    }

    /// Seals the session and returns the acknowledgment. Any further
    /// `apply_fragment` or `end` fails with `SessionError::Closed`.
    pub fn end(&mut self) -> Result<PartitionAck, SessionError> {
        self.ensure_receiving()?;
        self.state = SessionState::Completed;

        let ack = PartitionAck {
            partition_id: self.definition.partition_id,
            node_count: self.store.node_count(),
            edge_count: self.store.edge_count(),
            per_entry_errors: self.errors.clone(),
        };

        if let Some(expected) = self.definition.expected_edge_count {
            if expected != ack.edge_count {
                warn!(
                    partition_id = ack.partition_id,
                    expected,
                    actual = ack.edge_count,
                    "accepted edge count differs from advertised count"
                );
            }
        }

        info!(
            partition_id = ack.partition_id,
            nodes = ack.node_count,
            edges = ack.edge_count,
            rejected = ack.per_entry_errors.len(),
            "partition session completed"
        );

        Ok(ack)
    }

    /// Hands off the store of a completed session to its consumer. Returns
    /// `None` while the session is still receiving, so a partially built
    /// store can never leak out of an unfinished transfer.
    pub fn into_store(self) -> Option<GraphStore> {
        match self.state {
            SessionState::Completed => Some(self.store),
            SessionState::Receiving => None,
        }
    }

    fn ensure_receiving(&self) -> Result<(), SessionError> {
        match self.state {
            SessionState::Receiving => Ok(()),
            SessionState::Completed => Err(SessionError::Closed {
                partition_id: self.definition.partition_id,
            }),
        }
    }
}
