use graphshard_core::error::{ErrorCode, WorkerError};
use graphshard_core::model::{Fragment, PartitionAck, PartitionDefinition, PartitionId};
use storage::store::GraphStore;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::registry::SessionRegistry;
use crate::session::{PartitionSession, SessionError};

#[derive(Error, Debug)]
pub enum ReceiveError {
    #[error("fragment stream failed before end of stream: {0}")]
    Transport(#[from] anyhow::Error),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("partition {partition_id} is already being received")]
    PartitionBusy { partition_id: PartitionId },
}

impl WorkerError for ReceiveError {
    fn error_code(&self) -> ErrorCode {
        match self {
            ReceiveError::Transport(_) => ErrorCode::Aborted,
            ReceiveError::Session(err) => err.error_code(),
            ReceiveError::PartitionBusy { .. } => ErrorCode::FailedPrecondition,
        }
    }
}

/// Ordered source of partition fragments, the narrow seam to the transport
/// collaborator. `Ok(None)` is a clean end of stream; `Err` is a transport
/// failure and abandons the session.
#[async_trait::async_trait]
pub trait FragmentSource: Send {
    async fn next_fragment(&mut self) -> anyhow::Result<Option<Fragment>>;
}

/// Loopback source over a Tokio channel. A remote transport (e.g. a gRPC
/// server stream) plugs in by implementing `FragmentSource` the same way.
pub struct ChannelFragmentSource {
    receiver: mpsc::Receiver<Fragment>,
}

impl ChannelFragmentSource {
    pub fn new(capacity: usize) -> (mpsc::Sender<Fragment>, Self) {
        let (sender, receiver) = mpsc::channel(capacity);
        (sender, Self { receiver })
    }
}

#[async_trait::async_trait]
impl FragmentSource for ChannelFragmentSource {
    async fn next_fragment(&mut self) -> anyhow::Result<Option<Fragment>> {
        Ok(self.receiver.recv().await)
    }
}

/// A confirmed partition: the acknowledgment for the coordinator and the
/// finished store for the local compute engine.
#[derive(Debug)]
pub struct ReceivedPartition {
    pub ack: PartitionAck,
    pub store: GraphStore,
}

/// Drives one partition stream to completion.
///
/// Fragments are applied strictly in arrival order. A clean end of stream
/// seals the session and yields the ack together with the store; a transport
/// failure before that discards the partially built store and yields no ack,
/// so the coordinator never sees an ambiguous partial success.
pub async fn receive_partition<S: FragmentSource>(
    registry: &SessionRegistry,
    definition: PartitionDefinition,
    source: &mut S,
) -> Result<ReceivedPartition, ReceiveError> {
    let partition_id = definition.partition_id;
    let _guard = registry
        .try_claim(partition_id)
        .ok_or(ReceiveError::PartitionBusy { partition_id })?;

    let mut session = PartitionSession::begin(definition);

    loop {
        match source.next_fragment().await {
            Ok(Some(fragment)) => {
                let report = session.apply_fragment(fragment)?;
                debug!(
                    partition_id,
                    nodes = report.nodes_accepted,
                    edges = report.edges_accepted,
                    rejected = report.entries_rejected,
                    "fragment applied"
                );
            }
            Ok(None) => break,
            Err(err) => {
                error!(partition_id, %err, "fragment stream failed, discarding partial partition");
                return Err(ReceiveError::Transport(err));
            }
        }
    }

    let ack = session.end()?;
    let store = session
        .into_store()
        .expect("completed session always yields its store");

    Ok(ReceivedPartition { ack, store })
}
