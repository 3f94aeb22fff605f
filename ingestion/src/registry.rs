use dashmap::DashMap;
use graphshard_core::model::PartitionId;
use std::sync::Arc;

/// Tracks partition ids with a receive in flight. Distinct partitions stream
/// concurrently with fully independent stores; a second stream for the same
/// partition id is a coordinator error and is refused up front.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    in_flight: Arc<DashMap<PartitionId, ()>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the partition id for one receive. `None` means a stream for
    /// this partition is already active. The claim is released when the
    /// returned guard drops, whether the receive completed or was abandoned.
    pub fn try_claim(&self, partition_id: PartitionId) -> Option<SessionGuard> {
        if self.in_flight.insert(partition_id, ()).is_some() {
            return None;
        }
        Some(SessionGuard {
            partition_id,
            in_flight: Arc::clone(&self.in_flight),
        })
    }

    pub fn is_active(&self, partition_id: PartitionId) -> bool {
        self.in_flight.contains_key(&partition_id)
    }
}

pub struct SessionGuard {
    partition_id: PartitionId,
    in_flight: Arc<DashMap<PartitionId, ()>>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.in_flight.remove(&self.partition_id);
    }
}
