use graphshard_core::error::{ErrorCode, WorkerError};
use graphshard_core::model::{EdgeDecl, Fragment, NodeDecl, PartitionDefinition};
use ingestion::receiver::{
    receive_partition, ChannelFragmentSource, FragmentSource, ReceiveError,
};
use ingestion::registry::SessionRegistry;

fn fragment(nodes: &[u64], edges: &[(u64, u64, u64, bool)]) -> Fragment {
    Fragment::new(
        nodes.iter().map(|&id| NodeDecl { id }).collect(),
        edges
            .iter()
            .map(|&(from, to, weight, is_boundary)| EdgeDecl {
                from,
                to,
                weight,
                is_boundary,
            })
            .collect(),
    )
}

/// Fails the stream after yielding a fixed prefix of fragments.
struct FailingSource {
    remaining: Vec<Fragment>,
}

#[async_trait::async_trait]
impl FragmentSource for FailingSource {
    async fn next_fragment(&mut self) -> anyhow::Result<Option<Fragment>> {
        if self.remaining.is_empty() {
            anyhow::bail!("connection reset by peer");
        }
        Ok(Some(self.remaining.remove(0)))
    }
}

#[tokio::test]
async fn channel_stream_yields_ack_and_store() {
    let registry = SessionRegistry::new();
    let (sender, mut source) = ChannelFragmentSource::new(8);

    let producer = tokio::spawn(async move {
        sender
            .send(fragment(&[1, 2], &[(1, 2, 10, false)]))
            .await
            .unwrap();
        sender
            .send(fragment(&[3], &[(2, 3, 7, true)]))
            .await
            .unwrap();
        // Dropping the sender ends the stream cleanly.
    });

    let received = receive_partition(&registry, PartitionDefinition::new(7), &mut source)
        .await
        .unwrap();
    producer.await.unwrap();

    assert_eq!(received.ack.partition_id, 7);
    assert_eq!(received.ack.node_count, 3);
    assert_eq!(received.ack.edge_count, 2);
    assert!(received.ack.per_entry_errors.is_empty());
    assert_eq!(received.store.boundary_edge_count(), 1);
    assert_eq!(received.store.lookup(1).unwrap().edge_count(), 1);

    // The claim is released once the transfer completes.
    assert!(!registry.is_active(7));
}

#[tokio::test]
async fn transport_failure_discards_the_partial_partition() {
    let registry = SessionRegistry::new();
    let mut source = FailingSource {
        remaining: vec![fragment(&[1, 2], &[(1, 2, 1, false)])],
    };

    let err = receive_partition(&registry, PartitionDefinition::new(9), &mut source)
        .await
        .unwrap_err();

    // No ack, no store: the only evidence of the attempt is the error.
    assert!(matches!(err, ReceiveError::Transport(_)));
    assert_eq!(err.error_code(), ErrorCode::Aborted);
    assert!(!registry.is_active(9));
}

#[tokio::test]
async fn same_partition_cannot_be_received_twice_concurrently() {
    let registry = SessionRegistry::new();
    let _claim = registry.try_claim(5).unwrap();

    let (_sender, mut source) = ChannelFragmentSource::new(1);
    let err = receive_partition(&registry, PartitionDefinition::new(5), &mut source)
        .await
        .unwrap_err();

    assert!(matches!(err, ReceiveError::PartitionBusy { partition_id: 5 }));
    assert_eq!(err.error_code(), ErrorCode::FailedPrecondition);
}

#[tokio::test]
async fn distinct_partitions_stream_concurrently() {
    let registry = SessionRegistry::new();

    let mut tasks = Vec::new();
    for partition_id in [1u64, 2, 3] {
        let registry = registry.clone();
        let (sender, mut source) = ChannelFragmentSource::new(4);
        tasks.push(tokio::spawn(async move {
            sender
                .send(fragment(&[partition_id * 10], &[]))
                .await
                .unwrap();
            drop(sender);
            receive_partition(
                &registry,
                PartitionDefinition::new(partition_id),
                &mut source,
            )
            .await
        }));
    }

    for (task, partition_id) in tasks.into_iter().zip([1u64, 2, 3]) {
        let received = task.await.unwrap().unwrap();
        assert_eq!(received.ack.partition_id, partition_id);
        assert_eq!(received.ack.node_count, 1);
        assert!(received.store.contains(partition_id * 10));
    }
}

#[tokio::test]
async fn rejected_entries_flow_through_to_the_ack() {
    let registry = SessionRegistry::new();
    let (sender, mut source) = ChannelFragmentSource::new(4);

    sender
        .send(fragment(&[1, 1], &[(1, 99, 2, false)]))
        .await
        .unwrap();
    drop(sender);

    let received = receive_partition(&registry, PartitionDefinition::new(12), &mut source)
        .await
        .unwrap();

    assert_eq!(received.ack.node_count, 1);
    assert_eq!(received.ack.edge_count, 0);
    assert_eq!(received.ack.per_entry_errors.len(), 2);
}
