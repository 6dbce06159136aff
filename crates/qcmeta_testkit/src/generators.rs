//! Property-based test generators using proptest.
//!
//! Identifier ranges are kept small so generated operations collide often
//! and exercise overwrite, move, and cascade paths.

use qcmeta_core::{
    CollectionId, DmChannel, IndexVersion, NodeId, NodeVersion, PartitionId, Segment, SegmentId,
};
use proptest::prelude::*;

/// Strategy for node IDs in `0..max`.
pub fn node_id_strategy(max: i64) -> impl Strategy<Value = NodeId> {
    (0..max).prop_map(NodeId::new)
}

/// Strategy for non-negative index engine versions.
pub fn index_version_strategy() -> impl Strategy<Value = IndexVersion> {
    prop_oneof![
        8 => 0i32..64,
        1 => Just(0),
        1 => Just(IndexVersion::MAX),
    ]
}

/// Strategy for a single node version record.
pub fn node_version_strategy() -> impl Strategy<Value = NodeVersion> {
    (
        node_id_strategy(16),
        index_version_strategy(),
        index_version_strategy(),
    )
        .prop_map(|(node, minimal, current)| NodeVersion::new(node, minimal, current))
}

/// Strategy for a membership snapshot of 1..=`max_len` records.
pub fn membership_strategy(max_len: usize) -> impl Strategy<Value = Vec<NodeVersion>> {
    prop::collection::vec(node_version_strategy(), 1..=max_len)
}

/// Strategy for channel descriptors named `<collection>-dmc<n>`.
pub fn dm_channel_strategy() -> impl Strategy<Value = DmChannel> {
    (0i64..4, 0u8..4).prop_map(|(collection, n)| {
        DmChannel::new(CollectionId::new(collection), format!("{collection}-dmc{n}"))
    })
}

/// Strategy for segment descriptors.
///
/// Partition IDs are derived from the collection so they stay globally
/// unique, as real catalogs guarantee.
pub fn segment_strategy() -> impl Strategy<Value = Segment> {
    (0i64..32, 0i64..4, 0i64..3, 0i64..10_000).prop_map(|(id, collection, partition, rows)| {
        Segment::new(
            SegmentId::new(id),
            CollectionId::new(collection),
            PartitionId::new(collection * 10 + partition),
        )
        .with_num_rows(rows)
    })
}

/// A driver call against a [`qcmeta_core::TargetIndex`].
#[derive(Debug, Clone)]
pub enum TargetOp {
    /// `add_dm_channel`
    AddChannel(DmChannel),
    /// `add_segment`
    AddSegment(Segment),
    /// `remove_dm_channel`
    RemoveChannel(String),
    /// `remove_segment`
    RemoveSegment(SegmentId),
    /// `remove_partition`
    RemovePartition(PartitionId),
    /// `remove_collection`
    RemoveCollection(CollectionId),
}

impl TargetOp {
    /// Applies the call to an index.
    pub fn apply(&self, index: &qcmeta_core::TargetIndex) {
        match self {
            TargetOp::AddChannel(channel) => index.add_dm_channel(channel.clone()),
            TargetOp::AddSegment(segment) => index.add_segment(segment.clone()),
            TargetOp::RemoveChannel(name) => index.remove_dm_channel(name),
            TargetOp::RemoveSegment(id) => index.remove_segment(*id),
            TargetOp::RemovePartition(id) => index.remove_partition(*id),
            TargetOp::RemoveCollection(id) => index.remove_collection(*id),
        }
    }
}

/// Strategy for driver calls, weighted toward additions.
pub fn target_op_strategy() -> impl Strategy<Value = TargetOp> {
    prop_oneof![
        2 => dm_channel_strategy().prop_map(TargetOp::AddChannel),
        5 => segment_strategy().prop_map(TargetOp::AddSegment),
        1 => dm_channel_strategy().prop_map(|c| TargetOp::RemoveChannel(c.channel_name)),
        2 => (0i64..32).prop_map(|id| TargetOp::RemoveSegment(SegmentId::new(id))),
        1 => (0i64..40).prop_map(|id| TargetOp::RemovePartition(PartitionId::new(id))),
        1 => (0i64..4).prop_map(|id| TargetOp::RemoveCollection(CollectionId::new(id))),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use qcmeta_core::{TargetIndex, VersionManager};

    proptest! {
        #[test]
        fn generated_segments_keep_partition_in_collection(segment in segment_strategy()) {
            prop_assert_eq!(
                segment.partition_id.as_i64() / 10,
                segment.collection_id.as_i64()
            );
        }

        #[test]
        fn random_drivers_keep_index_consistent(
            ops in prop::collection::vec(target_op_strategy(), 0..150)
        ) {
            let index = TargetIndex::new();
            for op in &ops {
                op.apply(&index);
            }
            prop_assert!(index.check_consistency());
        }

        #[test]
        fn startup_keeps_last_record_per_node(nodes in membership_strategy(8)) {
            let manager = VersionManager::new();
            manager.startup(nodes.clone());

            let mut latest = std::collections::BTreeMap::new();
            for node in &nodes {
                latest.insert(node.node_id, *node);
            }
            prop_assert_eq!(manager.nodes(), latest.values().copied().collect::<Vec<_>>());
            prop_assert!(manager.bounds().is_some());
        }
    }
}
