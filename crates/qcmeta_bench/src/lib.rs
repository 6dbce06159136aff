//! Benchmark utilities.

#![deny(unsafe_code)]
#![warn(missing_docs)]

use qcmeta_core::{
    CollectionId, DmChannel, NodeId, NodeVersion, PartitionId, Segment, SegmentId, TargetIndex,
};
use rand::Rng;

/// Generate `count` node records with random versions.
pub fn random_nodes(count: usize) -> Vec<NodeVersion> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|i| {
            let minimal = rng.gen_range(0..50);
            let current = rng.gen_range(minimal..100);
            NodeVersion::new(NodeId::new(i as i64), minimal, current)
        })
        .collect()
}

/// Build an index with the given shape.
///
/// Segment IDs are dense from 0; partitions of collection `c` are
/// `c * partitions .. (c + 1) * partitions`.
pub fn populated_index(
    collections: usize,
    partitions: usize,
    segments_per_partition: usize,
) -> TargetIndex {
    let index = TargetIndex::new();
    let mut next_segment = 0i64;
    for c in 0..collections {
        let collection = CollectionId::new(c as i64);
        index.add_dm_channel(DmChannel::new(collection, format!("{c}-dmc0")));
        index.add_dm_channel(DmChannel::new(collection, format!("{c}-dmc1")));
        for p in 0..partitions {
            let partition = PartitionId::new((c * partitions + p) as i64);
            for _ in 0..segments_per_partition {
                let id = SegmentId::new(next_segment);
                index.add_segment(Segment::new(id, collection, partition));
                next_segment += 1;
            }
        }
    }
    index
}
