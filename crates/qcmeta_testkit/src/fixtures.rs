//! Test fixtures for target and version state.
//!
//! [`TargetFixture::standard`] is the layout routing tests share: two
//! collections, each with two channels and two partitions of two segments.

use qcmeta_core::{
    CollectionId, DmChannel, IndexVersion, NodeId, NodeVersion, PartitionId, Segment, SegmentId,
    TargetIndex, VersionManager,
};
use std::collections::BTreeMap;

/// Declarative description of a target layout.
#[derive(Debug, Clone, Default)]
pub struct TargetFixture {
    /// Collection IDs in declaration order.
    pub collections: Vec<CollectionId>,
    /// Partitions of each collection, in declaration order.
    pub partitions: BTreeMap<CollectionId, Vec<PartitionId>>,
    /// Channel names of each collection.
    pub channels: BTreeMap<CollectionId, Vec<String>>,
    /// Segments of each (collection, partition), in declaration order.
    pub segments: BTreeMap<(CollectionId, PartitionId), Vec<SegmentId>>,
}

impl TargetFixture {
    /// Creates an empty fixture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Collections 1000 and 1001; partitions 100/101 and 102/103;
    /// segments {1,2}/{3,4} and {5,6}/{7,8}; channels `<col>-dmc0/1`.
    pub fn standard() -> Self {
        Self::new()
            .with_collection(1000, [(100, vec![1, 2]), (101, vec![3, 4])])
            .with_collection(1001, [(102, vec![5, 6]), (103, vec![7, 8])])
    }

    /// Adds a collection with two channels and the given partitions.
    pub fn with_collection<I>(mut self, collection: i64, partitions: I) -> Self
    where
        I: IntoIterator<Item = (i64, Vec<i64>)>,
    {
        let collection_id = CollectionId::new(collection);
        self.collections.push(collection_id);
        self.channels.insert(
            collection_id,
            (0..2).map(|i| format!("{collection}-dmc{i}")).collect(),
        );
        let mut partition_ids = Vec::new();
        for (partition, segments) in partitions {
            let partition_id = PartitionId::new(partition);
            partition_ids.push(partition_id);
            self.segments.insert(
                (collection_id, partition_id),
                segments.into_iter().map(SegmentId::new).collect(),
            );
        }
        self.partitions.insert(collection_id, partition_ids);
        self
    }

    /// Loads the layout into an existing index.
    pub fn load_into(&self, index: &TargetIndex) {
        for (collection_id, names) in &self.channels {
            for name in names {
                index.add_dm_channel(DmChannel::new(*collection_id, name.clone()));
            }
        }
        for ((collection_id, partition_id), segments) in &self.segments {
            for segment_id in segments {
                index.add_segment(
                    Segment::new(*segment_id, *collection_id, *partition_id)
                        .with_insert_channel(format!("{}-dmc0", collection_id.as_i64())),
                );
            }
        }
    }

    /// Builds a fresh index holding the layout.
    pub fn build(&self) -> TargetIndex {
        let index = TargetIndex::new();
        self.load_into(&index);
        index
    }

    /// Segments of one collection across its partitions.
    pub fn collection_segments(&self, collection_id: CollectionId) -> Vec<SegmentId> {
        self.segments
            .iter()
            .filter(|((c, _), _)| *c == collection_id)
            .flat_map(|(_, segments)| segments.iter().copied())
            .collect()
    }

    /// Every channel name in the fixture.
    pub fn all_channels(&self) -> Vec<String> {
        self.channels.values().flatten().cloned().collect()
    }

    /// Every segment in the fixture.
    pub fn all_segments(&self) -> Vec<SegmentId> {
        self.segments.values().flatten().copied().collect()
    }
}

/// Builds a version manager seeded with `(node, minimal, current)` rows.
pub fn version_manager(rows: &[(i64, IndexVersion, IndexVersion)]) -> VersionManager {
    let manager = VersionManager::new();
    manager.startup(
        rows.iter()
            .map(|(node, minimal, current)| NodeVersion::new(NodeId::new(*node), *minimal, *current)),
    );
    manager
}

/// Sorted raw IDs of a segment listing.
pub fn segment_ids(segments: &[Segment]) -> Vec<i64> {
    let mut ids: Vec<i64> = segments.iter().map(|s| s.id.as_i64()).collect();
    ids.sort_unstable();
    ids
}

/// Sorted names of a channel listing.
pub fn channel_names(channels: &[DmChannel]) -> Vec<String> {
    let mut names: Vec<String> = channels.iter().map(|c| c.channel_name.clone()).collect();
    names.sort();
    names
}
