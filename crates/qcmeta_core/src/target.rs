//! Target index: which channels and segments each collection serves.
//!
//! The index is one composite structure with two access paths:
//!
//! - hierarchical: collection → channels, and collection → partition →
//!   segments, used for per-collection listings
//! - flat: channel name → owning collections, and segment ID → owning
//!   (collection, partition), used for O(1) membership and removal
//!
//! Descriptors live only in the hierarchy; the flat maps hold locations.
//! Every mutation updates both paths under the same write lock, so a
//! segment is reachable through the hierarchy if and only if the flat map
//! knows it.
//!
//! # Invariants
//!
//! - Segment IDs are globally unique. Re-adding an ID under a different
//!   (collection, partition) moves it.
//! - Partition IDs are globally unique. [`TargetIndex::remove_partition`]
//!   drops the partition from whichever collection files it.
//! - Channels are unique by (collection, name).
//! - Empty partitions and collections are pruned.

use crate::descriptor::{DmChannel, Segment};
use crate::observer::{MetaEvent, MetaObserver, Observers};
use crate::types::{CollectionId, PartitionId, SegmentId};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

type SegmentBucket = BTreeMap<SegmentId, Segment>;

/// Everything filed under one collection.
#[derive(Debug, Default)]
struct CollectionTarget {
    channels: BTreeMap<String, DmChannel>,
    partitions: BTreeMap<PartitionId, SegmentBucket>,
}

impl CollectionTarget {
    fn is_empty(&self) -> bool {
        self.channels.is_empty() && self.partitions.is_empty()
    }

    fn segment_count(&self) -> usize {
        self.partitions.values().map(BTreeMap::len).sum()
    }
}

#[derive(Debug, Default)]
struct TargetState {
    collections: BTreeMap<CollectionId, CollectionTarget>,
    channel_index: HashMap<String, BTreeSet<CollectionId>>,
    segment_index: HashMap<SegmentId, (CollectionId, PartitionId)>,
}

impl TargetState {
    fn insert_channel(&mut self, channel: DmChannel) {
        self.channel_index
            .entry(channel.channel_name.clone())
            .or_default()
            .insert(channel.collection_id);
        self.collections
            .entry(channel.collection_id)
            .or_default()
            .channels
            .insert(channel.channel_name.clone(), channel);
    }

    fn remove_channel(&mut self, name: &str) -> Vec<CollectionId> {
        let Some(owners) = self.channel_index.remove(name) else {
            return Vec::new();
        };
        for collection_id in &owners {
            if let Some(target) = self.collections.get_mut(collection_id) {
                target.channels.remove(name);
            }
            self.prune(*collection_id);
        }
        owners.into_iter().collect()
    }

    fn insert_segment(&mut self, segment: Segment) {
        let location = (segment.collection_id, segment.partition_id);
        if let Some(previous) = self.segment_index.insert(segment.id, location) {
            if previous != location {
                self.detach_segment(segment.id, previous);
            }
        }
        self.collections
            .entry(segment.collection_id)
            .or_default()
            .partitions
            .entry(segment.partition_id)
            .or_default()
            .insert(segment.id, segment);
    }

    fn remove_segment(&mut self, segment_id: SegmentId) -> Option<(CollectionId, PartitionId)> {
        let location = self.segment_index.remove(&segment_id)?;
        self.detach_segment(segment_id, location);
        Some(location)
    }

    /// Drops a segment from its hierarchical bucket only.
    fn detach_segment(&mut self, segment_id: SegmentId, location: (CollectionId, PartitionId)) {
        let (collection_id, partition_id) = location;
        if let Some(target) = self.collections.get_mut(&collection_id) {
            if let Some(bucket) = target.partitions.get_mut(&partition_id) {
                bucket.remove(&segment_id);
                if bucket.is_empty() {
                    target.partitions.remove(&partition_id);
                }
            }
        }
        self.prune(collection_id);
    }

    fn remove_partition(&mut self, partition_id: PartitionId) -> usize {
        let mut removed = 0;
        let mut emptied = Vec::new();
        for (collection_id, target) in self.collections.iter_mut() {
            if let Some(bucket) = target.partitions.remove(&partition_id) {
                removed += bucket.len();
                for segment_id in bucket.keys() {
                    self.segment_index.remove(segment_id);
                }
                if target.is_empty() {
                    emptied.push(*collection_id);
                }
            }
        }
        for collection_id in emptied {
            self.collections.remove(&collection_id);
        }
        removed
    }

    fn remove_collection(&mut self, collection_id: CollectionId) -> (usize, usize) {
        let Some(target) = self.collections.remove(&collection_id) else {
            return (0, 0);
        };
        for name in target.channels.keys() {
            let orphaned = match self.channel_index.get_mut(name) {
                Some(owners) => {
                    owners.remove(&collection_id);
                    owners.is_empty()
                }
                None => false,
            };
            if orphaned {
                self.channel_index.remove(name);
            }
        }
        for bucket in target.partitions.values() {
            for segment_id in bucket.keys() {
                self.segment_index.remove(segment_id);
            }
        }
        (target.channels.len(), target.segment_count())
    }

    fn prune(&mut self, collection_id: CollectionId) {
        if self
            .collections
            .get(&collection_id)
            .is_some_and(CollectionTarget::is_empty)
        {
            self.collections.remove(&collection_id);
        }
    }

    fn segments_in<'a>(
        &'a self,
        collection_id: CollectionId,
        partitions: Option<&'a BTreeSet<PartitionId>>,
    ) -> Vec<Segment> {
        let Some(target) = self.collections.get(&collection_id) else {
            return Vec::new();
        };
        target
            .partitions
            .iter()
            .filter(|(partition_id, _)| partitions.is_none_or(|p| p.contains(*partition_id)))
            .flat_map(|(_, bucket)| bucket.values().cloned())
            .collect()
    }

    fn is_consistent(&self) -> bool {
        let mut hierarchical_segments = 0;
        let mut hierarchical_channels = 0;
        for (collection_id, target) in &self.collections {
            if target.is_empty() {
                return false;
            }
            for (name, channel) in &target.channels {
                hierarchical_channels += 1;
                let indexed = self
                    .channel_index
                    .get(name)
                    .is_some_and(|owners| owners.contains(collection_id));
                if !indexed || channel.collection_id != *collection_id {
                    return false;
                }
            }
            for (partition_id, bucket) in &target.partitions {
                if bucket.is_empty() {
                    return false;
                }
                for (segment_id, segment) in bucket {
                    hierarchical_segments += 1;
                    let location = (*collection_id, *partition_id);
                    if self.segment_index.get(segment_id) != Some(&location)
                        || segment.id != *segment_id
                    {
                        return false;
                    }
                }
            }
        }
        let indexed_channels: usize = self.channel_index.values().map(BTreeSet::len).sum();
        hierarchical_segments == self.segment_index.len()
            && hierarchical_channels == indexed_channels
    }
}

/// Maps collections to the channels and segments queries must target.
///
/// All operations are total: unknown keys read as empty and removals of
/// unknown keys succeed silently.
#[derive(Debug, Default)]
pub struct TargetIndex {
    state: RwLock<TargetState>,
    observers: Observers,
}

impl TargetIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty index that reports no-op removals to observers.
    pub fn with_noop_notifications() -> Self {
        Self {
            state: RwLock::new(TargetState::default()),
            observers: Observers::new(true),
        }
    }

    /// Registers an observer for subsequent mutations.
    pub fn add_observer(&self, observer: Arc<dyn MetaObserver>) {
        self.observers.add(observer);
    }

    /// Inserts or overwrites a channel under its collection.
    pub fn add_dm_channel(&self, channel: DmChannel) {
        let mut state = self.state.write();
        let collection_id = channel.collection_id;
        let channel_name = channel.channel_name.clone();
        state.insert_channel(channel);
        self.observers.emit_with(|| MetaEvent::ChannelAdded {
            collection_id,
            channel_name,
        });
    }

    /// Inserts or overwrites a segment under its collection and partition.
    pub fn add_segment(&self, segment: Segment) {
        let mut state = self.state.write();
        let (segment_id, collection_id, partition_id) =
            (segment.id, segment.collection_id, segment.partition_id);
        state.insert_segment(segment);
        self.observers.emit_with(|| MetaEvent::SegmentAdded {
            segment_id,
            collection_id,
            partition_id,
        });
    }

    /// Returns a collection's channels, ordered by name.
    pub fn get_dm_channels_by_collection(&self, collection_id: CollectionId) -> Vec<DmChannel> {
        self.state
            .read()
            .collections
            .get(&collection_id)
            .map(|target| target.channels.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns one channel of a collection.
    pub fn get_dm_channel(&self, collection_id: CollectionId, name: &str) -> Option<DmChannel> {
        self.state
            .read()
            .collections
            .get(&collection_id)
            .and_then(|target| target.channels.get(name).cloned())
    }

    /// Returns every segment of a collection across all its partitions.
    ///
    /// Ordered by partition, then segment ID.
    pub fn get_segments_by_collection(&self, collection_id: CollectionId) -> Vec<Segment> {
        self.state.read().segments_in(collection_id, None)
    }

    /// Returns the segments of one partition within a collection.
    pub fn get_segments_by_partition(
        &self,
        collection_id: CollectionId,
        partition_id: PartitionId,
    ) -> Vec<Segment> {
        self.get_segments_by_partitions(collection_id, &[partition_id])
    }

    /// Returns the segments of the given partitions within a collection.
    ///
    /// An empty slice applies no filter and returns every segment of the
    /// collection. Partitions that are unknown or belong to another
    /// collection contribute nothing.
    pub fn get_segments_by_partitions(
        &self,
        collection_id: CollectionId,
        partitions: &[PartitionId],
    ) -> Vec<Segment> {
        if partitions.is_empty() {
            return self.get_segments_by_collection(collection_id);
        }
        let wanted: BTreeSet<PartitionId> = partitions.iter().copied().collect();
        self.state.read().segments_in(collection_id, Some(&wanted))
    }

    /// Returns a segment by ID, wherever it is filed.
    pub fn get_segment(&self, segment_id: SegmentId) -> Option<Segment> {
        let state = self.state.read();
        let (collection_id, partition_id) = state.segment_index.get(&segment_id)?;
        state
            .collections
            .get(collection_id)?
            .partitions
            .get(partition_id)?
            .get(&segment_id)
            .cloned()
    }

    /// Returns true if any collection files a channel with this name.
    pub fn contains_dm_channel(&self, name: &str) -> bool {
        self.state.read().channel_index.contains_key(name)
    }

    /// Returns true if the segment is filed anywhere.
    pub fn contains_segment(&self, segment_id: SegmentId) -> bool {
        self.state.read().segment_index.contains_key(&segment_id)
    }

    /// Removes a channel from every collection that files it.
    pub fn remove_dm_channel(&self, name: &str) {
        let mut state = self.state.write();
        let collections = state.remove_channel(name);
        if !collections.is_empty() || self.observers.notify_noops() {
            self.observers.emit_with(|| MetaEvent::ChannelRemoved {
                channel_name: name.to_string(),
                collections,
            });
        }
    }

    /// Removes a segment from both access paths. Unknown IDs are ignored.
    pub fn remove_segment(&self, segment_id: SegmentId) {
        let mut state = self.state.write();
        let location = state.remove_segment(segment_id);
        if location.is_some() || self.observers.notify_noops() {
            self.observers.emit_with(|| MetaEvent::SegmentRemoved {
                segment_id,
                location,
            });
        }
    }

    /// Removes every segment filed under the partition, in any collection.
    ///
    /// Channels and other partitions are untouched.
    pub fn remove_partition(&self, partition_id: PartitionId) {
        let mut state = self.state.write();
        let segments = state.remove_partition(partition_id);
        if segments > 0 || self.observers.notify_noops() {
            self.observers.emit_with(|| MetaEvent::PartitionRemoved {
                partition_id,
                segments,
            });
        }
    }

    /// Removes a collection's channels and the segments of all its partitions.
    pub fn remove_collection(&self, collection_id: CollectionId) {
        let mut state = self.state.write();
        let (channels, segments) = state.remove_collection(collection_id);
        if channels + segments > 0 || self.observers.notify_noops() {
            self.observers.emit_with(|| MetaEvent::CollectionRemoved {
                collection_id,
                channels,
                segments,
            });
        }
    }

    /// Returns the collections with at least one channel or segment.
    pub fn collections(&self) -> Vec<CollectionId> {
        self.state.read().collections.keys().copied().collect()
    }

    /// Returns the number of (collection, channel) entries.
    pub fn channel_count(&self) -> usize {
        self.state
            .read()
            .collections
            .values()
            .map(|target| target.channels.len())
            .sum()
    }

    /// Returns the number of segments.
    pub fn segment_count(&self) -> usize {
        self.state.read().segment_index.len()
    }

    /// Returns true if nothing is filed.
    pub fn is_empty(&self) -> bool {
        self.state.read().collections.is_empty()
    }

    /// Verifies that the flat and hierarchical access paths agree.
    ///
    /// Diagnostic for tests and debug tooling; walks the whole index.
    pub fn check_consistency(&self) -> bool {
        self.state.read().is_consistent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::tests::Recorder;

    fn col(id: i64) -> CollectionId {
        CollectionId::new(id)
    }

    fn part(id: i64) -> PartitionId {
        PartitionId::new(id)
    }

    fn seg(id: i64) -> SegmentId {
        SegmentId::new(id)
    }

    fn segment(id: i64, collection: i64, partition: i64) -> Segment {
        Segment::new(seg(id), col(collection), part(partition))
    }

    fn ids(segments: &[Segment]) -> Vec<i64> {
        segments.iter().map(|s| s.id.as_i64()).collect()
    }

    #[test]
    fn unknown_collection_reads_empty() {
        let index = TargetIndex::new();
        assert!(index.get_dm_channels_by_collection(col(1)).is_empty());
        assert!(index.get_segments_by_collection(col(1)).is_empty());
        assert!(index.get_segments_by_partition(col(1), part(1)).is_empty());
        assert!(index.is_empty());
    }

    #[test]
    fn add_segment_reachable_both_ways() {
        let index = TargetIndex::new();
        index.add_segment(segment(1, 10, 100));

        assert!(index.contains_segment(seg(1)));
        assert_eq!(ids(&index.get_segments_by_partition(col(10), part(100))), vec![1]);
        assert_eq!(ids(&index.get_segments_by_collection(col(10))), vec![1]);
        assert_eq!(index.get_segment(seg(1)), Some(segment(1, 10, 100)));
        assert!(index.check_consistency());
    }

    #[test]
    fn empty_partition_filter_lists_whole_collection() {
        let index = TargetIndex::new();
        index.add_segment(segment(1, 10, 100));
        index.add_segment(segment(2, 10, 101));
        index.add_segment(segment(3, 11, 110));

        let unfiltered = index.get_segments_by_collection(col(10));
        assert_eq!(ids(&unfiltered), vec![1, 2]);
        assert_eq!(index.get_segments_by_partitions(col(10), &[]), unfiltered);
        assert!(index.get_segments_by_partitions(col(12), &[]).is_empty());
    }

    #[test]
    fn partition_filter_is_scoped_to_collection() {
        let index = TargetIndex::new();
        index.add_segment(segment(1, 10, 100));
        index.add_segment(segment(2, 11, 101));

        assert!(index.get_segments_by_partition(col(10), part(101)).is_empty());
        assert_eq!(
            ids(&index.get_segments_by_partitions(col(10), &[part(100), part(101)])),
            vec![1]
        );
    }

    #[test]
    fn re_adding_segment_overwrites() {
        let index = TargetIndex::new();
        index.add_segment(segment(1, 10, 100));
        index.add_segment(segment(1, 10, 100).with_num_rows(50));

        assert_eq!(index.segment_count(), 1);
        assert_eq!(index.get_segment(seg(1)).map(|s| s.num_rows), Some(50));
    }

    #[test]
    fn re_adding_segment_elsewhere_moves_it() {
        let index = TargetIndex::new();
        index.add_segment(segment(1, 10, 100));
        index.add_segment(segment(1, 11, 110));

        assert!(index.get_segments_by_collection(col(10)).is_empty());
        assert_eq!(ids(&index.get_segments_by_collection(col(11))), vec![1]);
        assert_eq!(index.collections(), vec![col(11)]);
        assert!(index.check_consistency());
    }

    #[test]
    fn remove_segment_clears_both_paths() {
        let index = TargetIndex::new();
        index.add_segment(segment(1, 10, 100));
        index.add_segment(segment(2, 10, 100));

        index.remove_segment(seg(1));

        assert!(!index.contains_segment(seg(1)));
        assert_eq!(ids(&index.get_segments_by_collection(col(10))), vec![2]);
        assert!(index.check_consistency());

        // Second removal is a no-op.
        index.remove_segment(seg(1));
        assert_eq!(index.segment_count(), 1);
    }

    #[test]
    fn remove_partition_leaves_channels_and_siblings() {
        let index = TargetIndex::new();
        index.add_dm_channel(DmChannel::new(col(10), "10-dmc0"));
        index.add_segment(segment(1, 10, 100));
        index.add_segment(segment(2, 10, 100));
        index.add_segment(segment(3, 10, 101));

        index.remove_partition(part(100));

        assert!(!index.contains_segment(seg(1)));
        assert!(!index.contains_segment(seg(2)));
        assert!(index.contains_segment(seg(3)));
        assert!(index.contains_dm_channel("10-dmc0"));
        assert_eq!(ids(&index.get_segments_by_collection(col(10))), vec![3]);
        assert!(index.check_consistency());
    }

    #[test]
    fn remove_unknown_partition_is_noop() {
        let index = TargetIndex::new();
        index.add_segment(segment(1, 10, 100));
        index.remove_partition(part(999));
        assert_eq!(index.segment_count(), 1);
    }

    #[test]
    fn remove_collection_cascades() {
        let index = TargetIndex::new();
        index.add_dm_channel(DmChannel::new(col(10), "10-dmc0"));
        index.add_dm_channel(DmChannel::new(col(11), "11-dmc0"));
        index.add_segment(segment(1, 10, 100));
        index.add_segment(segment(2, 10, 101));
        index.add_segment(segment(3, 11, 110));

        index.remove_collection(col(10));

        assert!(index.get_dm_channels_by_collection(col(10)).is_empty());
        assert!(index.get_segments_by_collection(col(10)).is_empty());
        assert!(!index.contains_dm_channel("10-dmc0"));
        assert!(!index.contains_segment(seg(1)));
        assert!(!index.contains_segment(seg(2)));
        assert!(index.contains_segment(seg(3)));
        assert!(index.contains_dm_channel("11-dmc0"));
        assert!(index.check_consistency());
    }

    #[test]
    fn shared_channel_name_survives_one_owner() {
        let index = TargetIndex::new();
        index.add_dm_channel(DmChannel::new(col(10), "shared"));
        index.add_dm_channel(DmChannel::new(col(11), "shared"));
        assert_eq!(index.channel_count(), 2);

        index.remove_collection(col(10));

        assert!(index.contains_dm_channel("shared"));
        assert!(index.get_dm_channel(col(11), "shared").is_some());
        assert!(index.check_consistency());

        index.remove_dm_channel("shared");
        assert!(!index.contains_dm_channel("shared"));
        assert!(index.is_empty());
    }

    #[test]
    fn re_adding_channel_overwrites() {
        let index = TargetIndex::new();
        index.add_dm_channel(DmChannel::new(col(10), "10-dmc0"));
        index.add_dm_channel(
            DmChannel::new(col(10), "10-dmc0").with_unflushed_segments(vec![seg(4)]),
        );

        let channels = index.get_dm_channels_by_collection(col(10));
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].unflushed_segment_ids, vec![seg(4)]);
    }

    #[test]
    fn empty_collections_are_pruned() {
        let index = TargetIndex::new();
        index.add_segment(segment(1, 10, 100));
        index.remove_segment(seg(1));
        assert!(index.collections().is_empty());
    }

    #[test]
    fn observers_see_cascade_counts() {
        let index = TargetIndex::new();
        let recorder = Arc::new(Recorder::default());
        index.add_dm_channel(DmChannel::new(col(10), "10-dmc0"));
        index.add_segment(segment(1, 10, 100));
        index.add_segment(segment(2, 10, 101));
        index.add_observer(recorder.clone());

        index.remove_collection(col(10));
        index.remove_collection(col(10));

        assert_eq!(
            recorder.events(),
            vec![MetaEvent::CollectionRemoved {
                collection_id: col(10),
                channels: 1,
                segments: 2,
            }]
        );
    }

    #[test]
    fn noop_removals_reported_when_enabled() {
        let index = TargetIndex::with_noop_notifications();
        let recorder = Arc::new(Recorder::default());
        index.add_observer(recorder.clone());

        index.remove_segment(seg(5));
        index.remove_partition(part(6));

        assert_eq!(
            recorder.events(),
            vec![
                MetaEvent::SegmentRemoved {
                    segment_id: seg(5),
                    location: None,
                },
                MetaEvent::PartitionRemoved {
                    partition_id: part(6),
                    segments: 0,
                },
            ]
        );
    }
}
