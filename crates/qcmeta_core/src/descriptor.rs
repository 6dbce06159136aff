//! Descriptors stored by the managers.
//!
//! Descriptors arrive already decoded from the membership and catalog
//! services. The managers store them as given and never validate fields
//! beyond the identifiers they index by.

use crate::types::{CollectionId, IndexVersion, NodeId, PartitionId, SegmentId};

/// Index engine versions declared by one worker node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeVersion {
    /// The declaring node.
    pub node_id: NodeId,
    /// Oldest index engine version the node can still read.
    pub minimal_index_version: IndexVersion,
    /// Newest index engine version the node can write.
    pub current_index_version: IndexVersion,
}

impl NodeVersion {
    /// Creates a node version record.
    #[must_use]
    pub const fn new(node_id: NodeId, minimal: IndexVersion, current: IndexVersion) -> Self {
        Self {
            node_id,
            minimal_index_version: minimal,
            current_index_version: current,
        }
    }
}

/// Position in a message stream from which a channel resumes consumption.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SeekPosition {
    /// Physical channel the position belongs to.
    pub channel_name: String,
    /// Opaque message identifier.
    pub msg_id: Vec<u8>,
    /// Timestamp of the message.
    pub timestamp: u64,
}

/// A data-manipulation channel owned by a collection.
///
/// Unique by `(collection_id, channel_name)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmChannel {
    /// Owning collection.
    pub collection_id: CollectionId,
    /// Virtual channel name.
    pub channel_name: String,
    /// Where consumption should resume, if known.
    pub seek_position: Option<SeekPosition>,
    /// Growing segments fed by this channel.
    pub unflushed_segment_ids: Vec<SegmentId>,
    /// Sealed segments already flushed from this channel.
    pub flushed_segment_ids: Vec<SegmentId>,
    /// Segments dropped from this channel.
    pub dropped_segment_ids: Vec<SegmentId>,
}

impl DmChannel {
    /// Creates a channel descriptor with no position or segment lists.
    pub fn new(collection_id: CollectionId, channel_name: impl Into<String>) -> Self {
        Self {
            collection_id,
            channel_name: channel_name.into(),
            seek_position: None,
            unflushed_segment_ids: Vec::new(),
            flushed_segment_ids: Vec::new(),
            dropped_segment_ids: Vec::new(),
        }
    }

    /// Sets the seek position.
    #[must_use]
    pub fn with_seek_position(mut self, position: SeekPosition) -> Self {
        self.seek_position = Some(position);
        self
    }

    /// Sets the unflushed segment list.
    #[must_use]
    pub fn with_unflushed_segments(mut self, ids: Vec<SegmentId>) -> Self {
        self.unflushed_segment_ids = ids;
        self
    }

    /// Sets the flushed segment list.
    #[must_use]
    pub fn with_flushed_segments(mut self, ids: Vec<SegmentId>) -> Self {
        self.flushed_segment_ids = ids;
        self
    }

    /// Sets the dropped segment list.
    #[must_use]
    pub fn with_dropped_segments(mut self, ids: Vec<SegmentId>) -> Self {
        self.dropped_segment_ids = ids;
        self
    }
}

/// A sealed segment filed under a collection partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Globally unique segment ID.
    pub id: SegmentId,
    /// Owning collection.
    pub collection_id: CollectionId,
    /// Owning partition.
    pub partition_id: PartitionId,
    /// Channel the segment's rows were inserted through.
    pub insert_channel: String,
    /// Row count reported by the catalog.
    pub num_rows: i64,
}

impl Segment {
    /// Creates a segment descriptor.
    pub fn new(id: SegmentId, collection_id: CollectionId, partition_id: PartitionId) -> Self {
        Self {
            id,
            collection_id,
            partition_id,
            insert_channel: String::new(),
            num_rows: 0,
        }
    }

    /// Sets the insert channel.
    #[must_use]
    pub fn with_insert_channel(mut self, channel: impl Into<String>) -> Self {
        self.insert_channel = channel.into();
        self
    }

    /// Sets the row count.
    #[must_use]
    pub fn with_num_rows(mut self, num_rows: i64) -> Self {
        self.num_rows = num_rows;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_builder() {
        let channel = DmChannel::new(CollectionId::new(1), "1-dmc0")
            .with_seek_position(SeekPosition {
                channel_name: "dml_0".into(),
                msg_id: vec![1, 2],
                timestamp: 99,
            })
            .with_flushed_segments(vec![SegmentId::new(3)]);

        assert_eq!(channel.channel_name, "1-dmc0");
        assert_eq!(channel.seek_position.as_ref().map(|p| p.timestamp), Some(99));
        assert_eq!(channel.flushed_segment_ids, vec![SegmentId::new(3)]);
        assert!(channel.unflushed_segment_ids.is_empty());
    }

    #[test]
    fn segment_builder() {
        let segment = Segment::new(SegmentId::new(9), CollectionId::new(1), PartitionId::new(10))
            .with_insert_channel("1-dmc0")
            .with_num_rows(2048);

        assert_eq!(segment.insert_channel, "1-dmc0");
        assert_eq!(segment.num_rows, 2048);
    }
}
