//! Observer hooks for manager mutations.
//!
//! The managers never log on their own. Instrumentation is injected by
//! registering a [`MetaObserver`]; [`TracingObserver`] is the stock one.
//!
//! Observers run while the notifying manager holds its lock, so events from
//! one manager arrive in the order the mutations took effect. An observer
//! must not call back into the manager that notified it.

use crate::descriptor::NodeVersion;
use crate::types::{CollectionId, NodeId, PartitionId, SegmentId};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

/// A mutation applied by one of the managers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaEvent {
    /// A node's versions were inserted or overwritten.
    NodeUpserted {
        /// The stored record.
        version: NodeVersion,
    },
    /// A node was removed.
    NodeRemoved {
        /// The node.
        node_id: NodeId,
        /// Whether the node was tracked before the call.
        existed: bool,
    },
    /// A channel was inserted or overwritten.
    ChannelAdded {
        /// Owning collection.
        collection_id: CollectionId,
        /// Channel name.
        channel_name: String,
    },
    /// A channel was removed from the given collections.
    ChannelRemoved {
        /// Channel name.
        channel_name: String,
        /// Collections the channel was filed under.
        collections: Vec<CollectionId>,
    },
    /// A segment was inserted or overwritten.
    SegmentAdded {
        /// The segment.
        segment_id: SegmentId,
        /// Owning collection.
        collection_id: CollectionId,
        /// Owning partition.
        partition_id: PartitionId,
    },
    /// A segment was removed.
    SegmentRemoved {
        /// The segment.
        segment_id: SegmentId,
        /// Former owner, `None` when the segment was unknown.
        location: Option<(CollectionId, PartitionId)>,
    },
    /// Every segment under a partition was removed.
    PartitionRemoved {
        /// The partition.
        partition_id: PartitionId,
        /// Number of segments dropped.
        segments: usize,
    },
    /// A collection and everything beneath it was removed.
    CollectionRemoved {
        /// The collection.
        collection_id: CollectionId,
        /// Number of channels dropped.
        channels: usize,
        /// Number of segments dropped.
        segments: usize,
    },
}

/// Receives manager mutations.
pub trait MetaObserver: Send + Sync {
    /// Called once per effective mutation.
    fn on_event(&self, event: &MetaEvent);
}

/// Logs every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl TracingObserver {
    /// Creates a tracing observer.
    pub fn new() -> Self {
        Self
    }
}

impl MetaObserver for TracingObserver {
    fn on_event(&self, event: &MetaEvent) {
        match event {
            MetaEvent::NodeUpserted { version } => debug!(
                node = %version.node_id,
                minimal = version.minimal_index_version,
                current = version.current_index_version,
                "upserted index engine version"
            ),
            MetaEvent::NodeRemoved { node_id, existed } => {
                debug!(node = %node_id, existed, "removed node version")
            }
            MetaEvent::ChannelAdded {
                collection_id,
                channel_name,
            } => debug!(collection = %collection_id, channel = %channel_name, "added dm channel"),
            MetaEvent::ChannelRemoved {
                channel_name,
                collections,
            } => debug!(
                channel = %channel_name,
                collections = collections.len(),
                "removed dm channel"
            ),
            MetaEvent::SegmentAdded {
                segment_id,
                collection_id,
                partition_id,
            } => debug!(
                segment = %segment_id,
                collection = %collection_id,
                partition = %partition_id,
                "added segment"
            ),
            MetaEvent::SegmentRemoved {
                segment_id,
                location,
            } => debug!(segment = %segment_id, found = location.is_some(), "removed segment"),
            MetaEvent::PartitionRemoved {
                partition_id,
                segments,
            } => debug!(partition = %partition_id, segments, "removed partition"),
            MetaEvent::CollectionRemoved {
                collection_id,
                channels,
                segments,
            } => info!(
                collection = %collection_id,
                channels,
                segments,
                "removed collection target"
            ),
        }
    }
}

/// Registered observers of one manager.
#[derive(Default)]
pub(crate) struct Observers {
    observers: RwLock<Vec<Arc<dyn MetaObserver>>>,
    notify_noops: bool,
}

impl Observers {
    pub(crate) fn new(notify_noops: bool) -> Self {
        Self {
            observers: RwLock::new(Vec::new()),
            notify_noops,
        }
    }

    pub(crate) fn add(&self, observer: Arc<dyn MetaObserver>) {
        self.observers.write().push(observer);
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.read().len()
    }

    /// Whether removals of absent keys should be reported.
    pub(crate) fn notify_noops(&self) -> bool {
        self.notify_noops
    }

    /// Builds and dispatches an event only when someone is listening.
    pub(crate) fn emit_with(&self, make: impl FnOnce() -> MetaEvent) {
        let observers = self.observers.read();
        if observers.is_empty() {
            return;
        }
        let event = make();
        for observer in observers.iter() {
            observer.on_event(&event);
        }
    }
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("count", &self.len())
            .field("notify_noops", &self.notify_noops)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Collects every event it sees.
    #[derive(Default)]
    pub(crate) struct Recorder {
        events: Mutex<Vec<MetaEvent>>,
    }

    impl Recorder {
        pub(crate) fn events(&self) -> Vec<MetaEvent> {
            self.events.lock().clone()
        }
    }

    impl MetaObserver for Recorder {
        fn on_event(&self, event: &MetaEvent) {
            self.events.lock().push(event.clone());
        }
    }

    #[test]
    fn emit_reaches_every_observer() {
        let observers = Observers::new(false);
        let a = Arc::new(Recorder::default());
        let b = Arc::new(Recorder::default());
        observers.add(a.clone());
        observers.add(b.clone());

        observers.emit_with(|| MetaEvent::NodeRemoved {
            node_id: NodeId::new(1),
            existed: true,
        });

        assert_eq!(a.events().len(), 1);
        assert_eq!(a.events(), b.events());
    }

    #[test]
    fn emit_skips_construction_without_observers() {
        let observers = Observers::new(false);
        let mut built = false;
        observers.emit_with(|| {
            built = true;
            MetaEvent::NodeRemoved {
                node_id: NodeId::new(1),
                existed: false,
            }
        });
        assert!(!built);
    }

    #[test]
    fn tracing_observer_handles_every_variant() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .try_init();

        let observer = TracingObserver::new();
        let events = [
            MetaEvent::NodeUpserted {
                version: NodeVersion::new(NodeId::new(1), 1, 2),
            },
            MetaEvent::ChannelRemoved {
                channel_name: "c".into(),
                collections: vec![CollectionId::new(1)],
            },
            MetaEvent::SegmentRemoved {
                segment_id: SegmentId::new(1),
                location: None,
            },
            MetaEvent::CollectionRemoved {
                collection_id: CollectionId::new(1),
                channels: 2,
                segments: 4,
            },
        ];
        for event in &events {
            observer.on_event(event);
        }
    }
}
