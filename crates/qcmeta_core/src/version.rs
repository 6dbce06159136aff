//! Cluster-wide index engine version negotiation.
//!
//! Each worker node declares the oldest index engine version it can read
//! (`minimal`) and the newest it can write (`current`). A version chosen
//! for the whole cluster must be:
//!
//! - no newer than the least capable node's `current`, so the manager
//!   reports the **minimum** of all `current` values
//! - no older than the strictest node's `minimal`, so the manager reports
//!   the **maximum** of all `minimal` values
//!
//! When no nodes are tracked both getters return `0`, meaning "no
//! constraint known yet". The getters never check `minimal <= current`;
//! callers that need a usable version go through [`VersionManager::negotiate`]
//! or [`VersionBounds::resolve`].

use crate::descriptor::NodeVersion;
use crate::error::{MetaError, MetaResult};
use crate::observer::{MetaEvent, MetaObserver, Observers};
use crate::types::{IndexVersion, NodeId};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Aggregate bounds over a non-empty node set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionBounds {
    /// Maximum of all nodes' minimal versions.
    pub minimal: IndexVersion,
    /// Minimum of all nodes' current versions.
    pub current: IndexVersion,
}

impl VersionBounds {
    /// Whether some version satisfies every node.
    #[must_use]
    pub fn is_satisfiable(&self) -> bool {
        self.minimal <= self.current
    }

    /// Returns the version to announce to workers.
    pub fn resolve(&self) -> MetaResult<IndexVersion> {
        if self.is_satisfiable() {
            Ok(self.current)
        } else {
            Err(MetaError::IncompatibleVersions {
                minimal: self.minimal,
                current: self.current,
            })
        }
    }

    fn fold<'a>(versions: impl Iterator<Item = &'a NodeVersion>) -> Option<Self> {
        let mut seen = false;
        let mut minimal: IndexVersion = 0;
        let mut current = IndexVersion::MAX;
        for version in versions {
            seen = true;
            minimal = minimal.max(version.minimal_index_version);
            current = current.min(version.current_index_version);
        }
        seen.then_some(Self { minimal, current })
    }
}

/// Tracks declared index engine versions per node.
///
/// All reads and writes go through one lock; upserts are last-writer-wins
/// and removals of unknown nodes are no-ops.
#[derive(Debug, Default)]
pub struct VersionManager {
    versions: RwLock<HashMap<NodeId, NodeVersion>>,
    observers: Observers,
}

impl VersionManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty manager that reports no-op removals to observers.
    pub fn with_noop_notifications() -> Self {
        Self {
            versions: RwLock::new(HashMap::new()),
            observers: Observers::new(true),
        }
    }

    /// Registers an observer for subsequent mutations.
    pub fn add_observer(&self, observer: Arc<dyn MetaObserver>) {
        self.observers.add(observer);
    }

    /// Seeds the manager from a membership snapshot.
    ///
    /// Every record is upserted under a single lock acquisition, so readers
    /// see either none or all of the snapshot. Nodes already tracked but
    /// missing from the snapshot are kept.
    pub fn startup<I>(&self, nodes: I)
    where
        I: IntoIterator<Item = NodeVersion>,
    {
        let mut versions = self.versions.write();
        for version in nodes {
            self.upsert_locked(&mut versions, version);
        }
    }

    /// Inserts or overwrites a node's versions.
    pub fn add_node(&self, version: NodeVersion) {
        let mut versions = self.versions.write();
        self.upsert_locked(&mut versions, version);
    }

    /// Inserts or overwrites a node's versions. Same as [`Self::add_node`].
    pub fn update(&self, version: NodeVersion) {
        self.add_node(version);
    }

    /// Forgets a node. Unknown nodes are ignored.
    pub fn remove_node(&self, node_id: NodeId) {
        let mut versions = self.versions.write();
        let existed = versions.remove(&node_id).is_some();
        if existed || self.observers.notify_noops() {
            self.observers
                .emit_with(|| MetaEvent::NodeRemoved { node_id, existed });
        }
    }

    fn upsert_locked(&self, versions: &mut HashMap<NodeId, NodeVersion>, version: NodeVersion) {
        versions.insert(version.node_id, version);
        self.observers
            .emit_with(|| MetaEvent::NodeUpserted { version });
    }

    /// Minimum of all nodes' current versions, or 0 if none are tracked.
    pub fn current_index_engine_version(&self) -> IndexVersion {
        self.bounds().map_or(0, |b| b.current)
    }

    /// Maximum of all nodes' minimal versions, or 0 if none are tracked.
    pub fn minimal_index_engine_version(&self) -> IndexVersion {
        self.bounds().map_or(0, |b| b.minimal)
    }

    /// Both bounds from one consistent snapshot, `None` when empty.
    pub fn bounds(&self) -> Option<VersionBounds> {
        VersionBounds::fold(self.versions.read().values())
    }

    /// Picks the version to announce to workers.
    ///
    /// Fails with [`MetaError::NoNodes`] when empty and
    /// [`MetaError::IncompatibleVersions`] when no version fits every node.
    pub fn negotiate(&self) -> MetaResult<IndexVersion> {
        self.bounds().ok_or(MetaError::NoNodes)?.resolve()
    }

    /// Returns a node's declared versions.
    pub fn get(&self, node_id: NodeId) -> Option<NodeVersion> {
        self.versions.read().get(&node_id).copied()
    }

    /// Returns every tracked record, ordered by node ID.
    pub fn nodes(&self) -> Vec<NodeVersion> {
        let mut nodes: Vec<NodeVersion> = self.versions.read().values().copied().collect();
        nodes.sort_by_key(|v| v.node_id);
        nodes
    }

    /// Returns the number of tracked nodes.
    pub fn node_count(&self) -> usize {
        self.versions.read().len()
    }

    /// Returns true if no nodes are tracked.
    pub fn is_empty(&self) -> bool {
        self.versions.read().is_empty()
    }
}
