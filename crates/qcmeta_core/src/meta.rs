//! Coordinator metadata facade.

use crate::config::MetaConfig;
use crate::error::MetaResult;
use crate::feed::{EventFeed, FeedEvent};
use crate::observer::TracingObserver;
use crate::target::TargetIndex;
use crate::version::VersionManager;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

/// Owns the version manager and target index of one coordinator.
///
/// Both managers report to a shared [`EventFeed`]. They remain independent:
/// no operation spans both, and each serializes only its own callers.
#[derive(Debug)]
pub struct QueryCoordMeta {
    config: MetaConfig,
    versions: VersionManager,
    targets: TargetIndex,
    feed: Arc<EventFeed>,
}

impl QueryCoordMeta {
    /// Builds the managers and wires their observers.
    pub fn open(config: MetaConfig) -> MetaResult<Self> {
        config.validate()?;

        let (versions, targets) = if config.notify_noop_removals {
            (
                VersionManager::with_noop_notifications(),
                TargetIndex::with_noop_notifications(),
            )
        } else {
            (VersionManager::new(), TargetIndex::new())
        };

        let feed = Arc::new(EventFeed::with_max_history(config.feed_history));
        versions.add_observer(feed.clone());
        targets.add_observer(feed.clone());

        if config.trace_events {
            let tracer = Arc::new(TracingObserver::new());
            versions.add_observer(tracer.clone());
            targets.add_observer(tracer);
        }

        Ok(Self {
            config,
            versions,
            targets,
            feed,
        })
    }

    /// Returns the version manager.
    pub fn versions(&self) -> &VersionManager {
        &self.versions
    }

    /// Returns the target index.
    pub fn targets(&self) -> &TargetIndex {
        &self.targets
    }

    /// Returns the shared event feed.
    pub fn feed(&self) -> &Arc<EventFeed> {
        &self.feed
    }

    /// Subscribes to events from both managers.
    pub fn subscribe(&self) -> Receiver<FeedEvent> {
        self.feed.subscribe()
    }

    /// Returns the configuration the facade was opened with.
    pub fn config(&self) -> &MetaConfig {
        &self.config
    }
}
