//! Configuration for the coordinator metadata facade.

use crate::error::{MetaError, MetaResult};

/// Configuration for [`crate::QueryCoordMeta`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaConfig {
    /// Number of events the feed keeps for polling.
    pub feed_history: usize,
    /// Emit removal events even when the removed key was absent.
    pub notify_noop_removals: bool,
    /// Install a [`crate::TracingObserver`] on both managers.
    pub trace_events: bool,
}

impl MetaConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self {
            feed_history: 10_000,
            notify_noop_removals: false,
            trace_events: true,
        }
    }

    /// Sets the feed history size.
    pub fn with_feed_history(mut self, size: usize) -> Self {
        self.feed_history = size;
        self
    }

    /// Sets whether no-op removals are reported to observers.
    pub fn with_noop_removals(mut self, notify: bool) -> Self {
        self.notify_noop_removals = notify;
        self
    }

    /// Sets whether events are logged through `tracing`.
    pub fn with_trace_events(mut self, trace: bool) -> Self {
        self.trace_events = trace;
        self
    }

    /// Checks the configuration for values the facade cannot run with.
    pub fn validate(&self) -> MetaResult<()> {
        if self.feed_history == 0 {
            return Err(MetaError::invalid_config("feed_history must be at least 1"));
        }
        Ok(())
    }
}

impl Default for MetaConfig {
    fn default() -> Self {
        Self::new()
    }
}
