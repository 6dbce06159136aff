//! Event feed for observing manager mutations.
//!
//! The feed is a [`MetaObserver`] that stamps each event with a sequence
//! number, keeps a bounded history for polling, and fans events out to
//! channel subscribers. It is how routing caches and audit tooling follow
//! target and version changes without polling the managers.
//!
//! # Usage
//!
//! ```rust,ignore
//! use qcmeta_core::{MetaConfig, QueryCoordMeta};
//!
//! let meta = QueryCoordMeta::open(MetaConfig::default())?;
//! let receiver = meta.subscribe();
//!
//! std::thread::spawn(move || {
//!     while let Ok(event) = receiver.recv() {
//!         println!("{}: {:?}", event.sequence, event.event);
//!     }
//! });
//! ```

use crate::observer::{MetaEvent, MetaObserver};
use parking_lot::{Mutex, RwLock};
use std::collections::VecDeque;
use std::sync::mpsc::{self, Receiver, Sender};

/// A sequenced event delivered by the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEvent {
    /// Position of the event in the feed, starting at 1.
    pub sequence: u64,
    /// The mutation.
    pub event: MetaEvent,
}

struct FeedState {
    next_sequence: u64,
    history: VecDeque<FeedEvent>,
}

/// Distributes manager events to subscribers and keeps recent history.
pub struct EventFeed {
    state: Mutex<FeedState>,
    subscribers: RwLock<Vec<Sender<FeedEvent>>>,
    max_history: usize,
}

impl EventFeed {
    /// Creates a feed with the default history limit.
    pub fn new() -> Self {
        Self::with_max_history(10_000)
    }

    /// Creates a feed with a specific history limit.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            state: Mutex::new(FeedState {
                next_sequence: 1,
                history: VecDeque::new(),
            }),
            subscribers: RwLock::new(Vec::new()),
            max_history,
        }
    }

    /// Subscribes to the feed.
    ///
    /// The receiver gets every event emitted after this call and should be
    /// drained regularly.
    pub fn subscribe(&self) -> Receiver<FeedEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Stamps and distributes one event. Returns its sequence number.
    pub fn emit(&self, event: MetaEvent) -> u64 {
        // Sequence assignment and delivery share the state lock so every
        // subscriber sees events in sequence order.
        let mut state = self.state.lock();
        let sequence = state.next_sequence;
        state.next_sequence += 1;

        let stamped = FeedEvent { sequence, event };
        state.history.push_back(stamped.clone());
        while state.history.len() > self.max_history {
            state.history.pop_front();
        }

        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(stamped.clone()).is_ok());
        sequence
    }

    /// Returns events with sequence > cursor, up to limit.
    pub fn poll(&self, cursor: u64, limit: usize) -> Vec<FeedEvent> {
        let state = self.state.lock();
        state
            .history
            .iter()
            .filter(|e| e.sequence > cursor)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Returns the latest sequence number emitted, 0 if none.
    pub fn latest_sequence(&self) -> u64 {
        self.state.lock().next_sequence - 1
    }

    /// Returns the number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Returns the number of events in history.
    pub fn history_len(&self) -> usize {
        self.state.lock().history.len()
    }

    /// Drops history older than the given sequence.
    pub fn truncate_history(&self, min_sequence: u64) {
        self.state
            .lock()
            .history
            .retain(|e| e.sequence >= min_sequence);
    }
}

impl Default for EventFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaObserver for EventFeed {
    fn on_event(&self, event: &MetaEvent) {
        self.emit(event.clone());
    }
}

impl std::fmt::Debug for EventFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventFeed")
            .field("latest_sequence", &self.latest_sequence())
            .field("history_len", &self.history_len())
            .field("subscribers", &self.subscriber_count())
            .field("max_history", &self.max_history)
            .finish()
    }
}
