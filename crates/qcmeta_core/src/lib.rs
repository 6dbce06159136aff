//! # qcmeta Core
//!
//! Coordinator-side state trackers for a distributed query service.
//!
//! This crate provides:
//! - [`VersionManager`]: aggregates per-node index engine versions into
//!   cluster-wide bounds
//! - [`TargetIndex`]: hierarchical collection → channel and
//!   collection → partition → segment index with flat O(1) membership
//! - [`MetaObserver`] and [`EventFeed`]: injected instrumentation for
//!   every effective mutation
//! - [`QueryCoordMeta`]: a facade wiring both managers to one feed
//!
//! ## Preconditions on drivers
//!
//! Segment and partition identifiers are assumed globally unique across
//! collections. `remove_segment` and `remove_partition` take no collection
//! argument and act on every entry filed under the identifier.
//!
//! ## Error model
//!
//! Every manager operation is total. Absent keys read as empty, removals
//! of absent keys succeed silently, and an empty version manager reports
//! `0` for both bounds. Only configuration and the opt-in negotiation
//! helpers return [`MetaError`].

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod descriptor;
mod error;
mod feed;
mod meta;
mod observer;
mod target;
mod types;
mod version;

pub use config::MetaConfig;
pub use descriptor::{DmChannel, NodeVersion, SeekPosition, Segment};
pub use error::{MetaError, MetaResult};
pub use feed::{EventFeed, FeedEvent};
pub use meta::QueryCoordMeta;
pub use observer::{MetaEvent, MetaObserver, TracingObserver};
pub use target::TargetIndex;
pub use types::{CollectionId, IndexVersion, NodeId, PartitionId, SegmentId};
pub use version::{VersionBounds, VersionManager};
