//! Core identifier types.

use std::fmt;

/// Index engine version number declared by a worker node.
///
/// Versions are non-negative in practice; `0` doubles as the
/// "no constraint known" sentinel of an empty [`crate::VersionManager`].
pub type IndexVersion = i32;

macro_rules! define_id {
    ($(#[$doc:meta])* $name:ident, $prefix:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub i64);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw ID value.
            #[must_use]
            pub const fn as_i64(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Identifier of a worker node, as announced by membership discovery.
    NodeId,
    "node"
);

define_id!(
    /// Identifier of a collection (top-level dataset).
    CollectionId,
    "col"
);

define_id!(
    /// Identifier of a partition.
    ///
    /// Partition IDs are globally unique: no two collections share one.
    PartitionId,
    "part"
);

define_id!(
    /// Identifier of a segment.
    ///
    /// Segment IDs are globally unique across all collections.
    SegmentId,
    "seg"
);
