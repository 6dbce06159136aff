//! Error types for qcmeta core.

use crate::types::IndexVersion;
use thiserror::Error;

/// Result type for core operations that can fail.
pub type MetaResult<T> = Result<T, MetaError>;

/// Errors surfaced by configuration and the opt-in negotiation helpers.
///
/// The managers' own operations never fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetaError {
    /// No node versions are tracked, so no bound is known yet.
    #[error("no index engine versions known: node set is empty")]
    NoNodes,

    /// The strictest node minimum exceeds the oldest node's current version.
    #[error("incompatible index engine versions: minimal {minimal} exceeds current {current}")]
    IncompatibleVersions {
        /// Maximum of all nodes' minimal versions.
        minimal: IndexVersion,
        /// Minimum of all nodes' current versions.
        current: IndexVersion,
    },

    /// Configuration rejected by validation.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },
}

impl MetaError {
    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_incompatible() {
        let err = MetaError::IncompatibleVersions {
            minimal: 5,
            current: 3,
        };
        assert_eq!(
            err.to_string(),
            "incompatible index engine versions: minimal 5 exceeds current 3"
        );
    }
}
