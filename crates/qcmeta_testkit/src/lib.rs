//! # qcmeta Testkit
//!
//! Test utilities for qcmeta.
//!
//! This crate provides:
//! - The standard two-collection target fixture
//! - Property-based test generators using proptest
//! - Stress testing utilities for concurrent drivers
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qcmeta_testkit::prelude::*;
//!
//! #[test]
//! fn routes_to_live_segments() {
//!     let fixture = TargetFixture::standard();
//!     let index = fixture.build();
//!     // ... routing assertions
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod stress;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::stress::*;
}

pub use fixtures::*;
pub use generators::*;
pub use stress::*;
