//! Shared test utilities for fireline.
//!
//! This crate provides the sinks and unwrap helpers the test suite uses
//! to observe provider behavior without a real tracing backend.
//!
//! # Modules
//!
//! - [`sinks`] - Recording and failing [`fireline::Sink`] implementations
//! - [`mod@must`] - Unwrap helpers with good error messages and `#[track_caller]`
//! - [`prelude`] - Convenience re-exports
//!
//! # Usage
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! fireline-test-helpers = { path = "crates/fireline-test-helpers" }
//! ```
//!
//! Then import the prelude:
//!
//! ```rust,ignore
//! use fireline_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]

pub mod must;
pub mod prelude;
pub mod sinks;

pub use must::*;
pub use sinks::{
    BlockingSink, RecordedEvent, RecordingSink, SlowRegistrationSink, UnavailableSink,
};
