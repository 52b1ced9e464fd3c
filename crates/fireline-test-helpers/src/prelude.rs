//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use fireline_test_helpers::prelude::*;
//! ```

pub use crate::must::{must, must_err, must_some};
pub use crate::sinks::{
    BlockingSink, RecordedEvent, RecordingSink, SlowRegistrationSink, UnavailableSink,
};

/// Boxed-error result alias for test functions.
pub type TestResult = Result<(), Box<dyn std::error::Error>>;
