//! Prelude for fireline
//!
//! This module re-exports the most commonly used types and macros.
//!
//! # Example
//!
//! ```rust,ignore
//! use fireline::prelude::*;
//!
//! let provider = Provider::new("greeting");
//! let start = provider.probe("start", Signature::new(vec![ArgKind::Int]))?;
//! provider.activate()?;
//!
//! fire_probe!(start, 5i64);
//! ```

pub use crate::{
    ArgKind, ArgValue, EnablementControl, EncodedArg, Probe, Provider, ProviderError,
    ProviderState, Signature, Sink, SinkError, fire_probe,
    sink::{ProbeDeclaration, ProbeId, Registration, SinkHandle},
};
