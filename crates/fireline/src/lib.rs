//! User-space static-tracing probes with dynamic enablement
//!
//! Application code declares named probes with typed argument signatures
//! under a [`Provider`]; a tracing backend may enable or disable each
//! probe at runtime. Firing a disabled probe costs a single relaxed
//! atomic load; firing an enabled probe encodes the arguments and hands
//! them to the backend [`Sink`].
//!
//! # Hot-Path Guarantees
//!
//! - [`Probe::is_enabled`] and a disabled [`Probe::fire`] never allocate,
//!   never block, and never panic.
//! - Nothing on the fire path returns an error to the instrumented
//!   application; failures are counted in the provider metrics and
//!   logged.
//! - Only [`Provider::activate`] and [`Provider::dispose`] may block,
//!   and both are deadline-bounded.
//!
//! # Example
//!
//! ```rust
//! use fireline::{ArgKind, Provider, Signature, fire_probe};
//!
//! # fn main() -> Result<(), fireline::ProviderError> {
//! let provider = Provider::new("greeting");
//! let start = provider.probe("start", Signature::new(vec![ArgKind::Int]))?;
//! let end = provider.probe("end", Signature::new(vec![ArgKind::Int]))?;
//!
//! provider.activate()?;
//!
//! for id in 0..100i64 {
//!     fire_probe!(start, id);
//!     // ... the traced work ...
//!     fire_probe!(end, id);
//! }
//!
//! provider.dispose()?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod args;
pub mod error;
pub mod macros;
pub mod metrics;
pub mod prelude;
pub mod probe;
pub mod provider;
pub mod sink;

pub use args::{ArgKind, ArgValue, EncodeError, EncodedArg, MAX_STR_BYTES, Signature};
pub use error::{ProviderError, SinkError};
pub use metrics::MetricsSnapshot;
pub use probe::Probe;
pub use provider::{DEFAULT_LIFECYCLE_TIMEOUT, EnablementControl, Provider, ProviderState};
pub use sink::{LoggingSink, ProbeDeclaration, ProbeId, Registration, Sink, SinkHandle};
