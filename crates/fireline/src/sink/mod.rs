//! Backend sink interface
//!
//! The sink is the external tracing consumer a provider registers with:
//! an OS tracing facility, a session daemon, or an in-process collector.
//! Everything platform-specific stays behind the [`Sink`] trait so the
//! probe/provider core carries no platform dependency.

mod logging;

pub use logging::LoggingSink;

use core::fmt;

use crate::args::{EncodedArg, Signature};
use crate::error::SinkError;
use crate::provider::EnablementControl;

/// Stable index of a probe within its provider, assigned in declaration
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProbeId(pub(crate) usize);

impl ProbeId {
    /// Id for the probe at `index` in declaration order.
    ///
    /// Backends use this to address probes in enablement callbacks; the
    /// ids of a registration are `0..probes.len()`.
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Position of the probe in declaration order.
    pub const fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ProbeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "probe#{}", self.0)
    }
}

/// Opaque handle a sink assigns to a registered provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkHandle(u64);

impl SinkHandle {
    /// Wrap a sink-chosen raw handle value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw handle value.
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

/// Declaration of a single probe, as presented to the sink at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeDeclaration {
    /// Probe name, unique within the provider
    pub name: String,
    /// Declared argument signature
    pub signature: Signature,
}

/// The full probe set a provider presents to the sink, registered
/// atomically: the sink sees all probes of a namespace or none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Provider namespace
    pub namespace: String,
    /// Probe declarations in declaration order; a probe's position is its
    /// [`ProbeId`]
    pub probes: Vec<ProbeDeclaration>,
}

/// Backend tracing sink.
///
/// # Contract
///
/// - `register_provider` is called once per activation with the complete
///   probe set. The sink keeps the [`EnablementControl`] and uses it to
///   toggle probes when a tracing session attaches or detaches.
/// - `emit` may be called from any application thread between a successful
///   registration and the matching `unregister_provider`. Implementations
///   should return quickly; the caller treats a slow sink as an enabled-path
///   cost, never as a correctness problem.
/// - Event timestamps and sequence numbers are the sink's responsibility.
pub trait Sink: Send + Sync {
    /// Register a provider's complete probe set.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Unavailable`] when the backend cannot accept
    /// the registration; the provider stays unregistered and may retry.
    fn register_provider(
        &self,
        registration: &Registration,
        control: EnablementControl,
    ) -> Result<SinkHandle, SinkError>;

    /// Release a previously registered provider.
    ///
    /// Called at most once per successful registration. No `emit` for this
    /// handle follows this call.
    fn unregister_provider(&self, handle: SinkHandle);

    /// Deliver one fired probe event.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Emission`] when the event cannot be delivered;
    /// the provider counts the failure and the firing thread continues
    /// normally.
    fn emit(
        &self,
        handle: SinkHandle,
        probe: ProbeId,
        args: &[EncodedArg],
    ) -> Result<(), SinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::ArgKind;

    #[test]
    fn test_probe_id_display() {
        assert_eq!(ProbeId(3).to_string(), "probe#3");
        assert_eq!(ProbeId(3).index(), 3);
    }

    #[test]
    fn test_sink_handle_roundtrip() {
        let handle = SinkHandle::new(42);
        assert_eq!(handle.raw(), 42);
        assert_eq!(handle, SinkHandle::new(42));
    }

    #[test]
    fn test_registration_preserves_order() {
        let registration = Registration {
            namespace: "greeting".to_string(),
            probes: vec![
                ProbeDeclaration {
                    name: "start".to_string(),
                    signature: Signature::new(vec![ArgKind::Int]),
                },
                ProbeDeclaration {
                    name: "end".to_string(),
                    signature: Signature::new(vec![ArgKind::Int]),
                },
            ],
        };
        assert_eq!(registration.probes.len(), 2);
        assert_eq!(
            registration.probes.first().map(|p| p.name.as_str()),
            Some("start")
        );
    }
}
