//! Probe handles
//!
//! A [`Probe`] is a named instrumentation point with a fixed argument
//! signature and a runtime enabled flag. Handles are cheap clones that
//! application code keeps at its call sites; firing a disabled probe is a
//! single relaxed atomic load.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::args::{ArgValue, Signature};
use crate::provider::ProviderShared;
use crate::sink::ProbeId;

/// Shared per-probe record owned by the provider.
///
/// Created during declaration, immutable afterwards except for the enabled
/// flag, which only the provider and the backend enablement channel write.
pub(crate) struct ProbeRecord {
    pub(crate) id: ProbeId,
    pub(crate) name: String,
    pub(crate) signature: Signature,
    pub(crate) enabled: AtomicBool,
}

/// A named, typed instrumentation point.
///
/// # Hot-Path Guarantees
///
/// - [`is_enabled`](Probe::is_enabled) and a disabled
///   [`fire`](Probe::fire) never allocate, never block, and never panic.
/// - The enabled flag is eventually consistent: a fire may still go
///   through shortly after a disable is requested, and vice versa. Tests
///   must not assume a hard cutover instant.
///
/// # Lifecycle
///
/// A handle may outlive its provider's disposal; it then fires into
/// nothing, permanently.
#[derive(Clone)]
pub struct Probe {
    record: Arc<ProbeRecord>,
    shared: Arc<ProviderShared>,
}

impl Probe {
    pub(crate) fn new(record: Arc<ProbeRecord>, shared: Arc<ProviderShared>) -> Self {
        Self { record, shared }
    }

    /// Check whether a tracing consumer is listening to this probe.
    ///
    /// Safe to call from any thread; a single relaxed atomic load.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.record.enabled.load(Ordering::Relaxed)
    }

    /// Fire the probe with concrete argument values.
    ///
    /// A no-op when the probe is disabled or the provider is not active.
    /// Never returns an error and never panics: mismatched or unencodable
    /// arguments and sink failures are counted in the provider metrics and
    /// logged, and the calling thread continues normally.
    ///
    /// Call sites on hot paths should guard expensive argument
    /// construction with [`is_enabled`](Probe::is_enabled) (or use the
    /// [`fire_probe!`](crate::fire_probe) macro, which does); `fire`
    /// re-checks internally either way.
    #[inline]
    pub fn fire(&self, args: &[ArgValue<'_>]) {
        if !self.record.enabled.load(Ordering::Relaxed) {
            return;
        }
        self.shared.dispatch(&self.record, args);
    }

    /// Probe name, unique within the provider.
    pub fn name(&self) -> &str {
        &self.record.name
    }

    /// Declared argument signature.
    pub fn signature(&self) -> &Signature {
        &self.record.signature
    }

    /// Stable id assigned in declaration order.
    pub fn id(&self) -> ProbeId {
        self.record.id
    }
}

impl core::fmt::Debug for Probe {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Probe")
            .field("name", &self.record.name)
            .field("signature", &self.record.signature.to_string())
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::args::{ArgKind, ArgValue, Signature};
    use crate::provider::Provider;

    #[test]
    fn test_probe_starts_disabled() {
        let provider = Provider::new("greeting");
        let probe = provider
            .probe("start", Signature::new(vec![ArgKind::Int]))
            .expect("declare");
        assert!(!probe.is_enabled());
        assert_eq!(probe.name(), "start");
        assert_eq!(probe.id().index(), 0);
        assert_eq!(probe.signature().arity(), 1);
    }

    #[test]
    fn test_disabled_fire_is_noop() {
        let provider = Provider::new("greeting");
        let probe = provider
            .probe("start", Signature::new(vec![ArgKind::Int]))
            .expect("declare");

        probe.fire(&[ArgValue::Int(5)]);
        // wrong arity is also fine while disabled: fire short-circuits
        probe.fire(&[]);

        let metrics = provider.metrics();
        assert_eq!(metrics.fires_emitted, 0);
        assert_eq!(metrics.argument_mismatches, 0);
    }

    #[test]
    fn test_probe_handles_are_cheap_clones() {
        let provider = Provider::new("greeting");
        let probe = provider
            .probe("start", Signature::empty())
            .expect("declare");
        let other = probe.clone();
        assert_eq!(probe.id(), other.id());
        assert_eq!(probe.name(), other.name());
    }

    #[test]
    fn test_probe_debug_output() {
        let provider = Provider::new("greeting");
        let probe = provider
            .probe("start", Signature::new(vec![ArgKind::Int, ArgKind::Str]))
            .expect("declare");
        let s = format!("{probe:?}");
        assert!(s.contains("start"));
        assert!(s.contains("(int, string)"));
    }
}
