//! Probe providers: declaration, activation, dispatch, disposal
//!
//! A [`Provider`] owns a namespaced set of probes with a shared lifecycle:
//!
//! ```text
//! Unregistered --activate()--> Active --dispose()--> Disposed
//! Unregistered --dispose()--> Disposed
//! ```
//!
//! Probes are declared while the provider is unregistered, the full set is
//! registered with the backend sink atomically at activation, and disposal
//! force-disables every probe and drains in-flight fires before releasing
//! the sink registration.
//!
//! # Example
//!
//! ```rust
//! use fireline::{ArgKind, Provider, Signature};
//!
//! # fn main() -> Result<(), fireline::ProviderError> {
//! let provider = Provider::new("greeting");
//! let start = provider.probe("start", Signature::new(vec![ArgKind::Int]))?;
//!
//! provider.activate()?;
//!
//! // A disabled probe fires into nothing at near-zero cost.
//! fireline::fire_probe!(start, 5i64);
//!
//! provider.dispose()?;
//! # Ok(())
//! # }
//! ```

use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};

use crate::args::{ArgValue, Signature};
use crate::error::ProviderError;
use crate::metrics::{MetricsSnapshot, ProviderMetrics};
use crate::probe::{Probe, ProbeRecord};
use crate::sink::{LoggingSink, ProbeDeclaration, ProbeId, Registration, Sink, SinkHandle};

/// Default deadline for `activate` and `dispose`.
pub const DEFAULT_LIFECYCLE_TIMEOUT: Duration = Duration::from_secs(5);

const STATE_UNREGISTERED: u8 = 0;
const STATE_ACTIVE: u8 = 1;
const STATE_DISPOSED: u8 = 2;

/// Lifecycle state of a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    /// Probes exist as declarations only; firing is a guaranteed no-op
    Unregistered,
    /// Registered with the sink; enablement may be toggled externally
    Active,
    /// Terminal; firing is a permanent no-op
    Disposed,
}

/// State shared between a provider, its probe handles, and the backend
/// enablement channel.
pub(crate) struct ProviderShared {
    namespace: String,
    state: AtomicU8,
    in_flight: AtomicU64,
    sink_handle: AtomicU64,
    // Serializes declaration and lifecycle transitions; never touched by
    // the fire path.
    lifecycle: Mutex<()>,
    probes: RwLock<Vec<Arc<ProbeRecord>>>,
    sink: Box<dyn Sink>,
    metrics: ProviderMetrics,
}

// Decrements the in-flight count on every dispatch exit path.
struct InFlightGuard<'a>(&'a ProviderShared);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ProviderShared {
    /// Dispatch one fire toward the sink.
    ///
    /// Called by [`Probe::fire`] after its enabled pre-check. Joins the
    /// in-flight set, re-checks state and enablement, encodes, and emits.
    /// Every failure is swallowed into metrics; this never panics and
    /// never reports an error to the firing thread.
    pub(crate) fn dispatch(&self, record: &ProbeRecord, args: &[ArgValue<'_>]) {
        // SeqCst pairs this increment with the state swap in dispose: a
        // disposing thread either observes this fire in flight, or this
        // fire observes the disposed state below and drops out.
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        let _guard = InFlightGuard(self);

        if self.state.load(Ordering::SeqCst) != STATE_ACTIVE
            || !record.enabled.load(Ordering::Relaxed)
        {
            self.metrics.record_dropped();
            return;
        }

        let encoded = match record.signature.encode(args) {
            Ok(encoded) => encoded,
            Err(err) if err.is_argument_mismatch() => {
                self.metrics.record_argument_mismatch();
                tracing::debug!(
                    namespace = %self.namespace,
                    probe = %record.name,
                    error = %err,
                    "fire arguments rejected"
                );
                return;
            }
            Err(err) => {
                self.metrics.record_encoding_error();
                tracing::debug!(
                    namespace = %self.namespace,
                    probe = %record.name,
                    error = %err,
                    "fire argument encoding failed"
                );
                return;
            }
        };

        let handle = SinkHandle::new(self.sink_handle.load(Ordering::Acquire));
        match self.sink.emit(handle, record.id, &encoded) {
            Ok(()) => self.metrics.record_emitted(),
            Err(err) => {
                self.metrics.record_dropped();
                tracing::warn!(
                    namespace = %self.namespace,
                    probe = %record.name,
                    error = %err,
                    "sink rejected fired event"
                );
            }
        }
    }

    fn registration(&self) -> Registration {
        Registration {
            namespace: self.namespace.clone(),
            probes: self
                .probes
                .read()
                .iter()
                .map(|record| ProbeDeclaration {
                    name: record.name.clone(),
                    signature: record.signature.clone(),
                })
                .collect(),
        }
    }

    fn dispose(&self, timeout: Duration) -> Result<(), ProviderError> {
        let _lifecycle = self.lifecycle.lock();

        let previous = self.state.swap(STATE_DISPOSED, Ordering::SeqCst);
        if previous == STATE_DISPOSED {
            // idempotent: nothing to release twice
            return Ok(());
        }

        for record in self.probes.read().iter() {
            record.enabled.store(false, Ordering::Relaxed);
        }

        // Drain fires that passed their enabled check before the state
        // swap; they must complete or drop before the sink is released.
        let started = Instant::now();
        let drained = loop {
            if self.in_flight.load(Ordering::SeqCst) == 0 {
                break true;
            }
            if started.elapsed() >= timeout {
                break false;
            }
            std::thread::sleep(Duration::from_micros(100));
        };

        if previous == STATE_ACTIVE {
            let handle = SinkHandle::new(self.sink_handle.load(Ordering::Acquire));
            self.sink.unregister_provider(handle);
        }

        tracing::info!(namespace = %self.namespace, drained, "provider disposed");

        if drained {
            Ok(())
        } else {
            Err(ProviderError::Timeout {
                elapsed: started.elapsed(),
            })
        }
    }
}

/// An owned, namespaced group of probes with a shared lifecycle.
///
/// # Thread Safety
///
/// `Provider` is `Send + Sync`. Lifecycle calls may be made from any
/// thread and are serialized internally; probe handles fire concurrently
/// without coordination.
pub struct Provider {
    shared: Arc<ProviderShared>,
}

impl Provider {
    /// Create a provider backed by the structured-logging sink.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self::with_sink(namespace, Box::new(LoggingSink::new()))
    }

    /// Create a provider backed by a custom sink.
    ///
    /// Use this to register with a real tracing backend, or with a
    /// recording sink in tests.
    pub fn with_sink(namespace: impl Into<String>, sink: Box<dyn Sink>) -> Self {
        Self {
            shared: Arc::new(ProviderShared {
                namespace: namespace.into(),
                state: AtomicU8::new(STATE_UNREGISTERED),
                in_flight: AtomicU64::new(0),
                sink_handle: AtomicU64::new(0),
                lifecycle: Mutex::new(()),
                probes: RwLock::new(Vec::new()),
                sink,
                metrics: ProviderMetrics::new(),
            }),
        }
    }

    /// Declare a probe under this provider.
    ///
    /// Probes can only be declared while the provider is unregistered;
    /// the probe set is fixed at activation so the sink sees a stable
    /// surface.
    ///
    /// # Errors
    ///
    /// [`ProviderError::DuplicateProbeName`] when the name is taken,
    /// [`ProviderError::AlreadyActive`] after activation, and
    /// [`ProviderError::Disposed`] after disposal.
    pub fn probe(
        &self,
        name: impl Into<String>,
        signature: Signature,
    ) -> Result<Probe, ProviderError> {
        let name = name.into();
        let _lifecycle = self.shared.lifecycle.lock();

        match self.shared.state.load(Ordering::Acquire) {
            STATE_ACTIVE => return Err(ProviderError::AlreadyActive),
            STATE_DISPOSED => return Err(ProviderError::Disposed),
            _ => {}
        }

        let mut probes = self.shared.probes.write();
        if probes.iter().any(|record| record.name == name) {
            return Err(ProviderError::DuplicateProbeName { name });
        }

        let record = Arc::new(ProbeRecord {
            id: ProbeId(probes.len()),
            name,
            signature,
            enabled: AtomicBool::new(false),
        });
        probes.push(Arc::clone(&record));
        Ok(Probe::new(record, Arc::clone(&self.shared)))
    }

    /// Activate the provider with the default deadline.
    ///
    /// # Errors
    ///
    /// See [`activate_timeout`](Provider::activate_timeout).
    pub fn activate(&self) -> Result<(), ProviderError> {
        self.activate_timeout(DEFAULT_LIFECYCLE_TIMEOUT)
    }

    /// Activate the provider: register the full probe set with the sink.
    ///
    /// Registration is atomic from the sink's point of view: one call
    /// carries every probe, so the backend never sees a partial
    /// namespace. On failure the provider stays unregistered and the
    /// call may be retried.
    ///
    /// The deadline is checked once the handshake returns: a
    /// registration that completed late is unregistered again and
    /// reported as `Timeout`. It does not preempt a sink that never
    /// returns from `register_provider`; sinks must bound their own
    /// handshake.
    ///
    /// # Errors
    ///
    /// [`ProviderError::AlreadyActive`] or [`ProviderError::Disposed`]
    /// for state violations, [`ProviderError::BackendUnavailable`] when
    /// the sink refuses the registration, and [`ProviderError::Timeout`]
    /// when the handshake outlives the deadline (the late registration
    /// is rolled back).
    pub fn activate_timeout(&self, timeout: Duration) -> Result<(), ProviderError> {
        let _lifecycle = self.shared.lifecycle.lock();

        match self.shared.state.load(Ordering::Acquire) {
            STATE_ACTIVE => return Err(ProviderError::AlreadyActive),
            STATE_DISPOSED => return Err(ProviderError::Disposed),
            _ => {}
        }

        let registration = self.shared.registration();
        let control = EnablementControl {
            shared: Arc::downgrade(&self.shared),
        };

        let started = Instant::now();
        let handle = self.shared.sink.register_provider(&registration, control)?;
        if started.elapsed() > timeout {
            // The handshake finished after the deadline; roll the
            // registration back so the caller can retry cleanly.
            self.shared.sink.unregister_provider(handle);
            return Err(ProviderError::Timeout {
                elapsed: started.elapsed(),
            });
        }

        self.shared.sink_handle.store(handle.raw(), Ordering::Release);
        self.shared.state.store(STATE_ACTIVE, Ordering::SeqCst);
        tracing::info!(
            namespace = %self.shared.namespace,
            probes = registration.probes.len(),
            "provider activated"
        );
        Ok(())
    }

    /// Dispose the provider with the default deadline.
    ///
    /// # Errors
    ///
    /// See [`dispose_timeout`](Provider::dispose_timeout).
    pub fn dispose(&self) -> Result<(), ProviderError> {
        self.dispose_timeout(DEFAULT_LIFECYCLE_TIMEOUT)
    }

    /// Dispose the provider: force-disable every probe, drain in-flight
    /// fires, and release the sink registration.
    ///
    /// Idempotent; a second call returns `Ok` and does nothing. Legal
    /// from any state, including a provider that was never activated.
    /// After this returns, no fire reaches the sink, even from threads
    /// that were already past their enabled check.
    ///
    /// # Errors
    ///
    /// [`ProviderError::Timeout`] when in-flight fires do not drain
    /// within the deadline. The sink registration is released regardless,
    /// and the provider is disposed either way.
    pub fn dispose_timeout(&self, timeout: Duration) -> Result<(), ProviderError> {
        self.shared.dispose(timeout)
    }

    /// Provider namespace.
    pub fn namespace(&self) -> &str {
        &self.shared.namespace
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ProviderState {
        match self.shared.state.load(Ordering::Acquire) {
            STATE_ACTIVE => ProviderState::Active,
            STATE_DISPOSED => ProviderState::Disposed,
            _ => ProviderState::Unregistered,
        }
    }

    /// Snapshot of the fire-path counters.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    /// The reverse channel handed to the backend.
    ///
    /// `activate` passes a control to the sink automatically; this
    /// accessor exists for backends and tests that drive enablement
    /// out of band.
    pub fn enablement_control(&self) -> EnablementControl {
        EnablementControl {
            shared: Arc::downgrade(&self.shared),
        }
    }
}

impl Drop for Provider {
    fn drop(&mut self) {
        if let Err(err) = self.shared.dispose(DEFAULT_LIFECYCLE_TIMEOUT) {
            tracing::warn!(
                namespace = %self.shared.namespace,
                error = %err,
                "dispose on drop did not drain cleanly"
            );
        }
    }
}

impl core::fmt::Debug for Provider {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Provider")
            .field("namespace", &self.shared.namespace)
            .field("state", &self.state())
            .field("probes", &self.shared.probes.read().len())
            .finish()
    }
}

/// Backend-facing enablement channel.
///
/// The sink receives one of these at registration and uses it to flip
/// probe flags when a tracing session attaches or detaches. The control
/// holds a weak reference: toggling a disposed or dropped provider is a
/// no-op that returns `false`.
#[derive(Clone)]
pub struct EnablementControl {
    shared: Weak<ProviderShared>,
}

impl EnablementControl {
    /// Apply an enablement change to one probe.
    ///
    /// Returns `true` when the change was applied, `false` when the
    /// provider is gone or not active, or the probe id is unknown.
    /// Concurrent fires observe the new flag eventually; there is no
    /// hard cutover instant.
    pub fn set_enabled(&self, probe: ProbeId, enabled: bool) -> bool {
        let Some(shared) = self.shared.upgrade() else {
            return false;
        };
        if shared.state.load(Ordering::SeqCst) != STATE_ACTIVE {
            return false;
        }
        let probes = shared.probes.read();
        let Some(record) = probes.get(probe.index()) else {
            return false;
        };
        record.enabled.store(enabled, Ordering::Relaxed);
        shared.metrics.record_enablement_change();
        tracing::debug!(
            namespace = %shared.namespace,
            probe = %record.name,
            enabled,
            "probe enablement changed"
        );
        true
    }
}

impl core::fmt::Debug for EnablementControl {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EnablementControl")
            .field("provider_alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::{ArgKind, ArgValue, Signature};
    use crate::error::SinkError;
    use parking_lot::Mutex as PlMutex;

    struct CountingSink {
        emitted: Arc<PlMutex<Vec<(ProbeId, Vec<crate::args::EncodedArg>)>>>,
        registrations: Arc<PlMutex<u64>>,
        unregistrations: Arc<PlMutex<u64>>,
    }

    impl CountingSink {
        fn new() -> Self {
            Self {
                emitted: Arc::new(PlMutex::new(Vec::new())),
                registrations: Arc::new(PlMutex::new(0)),
                unregistrations: Arc::new(PlMutex::new(0)),
            }
        }
    }

    impl Sink for CountingSink {
        fn register_provider(
            &self,
            _registration: &Registration,
            _control: EnablementControl,
        ) -> Result<SinkHandle, SinkError> {
            *self.registrations.lock() += 1;
            Ok(SinkHandle::new(7))
        }

        fn unregister_provider(&self, _handle: SinkHandle) {
            *self.unregistrations.lock() += 1;
        }

        fn emit(
            &self,
            _handle: SinkHandle,
            probe: ProbeId,
            args: &[crate::args::EncodedArg],
        ) -> Result<(), SinkError> {
            self.emitted.lock().push((probe, args.to_vec()));
            Ok(())
        }
    }

    #[test]
    fn test_state_machine_transitions() {
        let provider = Provider::with_sink("greeting", Box::new(CountingSink::new()));
        assert_eq!(provider.state(), ProviderState::Unregistered);

        provider.activate().expect("activate");
        assert_eq!(provider.state(), ProviderState::Active);
        assert!(matches!(
            provider.activate(),
            Err(ProviderError::AlreadyActive)
        ));

        provider.dispose().expect("dispose");
        assert_eq!(provider.state(), ProviderState::Disposed);
        assert!(matches!(provider.activate(), Err(ProviderError::Disposed)));
    }

    #[test]
    fn test_dispose_without_activation() {
        let sink = CountingSink::new();
        let unregistrations = Arc::clone(&sink.unregistrations);
        let provider = Provider::with_sink("greeting", Box::new(sink));

        provider.dispose().expect("dispose");
        assert_eq!(provider.state(), ProviderState::Disposed);
        // never registered, so nothing to unregister
        assert_eq!(*unregistrations.lock(), 0);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let sink = CountingSink::new();
        let unregistrations = Arc::clone(&sink.unregistrations);
        let provider = Provider::with_sink("greeting", Box::new(sink));

        provider.activate().expect("activate");
        provider.dispose().expect("first dispose");
        provider.dispose().expect("second dispose");
        assert_eq!(*unregistrations.lock(), 1);
    }

    #[test]
    fn test_duplicate_probe_name_rejected() {
        let provider = Provider::with_sink("greeting", Box::new(CountingSink::new()));
        provider
            .probe("start", Signature::new(vec![ArgKind::Int]))
            .expect("declare");
        let err = provider
            .probe("start", Signature::empty())
            .expect_err("must fail");
        assert!(matches!(err, ProviderError::DuplicateProbeName { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_declare_after_activate_rejected() {
        let provider = Provider::with_sink("greeting", Box::new(CountingSink::new()));
        provider.activate().expect("activate");
        let err = provider
            .probe("late", Signature::empty())
            .expect_err("must fail");
        assert!(matches!(err, ProviderError::AlreadyActive));
    }

    #[test]
    fn test_enabled_fire_reaches_sink() {
        let sink = CountingSink::new();
        let emitted = Arc::clone(&sink.emitted);
        let provider = Provider::with_sink("greeting", Box::new(sink));
        let probe = provider
            .probe("start", Signature::new(vec![ArgKind::Int]))
            .expect("declare");

        provider.activate().expect("activate");
        assert!(provider.enablement_control().set_enabled(probe.id(), true));
        assert!(probe.is_enabled());

        probe.fire(&[ArgValue::Int(5)]);

        let events = emitted.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(provider.metrics().fires_emitted, 1);
    }

    #[test]
    fn test_argument_mismatch_is_swallowed() {
        let sink = CountingSink::new();
        let emitted = Arc::clone(&sink.emitted);
        let provider = Provider::with_sink("greeting", Box::new(sink));
        let probe = provider
            .probe("start", Signature::new(vec![ArgKind::Int]))
            .expect("declare");

        provider.activate().expect("activate");
        provider.enablement_control().set_enabled(probe.id(), true);

        probe.fire(&[ArgValue::Str("wrong type")]);
        probe.fire(&[]);

        assert_eq!(emitted.lock().len(), 0);
        let metrics = provider.metrics();
        assert_eq!(metrics.argument_mismatches, 2);
        assert!(!metrics.is_clean());
    }

    #[test]
    fn test_control_ignores_unknown_probe_and_dead_provider() {
        let provider = Provider::with_sink("greeting", Box::new(CountingSink::new()));
        provider.activate().expect("activate");

        let control = provider.enablement_control();
        assert!(!control.set_enabled(ProbeId(99), true));

        drop(provider);
        assert!(!control.set_enabled(ProbeId(0), true));
    }

    #[test]
    fn test_control_inactive_provider_is_noop() {
        let provider = Provider::with_sink("greeting", Box::new(CountingSink::new()));
        let probe = provider
            .probe("start", Signature::empty())
            .expect("declare");
        let control = provider.enablement_control();

        // not active yet: toggle refused, flag stays false
        assert!(!control.set_enabled(probe.id(), true));
        assert!(!probe.is_enabled());
    }

    #[test]
    fn test_dispose_forces_flags_false() {
        let provider = Provider::with_sink("greeting", Box::new(CountingSink::new()));
        let probe = provider
            .probe("start", Signature::empty())
            .expect("declare");

        provider.activate().expect("activate");
        provider.enablement_control().set_enabled(probe.id(), true);
        assert!(probe.is_enabled());

        provider.dispose().expect("dispose");
        assert!(!probe.is_enabled());

        // fire after dispose is a quiet no-op
        probe.fire(&[]);
        assert_eq!(provider.metrics().fires_emitted, 0);
    }
}
