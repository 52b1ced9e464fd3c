//! Test sink implementations.
//!
//! [`RecordingSink`] captures everything a provider sends it, including the
//! enablement control handed over at registration, so tests can play the
//! backend's role: enable probes, observe fired events, and assert on
//! ordering. [`UnavailableSink`] refuses registration for activation-failure
//! tests, [`BlockingSink`] parks firing threads inside `emit` for drain
//! deadline tests, and [`SlowRegistrationSink`] delays the handshake for
//! activation deadline tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use fireline::{
    EnablementControl, EncodedArg, ProbeId, Registration, Sink, SinkError, SinkHandle,
};

/// One fired event as observed by the sink, with the probe name resolved
/// from the registration.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    /// Name of the fired probe
    pub probe: String,
    /// Encoded arguments in signature order
    pub args: Vec<EncodedArg>,
}

struct RecordingInner {
    next_handle: AtomicU64,
    fail_emissions: AtomicBool,
    registrations: Mutex<HashMap<u64, (Registration, EnablementControl)>>,
    events: Mutex<Vec<RecordedEvent>>,
}

/// Sink that records registrations and fired events for assertions.
///
/// Clone the sink before boxing it into a provider; all clones share
/// state, so the test keeps full visibility:
///
/// ```rust
/// use fireline::{ArgKind, Provider, Signature};
/// use fireline_test_helpers::RecordingSink;
///
/// let sink = RecordingSink::new();
/// let provider = Provider::with_sink("greeting", Box::new(sink.clone()));
/// let start = fireline_test_helpers::must(
///     provider.probe("start", Signature::new(vec![ArgKind::Int])),
/// );
/// # let _ = start;
/// assert_eq!(sink.event_count(), 0);
/// ```
#[derive(Clone)]
pub struct RecordingSink {
    inner: Arc<RecordingInner>,
}

impl RecordingSink {
    /// Create an empty recording sink.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RecordingInner {
                next_handle: AtomicU64::new(1),
                fail_emissions: AtomicBool::new(false),
                registrations: Mutex::new(HashMap::new()),
                events: Mutex::new(Vec::new()),
            }),
        }
    }

    /// All events recorded so far, in emission order.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.inner.events.lock().clone()
    }

    /// Number of events recorded so far.
    pub fn event_count(&self) -> usize {
        self.inner.events.lock().len()
    }

    /// Number of currently registered providers.
    pub fn registration_count(&self) -> usize {
        self.inner.registrations.lock().len()
    }

    /// The enablement control captured from the most recent registration.
    pub fn control(&self) -> Option<EnablementControl> {
        let registrations = self.inner.registrations.lock();
        registrations
            .values()
            .next()
            .map(|(_, control)| control.clone())
    }

    /// Enable or disable every probe of every registered provider,
    /// playing the role of a tracing session attaching or detaching.
    pub fn set_all_enabled(&self, enabled: bool) {
        let registrations = self.inner.registrations.lock();
        for (registration, control) in registrations.values() {
            for index in 0..registration.probes.len() {
                control.set_enabled(ProbeId::new(index), enabled);
            }
        }
    }

    /// Make subsequent `emit` calls fail with [`SinkError::Emission`].
    pub fn set_fail_emissions(&self, fail: bool) {
        self.inner.fail_emissions.store(fail, Ordering::Relaxed);
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for RecordingSink {
    fn register_provider(
        &self,
        registration: &Registration,
        control: EnablementControl,
    ) -> Result<SinkHandle, SinkError> {
        let handle = SinkHandle::new(self.inner.next_handle.fetch_add(1, Ordering::Relaxed));
        self.inner
            .registrations
            .lock()
            .insert(handle.raw(), (registration.clone(), control));
        Ok(handle)
    }

    fn unregister_provider(&self, handle: SinkHandle) {
        self.inner.registrations.lock().remove(&handle.raw());
    }

    fn emit(
        &self,
        handle: SinkHandle,
        probe: ProbeId,
        args: &[EncodedArg],
    ) -> Result<(), SinkError> {
        if self.inner.fail_emissions.load(Ordering::Relaxed) {
            return Err(SinkError::Emission("emission failure injected".into()));
        }
        let probe_name = {
            let registrations = self.inner.registrations.lock();
            registrations
                .get(&handle.raw())
                .and_then(|(registration, _)| registration.probes.get(probe.index()))
                .map(|declaration| declaration.name.clone())
        };
        let Some(probe_name) = probe_name else {
            return Err(SinkError::Emission(format!(
                "emit for unknown handle {}",
                handle.raw()
            )));
        };
        self.inner.events.lock().push(RecordedEvent {
            probe: probe_name,
            args: args.to_vec(),
        });
        Ok(())
    }
}

impl core::fmt::Debug for RecordingSink {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RecordingSink")
            .field("registrations", &self.registration_count())
            .field("events", &self.event_count())
            .finish()
    }
}

struct BlockingState {
    blocking: bool,
    parked: usize,
}

struct BlockingInner {
    next_handle: AtomicU64,
    state: Mutex<BlockingState>,
    entered: Condvar,
    released: Condvar,
}

/// Sink whose `emit` parks the firing thread until [`release`] is called.
///
/// A parked fire keeps the provider's in-flight count up, so a
/// `dispose_timeout` with a short deadline must give up and report
/// `Timeout` instead of draining.
///
/// [`release`]: BlockingSink::release
#[derive(Clone)]
pub struct BlockingSink {
    inner: Arc<BlockingInner>,
}

impl BlockingSink {
    /// Create a sink that blocks every `emit` until released.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BlockingInner {
                next_handle: AtomicU64::new(1),
                state: Mutex::new(BlockingState {
                    blocking: true,
                    parked: 0,
                }),
                entered: Condvar::new(),
                released: Condvar::new(),
            }),
        }
    }

    /// Unblock every parked and future `emit`.
    pub fn release(&self) {
        let mut state = self.inner.state.lock();
        state.blocking = false;
        self.inner.released.notify_all();
    }

    /// Wait until at least one firing thread is parked inside `emit`.
    ///
    /// Returns `false` when no fire arrives within `timeout`.
    pub fn wait_for_blocked(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.state.lock();
        while state.parked == 0 {
            if self
                .inner
                .entered
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                return false;
            }
        }
        true
    }
}

impl Default for BlockingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for BlockingSink {
    fn register_provider(
        &self,
        _registration: &Registration,
        _control: EnablementControl,
    ) -> Result<SinkHandle, SinkError> {
        Ok(SinkHandle::new(
            self.inner.next_handle.fetch_add(1, Ordering::Relaxed),
        ))
    }

    fn unregister_provider(&self, _handle: SinkHandle) {}

    fn emit(
        &self,
        _handle: SinkHandle,
        _probe: ProbeId,
        _args: &[EncodedArg],
    ) -> Result<(), SinkError> {
        let mut state = self.inner.state.lock();
        state.parked += 1;
        self.inner.entered.notify_all();
        while state.blocking {
            self.inner.released.wait(&mut state);
        }
        state.parked -= 1;
        Ok(())
    }
}

impl core::fmt::Debug for BlockingSink {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("BlockingSink")
            .field("blocking", &state.blocking)
            .field("parked", &state.parked)
            .finish()
    }
}

/// Sink that delays the registration handshake by a fixed amount.
///
/// Delegates everything to an inner [`RecordingSink`], so tests can
/// observe whether a registration that finished after the activation
/// deadline was rolled back.
#[derive(Clone)]
pub struct SlowRegistrationSink {
    delay: Duration,
    inner: RecordingSink,
}

impl SlowRegistrationSink {
    /// Create a sink whose `register_provider` sleeps for `delay`.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            inner: RecordingSink::new(),
        }
    }

    /// The inner recording sink, for assertions.
    pub fn recorder(&self) -> RecordingSink {
        self.inner.clone()
    }
}

impl Sink for SlowRegistrationSink {
    fn register_provider(
        &self,
        registration: &Registration,
        control: EnablementControl,
    ) -> Result<SinkHandle, SinkError> {
        std::thread::sleep(self.delay);
        self.inner.register_provider(registration, control)
    }

    fn unregister_provider(&self, handle: SinkHandle) {
        self.inner.unregister_provider(handle);
    }

    fn emit(
        &self,
        handle: SinkHandle,
        probe: ProbeId,
        args: &[EncodedArg],
    ) -> Result<(), SinkError> {
        self.inner.emit(handle, probe, args)
    }
}

impl core::fmt::Debug for SlowRegistrationSink {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SlowRegistrationSink")
            .field("delay", &self.delay)
            .field("inner", &self.inner)
            .finish()
    }
}

/// Sink that refuses every registration, for activation-failure tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableSink;

impl Sink for UnavailableSink {
    fn register_provider(
        &self,
        _registration: &Registration,
        _control: EnablementControl,
    ) -> Result<SinkHandle, SinkError> {
        Err(SinkError::Unavailable("no tracing session".into()))
    }

    fn unregister_provider(&self, _handle: SinkHandle) {}

    fn emit(
        &self,
        _handle: SinkHandle,
        _probe: ProbeId,
        _args: &[EncodedArg],
    ) -> Result<(), SinkError> {
        Err(SinkError::Emission("sink is unavailable".into()))
    }
}
