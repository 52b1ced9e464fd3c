//! Structured-logging sink
//!
//! The zero-platform-dependency backend: fired events become `tracing`
//! records. Useful during development and on platforms without a native
//! tracing facility.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::args::EncodedArg;
use crate::error::SinkError;
use crate::provider::EnablementControl;
use crate::sink::{ProbeId, Registration, Sink, SinkHandle};

/// Sink that forwards fired events to `tracing` as structured records.
///
/// Accepts every registration and never fails emission. Probe enablement
/// is left to the caller: tests and development tools drive the
/// [`EnablementControl`] themselves (this sink does not keep it).
pub struct LoggingSink {
    next_handle: AtomicU64,
    registrations: Mutex<HashMap<u64, Registration>>,
}

impl LoggingSink {
    /// Create a new logging sink.
    pub fn new() -> Self {
        Self {
            next_handle: AtomicU64::new(1),
            registrations: Mutex::new(HashMap::new()),
        }
    }

    fn probe_name(&self, handle: SinkHandle, probe: ProbeId) -> Option<String> {
        let registrations = self.registrations.lock();
        registrations
            .get(&handle.raw())
            .and_then(|r| r.probes.get(probe.index()))
            .map(|p| p.name.clone())
    }
}

impl Default for LoggingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for LoggingSink {
    fn register_provider(
        &self,
        registration: &Registration,
        _control: EnablementControl,
    ) -> Result<SinkHandle, SinkError> {
        let handle = SinkHandle::new(self.next_handle.fetch_add(1, Ordering::Relaxed));
        tracing::info!(
            namespace = %registration.namespace,
            probes = registration.probes.len(),
            handle = handle.raw(),
            "provider registered with logging sink"
        );
        self.registrations
            .lock()
            .insert(handle.raw(), registration.clone());
        Ok(handle)
    }

    fn unregister_provider(&self, handle: SinkHandle) {
        if let Some(registration) = self.registrations.lock().remove(&handle.raw()) {
            tracing::info!(
                namespace = %registration.namespace,
                handle = handle.raw(),
                "provider unregistered from logging sink"
            );
        }
    }

    fn emit(
        &self,
        handle: SinkHandle,
        probe: ProbeId,
        args: &[EncodedArg],
    ) -> Result<(), SinkError> {
        let name = self
            .probe_name(handle, probe)
            .unwrap_or_else(|| probe.to_string());
        tracing::info!(
            probe = %name,
            args = ?args,
            "probe fired"
        );
        Ok(())
    }
}

impl core::fmt::Debug for LoggingSink {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoggingSink")
            .field("registrations", &self.registrations.lock().len())
            .finish()
    }
}
