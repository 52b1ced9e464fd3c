//! Fire-path metrics counters
//!
//! The dispatch path never returns errors to the instrumented application;
//! everything that goes wrong there is counted here instead. All counters
//! are atomic and incremented with relaxed ordering, so recording from the
//! fire hot path is a single atomic instruction with no allocation.

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters owned by a provider.
///
/// # Thread Safety
///
/// All `record_*` methods take `&self` and use `Ordering::Relaxed`;
/// counter values are eventually consistent, which is sufficient for
/// observability counters.
#[derive(Debug, Default)]
pub(crate) struct ProviderMetrics {
    fires_emitted: AtomicU64,
    fires_dropped: AtomicU64,
    encoding_errors: AtomicU64,
    argument_mismatches: AtomicU64,
    enablement_changes: AtomicU64,
}

impl ProviderMetrics {
    pub(crate) const fn new() -> Self {
        Self {
            fires_emitted: AtomicU64::new(0),
            fires_dropped: AtomicU64::new(0),
            encoding_errors: AtomicU64::new(0),
            argument_mismatches: AtomicU64::new(0),
            enablement_changes: AtomicU64::new(0),
        }
    }

    #[inline]
    pub(crate) fn record_emitted(&self) {
        self.fires_emitted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_dropped(&self) {
        self.fires_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_encoding_error(&self) {
        self.encoding_errors.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_argument_mismatch(&self) {
        self.argument_mismatches.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_enablement_change(&self) {
        self.enablement_changes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            fires_emitted: self.fires_emitted.load(Ordering::Relaxed),
            fires_dropped: self.fires_dropped.load(Ordering::Relaxed),
            encoding_errors: self.encoding_errors.load(Ordering::Relaxed),
            argument_mismatches: self.argument_mismatches.load(Ordering::Relaxed),
            enablement_changes: self.enablement_changes.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a provider's counters.
///
/// All counters are monotonically increasing over the provider's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    /// Fires that reached the sink
    pub fires_emitted: u64,
    /// Fires dropped because the provider was not active, raced dispose,
    /// or the sink refused the event
    pub fires_dropped: u64,
    /// Fires rejected because a string argument could not be encoded
    pub encoding_errors: u64,
    /// Fires rejected because argument count or types did not match
    pub argument_mismatches: u64,
    /// Enablement toggles applied through the backend channel
    pub enablement_changes: u64,
}

impl MetricsSnapshot {
    /// True when no fire has been rejected on the dispatch path.
    pub const fn is_clean(&self) -> bool {
        self.encoding_errors == 0 && self.argument_mismatches == 0
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MetricsSnapshot(emitted={}, dropped={}, encoding_errors={}, arg_mismatches={}, enablement_changes={})",
            self.fires_emitted,
            self.fires_dropped,
            self.encoding_errors,
            self.argument_mismatches,
            self.enablement_changes
        )
    }
}
