//! Provider and sink error types

use core::time::Duration;

/// Provider lifecycle errors
///
/// Only lifecycle calls (`probe`, `activate`, `dispose`) surface hard
/// errors; the fire path swallows failures into metrics instead.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// A probe with this name is already declared in the provider
    #[error("probe `{name}` is already declared in this provider")]
    DuplicateProbeName {
        /// The conflicting probe name
        name: String,
    },

    /// The probe set is fixed once the provider is active
    #[error("provider is already active; probes must be declared before activation")]
    AlreadyActive,

    /// The provider has been disposed; no further lifecycle operations
    #[error("provider has been disposed")]
    Disposed,

    /// The backend sink rejected or could not complete the registration
    #[error("tracing backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A lifecycle operation exceeded its deadline
    #[error("lifecycle operation timed out after {elapsed:?}")]
    Timeout {
        /// Time spent before giving up
        elapsed: Duration,
    },
}

impl ProviderError {
    /// Check if the caller can retry the failed operation.
    ///
    /// Activation failures leave the provider unregistered, so
    /// backend and deadline errors are retryable.
    pub const fn is_retryable(&self) -> bool {
        match self {
            ProviderError::BackendUnavailable(_) | ProviderError::Timeout { .. } => true,
            ProviderError::DuplicateProbeName { .. }
            | ProviderError::AlreadyActive
            | ProviderError::Disposed => false,
        }
    }
}

impl From<SinkError> for ProviderError {
    fn from(err: SinkError) -> Self {
        ProviderError::BackendUnavailable(err.to_string())
    }
}

/// Errors reported by a backend sink
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    /// The sink cannot be reached or refused the registration
    #[error("sink unavailable: {0}")]
    Unavailable(String),

    /// A single event emission failed
    #[error("event emission failed: {0}")]
    Emission(String),
}
