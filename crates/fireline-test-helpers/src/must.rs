//! Panic-with-context helpers for test assertions.
//!
//! Test code in this workspace avoids bare `unwrap()`/`expect()`. These
//! helpers panic with the offending value instead, and `#[track_caller]`
//! makes the panic point at the asserting test line rather than here.

use std::fmt::Debug;

/// Unwrap a `Result`, panicking with the error value on `Err`.
///
/// # Example
///
/// ```rust
/// use fireline::{Provider, Signature};
/// use fireline_test_helpers::must;
///
/// let provider = Provider::new("greeting");
/// let probe = must(provider.probe("start", Signature::empty()));
/// assert_eq!(probe.name(), "start");
/// ```
///
/// # Panics
///
/// Panics when the result is `Err`, including the error in the message.
#[track_caller]
pub fn must<T, E: Debug>(result: Result<T, E>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => panic!("must: unexpected Err: {e:?}"),
    }
}

/// Unwrap an `Option`, panicking with `msg` on `None`.
///
/// # Example
///
/// ```rust
/// use fireline_test_helpers::must_some;
///
/// let first = must_some([1, 2].first(), "array is non-empty");
/// assert_eq!(*first, 1);
/// ```
///
/// # Panics
///
/// Panics when the option is `None`, with the supplied message.
#[track_caller]
pub fn must_some<T>(option: Option<T>, msg: &str) -> T {
    match option {
        Some(v) => v,
        None => panic!("must_some: {msg}"),
    }
}

/// Unwrap an expected `Err`, panicking when the result is `Ok`.
///
/// # Example
///
/// ```rust
/// use fireline::Provider;
/// use fireline_test_helpers::{must, must_err};
///
/// let provider = Provider::new("greeting");
/// must(provider.activate());
/// let err = must_err(provider.activate(), "second activate must fail");
/// assert!(!err.is_retryable());
/// ```
///
/// # Panics
///
/// Panics when the result is `Ok`, with the message and the value.
#[track_caller]
pub fn must_err<T: Debug, E>(result: Result<T, E>, msg: &str) -> E {
    match result {
        Ok(v) => panic!("must_err: {msg}: unexpected Ok: {v:?}"),
        Err(e) => e,
    }
}
