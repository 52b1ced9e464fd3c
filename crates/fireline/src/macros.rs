//! Call-site macros for firing probes

/// Fire a probe with typed arguments, guarded by its enabled check.
///
/// Arguments are converted through [`ArgValue::from`](crate::ArgValue), so
/// call sites pass plain integers and string slices. The enabled check runs
/// first; when nobody is listening the arguments are never assembled.
///
/// # Example
///
/// ```rust
/// use fireline::{ArgKind, Provider, Signature, fire_probe};
///
/// # fn main() -> Result<(), fireline::ProviderError> {
/// let provider = Provider::new("greeting");
/// let start = provider.probe(
///     "start",
///     Signature::new(vec![ArgKind::Int, ArgKind::Str]),
/// )?;
/// provider.activate()?;
///
/// fire_probe!(start, 5i64, "hello");
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! fire_probe {
    ($probe:expr $(, $arg:expr)* $(,)?) => {
        if $probe.is_enabled() {
            $probe.fire(&[$($crate::ArgValue::from($arg)),*]);
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::args::{ArgKind, EncodedArg, Signature};
    use crate::error::SinkError;
    use crate::provider::{EnablementControl, Provider};
    use crate::sink::{ProbeId, Registration, Sink, SinkHandle};
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct TestSink {
        events: Arc<Mutex<Vec<Vec<EncodedArg>>>>,
    }

    impl Sink for TestSink {
        fn register_provider(
            &self,
            _registration: &Registration,
            _control: EnablementControl,
        ) -> Result<SinkHandle, SinkError> {
            Ok(SinkHandle::new(1))
        }

        fn unregister_provider(&self, _handle: SinkHandle) {}

        fn emit(
            &self,
            _handle: SinkHandle,
            _probe: ProbeId,
            args: &[EncodedArg],
        ) -> Result<(), SinkError> {
            self.events.lock().push(args.to_vec());
            Ok(())
        }
    }

    #[test]
    fn test_fire_probe_macro_converts_arguments() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = TestSink {
            events: Arc::clone(&events),
        };
        let provider = Provider::with_sink("greeting", Box::new(sink));
        let probe = provider
            .probe("start", Signature::new(vec![ArgKind::Int, ArgKind::Str]))
            .expect("declare");

        provider.activate().expect("activate");
        provider.enablement_control().set_enabled(probe.id(), true);

        fire_probe!(probe, 5i64, "hello");
        fire_probe!(probe, 6i32, "world",);

        let guard = events.lock();
        assert_eq!(
            guard.as_slice(),
            &[
                vec![EncodedArg::Int(5), EncodedArg::Str("hello".to_string())],
                vec![EncodedArg::Int(6), EncodedArg::Str("world".to_string())],
            ]
        );
    }

    #[test]
    fn test_fire_probe_macro_skips_when_disabled() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = TestSink {
            events: Arc::clone(&events),
        };
        let provider = Provider::with_sink("greeting", Box::new(sink));
        let probe = provider
            .probe("start", Signature::empty())
            .expect("declare");
        provider.activate().expect("activate");

        fire_probe!(probe);

        assert!(events.lock().is_empty());
    }
}
