//! Diagnostic observers for materialization and activation waits.
//!
//! Observers are notified synchronously from the registry and the waiter, so
//! implementations should stay cheap. [`TracingObserver`] forwards every
//! event to `tracing`.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{LocatorError, LocatorResult};
use crate::key::{ProviderId, ServiceKey};
use crate::waiter::WaitResult;

/// Observer of locator events.
///
/// Only the two materialization callbacks are required; failure and wait
/// callbacks default to no-ops.
///
/// # Examples
///
/// ```
/// use ferrous_locator::{LocatorObserver, ServiceKey};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct CountingObserver {
///     created: AtomicUsize,
/// }
///
/// impl LocatorObserver for CountingObserver {
///     fn materializing(&self, _key: &ServiceKey) {}
///
///     fn materialized(&self, _key: &ServiceKey, _duration: Duration) {
///         self.created.fetch_add(1, Ordering::Relaxed);
///     }
/// }
/// ```
pub trait LocatorObserver: Send + Sync {
    /// A cache miss is about to invoke the provider's entry point.
    fn materializing(&self, key: &ServiceKey);

    /// The entry point produced an instance that is now cached.
    fn materialized(&self, key: &ServiceKey, duration: Duration);

    /// Materialization failed; the cache was left unchanged.
    fn materialization_failed(&self, _key: &ServiceKey, _error: &LocatorError) {}

    /// An activation wait settled, successfully or not.
    fn wait_settled(&self, _provider: &ProviderId, _outcome: &LocatorResult<WaitResult>, _duration: Duration) {}
}

/// Registered observers.
#[derive(Default)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn LocatorObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self {
            observers: Vec::new(),
        }
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn LocatorObserver>) {
        self.observers.push(observer);
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    #[inline]
    pub(crate) fn materializing(&self, key: &ServiceKey) {
        for observer in &self.observers {
            observer.materializing(key);
        }
    }

    #[inline]
    pub(crate) fn materialized(&self, key: &ServiceKey, duration: Duration) {
        for observer in &self.observers {
            observer.materialized(key, duration);
        }
    }

    #[inline]
    pub(crate) fn materialization_failed(&self, key: &ServiceKey, error: &LocatorError) {
        for observer in &self.observers {
            observer.materialization_failed(key, error);
        }
    }

    #[inline]
    pub(crate) fn wait_settled(&self, provider: &ProviderId, outcome: &LocatorResult<WaitResult>, duration: Duration) {
        for observer in &self.observers {
            observer.wait_settled(provider, outcome, duration);
        }
    }
}

/// Built-in observer that emits `tracing` events.
///
/// # Examples
///
/// ```
/// use ferrous_locator::{ServiceRegistry, TracingObserver};
/// use std::sync::Arc;
///
/// let builder = ServiceRegistry::builder()
///     .observer(Arc::new(TracingObserver::with_label("extension-host")));
/// ```
pub struct TracingObserver {
    label: String,
}

impl TracingObserver {
    /// Creates an observer with the default label.
    pub fn new() -> Self {
        Self {
            label: "ferrous-locator".to_string(),
        }
    }

    /// Creates an observer whose events carry a custom label.
    pub fn with_label(label: impl Into<String>) -> Self {
        Self { label: label.into() }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl LocatorObserver for TracingObserver {
    fn materializing(&self, key: &ServiceKey) {
        debug!(observer = %self.label, key = %key, "materializing service");
    }

    fn materialized(&self, key: &ServiceKey, duration: Duration) {
        info!(observer = %self.label, key = %key, ?duration, "service materialized");
    }

    fn materialization_failed(&self, key: &ServiceKey, error: &LocatorError) {
        warn!(observer = %self.label, key = %key, %error, "service materialization failed");
    }

    fn wait_settled(&self, provider: &ProviderId, outcome: &LocatorResult<WaitResult>, duration: Duration) {
        match outcome {
            Ok(result) if result.success => {
                debug!(observer = %self.label, provider = %provider, ?duration, "provider became active");
            }
            Ok(result) => {
                info!(observer = %self.label, provider = %provider, state = %result.state, message = %result.message, "activation wait gave up");
            }
            Err(error) => {
                warn!(observer = %self.label, provider = %provider, %error, "activation wait failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::ServiceKind;
    use crate::state::ProviderState;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl LocatorObserver for Recorder {
        fn materializing(&self, key: &ServiceKey) {
            self.events.lock().unwrap().push(format!("materializing {}", key));
        }

        fn materialized(&self, key: &ServiceKey, _duration: Duration) {
            self.events.lock().unwrap().push(format!("materialized {}", key));
        }

        fn wait_settled(&self, provider: &ProviderId, outcome: &LocatorResult<WaitResult>, _duration: Duration) {
            let success = matches!(outcome, Ok(r) if r.success);
            self.events.lock().unwrap().push(format!("wait {} {}", provider, success));
        }
    }

    #[test]
    fn test_observers_fan_out_in_order() {
        let recorder = Arc::new(Recorder::default());
        let mut observers = Observers::new();
        observers.add(recorder.clone());
        observers.add(Arc::new(TracingObserver::new()));
        assert_eq!(observers.len(), 2);

        let key = ServiceKey::new(ServiceKind::Logger, "main");
        observers.materializing(&key);
        observers.materialized(&key, Duration::from_millis(3));
        observers.materialization_failed(&key, &LocatorError::UnsupportedKind(ServiceKind::Logger));
        observers.wait_settled(
            &ProviderId::new("core"),
            &Ok(WaitResult::succeeded("ok", ProviderState::Active)),
            Duration::ZERO,
        );

        let events = recorder.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                "materializing Logger/main".to_string(),
                "materialized Logger/main".to_string(),
                "wait core true".to_string(),
            ]
        );
    }
}
