/// Observer integration tests

mod common;

use common::{provider_commands, Invocations, MockHost};
use ferrous_locator::{
    CommandRegistry, LocatorError, LocatorObserver, LocatorResult, LoggerParams, LoggerType, ProviderId, ProviderState,
    ServiceKey, ServiceRegistry, TracingObserver, WaitOptions, WaitResult,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl LocatorObserver for Recorder {
    fn materializing(&self, key: &ServiceKey) {
        self.events.lock().push(format!("materializing {}", key));
    }

    fn materialized(&self, key: &ServiceKey, _duration: Duration) {
        self.events.lock().push(format!("materialized {}", key));
    }

    fn materialization_failed(&self, key: &ServiceKey, _error: &LocatorError) {
        self.events.lock().push(format!("failed {}", key));
    }

    fn wait_settled(&self, provider: &ProviderId, outcome: &LocatorResult<WaitResult>, _duration: Duration) {
        let label = match outcome {
            Ok(result) if result.success => "active",
            Ok(_) => "gave up",
            Err(_) => "error",
        };
        self.events.lock().push(format!("wait {} {}", provider, label));
    }
}

#[tokio::test]
async fn test_materialization_events() {
    let recorder = Arc::new(Recorder::default());
    let registry = ServiceRegistry::builder()
        .observer(recorder.clone())
        .observer(Arc::new(TracingObserver::new()))
        .build(
            MockHost::with_defaults(ProviderState::Active),
            provider_commands(Arc::new(Invocations::default()), Duration::ZERO),
        );

    registry.get::<LoggerType>(Some("a"), LoggerParams::default()).await.unwrap();
    registry.get::<LoggerType>(Some("a"), LoggerParams::default()).await.unwrap();

    assert_eq!(
        *recorder.events.lock(),
        vec!["materializing Logger/a".to_string(), "materialized Logger/a".to_string()]
    );
}

#[tokio::test]
async fn test_failed_materialization_event() {
    let recorder = Arc::new(Recorder::default());
    let commands = Arc::new(CommandRegistry::new());
    commands
        .register::<LoggerType, _, _>(ferrous_locator::LOGGER_ENTRY_POINT, |_, _| async {
            Ok::<_, ferrous_locator::HostError>(None)
        })
        .unwrap();
    let registry = ServiceRegistry::builder()
        .observer(recorder.clone())
        .build(MockHost::with_defaults(ProviderState::Active), commands);

    assert!(registry.get::<LoggerType>(Some("b"), LoggerParams::default()).await.is_err());
    assert_eq!(
        *recorder.events.lock(),
        vec!["materializing Logger/b".to_string(), "failed Logger/b".to_string()]
    );
}

#[tokio::test(start_paused = true)]
async fn test_wait_events() {
    let recorder = Arc::new(Recorder::default());
    let host = MockHost::with_defaults(ProviderState::Inactive);
    let registry = ServiceRegistry::builder()
        .observer(recorder.clone())
        .observer(Arc::new(TracingObserver::with_label("test")))
        .build(host, provider_commands(Arc::new(Invocations::default()), Duration::ZERO));

    let options = WaitOptions::from_millis(200).with_throw_on_timeout(false);
    let result = registry
        .get_with_wait::<LoggerType>(None, Some(options), LoggerParams::default())
        .await
        .unwrap();
    assert!(!result.success);

    let result = registry
        .get_with_wait::<LoggerType>(None, Some(WaitOptions::from_millis(200)), LoggerParams::default())
        .await;
    assert!(result.is_err());

    assert_eq!(
        *recorder.events.lock(),
        vec!["wait ferrous.core gave up".to_string(), "wait ferrous.core error".to_string()]
    );
}
