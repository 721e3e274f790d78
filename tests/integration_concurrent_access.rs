/// Concurrent access integration tests
///
/// These tests verify that the registry de-duplicates concurrent
/// materializations of one key while distinct keys proceed in parallel.

mod common;

use common::{memory_logger, provider_commands, Invocations, MockHost};
use ferrous_locator::{Logger, LoggerParams, LoggerType, ProviderState, ServiceKind, ServiceRegistry, TelemetryParams, TelemetryType};
use std::sync::Arc;
use std::time::Duration;

fn slow_registry(invocations: Arc<Invocations>) -> Arc<ServiceRegistry> {
    Arc::new(
        ServiceRegistry::builder().build(
            MockHost::with_defaults(ProviderState::Active),
            provider_commands(invocations, Duration::from_millis(20)),
        ),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_same_key_materializes_once() {
    let invocations = Arc::new(Invocations::default());
    let registry = slow_registry(invocations.clone());

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                registry
                    .get::<LoggerType>(Some("shared"), LoggerParams::default())
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut loggers = Vec::new();
    for task in tasks {
        loggers.push(task.await.unwrap());
    }

    assert_eq!(invocations.logger(), 1);
    for logger in &loggers[1..] {
        assert!(Arc::ptr_eq(&loggers[0], logger));
    }
    assert_eq!(registry.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_keys_materialize_independently() {
    let invocations = Arc::new(Invocations::default());
    let registry = slow_registry(invocations.clone());

    let mut tasks = Vec::new();
    for i in 0..8 {
        let logger_registry = Arc::clone(&registry);
        tasks.push(tokio::spawn(async move {
            let name = format!("logger-{}", i);
            logger_registry.get::<LoggerType>(Some(&name), LoggerParams::default()).await.unwrap();
        }));
        let telemetry_registry = Arc::clone(&registry);
        tasks.push(tokio::spawn(async move {
            let name = format!("telemetry-{}", i);
            telemetry_registry.get::<TelemetryType>(Some(&name), TelemetryParams::default()).await.unwrap();
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(invocations.logger(), 8);
    assert_eq!(invocations.telemetry(), 8);
    assert_eq!(registry.instance_names(ServiceKind::Logger).len(), 8);
    assert_eq!(registry.instance_names(ServiceKind::Telemetry).len(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_set_service_during_materialization_is_kept() {
    let invocations = Arc::new(Invocations::default());
    let registry = slow_registry(invocations.clone());

    let pending = {
        let registry = Arc::clone(&registry);
        tokio::spawn(async move {
            registry
                .get::<LoggerType>(Some("raced"), LoggerParams::default())
                .await
                .unwrap()
        })
    };

    // Lands while the entry point is still sleeping
    tokio::time::sleep(Duration::from_millis(5)).await;
    let injected = memory_logger("injected");
    let inserted = registry.set_service::<LoggerType>("raced", injected.clone()).is_ok();

    let resolved = pending.await.unwrap();
    if inserted {
        assert!(Arc::ptr_eq(&resolved, &injected));
    }
    let cached = registry.get::<LoggerType>(Some("raced"), LoggerParams::default()).await.unwrap();
    assert!(Arc::ptr_eq(&cached, &resolved));
    assert_eq!(registry.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_clear_all_while_reading() {
    let invocations = Arc::new(Invocations::default());
    let registry = slow_registry(invocations);
    registry.set_service::<LoggerType>("hot", memory_logger("hot")).unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                for _ in 0..50 {
                    registry
                        .get::<LoggerType>(Some("hot"), LoggerParams::default())
                        .await
                        .unwrap();
                }
            })
        })
        .collect();

    registry.clear_all();
    for reader in readers {
        reader.await.unwrap();
    }

    // Either the injected instance or a fresh one, both named after the key
    let logger = registry.get::<LoggerType>(Some("hot"), LoggerParams::default()).await.unwrap();
    assert_eq!(logger.name(), "hot");
    assert!(registry.has(ServiceKind::Logger, "hot"));
}
