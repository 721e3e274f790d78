//! # ferrous-locator
//!
//! Lifecycle-aware service locator for plugin hosts.
//!
//! Services such as loggers, telemetry sinks and language-model clients are
//! owned by provider modules that the host loads and activates on its own
//! schedule. The locator hands out instances by `(kind, instance name)`,
//! materializing each one lazily through the owning provider's entry point and
//! caching it until it is removed.
//!
//! ## Features
//!
//! - **Typed lookups**: each kind has a [`ServiceType`] fixing its parameters and capability interface
//! - **Lazy materialization**: instances are created on first request, at most once per key
//! - **Activation waits**: bounded waits for a provider to become active, with optional forced activation
//! - **State tracking**: a snapshot of provider states kept current through host change notifications
//! - **Observability**: `tracing` events throughout and pluggable [`LocatorObserver`]s
//!
//! ## Quick Start
//!
//! ```rust
//! use ferrous_locator::{
//!     ServiceRegistry, CommandRegistry, LoggerType, LoggerParams, LoggerLevel, Logger,
//!     ModuleHost, ProviderId, ProviderState, ChangeListener, SubscriptionId, HostError,
//!     WaitOptions, LOGGER_ENTRY_POINT,
//! };
//! use async_trait::async_trait;
//! use std::sync::Arc;
//!
//! struct StdoutLogger { name: String, level: LoggerLevel }
//!
//! impl Logger for StdoutLogger {
//!     fn name(&self) -> &str { &self.name }
//!     fn level(&self) -> LoggerLevel { self.level }
//!     fn log(&self, level: LoggerLevel, message: &str) {
//!         println!("{} [{:?}] {}", self.name, level, message);
//!     }
//! }
//!
//! // A host whose providers are always up
//! struct Host;
//!
//! #[async_trait]
//! impl ModuleHost for Host {
//!     fn known_providers(&self) -> Vec<ProviderId> { Vec::new() }
//!     async fn provider_state(&self, _: &ProviderId) -> Result<ProviderState, HostError> {
//!         Ok(ProviderState::Active)
//!     }
//!     async fn activate(&self, _: &ProviderId) -> Result<(), HostError> { Ok(()) }
//!     fn subscribe(&self, _: ChangeListener) -> SubscriptionId { SubscriptionId(0) }
//!     fn unsubscribe(&self, _: SubscriptionId) {}
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let commands = Arc::new(CommandRegistry::new());
//! commands.register::<LoggerType, _, _>(LOGGER_ENTRY_POINT, |name, params: LoggerParams| async move {
//!     let logger: Arc<dyn Logger> = Arc::new(StdoutLogger {
//!         name,
//!         level: params.level.unwrap_or_default(),
//!     });
//!     Ok::<_, HostError>(Some(logger))
//! })?;
//!
//! let registry = ServiceRegistry::builder().build(Arc::new(Host), commands);
//! registry.tracker().refresh().await;
//!
//! let result = registry
//!     .get_with_wait::<LoggerType>(Some("build"), Some(WaitOptions::from_millis(1_000)), LoggerParams::default())
//!     .await?;
//! assert!(result.success);
//!
//! let logger = result.service.expect("provider is active");
//! logger.info("ready");
//! assert!(registry.has(ferrous_locator::ServiceKind::Logger, "build"));
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod commands;
pub mod config;
pub mod descriptors;
pub mod error;
pub mod key;
pub mod observer;
pub mod registry;
pub mod services;
pub mod state;
pub mod tracker;
pub mod traits;
pub mod waiter;

mod internal;

// Re-exports
pub use commands::CommandRegistry;
pub use config::{LocatorConfig, WaitConfig};
pub use descriptors::{
    KindBinding, ServiceCatalog, CORE_PROVIDER, LLM_PROVIDER, LLM_SERVICE_ENTRY_POINT, LOGGER_ENTRY_POINT,
    TELEMETRY_ENTRY_POINT,
};
pub use error::{HostError, LocatorError, LocatorResult};
pub use key::{ProviderId, ServiceKey, ServiceKind};
pub use observer::{LocatorObserver, TracingObserver};
pub use registry::{ServiceGetResult, ServiceRegistry, ServiceRegistryBuilder};
pub use services::{
    LlmCallOptions, LlmService, LlmServiceType, Logger, LoggerLevel, LoggerParams, LoggerType, Measurements,
    Properties, Telemetry, TelemetryParams, TelemetryType,
};
pub use state::ProviderState;
pub use tracker::{ProviderStateTracker, StateSnapshot};
pub use traits::{AnyParams, AnyService, ChangeListener, EntryPointTransport, ModuleHost, ServiceType, SubscriptionId};
pub use waiter::{ActivationWaiter, WaitOptions, WaitResult, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT};
