//! The service registry: a keyed cache of lazily materialized provider
//! services.
//!
//! A lookup validates the instance name, answers from the cache when it can,
//! and otherwise asks the kind's provider to materialize an instance through
//! its entry point. The wait variant first blocks (boundedly) until the
//! provider is active.

mod cache;

use std::fmt;
use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::LocatorConfig;
use crate::descriptors::{KindBinding, ServiceCatalog};
use crate::error::{LocatorError, LocatorResult};
use crate::internal::{downcast_instance, erase_instance};
use crate::key::{key_of, ServiceKey, ServiceKind};
use crate::observer::{LocatorObserver, Observers};
use crate::state::ProviderState;
use crate::tracker::ProviderStateTracker;
use crate::traits::{EntryPointTransport, ModuleHost, ServiceType};
use crate::waiter::{ActivationWaiter, WaitOptions};

use cache::InstanceCache;

/// Outcome of [`ServiceRegistry::get_with_wait`].
///
/// The wait fields describe the activation wait; `service` is present only
/// when the wait succeeded (or the instance was already cached).
pub struct ServiceGetResult<T: ?Sized> {
    /// True if the provider was active and the instance is available
    pub success: bool,
    /// Human-readable description of the outcome
    pub message: String,
    /// Provider state observed while waiting
    pub state: ProviderState,
    /// The instance, if one was obtained
    pub service: Option<Arc<T>>,
}

impl<T: ?Sized> fmt::Debug for ServiceGetResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceGetResult")
            .field("success", &self.success)
            .field("message", &self.message)
            .field("state", &self.state)
            .field("service", &self.service.as_ref().map(|_| "<instance>"))
            .finish()
    }
}

/// Builder for [`ServiceRegistry`].
pub struct ServiceRegistryBuilder {
    catalog: ServiceCatalog,
    default_wait: WaitOptions,
    observers: Observers,
}

impl ServiceRegistryBuilder {
    fn new() -> Self {
        Self {
            catalog: ServiceCatalog::default(),
            default_wait: WaitOptions::default(),
            observers: Observers::new(),
        }
    }

    /// Replaces the kind bindings.
    pub fn catalog(mut self, catalog: ServiceCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Wait options used by `get_with_wait` when the caller passes none.
    pub fn default_wait(mut self, options: WaitOptions) -> Self {
        self.default_wait = options;
        self
    }

    /// Registers an observer. Observers are notified in registration order.
    pub fn observer(mut self, observer: Arc<dyn LocatorObserver>) -> Self {
        self.observers.add(observer);
        self
    }

    /// Takes bindings and default wait options from a loaded configuration.
    pub fn from_config(self, config: &LocatorConfig) -> Self {
        self.catalog(config.catalog()).default_wait(config.wait_options())
    }

    /// Builds the registry and subscribes its tracker to host changes.
    ///
    /// The tracker snapshot starts empty; call
    /// [`ProviderStateTracker::refresh`] once the host is up.
    pub fn build(self, host: Arc<dyn ModuleHost>, transport: Arc<dyn EntryPointTransport>) -> ServiceRegistry {
        let observers = Arc::new(self.observers);
        let tracker = ProviderStateTracker::attach(Arc::clone(&host), self.catalog.providers());
        let waiter = ActivationWaiter::with_observers(Arc::clone(&tracker), host, Arc::clone(&observers));

        debug!(
            kinds = self.catalog.kinds().count(),
            observers = observers.len(),
            "service registry built"
        );

        ServiceRegistry {
            catalog: self.catalog,
            transport,
            tracker,
            waiter,
            default_wait: self.default_wait,
            cache: InstanceCache::new(),
            observers,
        }
    }
}

/// Lazily materializing service locator.
///
/// One registry is built per application and shared behind an `Arc`. Each
/// `(kind, instance name)` pair is materialized at most once and cached until
/// removed.
///
/// # Examples
///
/// ```
/// use ferrous_locator::{ServiceRegistry, CommandRegistry, LoggerType, LoggerParams,
///     Logger, LoggerLevel, ModuleHost, ProviderId, ProviderState, ChangeListener,
///     SubscriptionId, HostError, LOGGER_ENTRY_POINT};
/// use async_trait::async_trait;
/// use std::sync::Arc;
///
/// struct ConsoleLogger { name: String, level: LoggerLevel }
///
/// impl Logger for ConsoleLogger {
///     fn name(&self) -> &str { &self.name }
///     fn level(&self) -> LoggerLevel { self.level }
///     fn log(&self, level: LoggerLevel, message: &str) { println!("[{:?}] {}", level, message); }
/// }
///
/// struct ReadyHost;
///
/// #[async_trait]
/// impl ModuleHost for ReadyHost {
///     fn known_providers(&self) -> Vec<ProviderId> { Vec::new() }
///     async fn provider_state(&self, _: &ProviderId) -> Result<ProviderState, HostError> {
///         Ok(ProviderState::Active)
///     }
///     async fn activate(&self, _: &ProviderId) -> Result<(), HostError> { Ok(()) }
///     fn subscribe(&self, _: ChangeListener) -> SubscriptionId { SubscriptionId(0) }
///     fn unsubscribe(&self, _: SubscriptionId) {}
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let commands = Arc::new(CommandRegistry::new());
/// commands.register::<LoggerType, _, _>(LOGGER_ENTRY_POINT, |name, params: LoggerParams| async move {
///     let logger: Arc<dyn Logger> = Arc::new(ConsoleLogger {
///         name,
///         level: params.level.unwrap_or_default(),
///     });
///     Ok::<_, HostError>(Some(logger))
/// })?;
///
/// let registry = ServiceRegistry::builder().build(Arc::new(ReadyHost), commands);
///
/// let logger = registry.get::<LoggerType>(None, LoggerParams::default()).await?;
/// assert_eq!(logger.name(), "defaultLoggerInstance");
///
/// let again = registry.get::<LoggerType>(Some("defaultLoggerInstance"), LoggerParams::default()).await?;
/// assert!(Arc::ptr_eq(&logger, &again));
/// # Ok(())
/// # }
/// ```
pub struct ServiceRegistry {
    catalog: ServiceCatalog,
    transport: Arc<dyn EntryPointTransport>,
    tracker: Arc<ProviderStateTracker>,
    waiter: ActivationWaiter,
    default_wait: WaitOptions,
    cache: InstanceCache,
    observers: Arc<Observers>,
}

impl ServiceRegistry {
    /// Starts a builder with the default catalog and wait options.
    pub fn builder() -> ServiceRegistryBuilder {
        ServiceRegistryBuilder::new()
    }

    /// Builds a registry with default wait options and no observers.
    pub fn new(catalog: ServiceCatalog, host: Arc<dyn ModuleHost>, transport: Arc<dyn EntryPointTransport>) -> Self {
        Self::builder().catalog(catalog).build(host, transport)
    }

    /// Returns the instance for `(S::KIND, instance_name)`, materializing it
    /// on a miss.
    ///
    /// An omitted or blank name resolves to the kind's default instance. A
    /// hit has no side effects. A miss checks that the provider's entry point
    /// is registered, validates `params`, invokes the entry point and caches
    /// the result. This never waits for the provider to become active.
    pub async fn get<S: ServiceType>(
        &self,
        instance_name: Option<&str>,
        params: S::Params,
    ) -> LocatorResult<Arc<S::Instance>> {
        let binding = self.catalog.binding(S::KIND)?;
        let key = key_of::<S>(S::validate_instance_name(instance_name)?);

        if let Some(found) = self.cached::<S>(&key)? {
            debug!(kind = %key.kind(), instance = key.instance(), "service cache hit");
            return Ok(found);
        }

        debug!(kind = %key.kind(), instance = key.instance(), "service cache miss");
        self.materialize::<S>(binding, &key, params).await
    }

    /// Like [`get`](Self::get), but on a miss first waits for the kind's
    /// provider to become active.
    ///
    /// `None` options fall back to the registry's default wait options. An
    /// unsuccessful wait is reported in the result without materializing;
    /// wait errors (`Timeout`, `ActivationFailed`, invalid options) are
    /// returned as errors.
    pub async fn get_with_wait<S: ServiceType>(
        &self,
        instance_name: Option<&str>,
        wait_options: Option<WaitOptions>,
        params: S::Params,
    ) -> LocatorResult<ServiceGetResult<S::Instance>> {
        let binding = self.catalog.binding(S::KIND)?;
        let key = key_of::<S>(S::validate_instance_name(instance_name)?);

        if let Some(found) = self.cached::<S>(&key)? {
            debug!(kind = %key.kind(), instance = key.instance(), "service cache hit");
            return Ok(ServiceGetResult {
                success: true,
                message: format!("Service {} is already available.", key),
                state: self.tracker.state(&binding.provider),
                service: Some(found),
            });
        }

        let options = wait_options.unwrap_or(self.default_wait);
        let waited = self.waiter.wait_for_active(&binding.provider, &options).await?;
        if !waited.success {
            debug!(kind = %key.kind(), provider = %binding.provider, message = %waited.message, "provider not active, skipping materialization");
            return Ok(ServiceGetResult {
                success: false,
                message: waited.message,
                state: waited.state,
                service: None,
            });
        }

        let service = self.materialize::<S>(binding, &key, params).await?;
        Ok(ServiceGetResult {
            success: true,
            message: waited.message,
            state: waited.state,
            service: Some(service),
        })
    }

    /// True if the entry point serving `kind` is currently registered.
    pub async fn is_available(&self, kind: ServiceKind) -> LocatorResult<bool> {
        let binding = self.catalog.binding(kind)?;
        Ok(self.transport.is_registered(&binding.entry_point).await)
    }

    /// Caches an instance directly, bypassing the provider.
    ///
    /// Fails with [`LocatorError::AlreadyExists`] if the key is taken; the
    /// cached instance is left in place.
    pub fn set_service<S: ServiceType>(&self, instance_name: &str, instance: Arc<S::Instance>) -> LocatorResult<()> {
        self.catalog.binding(S::KIND)?;
        let key = key_of::<S>(S::validate_instance_name(Some(instance_name))?);

        if !self.cache.try_insert(key.clone(), erase_instance::<S>(instance)) {
            return Err(LocatorError::AlreadyExists {
                kind: key.kind(),
                instance: key.instance().to_string(),
            });
        }
        debug!(kind = %key.kind(), instance = key.instance(), "service set directly");
        Ok(())
    }

    /// True if an instance is cached under `(kind, instance_name)`.
    pub fn has(&self, kind: ServiceKind, instance_name: &str) -> bool {
        self.cache.contains(&ServiceKey::new(kind, instance_name))
    }

    /// True if at least one instance of `kind` is cached.
    pub fn has_kind(&self, kind: ServiceKind) -> bool {
        self.cache.contains_kind(kind)
    }

    /// Drops one cached instance. Missing keys are ignored.
    pub fn remove(&self, kind: ServiceKind, instance_name: &str) {
        if self.cache.remove(&ServiceKey::new(kind, instance_name)) {
            debug!(kind = %kind, instance = instance_name, "service removed");
        }
    }

    /// Drops every cached instance of `kind`.
    pub fn remove_kind(&self, kind: ServiceKind) {
        let removed = self.cache.remove_kind(kind);
        debug!(kind = %kind, removed, "service kind cleared");
    }

    /// Drops every cached instance.
    pub fn clear_all(&self) {
        let removed = self.cache.clear();
        debug!(removed, "service cache cleared");
    }

    /// Sorted instance names cached for `kind`.
    pub fn instance_names(&self, kind: ServiceKind) -> Vec<String> {
        self.cache.instance_names(kind)
    }

    /// Number of cached instances.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn tracker(&self) -> &Arc<ProviderStateTracker> {
        &self.tracker
    }

    pub fn waiter(&self) -> &ActivationWaiter {
        &self.waiter
    }

    pub fn catalog(&self) -> &ServiceCatalog {
        &self.catalog
    }

    fn cached<S: ServiceType>(&self, key: &ServiceKey) -> LocatorResult<Option<Arc<S::Instance>>> {
        match self.cache.get(key) {
            None => Ok(None),
            Some(any) => downcast_instance::<S>(&any).map(Some).ok_or_else(|| {
                LocatorError::InvalidConfiguration(format!(
                    "cached instance {} does not have the requested type",
                    key
                ))
            }),
        }
    }

    async fn materialize<S: ServiceType>(
        &self,
        binding: &KindBinding,
        key: &ServiceKey,
        params: S::Params,
    ) -> LocatorResult<Arc<S::Instance>> {
        let lease = self.cache.lease_gate(key);
        let _permit = lease.lock().await;
        self.materialize_gated::<S>(binding, key, params).await
    }

    // Runs with the key's gate held
    async fn materialize_gated<S: ServiceType>(
        &self,
        binding: &KindBinding,
        key: &ServiceKey,
        params: S::Params,
    ) -> LocatorResult<Arc<S::Instance>> {
        if let Some(found) = self.cached::<S>(key)? {
            debug!(kind = %key.kind(), instance = key.instance(), "service materialized by a concurrent caller");
            return Ok(found);
        }

        if !self.transport.is_registered(&binding.entry_point).await {
            return Err(LocatorError::EntryPointUnavailable {
                entry_point: binding.entry_point.clone(),
            });
        }

        let params = S::validate_params(params)?;

        self.observers.materializing(key);
        let started = Instant::now();
        let produced = self
            .transport
            .invoke(&binding.entry_point, key.instance(), Box::new(params))
            .await;

        let failed = |reason: String| LocatorError::MaterializationFailed {
            kind: key.kind(),
            instance: key.instance().to_string(),
            reason,
        };
        let instance = match produced {
            Ok(Some(any)) => downcast_instance::<S>(&any)
                .ok_or_else(|| failed("entry point returned an instance of an unexpected type".to_string())),
            Ok(None) => Err(failed("entry point returned no instance".to_string())),
            Err(err) => Err(failed(err.to_string())),
        };

        let instance = match instance {
            Ok(instance) => instance,
            Err(err) => {
                warn!(kind = %key.kind(), instance = key.instance(), entry_point = %binding.entry_point, error = %err, "service materialization failed");
                self.observers.materialization_failed(key, &err);
                return Err(err);
            }
        };

        let stored = self.cache.get_or_insert(key.clone(), erase_instance::<S>(instance));
        let elapsed = started.elapsed();
        info!(kind = %key.kind(), instance = key.instance(), provider = %binding.provider, ?elapsed, "service materialized");
        self.observers.materialized(key, elapsed);

        downcast_instance::<S>(&stored).ok_or_else(|| {
            LocatorError::InvalidConfiguration(format!("cached instance {} does not have the requested type", key))
        })
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("catalog", &self.catalog)
            .field("default_wait", &self.default_wait)
            .field("cached", &self.cache.len())
            .field("tracker", &self.tracker)
            .finish()
    }
}
