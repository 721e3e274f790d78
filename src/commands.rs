//! In-process entry point transport.
//!
//! Providers running in the same process register typed async handlers under
//! their entry point names. The registry implements [`EntryPointTransport`],
//! so it can be handed straight to a [`ServiceRegistry`](crate::ServiceRegistry).

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;

use crate::error::{HostError, LocatorError, LocatorResult};
use crate::internal::{downcast_params, erase_instance};
use crate::traits::{AnyParams, AnyService, EntryPointTransport, ServiceType};

type HandlerFuture = Pin<Box<dyn Future<Output = Result<Option<AnyService>, HostError>> + Send>>;

// Erased handler: instance name plus boxed params in, boxed instance out
type Handler = Arc<dyn Fn(String, AnyParams) -> HandlerFuture + Send + Sync>;

/// Named async entry points.
///
/// # Examples
///
/// ```
/// use ferrous_locator::{CommandRegistry, EntryPointTransport, TelemetryType, TelemetryParams,
///     Telemetry, Properties, Measurements, HostError};
/// use std::sync::Arc;
///
/// struct NullTelemetry;
///
/// impl Telemetry for NullTelemetry {
///     fn is_enabled(&self) -> bool { false }
///     fn send_event(&self, _: &str, _: &Properties, _: &Measurements) {}
///     fn send_exception(&self, _: &str, _: &str) {}
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let commands = CommandRegistry::new();
/// commands
///     .register::<TelemetryType, _, _>("acme.telemetry", |_name, _params: TelemetryParams| async {
///         let telemetry: Arc<dyn Telemetry> = Arc::new(NullTelemetry);
///         Ok::<_, HostError>(Some(telemetry))
///     })
///     .unwrap();
///
/// assert!(commands.is_registered("acme.telemetry").await);
/// assert!(commands.register::<TelemetryType, _, _>("acme.telemetry", |_, _| async { Ok::<_, HostError>(None) }).is_err());
///
/// assert!(commands.unregister("acme.telemetry"));
/// assert!(!commands.is_registered("acme.telemetry").await);
/// # }
/// ```
#[derive(Default)]
pub struct CommandRegistry {
    handlers: RwLock<HashMap<String, Handler>>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a typed entry point for service type `S`.
    ///
    /// The handler receives the validated instance name and parameters and
    /// returns the instance, or `None` if it has nothing to offer. A name can
    /// only be registered once.
    pub fn register<S, F, Fut>(&self, entry_point: impl Into<String>, handler: F) -> LocatorResult<()>
    where
        S: ServiceType,
        F: Fn(String, S::Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Option<Arc<S::Instance>>, HostError>> + Send + 'static,
    {
        let entry_point = entry_point.into();
        let name = entry_point.clone();
        let erased: Handler = Arc::new(move |instance_name: String, params: AnyParams| -> HandlerFuture {
            match downcast_params::<S>(params) {
                Ok(params) => {
                    let produced = handler(instance_name, params);
                    Box::pin(async move { Ok(produced.await?.map(erase_instance::<S>)) })
                }
                Err(_) => {
                    let message = format!("entry point {} received parameters of an unexpected type", name);
                    Box::pin(async move { Err(HostError::from(message)) })
                }
            }
        });

        let mut handlers = self.handlers.write();
        if handlers.contains_key(&entry_point) {
            return Err(LocatorError::InvalidConfiguration(format!(
                "entry point {} is already registered",
                entry_point
            )));
        }
        debug!(entry_point = %entry_point, kind = %S::KIND, "entry point registered");
        handlers.insert(entry_point, erased);
        Ok(())
    }

    /// Removes an entry point. Returns false if it was not registered.
    pub fn unregister(&self, entry_point: &str) -> bool {
        let removed = self.handlers.write().remove(entry_point).is_some();
        if removed {
            debug!(entry_point, "entry point unregistered");
        }
        removed
    }

    /// Registered entry point names, sorted.
    pub fn entry_points(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[async_trait]
impl EntryPointTransport for CommandRegistry {
    async fn is_registered(&self, entry_point: &str) -> bool {
        self.handlers.read().contains_key(entry_point)
    }

    async fn invoke(
        &self,
        entry_point: &str,
        instance_name: &str,
        params: AnyParams,
    ) -> Result<Option<AnyService>, HostError> {
        let handler = self.handlers.read().get(entry_point).cloned();
        match handler {
            Some(handler) => handler(instance_name.to_string(), params).await,
            None => Err(format!("entry point {} is not registered", entry_point).into()),
        }
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("entry_points", &self.entry_points())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::downcast_instance;
    use crate::services::{LlmCallOptions, LlmService, LlmServiceType};

    struct Echo(String);

    #[async_trait]
    impl LlmService for Echo {
        async fn call_llm(&self, prompt: &str, _options: LlmCallOptions) -> Result<String, HostError> {
            Ok(format!("{}: {}", self.0, prompt))
        }
    }

    fn echo_registry() -> CommandRegistry {
        let commands = CommandRegistry::new();
        commands
            .register::<LlmServiceType, _, _>("llm.get", |name, ()| async move {
                let service: Arc<dyn LlmService> = Arc::new(Echo(name));
                Ok::<_, HostError>(Some(service))
            })
            .unwrap();
        commands
    }

    #[tokio::test]
    async fn test_invoke_passes_instance_name() {
        let commands = echo_registry();
        let any = commands.invoke("llm.get", "gpt", Box::new(())).await.unwrap().unwrap();
        let service = downcast_instance::<LlmServiceType>(&any).unwrap();
        let reply = service.call_llm("hi", LlmCallOptions::default()).await.unwrap();
        assert_eq!(reply, "gpt: hi");
    }

    #[tokio::test]
    async fn test_wrong_params_are_a_host_error() {
        let commands = echo_registry();
        let result = commands.invoke("llm.get", "gpt", Box::new(7u8)).await;
        let message = result.err().unwrap().to_string();
        assert!(message.contains("unexpected type"), "{}", message);
    }

    #[tokio::test]
    async fn test_unknown_entry_point() {
        let commands = CommandRegistry::new();
        assert!(commands.invoke("missing", "x", Box::new(())).await.is_err());
        assert!(!commands.unregister("missing"));
    }

    #[test]
    fn test_entry_points_sorted() {
        let commands = echo_registry();
        commands
            .register::<LlmServiceType, _, _>("a.first", |_, ()| async { Ok::<_, HostError>(None) })
            .unwrap();
        assert_eq!(commands.entry_points(), vec!["a.first", "llm.get"]);
    }
}
