//! Shared fixtures: a scriptable module host and fake provider services.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ferrous_locator::{
    ChangeListener, CommandRegistry, HostError, LlmCallOptions, LlmService, LlmServiceType, Logger, LoggerLevel,
    LoggerParams, LoggerType, Measurements, ModuleHost, Properties, ProviderId, ProviderState, SubscriptionId,
    Telemetry, TelemetryParams, TelemetryType, CORE_PROVIDER, LLM_PROVIDER, LLM_SERVICE_ENTRY_POINT,
    LOGGER_ENTRY_POINT, TELEMETRY_ENTRY_POINT,
};
use parking_lot::Mutex;

// ===== Module host =====

#[derive(Default)]
pub struct MockHost {
    states: Mutex<HashMap<ProviderId, ProviderState>>,
    broken: Mutex<HashSet<ProviderId>>,
    listeners: Mutex<HashMap<u64, ChangeListener>>,
    next_subscription: AtomicU64,
    activation_fails: AtomicBool,
    install_fails: AtomicBool,
    yield_on_query: AtomicBool,
    query_delay: Mutex<Option<Duration>>,
    pub state_queries: AtomicUsize,
    pub activations: AtomicUsize,
    pub installs: AtomicUsize,
}

impl MockHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Host with both default providers in the given state.
    pub fn with_defaults(state: ProviderState) -> Arc<Self> {
        let host = Self::new();
        host.set_state(CORE_PROVIDER, state);
        host.set_state(LLM_PROVIDER, state);
        host
    }

    pub fn set_state(&self, provider: &str, state: ProviderState) {
        self.states.lock().insert(ProviderId::new(provider), state);
    }

    pub fn unload(&self, provider: &str) {
        self.states.lock().remove(&ProviderId::new(provider));
    }

    /// State queries for `provider` fail from now on.
    pub fn break_queries(&self, provider: &str) {
        self.broken.lock().insert(ProviderId::new(provider));
    }

    /// State queries suspend once before answering.
    pub fn yield_on_queries(&self) {
        self.yield_on_query.store(true, Ordering::SeqCst);
    }

    /// State queries take `delay` of tokio time and answer with the state at
    /// the end of it.
    pub fn slow_queries(&self, delay: Duration) {
        *self.query_delay.lock() = Some(delay);
    }

    pub fn fail_activation(&self) {
        self.activation_fails.store(true, Ordering::SeqCst);
    }

    pub fn fail_install(&self) {
        self.install_fails.store(true, Ordering::SeqCst);
    }

    /// Invokes every subscribed change listener.
    pub fn notify(&self) {
        let listeners: Vec<ChangeListener> = self.listeners.lock().values().cloned().collect();
        for listener in listeners {
            listener();
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn queries(&self) -> usize {
        self.state_queries.load(Ordering::SeqCst)
    }

    /// Flips `provider` to `state` after `delay` of (possibly paused) tokio time.
    pub fn set_state_after(self: &Arc<Self>, provider: &'static str, state: ProviderState, delay: Duration) {
        let host = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            host.set_state(provider, state);
        });
    }
}

#[async_trait]
impl ModuleHost for MockHost {
    fn known_providers(&self) -> Vec<ProviderId> {
        let mut providers: Vec<ProviderId> = self.states.lock().keys().cloned().collect();
        providers.sort();
        providers
    }

    async fn provider_state(&self, provider: &ProviderId) -> Result<ProviderState, HostError> {
        self.state_queries.fetch_add(1, Ordering::SeqCst);
        if self.yield_on_query.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        let delay = *self.query_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.broken.lock().contains(provider) {
            return Err(format!("state of {} is unreadable", provider).into());
        }
        Ok(self.states.lock().get(provider).copied().unwrap_or_default())
    }

    async fn activate(&self, provider: &ProviderId) -> Result<(), HostError> {
        self.activations.fetch_add(1, Ordering::SeqCst);
        if self.activation_fails.load(Ordering::SeqCst) {
            return Err(format!("{} refused to activate", provider).into());
        }
        self.states.lock().insert(provider.clone(), ProviderState::Active);
        Ok(())
    }

    async fn install(&self, provider: &ProviderId) -> Result<(), HostError> {
        self.installs.fetch_add(1, Ordering::SeqCst);
        if self.install_fails.load(Ordering::SeqCst) {
            return Err(format!("{} is not in the marketplace", provider).into());
        }
        self.states.lock().insert(provider.clone(), ProviderState::Active);
        Ok(())
    }

    fn subscribe(&self, listener: ChangeListener) -> SubscriptionId {
        let id = self.next_subscription.fetch_add(1, Ordering::SeqCst);
        self.listeners.lock().insert(id, listener);
        SubscriptionId(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.lock().remove(&id.0);
    }
}

// ===== Fake services =====

pub struct MemoryLogger {
    pub name: String,
    pub level: LoggerLevel,
    pub lines: Mutex<Vec<String>>,
}

impl Logger for MemoryLogger {
    fn name(&self) -> &str {
        &self.name
    }

    fn level(&self) -> LoggerLevel {
        self.level
    }

    fn log(&self, level: LoggerLevel, message: &str) {
        self.lines.lock().push(format!("{:?} {}", level, message));
    }
}

pub fn memory_logger(name: &str) -> Arc<dyn Logger> {
    Arc::new(MemoryLogger {
        name: name.to_string(),
        level: LoggerLevel::Info,
        lines: Mutex::new(Vec::new()),
    })
}

pub struct CountingTelemetry {
    pub extension_name: Option<String>,
    pub events: AtomicUsize,
}

impl Telemetry for CountingTelemetry {
    fn is_enabled(&self) -> bool {
        true
    }

    fn send_event(&self, _name: &str, _properties: &Properties, _measurements: &Measurements) {
        self.events.fetch_add(1, Ordering::SeqCst);
    }

    fn send_exception(&self, _name: &str, _message: &str) {
        self.events.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct EchoLlm {
    pub model: String,
}

#[async_trait]
impl LlmService for EchoLlm {
    async fn call_llm(&self, prompt: &str, _options: LlmCallOptions) -> Result<String, HostError> {
        Ok(format!("[{}] {}", self.model, prompt))
    }
}

// ===== Entry points =====

/// Per-entry-point invocation counters.
#[derive(Default)]
pub struct Invocations {
    pub logger: AtomicUsize,
    pub telemetry: AtomicUsize,
    pub llm: AtomicUsize,
}

impl Invocations {
    pub fn logger(&self) -> usize {
        self.logger.load(Ordering::SeqCst)
    }

    pub fn telemetry(&self) -> usize {
        self.telemetry.load(Ordering::SeqCst)
    }

    pub fn llm(&self) -> usize {
        self.llm.load(Ordering::SeqCst)
    }
}

/// Registers all three default entry points. Each handler sleeps for
/// `latency` before producing its instance.
pub fn provider_commands(invocations: Arc<Invocations>, latency: Duration) -> Arc<CommandRegistry> {
    let commands = Arc::new(CommandRegistry::new());

    let counter = Arc::clone(&invocations);
    commands
        .register::<LoggerType, _, _>(LOGGER_ENTRY_POINT, move |name, params: LoggerParams| {
            counter.logger.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(latency).await;
                let logger: Arc<dyn Logger> = Arc::new(MemoryLogger {
                    name,
                    level: params.level.unwrap_or_default(),
                    lines: Mutex::new(Vec::new()),
                });
                Ok::<_, HostError>(Some(logger))
            }
        })
        .unwrap();

    let counter = Arc::clone(&invocations);
    commands
        .register::<TelemetryType, _, _>(TELEMETRY_ENTRY_POINT, move |_name, params: TelemetryParams| {
            counter.telemetry.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(latency).await;
                let telemetry: Arc<dyn Telemetry> = Arc::new(CountingTelemetry {
                    extension_name: params.extension_name,
                    events: AtomicUsize::new(0),
                });
                Ok::<_, HostError>(Some(telemetry))
            }
        })
        .unwrap();

    let counter = invocations;
    commands
        .register::<LlmServiceType, _, _>(LLM_SERVICE_ENTRY_POINT, move |name, ()| {
            counter.llm.fetch_add(1, Ordering::SeqCst);
            async move {
                tokio::time::sleep(latency).await;
                let llm: Arc<dyn LlmService> = Arc::new(EchoLlm { model: name });
                Ok::<_, HostError>(Some(llm))
            }
        })
        .unwrap();

    commands
}
