//! Provider activation state tracking.
//!
//! The tracker is the single source of truth for "is provider P active". It
//! holds an immutable snapshot that is swapped whole, so readers never see a
//! half-updated view, and it keeps itself current through a change
//! subscription on the host.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::key::ProviderId;
use crate::state::ProviderState;
use crate::traits::{ChangeListener, ModuleHost, SubscriptionId};

/// Point-in-time provider states.
pub type StateSnapshot = HashMap<ProviderId, ProviderState>;

#[derive(Default)]
struct TrackedStates {
    snapshot: Arc<StateSnapshot>,
    // Bumped by every out-of-band record
    version: u64,
    // Version at which each provider was last recorded out of band
    marked: HashMap<ProviderId, u64>,
}

/// Tracks the activation state of every known provider.
///
/// Construct it with [`attach`](Self::attach) to subscribe to host change
/// notifications; the subscription is removed when the tracker is dropped.
/// The snapshot starts empty, so call [`refresh`](Self::refresh) once at
/// startup.
///
/// # Examples
///
/// ```
/// use ferrous_locator::{ProviderStateTracker, ModuleHost, ProviderId, ProviderState,
///     ChangeListener, SubscriptionId, HostError};
/// use async_trait::async_trait;
/// use std::sync::Arc;
///
/// struct StaticHost;
///
/// #[async_trait]
/// impl ModuleHost for StaticHost {
///     fn known_providers(&self) -> Vec<ProviderId> { vec![ProviderId::new("core")] }
///     async fn provider_state(&self, _: &ProviderId) -> Result<ProviderState, HostError> {
///         Ok(ProviderState::Active)
///     }
///     async fn activate(&self, _: &ProviderId) -> Result<(), HostError> { Ok(()) }
///     fn subscribe(&self, _: ChangeListener) -> SubscriptionId { SubscriptionId(1) }
///     fn unsubscribe(&self, _: SubscriptionId) {}
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let tracker = ProviderStateTracker::attach(Arc::new(StaticHost), Vec::new());
/// assert!(!tracker.is_active(&ProviderId::new("core")));
///
/// tracker.refresh().await;
/// assert!(tracker.is_active(&ProviderId::new("core")));
/// assert!(!tracker.is_active(&ProviderId::new("unknown")));
/// # }
/// ```
pub struct ProviderStateTracker {
    host: Arc<dyn ModuleHost>,
    providers: Vec<ProviderId>,
    states: RwLock<TrackedStates>,
    refresh_gate: tokio::sync::Mutex<()>,
    subscription: Mutex<Option<SubscriptionId>>,
}

impl ProviderStateTracker {
    /// Creates a tracker without subscribing to host notifications.
    ///
    /// `providers` are always queried on refresh, in addition to whatever the
    /// host reports through [`ModuleHost::known_providers`].
    pub fn new(host: Arc<dyn ModuleHost>, providers: Vec<ProviderId>) -> Self {
        Self {
            host,
            providers,
            states: RwLock::new(TrackedStates::default()),
            refresh_gate: tokio::sync::Mutex::new(()),
            subscription: Mutex::new(None),
        }
    }

    /// Creates a tracker and subscribes it to host change notifications.
    pub fn attach(host: Arc<dyn ModuleHost>, providers: Vec<ProviderId>) -> Arc<Self> {
        let tracker = Arc::new(Self::new(host, providers));

        let weak = Arc::downgrade(&tracker);
        let listener: ChangeListener = Arc::new(move || {
            if let Some(tracker) = weak.upgrade() {
                tracker.on_external_change();
            }
        });
        let id = tracker.host.subscribe(listener);
        debug!(subscription = %id, "provider state tracker subscribed to host changes");
        *tracker.subscription.lock() = Some(id);

        tracker
    }

    /// Re-reads every known provider and swaps the snapshot.
    ///
    /// Concurrent calls queue behind each other. Providers whose state cannot
    /// be queried are recorded as `Unavailable`. States recorded through
    /// [`mark`](Self::mark) or [`probe`](Self::probe) while the refresh was
    /// reading are newer than what it read and are kept.
    pub async fn refresh(&self) {
        let _guard = self.refresh_gate.lock().await;
        let since = self.states.read().version;
        let states = self.read_all().await;
        debug!(providers = states.len(), "provider states refreshed");
        self.install(states, since);
    }

    /// True if the latest snapshot records `provider` as active.
    pub fn is_active(&self, provider: &ProviderId) -> bool {
        self.state(provider).is_active()
    }

    /// Latest recorded state, `Unavailable` for unknown providers.
    pub fn state(&self, provider: &ProviderId) -> ProviderState {
        self.states.read().snapshot.get(provider).copied().unwrap_or_default()
    }

    /// The latest full snapshot.
    pub fn snapshot(&self) -> Arc<StateSnapshot> {
        Arc::clone(&self.states.read().snapshot)
    }

    /// Queries one provider now and records the answer.
    pub async fn probe(&self, provider: &ProviderId) -> ProviderState {
        let state = self.query(provider).await;
        self.mark(provider, state);
        state
    }

    /// Records a state learned out of band.
    pub fn mark(&self, provider: &ProviderId, state: ProviderState) {
        let mut guard = self.states.write();
        let tracked = &mut *guard;
        tracked.version += 1;
        tracked.marked.insert(provider.clone(), tracked.version);
        Arc::make_mut(&mut tracked.snapshot).insert(provider.clone(), state);
    }

    /// Host change hook.
    ///
    /// Spawns a best-effort reload on the current runtime and returns
    /// immediately. The reload does not queue behind [`refresh`](Self::refresh).
    pub fn on_external_change(self: &Arc<Self>) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let tracker = Arc::clone(self);
                handle.spawn(async move {
                    let since = tracker.states.read().version;
                    let states = tracker.read_all().await;
                    tracker.install(states, since);
                });
            }
            Err(_) => warn!("provider change notification dropped: no async runtime available"),
        }
    }

    // Swaps in a freshly read snapshot, keeping states marked after `since`
    fn install(&self, mut fresh: StateSnapshot, since: u64) {
        let mut tracked = self.states.write();
        for (provider, &version) in &tracked.marked {
            if version > since {
                if let Some(&state) = tracked.snapshot.get(provider) {
                    fresh.insert(provider.clone(), state);
                }
            }
        }
        tracked.snapshot = Arc::new(fresh);
    }

    async fn read_all(&self) -> StateSnapshot {
        let mut known = self.providers.clone();
        for provider in self.host.known_providers() {
            if !known.contains(&provider) {
                known.push(provider);
            }
        }

        let mut states = StateSnapshot::with_capacity(known.len());
        for provider in known {
            let state = self.query(&provider).await;
            states.insert(provider, state);
        }
        states
    }

    async fn query(&self, provider: &ProviderId) -> ProviderState {
        match self.host.provider_state(provider).await {
            Ok(state) => state,
            Err(err) => {
                warn!(provider = %provider, error = %err, "provider state query failed, recording unavailable");
                ProviderState::Unavailable
            }
        }
    }
}

impl Drop for ProviderStateTracker {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.get_mut().take() {
            self.host.unsubscribe(id);
        }
    }
}

impl std::fmt::Debug for ProviderStateTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderStateTracker")
            .field("providers", &self.providers)
            .field("snapshot", &self.states.read().snapshot)
            .field("subscription", &self.subscription.lock())
            .finish()
    }
}
