//! Host module system contract.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HostError;
use crate::key::ProviderId;
use crate::state::ProviderState;

/// Callback invoked by the host whenever its load/activation state changes.
pub type ChangeListener = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`ModuleHost::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subscription-{}", self.0)
    }
}

/// The host module system that loads and activates providers.
///
/// The locator never enumerates or activates providers on its own; it asks the
/// host through this trait. Every query is a suspension point.
///
/// # Examples
///
/// ```
/// use ferrous_locator::{ModuleHost, ProviderId, ProviderState, ChangeListener, SubscriptionId, HostError};
/// use async_trait::async_trait;
///
/// struct AlwaysActive;
///
/// #[async_trait]
/// impl ModuleHost for AlwaysActive {
///     fn known_providers(&self) -> Vec<ProviderId> {
///         vec![ProviderId::new("core")]
///     }
///
///     async fn provider_state(&self, _provider: &ProviderId) -> Result<ProviderState, HostError> {
///         Ok(ProviderState::Active)
///     }
///
///     async fn activate(&self, _provider: &ProviderId) -> Result<(), HostError> {
///         Ok(())
///     }
///
///     fn subscribe(&self, _listener: ChangeListener) -> SubscriptionId {
///         SubscriptionId(0)
///     }
///
///     fn unsubscribe(&self, _id: SubscriptionId) {}
/// }
/// ```
#[async_trait]
pub trait ModuleHost: Send + Sync {
    /// Providers the host currently knows about.
    fn known_providers(&self) -> Vec<ProviderId>;

    /// Current state of one provider.
    async fn provider_state(&self, provider: &ProviderId) -> Result<ProviderState, HostError>;

    /// Requests activation of a loaded provider.
    async fn activate(&self, provider: &ProviderId) -> Result<(), HostError>;

    /// Requests installation of a provider that is not present.
    ///
    /// Hosts that cannot install providers keep the default, which fails.
    async fn install(&self, provider: &ProviderId) -> Result<(), HostError> {
        Err(format!("host cannot install provider {}", provider).into())
    }

    /// Registers a change listener.
    fn subscribe(&self, listener: ChangeListener) -> SubscriptionId;

    /// Removes a listener registered with [`subscribe`](Self::subscribe).
    fn unsubscribe(&self, id: SubscriptionId);
}
