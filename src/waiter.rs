//! Bounded waits for provider activation.
//!
//! A wait races two activities: a polling loop that probes the provider's
//! state every `poll_interval`, and a one-shot deadline timer. Both live under
//! a single `tokio::select!`, so the first to finish settles the wait and the
//! other is dropped on the spot together with its timer.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::error::{LocatorError, LocatorResult};
use crate::key::ProviderId;
use crate::observer::Observers;
use crate::state::ProviderState;
use crate::tracker::ProviderStateTracker;
use crate::traits::ModuleHost;

/// Poll interval used when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
/// Timeout used by [`WaitOptions::default`].
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

/// How long and how to wait for a provider to become active.
///
/// # Examples
///
/// ```
/// use ferrous_locator::{WaitOptions, LocatorError};
/// use std::time::Duration;
///
/// let options = WaitOptions::from_millis(500)
///     .with_poll_interval(Duration::from_millis(50))
///     .with_throw_on_timeout(false);
/// assert!(options.validate().is_ok());
///
/// let inverted = WaitOptions::from_millis(50).with_poll_interval(Duration::from_millis(100));
/// assert!(matches!(inverted.validate(), Err(LocatorError::InvalidConfiguration(_))));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Deadline for the whole wait
    pub timeout: Duration,
    /// Delay between state probes
    pub poll_interval: Duration,
    /// Request activation once the deadline is reached
    pub force_activate: bool,
    /// With `force_activate`, also request activation while polling once this
    /// much time has passed
    pub force_activate_after: Option<Duration>,
    /// Fail with [`LocatorError::Timeout`] instead of returning an unsuccessful result
    pub throw_on_timeout: bool,
    /// Ask the host to install a provider that is not present, then keep polling
    pub install: bool,
}

impl WaitOptions {
    /// Options with the given timeout and every other field at its default.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            poll_interval: DEFAULT_POLL_INTERVAL,
            force_activate: false,
            force_activate_after: None,
            throw_on_timeout: true,
            install: false,
        }
    }

    /// Shorthand for [`new`](Self::new) with a timeout in milliseconds.
    pub fn from_millis(timeout_ms: u64) -> Self {
        Self::new(Duration::from_millis(timeout_ms))
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_force_activate(mut self, force_activate: bool) -> Self {
        self.force_activate = force_activate;
        self
    }

    pub fn with_force_activate_after(mut self, threshold: Duration) -> Self {
        self.force_activate_after = Some(threshold);
        self
    }

    pub fn with_throw_on_timeout(mut self, throw_on_timeout: bool) -> Self {
        self.throw_on_timeout = throw_on_timeout;
        self
    }

    pub fn with_install(mut self, install: bool) -> Self {
        self.install = install;
        self
    }

    /// Checks the options before any timer is started.
    ///
    /// Both durations must be positive, and neither the poll interval nor the
    /// early activation threshold may exceed the timeout.
    pub fn validate(&self) -> LocatorResult<()> {
        if self.timeout.is_zero() {
            return Err(LocatorError::InvalidConfiguration(
                "wait timeout must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(LocatorError::InvalidConfiguration(
                "wait poll interval must be greater than zero".to_string(),
            ));
        }
        if self.timeout < self.poll_interval {
            return Err(LocatorError::InvalidConfiguration(format!(
                "wait timeout ({}ms) is shorter than the poll interval ({}ms)",
                self.timeout.as_millis(),
                self.poll_interval.as_millis()
            )));
        }
        if let Some(threshold) = self.force_activate_after {
            if threshold > self.timeout {
                return Err(LocatorError::InvalidConfiguration(format!(
                    "force activation threshold ({}ms) is longer than the wait timeout ({}ms)",
                    threshold.as_millis(),
                    self.timeout.as_millis()
                )));
            }
        }
        Ok(())
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::new(DEFAULT_WAIT_TIMEOUT)
    }
}

/// Outcome of a settled activation wait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WaitResult {
    /// True if the provider is active
    pub success: bool,
    /// Human-readable description of the outcome
    pub message: String,
    /// Last state observed for the provider
    pub state: ProviderState,
}

impl WaitResult {
    /// A successful outcome.
    pub fn succeeded(message: impl Into<String>, state: ProviderState) -> Self {
        Self {
            success: true,
            message: message.into(),
            state,
        }
    }

    /// An unsuccessful outcome.
    pub fn failed(message: impl Into<String>, state: ProviderState) -> Self {
        Self {
            success: false,
            message: message.into(),
            state,
        }
    }
}

/// Waits for providers to become active.
///
/// # Examples
///
/// ```
/// use ferrous_locator::{ActivationWaiter, ProviderStateTracker, ModuleHost, ProviderId,
///     ProviderState, ChangeListener, SubscriptionId, HostError, WaitOptions};
/// use async_trait::async_trait;
/// use std::sync::Arc;
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
/// # async fn main() {
/// let host: Arc<dyn ModuleHost> = Arc::new(ReadyHost);
/// let tracker = Arc::new(ProviderStateTracker::new(host.clone(), Vec::new()));
/// let waiter = ActivationWaiter::new(tracker, host);
///
/// let result = waiter
///     .wait_for_active(&ProviderId::new("core"), &WaitOptions::from_millis(1_000))
///     .await
///     .unwrap();
/// assert!(result.success);
/// assert_eq!(result.state, ProviderState::Active);
/// # }
/// ```
pub struct ActivationWaiter {
    tracker: Arc<ProviderStateTracker>,
    host: Arc<dyn ModuleHost>,
    observers: Arc<Observers>,
}

impl ActivationWaiter {
    /// Creates a waiter over a tracker and the host that owns its providers.
    pub fn new(tracker: Arc<ProviderStateTracker>, host: Arc<dyn ModuleHost>) -> Self {
        Self::with_observers(tracker, host, Arc::new(Observers::new()))
    }

    pub(crate) fn with_observers(
        tracker: Arc<ProviderStateTracker>,
        host: Arc<dyn ModuleHost>,
        observers: Arc<Observers>,
    ) -> Self {
        Self {
            tracker,
            host,
            observers,
        }
    }

    /// The tracker consulted while polling.
    pub fn tracker(&self) -> &Arc<ProviderStateTracker> {
        &self.tracker
    }

    /// Waits until `provider` is active or the deadline passes.
    ///
    /// Invalid options fail before any timer starts. Otherwise exactly one
    /// outcome is produced:
    ///
    /// - the provider is observed `Active`: success;
    /// - the provider is `Unavailable` (and `install` is off): failure, at once;
    /// - the deadline fires: forced activation, [`LocatorError::Timeout`], or
    ///   an unsuccessful result carrying the last observed state, depending on
    ///   `force_activate` and `throw_on_timeout`.
    ///
    /// A poll tick that is ready at the same instant as the deadline wins. The
    /// deadline path re-probes the provider first, so a state query that was
    /// still in flight when the timer fired is not lost.
    pub async fn wait_for_active(&self, provider: &ProviderId, options: &WaitOptions) -> LocatorResult<WaitResult> {
        options.validate()?;

        let started = Instant::now();
        debug!(provider = %provider, timeout_ms = options.timeout_ms(), "waiting for provider activation");

        let outcome = tokio::select! {
            biased;
            result = self.poll_until_settled(provider, options, started) => Ok(result),
            _ = tokio::time::sleep(options.timeout) => {
                // A probe in flight when the timer fired was dropped with the poller
                match self.tracker.probe(provider).await {
                    ProviderState::Active => Ok(WaitResult::succeeded(
                        format!("Provider {} is active.", provider),
                        ProviderState::Active,
                    )),
                    last => self.on_deadline(provider, options, last).await,
                }
            }
        };

        self.observers.wait_settled(provider, &outcome, started.elapsed());
        outcome
    }

    async fn poll_until_settled(
        &self,
        provider: &ProviderId,
        options: &WaitOptions,
        started: Instant,
    ) -> WaitResult {
        let mut ticker = tokio::time::interval(options.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut install_requested = false;
        let mut activation_requested = false;

        loop {
            ticker.tick().await;
            let state = self.tracker.probe(provider).await;

            match state {
                ProviderState::Active => {
                    return WaitResult::succeeded(format!("Provider {} is active.", provider), state);
                }
                ProviderState::Inactive if !activation_requested && self.early_activation_due(options, started) => {
                    activation_requested = true;
                    debug!(provider = %provider, "activation threshold passed, forcing activation");
                    match self.host.activate(provider).await {
                        Ok(()) => {
                            self.tracker.mark(provider, ProviderState::Active);
                            return WaitResult::succeeded(
                                format!("Provider {} was activated while waiting.", provider),
                                ProviderState::Active,
                            );
                        }
                        Err(err) => {
                            warn!(provider = %provider, error = %err, "early activation failed, still polling");
                        }
                    }
                }
                ProviderState::Inactive => {
                    trace!(provider = %provider, "provider loaded but not active yet");
                }
                ProviderState::Unavailable if options.install && !install_requested => {
                    install_requested = true;
                    debug!(provider = %provider, "requesting provider installation");
                    if let Err(err) = self.host.install(provider).await {
                        return WaitResult::failed(
                            format!("Provider {} could not be installed: {}", provider, err),
                            state,
                        );
                    }
                }
                ProviderState::Unavailable if options.install => {
                    trace!(provider = %provider, "waiting for requested installation");
                }
                ProviderState::Unavailable => {
                    return WaitResult::failed(format!("Provider {} is not loaded.", provider), state);
                }
            }
        }
    }

    fn early_activation_due(&self, options: &WaitOptions, started: Instant) -> bool {
        match options.force_activate_after {
            Some(threshold) if options.force_activate => started.elapsed() >= threshold,
            _ => false,
        }
    }

    async fn on_deadline(
        &self,
        provider: &ProviderId,
        options: &WaitOptions,
        last_seen: ProviderState,
    ) -> LocatorResult<WaitResult> {
        let timeout_ms = options.timeout_ms();

        if options.force_activate {
            debug!(provider = %provider, timeout_ms, "deadline reached, forcing activation");
            return match self.host.activate(provider).await {
                Ok(()) => {
                    self.tracker.mark(provider, ProviderState::Active);
                    Ok(WaitResult::succeeded(
                        format!("Provider {} was activated after {}ms.", provider, timeout_ms),
                        ProviderState::Active,
                    ))
                }
                Err(err) if options.throw_on_timeout => Err(LocatorError::ActivationFailed {
                    provider: provider.clone(),
                    reason: err.to_string(),
                }),
                Err(err) => Ok(WaitResult::failed(
                    format!("Provider {} could not be activated: {}", provider, err),
                    last_seen,
                )),
            };
        }

        if options.throw_on_timeout {
            return Err(LocatorError::Timeout {
                provider: provider.clone(),
                timeout_ms,
            });
        }

        Ok(WaitResult::failed(
            format!("Provider {} did not become active within {}ms", provider, timeout_ms),
            last_seen,
        ))
    }
}
