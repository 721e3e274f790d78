//! Error types for the service locator.

use thiserror::Error;

use crate::key::{ProviderId, ServiceKind};

/// Service locator errors
///
/// Represents the failure modes of activation waits, entry point lookups and
/// the materialization protocol. Every error is returned to the immediate
/// caller; nothing is retried internally.
///
/// # Examples
///
/// ```rust
/// use ferrous_locator::{LocatorError, ProviderId, ServiceKind};
///
/// let timeout = LocatorError::Timeout {
///     provider: ProviderId::new("core"),
///     timeout_ms: 200,
/// };
/// assert_eq!(timeout.to_string(), "Provider core did not become active within 200ms");
///
/// let exists = LocatorError::AlreadyExists {
///     kind: ServiceKind::Telemetry,
///     instance: "instance1".to_string(),
/// };
/// assert_eq!(
///     exists.to_string(),
///     "Service instance instance1 of type Telemetry already exists"
/// );
/// ```
#[derive(Debug, Clone, Error)]
pub enum LocatorError {
    /// Bad wait options, instance name or construction parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The provider's entry point is not currently registered with the transport
    #[error("Entry point {entry_point} cannot be found in the current session")]
    EntryPointUnavailable {
        /// Name of the missing entry point
        entry_point: String,
    },

    /// The entry point ran but produced no usable instance
    #[error("Could not get a service instance {instance} for service type {kind}: {reason}")]
    MaterializationFailed {
        /// Kind being materialized
        kind: ServiceKind,
        /// Validated instance name
        instance: String,
        /// What went wrong
        reason: String,
    },

    /// Activation wait exceeded its deadline with `throw_on_timeout` set
    #[error("Provider {provider} did not become active within {timeout_ms}ms")]
    Timeout {
        /// Provider that was awaited
        provider: ProviderId,
        /// Configured timeout in milliseconds
        timeout_ms: u64,
    },

    /// Forced activation at the deadline failed with `throw_on_timeout` set
    #[error("Provider {provider} could not be activated: {reason}")]
    ActivationFailed {
        /// Provider that was activated
        provider: ProviderId,
        /// Error reported by the host
        reason: String,
    },

    /// Direct cache insertion collided with an existing entry
    #[error("Service instance {instance} of type {kind} already exists")]
    AlreadyExists {
        /// Kind of the colliding entry
        kind: ServiceKind,
        /// Instance name of the colliding entry
        instance: String,
    },

    /// The kind has no binding in the service catalog
    #[error("Unsupported service type: {0}")]
    UnsupportedKind(ServiceKind),
}

/// Result type for locator operations
///
/// A convenience alias for `Result<T, LocatorError>`.
///
/// # Examples
///
/// ```rust
/// use ferrous_locator::{LocatorError, LocatorResult};
///
/// fn checked_interval(ms: u64) -> LocatorResult<u64> {
///     if ms == 0 {
///         return Err(LocatorError::InvalidConfiguration("interval must be positive".into()));
///     }
///     Ok(ms)
/// }
///
/// assert!(checked_interval(0).is_err());
/// assert_eq!(checked_interval(100).unwrap(), 100);
/// ```
pub type LocatorResult<T> = Result<T, LocatorError>;

/// Error type reported by host collaborators (module system, entry points).
pub type HostError = Box<dyn std::error::Error + Send + Sync>;
