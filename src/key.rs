//! Service and provider key types for the locator.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::traits::ServiceType;

/// Closed set of service categories the locator knows about.
///
/// Each kind is owned by exactly one provider (see
/// [`ServiceCatalog`](crate::ServiceCatalog)) and is given its static shape
/// (parameters, capability interface, validators) by a
/// [`ServiceType`](crate::ServiceType) implementation.
///
/// # Examples
///
/// ```rust
/// use ferrous_locator::ServiceKind;
///
/// assert_eq!(ServiceKind::Logger.to_string(), "Logger");
/// assert_eq!(ServiceKind::ALL.len(), 3);
///
/// let parsed: ServiceKind = serde_json::from_str("\"llm_service\"").unwrap();
/// assert_eq!(parsed, ServiceKind::LlmService);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceKind {
    /// Structured logger
    Logger,
    /// Telemetry sink
    Telemetry,
    /// Language-model client
    LlmService,
}

impl ServiceKind {
    /// Every kind, in declaration order.
    pub const ALL: [ServiceKind; 3] = [ServiceKind::Logger, ServiceKind::Telemetry, ServiceKind::LlmService];

    /// Human-readable name used in diagnostics and error messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceKind::Logger => "Logger",
            ServiceKind::Telemetry => "Telemetry",
            ServiceKind::LlmService => "LLMService",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Opaque identifier of an externally loaded provider module.
///
/// # Examples
///
/// ```rust
/// use ferrous_locator::ProviderId;
///
/// let id = ProviderId::new("acme.core");
/// assert_eq!(id.as_str(), "acme.core");
/// assert_eq!(id, ProviderId::from("acme.core"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderId(String);

impl ProviderId {
    /// Creates a provider id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProviderId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Cache key: a service kind plus a validated instance name.
///
/// Instance names are logical labels chosen by callers ("default", a
/// workspace id, an extension name). Two keys are equal only when both the
/// kind and the name match.
///
/// # Examples
///
/// ```rust
/// use ferrous_locator::{ServiceKey, ServiceKind};
///
/// let a = ServiceKey::new(ServiceKind::Logger, "workspace-1");
/// let b = ServiceKey::new(ServiceKind::Telemetry, "workspace-1");
/// assert_ne!(a, b);
/// assert_eq!(a.to_string(), "Logger/workspace-1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    kind: ServiceKind,
    instance: String,
}

impl ServiceKey {
    /// Creates a key from a kind and an already validated instance name.
    pub fn new(kind: ServiceKind, instance: impl Into<String>) -> Self {
        Self {
            kind,
            instance: instance.into(),
        }
    }

    /// The service kind.
    #[inline]
    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    /// The instance name.
    #[inline]
    pub fn instance(&self) -> &str {
        &self.instance
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.instance)
    }
}

// Key for a typed service; the name must already have gone through the validator
#[inline]
pub(crate) fn key_of<S: ServiceType>(instance: impl Into<String>) -> ServiceKey {
    ServiceKey::new(S::KIND, instance)
}
