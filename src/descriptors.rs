//! Kind-to-provider bindings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{LocatorError, LocatorResult};
use crate::key::{ProviderId, ServiceKind};

/// Where a service kind lives: its owning provider and the entry point that
/// materializes instances of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindBinding {
    /// Provider that owns the kind
    pub provider: ProviderId,
    /// Entry point invoked to materialize an instance
    pub entry_point: String,
}

impl KindBinding {
    /// Creates a binding.
    pub fn new(provider: impl Into<ProviderId>, entry_point: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            entry_point: entry_point.into(),
        }
    }
}

/// Table of supported kinds.
///
/// Every lookup the registry performs for a kind goes through the catalog,
/// so a kind without a binding fails with
/// [`LocatorError::UnsupportedKind`] instead of being silently defaulted.
///
/// # Examples
///
/// ```rust
/// use ferrous_locator::{ServiceCatalog, ServiceKind, KindBinding, LocatorError};
///
/// let catalog = ServiceCatalog::empty()
///     .bind(ServiceKind::Logger, KindBinding::new("acme.core", "acme.logger.get"));
///
/// let binding = catalog.binding(ServiceKind::Logger).unwrap();
/// assert_eq!(binding.entry_point, "acme.logger.get");
///
/// match catalog.binding(ServiceKind::Telemetry) {
///     Err(LocatorError::UnsupportedKind(kind)) => assert_eq!(kind, ServiceKind::Telemetry),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceCatalog {
    bindings: BTreeMap<ServiceKind, KindBinding>,
}

/// Provider owning the logger and telemetry kinds in the default catalog.
pub const CORE_PROVIDER: &str = "ferrous.core";
/// Provider owning the language-model kind in the default catalog.
pub const LLM_PROVIDER: &str = "ferrous.llm";
/// Default logger entry point.
pub const LOGGER_ENTRY_POINT: &str = "ferrous.core.logger.getInstance";
/// Default telemetry entry point.
pub const TELEMETRY_ENTRY_POINT: &str = "ferrous.core.telemetry.getInstance";
/// Default language-model entry point.
pub const LLM_SERVICE_ENTRY_POINT: &str = "ferrous.llm.getLLMServiceInstance";

impl ServiceCatalog {
    /// A catalog with no bindings.
    pub fn empty() -> Self {
        Self {
            bindings: BTreeMap::new(),
        }
    }

    /// Adds or replaces the binding for `kind`.
    pub fn bind(mut self, kind: ServiceKind, binding: KindBinding) -> Self {
        self.bindings.insert(kind, binding);
        self
    }

    /// Binding for `kind`, or `UnsupportedKind`.
    pub fn binding(&self, kind: ServiceKind) -> LocatorResult<&KindBinding> {
        self.bindings
            .get(&kind)
            .ok_or(LocatorError::UnsupportedKind(kind))
    }

    /// Owning provider of `kind`.
    pub fn provider_of(&self, kind: ServiceKind) -> LocatorResult<&ProviderId> {
        self.binding(kind).map(|b| &b.provider)
    }

    /// Distinct providers referenced by the catalog, sorted.
    pub fn providers(&self) -> Vec<ProviderId> {
        let mut providers: Vec<ProviderId> = self.bindings.values().map(|b| b.provider.clone()).collect();
        providers.sort();
        providers.dedup();
        providers
    }

    /// Bound kinds in order.
    pub fn kinds(&self) -> impl Iterator<Item = ServiceKind> + '_ {
        self.bindings.keys().copied()
    }

    /// True if `kind` has a binding.
    pub fn supports(&self, kind: ServiceKind) -> bool {
        self.bindings.contains_key(&kind)
    }
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self::empty()
            .bind(ServiceKind::Logger, KindBinding::new(CORE_PROVIDER, LOGGER_ENTRY_POINT))
            .bind(ServiceKind::Telemetry, KindBinding::new(CORE_PROVIDER, TELEMETRY_ENTRY_POINT))
            .bind(ServiceKind::LlmService, KindBinding::new(LLM_PROVIDER, LLM_SERVICE_ENTRY_POINT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_binds_every_kind() {
        let catalog = ServiceCatalog::default();
        for kind in ServiceKind::ALL {
            assert!(catalog.supports(kind), "{} should be bound", kind);
        }
        assert_eq!(
            catalog.binding(ServiceKind::Logger).unwrap().entry_point,
            LOGGER_ENTRY_POINT
        );
    }

    #[test]
    fn test_providers_are_deduplicated() {
        let catalog = ServiceCatalog::default();
        assert_eq!(
            catalog.providers(),
            vec![ProviderId::new(CORE_PROVIDER), ProviderId::new(LLM_PROVIDER)]
        );
    }

    #[test]
    fn test_unbound_kind_is_unsupported() {
        let catalog = ServiceCatalog::empty();
        assert!(matches!(
            catalog.provider_of(ServiceKind::LlmService),
            Err(LocatorError::UnsupportedKind(ServiceKind::LlmService))
        ));
    }

    #[test]
    fn test_catalog_json_shape() {
        let json = r#"{ "logger": { "provider": "p", "entry_point": "p.logger" } }"#;
        let catalog: ServiceCatalog = serde_json::from_str(json).unwrap();
        assert_eq!(catalog.provider_of(ServiceKind::Logger).unwrap().as_str(), "p");
        assert!(!catalog.supports(ServiceKind::Telemetry));
    }
}
