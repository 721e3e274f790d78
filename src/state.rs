//! Provider activation states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Activation state of a provider as reported by the host module system.
///
/// States are not permanent: an `Active` provider can be unloaded and drop
/// back to `Unavailable`, so callers must not cache the answer.
///
/// # Examples
///
/// ```rust
/// use ferrous_locator::ProviderState;
///
/// assert!(ProviderState::Active.is_active());
/// assert!(!ProviderState::Inactive.is_active());
/// assert!(ProviderState::Inactive.is_loaded());
/// assert!(!ProviderState::Unavailable.is_loaded());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderState {
    /// Not present or not loaded
    #[default]
    Unavailable,
    /// Present but not yet activated
    Inactive,
    /// Ready to serve materialization requests
    Active,
}

impl ProviderState {
    /// True only for `Active`.
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, ProviderState::Active)
    }

    /// True when the provider is present, active or not.
    #[inline]
    pub fn is_loaded(self) -> bool {
        !matches!(self, ProviderState::Unavailable)
    }
}

impl fmt::Display for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProviderState::Unavailable => "unavailable",
            ProviderState::Inactive => "inactive",
            ProviderState::Active => "active",
        };
        f.write_str(label)
    }
}
