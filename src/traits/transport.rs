//! Entry point transport contract.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HostError;

/// Type-erased service instance as it travels through a transport.
///
/// For a service type `S` the payload is an `Arc<S::Instance>`.
pub type AnyService = Arc<dyn Any + Send + Sync>;

/// Type-erased construction parameters; the payload is an `S::Params`.
pub type AnyParams = Box<dyn Any + Send>;

/// Command dispatch used to probe and invoke provider entry points.
///
/// [`CommandRegistry`](crate::CommandRegistry) is the in-process
/// implementation; hosts with their own command bus implement this directly.
#[async_trait]
pub trait EntryPointTransport: Send + Sync {
    /// True if an entry point with this name is currently registered.
    async fn is_registered(&self, entry_point: &str) -> bool;

    /// Invokes an entry point. `Ok(None)` means it ran but produced nothing.
    async fn invoke(
        &self,
        entry_point: &str,
        instance_name: &str,
        params: AnyParams,
    ) -> Result<Option<AnyService>, HostError>;
}
