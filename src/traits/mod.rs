//! Core traits for the service locator.

mod host;
mod service_type;
mod transport;

pub use host::{ChangeListener, ModuleHost, SubscriptionId};
pub use service_type::ServiceType;
pub use transport::{AnyParams, AnyService, EntryPointTransport};
