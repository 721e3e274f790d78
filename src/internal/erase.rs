//! Type erasure for instances and parameters crossing the transport.
//!
//! Capability interfaces are unsized (`dyn Logger`), so an instance is stored
//! as an `Arc<Arc<dyn Logger>>` behind `dyn Any` and unwrapped one level on
//! the way out.

use std::sync::Arc;

use crate::traits::{AnyParams, AnyService, ServiceType};

#[inline]
pub(crate) fn erase_instance<S: ServiceType>(instance: Arc<S::Instance>) -> AnyService {
    Arc::new(instance)
}

#[inline]
pub(crate) fn downcast_instance<S: ServiceType>(any: &AnyService) -> Option<Arc<S::Instance>> {
    any.downcast_ref::<Arc<S::Instance>>().cloned()
}

// Wrong payload type hands the box back so the caller can report it
#[inline]
pub(crate) fn downcast_params<S: ServiceType>(params: AnyParams) -> Result<S::Params, AnyParams> {
    params.downcast::<S::Params>().map(|boxed| *boxed)
}
