//! Internal implementation details.

pub(crate) mod erase;

pub(crate) use erase::{downcast_instance, downcast_params, erase_instance};
