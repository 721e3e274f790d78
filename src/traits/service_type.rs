//! Static description of a service kind.

use crate::error::{LocatorError, LocatorResult};
use crate::key::ServiceKind;

/// Statically typed description of one [`ServiceKind`].
///
/// Implementors are zero-sized marker types. They fix the shape of the
/// construction parameters, the capability interface handed back to callers,
/// and the validators every instance name and parameter set goes through
/// before the registry uses it.
///
/// # Examples
///
/// ```
/// use ferrous_locator::{ServiceKind, ServiceType, LocatorResult, LocatorError};
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct GreeterService;
///
/// impl ServiceType for GreeterService {
///     const KIND: ServiceKind = ServiceKind::Telemetry;
///     const DEFAULT_INSTANCE: Option<&'static str> = Some("greeter");
///     type Params = u8;
///     type Instance = dyn Greeter;
///
///     fn validate_params(volume: u8) -> LocatorResult<u8> {
///         if volume > 10 {
///             return Err(LocatorError::InvalidConfiguration("volume goes to 10".into()));
///         }
///         Ok(volume)
///     }
/// }
///
/// assert_eq!(GreeterService::validate_instance_name(None).unwrap(), "greeter");
/// assert_eq!(GreeterService::validate_instance_name(Some(" team ")).unwrap(), "team");
/// assert!(GreeterService::validate_params(11).is_err());
/// ```
pub trait ServiceType: Send + Sync + 'static {
    /// Kind this type describes.
    const KIND: ServiceKind;

    /// Label used when the caller omits an instance name. `None` makes the
    /// name mandatory.
    const DEFAULT_INSTANCE: Option<&'static str>;

    /// Construction parameters passed to the provider's entry point.
    type Params: Send + 'static;

    /// Capability interface of a materialized instance.
    type Instance: ?Sized + Send + Sync + 'static;

    /// Validates and corrects a caller-supplied instance name.
    ///
    /// Surrounding whitespace is trimmed; a missing or blank name falls back
    /// to [`DEFAULT_INSTANCE`](Self::DEFAULT_INSTANCE).
    fn validate_instance_name(name: Option<&str>) -> LocatorResult<String> {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => Ok(name.to_string()),
            None => Self::DEFAULT_INSTANCE.map(str::to_string).ok_or_else(|| {
                LocatorError::InvalidConfiguration(format!(
                    "an instance name is required for service type {}",
                    Self::KIND
                ))
            }),
        }
    }

    /// Validates and corrects construction parameters.
    fn validate_params(params: Self::Params) -> LocatorResult<Self::Params> {
        Ok(params)
    }
}
