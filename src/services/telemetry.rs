//! Telemetry capability.

use std::collections::BTreeMap;

use crate::error::LocatorResult;
use crate::key::ServiceKind;
use crate::traits::ServiceType;

/// String-valued event properties.
pub type Properties = BTreeMap<String, String>;
/// Numeric event measurements.
pub type Measurements = BTreeMap<String, f64>;

/// A telemetry sink handed out by a provider.
pub trait Telemetry: Send + Sync {
    /// False when the user or the environment disabled telemetry.
    fn is_enabled(&self) -> bool;

    /// Sends a named event.
    fn send_event(&self, name: &str, properties: &Properties, measurements: &Measurements);

    /// Sends an exception report.
    fn send_exception(&self, name: &str, message: &str);
}

/// Construction parameters for a telemetry sink.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetryParams {
    /// Name of the consumer the events are reported for
    pub extension_name: Option<String>,
}

/// Service type for [`Telemetry`] instances.
pub struct TelemetryType;

impl ServiceType for TelemetryType {
    const KIND: ServiceKind = ServiceKind::Telemetry;
    const DEFAULT_INSTANCE: Option<&'static str> = Some("defaultTelemetryInstance");
    type Params = TelemetryParams;
    type Instance = dyn Telemetry;

    fn validate_params(params: TelemetryParams) -> LocatorResult<TelemetryParams> {
        let extension_name = params
            .extension_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        Ok(TelemetryParams { extension_name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_extension_name_is_dropped() {
        let params = TelemetryType::validate_params(TelemetryParams {
            extension_name: Some("   ".to_string()),
        })
        .unwrap();
        assert_eq!(params.extension_name, None);

        let params = TelemetryType::validate_params(TelemetryParams {
            extension_name: Some(" my-ext ".to_string()),
        })
        .unwrap();
        assert_eq!(params.extension_name.as_deref(), Some("my-ext"));
    }
}
