//! Built-in service types and their capability interfaces.

mod llm;
mod logger;
mod telemetry;

pub use llm::{LlmCallOptions, LlmService, LlmServiceType};
pub use logger::{Logger, LoggerLevel, LoggerParams, LoggerType};
pub use telemetry::{Measurements, Properties, Telemetry, TelemetryParams, TelemetryType};
