//! Logger capability.

use serde::{Deserialize, Serialize};

use crate::error::LocatorResult;
use crate::key::ServiceKind;
use crate::traits::ServiceType;

/// Standard logger levels. Numeric values leave room for custom levels in
/// between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoggerLevel {
    Trace = 10,
    Debug = 20,
    #[default]
    Info = 30,
    Warn = 40,
    Error = 50,
    Fatal = 60,
}

impl LoggerLevel {
    /// Numeric value of the level.
    pub fn value(self) -> u8 {
        self as u8
    }
}

/// A named logger handed out by a provider.
///
/// Only [`log`](Logger::log) and the accessors are required; the per-level
/// helpers filter through [`should_log`](Logger::should_log).
///
/// # Examples
///
/// ```
/// use ferrous_locator::{Logger, LoggerLevel};
/// use std::sync::Mutex;
///
/// struct MemoryLogger {
///     lines: Mutex<Vec<String>>,
/// }
///
/// impl Logger for MemoryLogger {
///     fn name(&self) -> &str { "memory" }
///     fn level(&self) -> LoggerLevel { LoggerLevel::Warn }
///     fn log(&self, level: LoggerLevel, message: &str) {
///         self.lines.lock().unwrap().push(format!("{:?}: {}", level, message));
///     }
/// }
///
/// let logger = MemoryLogger { lines: Mutex::new(Vec::new()) };
/// logger.info("dropped");
/// logger.error("kept");
/// assert_eq!(*logger.lines.lock().unwrap(), vec!["Error: kept".to_string()]);
/// ```
pub trait Logger: Send + Sync {
    /// Logger name.
    fn name(&self) -> &str;

    /// Minimum level this logger records.
    fn level(&self) -> LoggerLevel;

    /// Records one message unconditionally.
    fn log(&self, level: LoggerLevel, message: &str);

    /// True if messages at `level` would be recorded.
    fn should_log(&self, level: LoggerLevel) -> bool {
        level >= self.level()
    }

    fn trace(&self, message: &str) {
        self.log_filtered(LoggerLevel::Trace, message);
    }

    fn debug(&self, message: &str) {
        self.log_filtered(LoggerLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.log_filtered(LoggerLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.log_filtered(LoggerLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.log_filtered(LoggerLevel::Error, message);
    }

    fn fatal(&self, message: &str) {
        self.log_filtered(LoggerLevel::Fatal, message);
    }

    #[doc(hidden)]
    fn log_filtered(&self, level: LoggerLevel, message: &str) {
        if self.should_log(level) {
            self.log(level, message);
        }
    }
}

/// Construction parameters for a logger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggerParams {
    /// Requested level; `Info` when omitted
    pub level: Option<LoggerLevel>,
}

impl LoggerParams {
    /// Parameters requesting a specific level.
    pub fn with_level(level: LoggerLevel) -> Self {
        Self { level: Some(level) }
    }
}

/// Service type for [`Logger`] instances.
pub struct LoggerType;

impl ServiceType for LoggerType {
    const KIND: ServiceKind = ServiceKind::Logger;
    const DEFAULT_INSTANCE: Option<&'static str> = Some("defaultLoggerInstance");
    type Params = LoggerParams;
    type Instance = dyn Logger;

    fn validate_params(params: LoggerParams) -> LocatorResult<LoggerParams> {
        Ok(LoggerParams {
            level: Some(params.level.unwrap_or_default()),
        })
    }
}
