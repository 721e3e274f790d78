//! Locator configuration.
//!
//! Configuration is plain serde data: kind bindings plus default wait
//! options. It can be loaded from JSON and then overridden from prefixed
//! environment variables, e.g. `MYAPP_WAIT_TIMEOUT_MS=5000`.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::descriptors::ServiceCatalog;
use crate::error::{LocatorError, LocatorResult};
use crate::waiter::WaitOptions;

/// Default activation wait settings, in serializable form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub force_activate: bool,
    pub force_activate_after_ms: Option<u64>,
    pub throw_on_timeout: bool,
    pub install: bool,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            poll_interval_ms: 100,
            force_activate: false,
            force_activate_after_ms: None,
            throw_on_timeout: true,
            install: false,
        }
    }
}

impl From<WaitConfig> for WaitOptions {
    fn from(config: WaitConfig) -> Self {
        let options = WaitOptions::new(Duration::from_millis(config.timeout_ms))
            .with_poll_interval(Duration::from_millis(config.poll_interval_ms))
            .with_force_activate(config.force_activate)
            .with_throw_on_timeout(config.throw_on_timeout)
            .with_install(config.install);
        match config.force_activate_after_ms {
            Some(ms) => options.with_force_activate_after(Duration::from_millis(ms)),
            None => options,
        }
    }
}

/// Top-level locator configuration.
///
/// # Examples
///
/// ```
/// use ferrous_locator::{LocatorConfig, ServiceKind};
/// use std::time::Duration;
///
/// let config = LocatorConfig::from_json(r#"{
///     "bindings": {
///         "logger": { "provider": "acme.core", "entry_point": "acme.logger.get" }
///     },
///     "wait": { "timeout_ms": 2000 }
/// }"#).unwrap();
///
/// assert_eq!(config.catalog().provider_of(ServiceKind::Logger).unwrap().as_str(), "acme.core");
/// assert!(!config.catalog().supports(ServiceKind::Telemetry));
///
/// let wait = config.wait_options();
/// assert_eq!(wait.timeout, Duration::from_secs(2));
/// assert_eq!(wait.poll_interval, Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocatorConfig {
    /// Kind bindings; defaults to the built-in catalog
    pub bindings: ServiceCatalog,
    /// Default wait options for `get_with_wait`
    pub wait: WaitConfig,
}

impl LocatorConfig {
    /// Parses a JSON document. Missing sections take their defaults.
    pub fn from_json(json: &str) -> LocatorResult<Self> {
        serde_json::from_str(json)
            .map_err(|err| LocatorError::InvalidConfiguration(format!("malformed locator config: {}", err)))
    }

    /// Applies `<PREFIX>_WAIT_*` environment overrides.
    ///
    /// Recognized suffixes are `TIMEOUT_MS`, `POLL_INTERVAL_MS`,
    /// `FORCE_ACTIVATE`, `FORCE_ACTIVATE_AFTER_MS`, `THROW_ON_TIMEOUT` and
    /// `INSTALL`. Unset variables
    /// leave the value alone; unparseable ones are an error.
    pub fn with_env_overrides(mut self, prefix: &str) -> LocatorResult<Self> {
        let prefix = prefix.to_uppercase();
        let wait = &mut self.wait;
        override_from_env(&prefix, "WAIT_TIMEOUT_MS", &mut wait.timeout_ms)?;
        override_from_env(&prefix, "WAIT_POLL_INTERVAL_MS", &mut wait.poll_interval_ms)?;
        override_from_env(&prefix, "WAIT_FORCE_ACTIVATE", &mut wait.force_activate)?;
        if let Some(ms) = env_value(&prefix, "WAIT_FORCE_ACTIVATE_AFTER_MS")? {
            wait.force_activate_after_ms = Some(ms);
        }
        override_from_env(&prefix, "WAIT_THROW_ON_TIMEOUT", &mut wait.throw_on_timeout)?;
        override_from_env(&prefix, "WAIT_INSTALL", &mut wait.install)?;
        Ok(self)
    }

    /// The configured bindings.
    pub fn catalog(&self) -> ServiceCatalog {
        self.bindings.clone()
    }

    /// The configured wait settings as runtime options. They are validated
    /// when a wait starts, not here.
    pub fn wait_options(&self) -> WaitOptions {
        self.wait.into()
    }
}

fn override_from_env<T: FromStr>(prefix: &str, key: &str, target: &mut T) -> LocatorResult<()> {
    if let Some(value) = env_value(prefix, key)? {
        *target = value;
    }
    Ok(())
}

fn env_value<T: FromStr>(prefix: &str, key: &str) -> LocatorResult<Option<T>> {
    let name = format!("{}_{}", prefix, key);
    match env::var(&name) {
        Ok(raw) => raw.trim().parse().map(Some).map_err(|_| {
            LocatorError::InvalidConfiguration(format!("environment variable {} has an invalid value: {}", name, raw))
        }),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(env::VarError::NotUnicode(_)) => Err(LocatorError::InvalidConfiguration(format!(
            "environment variable {} is not valid unicode",
            name
        ))),
    }
}
