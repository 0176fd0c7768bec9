//! Configuration types for the sim-bridge crate
//!
//! [`BridgeConfig`] controls how the bridge talks to the simulator: the name
//! it connects under, the platform message it is notified with, how often it
//! polls and what it does when the simulator quits. [`BridgeSettings`] pairs
//! it with the property registry so a whole bridge can be loaded from one
//! JSON document.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use sim_api::ObjectSelector;

use crate::error::ConfigError;
use crate::registry::{PropertyRegistry, TrackedProperty};

/// Platform message the simulator posts when inbound messages are waiting
pub const DEFAULT_NOTIFICATION_CODE: u32 = 0x0402;

/// Application name the bridge connects under
pub const DEFAULT_APP_NAME: &str = "simlink";

/// Lowest code of the user-defined platform message range
const USER_MESSAGE_MIN: u32 = 0x0400;

/// Highest code of the user-defined platform message range
const USER_MESSAGE_MAX: u32 = 0x7FFF;

/// Configuration for the telemetry bridge
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// Name reported to the simulator at connect time
    /// Default: "simlink"
    pub app_name: String,

    /// Platform message code reserved for "messages waiting"
    /// Default: 0x0402
    pub notification_code: u32,

    /// Cadence of connect attempts and data requests
    /// Default: 1 second
    pub poll_interval: Duration,

    /// Release the connection as soon as the simulator quits, instead of on
    /// the next failed request
    /// Default: true
    pub release_on_quit: bool,

    /// Object every data request targets
    /// Default: the user aircraft, radius 0
    pub object_selector: ObjectSelector,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            notification_code: DEFAULT_NOTIFICATION_CODE,
            poll_interval: Duration::from_secs(1),
            release_on_quit: true,
            object_selector: ObjectSelector::user(),
        }
    }
}

impl BridgeConfig {
    /// Create a new BridgeConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a BridgeConfig that polls four times a second
    pub fn fast_polling() -> Self {
        Self {
            poll_interval: Duration::from_millis(250),
            ..Default::default()
        }
    }

    /// Validate the configuration and return any issues
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.app_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "Application name must not be empty".to_string(),
            ));
        }

        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "Poll interval must be greater than 0".to_string(),
            ));
        }

        if !(USER_MESSAGE_MIN..=USER_MESSAGE_MAX).contains(&self.notification_code) {
            return Err(ConfigError::Invalid(format!(
                "Notification code {:#06x} is outside the user message range {:#06x}..={:#06x}",
                self.notification_code, USER_MESSAGE_MIN, USER_MESSAGE_MAX
            )));
        }

        Ok(())
    }

    /// Parse a configuration from JSON. Missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(json)?;
        let config = raw.into_config();
        config.validate()?;
        Ok(config)
    }

    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    pub fn with_notification_code(mut self, code: u32) -> Self {
        self.notification_code = code;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_release_on_quit(mut self, release: bool) -> Self {
        self.release_on_quit = release;
        self
    }

    pub fn with_object_selector(mut self, selector: ObjectSelector) -> Self {
        self.object_selector = selector;
        self
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    app_name: Option<String>,
    notification_code: Option<u32>,
    poll_interval_ms: Option<u64>,
    release_on_quit: Option<bool>,
    object_selector: Option<ObjectSelector>,
}

impl RawConfig {
    fn into_config(self) -> BridgeConfig {
        let defaults = BridgeConfig::default();
        BridgeConfig {
            app_name: self.app_name.unwrap_or(defaults.app_name),
            notification_code: self.notification_code.unwrap_or(defaults.notification_code),
            poll_interval: self
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.poll_interval),
            release_on_quit: self.release_on_quit.unwrap_or(defaults.release_on_quit),
            object_selector: self.object_selector.unwrap_or(defaults.object_selector),
        }
    }
}

/// Bridge configuration together with the properties it tracks.
#[derive(Debug, Clone)]
pub struct BridgeSettings {
    pub config: BridgeConfig,
    pub registry: PropertyRegistry,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    #[serde(default)]
    bridge: RawConfig,
    properties: Option<Vec<TrackedProperty>>,
}

impl BridgeSettings {
    /// Parse settings of the form `{"bridge": {...}, "properties": [...]}`.
    ///
    /// Both sections are optional; a missing `properties` list means the
    /// default aircraft set.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let raw: RawSettings = serde_json::from_str(json)?;

        let config = raw.bridge.into_config();
        config.validate()?;

        let registry = match raw.properties {
            Some(properties) => PropertyRegistry::new(properties)?,
            None => PropertyRegistry::default_aircraft(),
        };

        Ok(Self { config, registry })
    }

    /// Read and parse a settings file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            config: BridgeConfig::default(),
            registry: PropertyRegistry::default_aircraft(),
        }
    }
}
