//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `meshbridge.toml` in the working directory. Every field has a
//! default so the file is optional, but the cloud account must be set either
//! in the file or through the environment. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use meshbridge_adapter_mqtt::MqttConfig;
use meshbridge_adapter_virtual::{Credentials, SimulationConfig};
use meshbridge_app::services::bootstrap::{BootstrapSettings, FailurePolicy};
use meshbridge_app::services::supervisor::RetryPolicy;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Cloud account and site selection.
    pub cloud: CloudConfig,
    /// MQTT bus settings.
    pub mqtt: MqttConfig,
    /// Mesh transport timings.
    pub mesh: MeshConfig,
    /// What to do when the startup chain fails.
    pub bootstrap: BootstrapConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Site served by the virtual cloud and mesh.
    pub simulation: SimulationConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// Site id or title.
    pub site: String,
    pub username: String,
    pub password: String,
    /// Expose rooms as dimmable lights.
    pub include_rooms_as_lights: bool,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    pub connection_timeout_secs: u64,
    pub write_queue_wait_ms: u64,
    /// Pause before reconnecting after a failed connection attempt.
    pub reconnect_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnFailure {
    #[default]
    FailFast,
    Retry,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub on_failure: OnFailure,
    pub retry_delay_ms: u64,
    /// `0` retries forever.
    pub max_attempts: u32,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `meshbridge.toml` (if present), apply
    /// environment-variable overrides and validate the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("meshbridge.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(val) = lookup("MESHBRIDGE_SITE") {
            self.cloud.site = val;
        }
        if let Some(val) = lookup("MESHBRIDGE_USERNAME") {
            self.cloud.username = val;
        }
        if let Some(val) = lookup("MESHBRIDGE_PASSWORD") {
            self.cloud.password = val;
        }
        if let Some(val) = lookup("MESHBRIDGE_MQTT_HOST") {
            self.mqtt.broker_host = val;
        }
        if let Some(val) = lookup("MESHBRIDGE_MQTT_PORT")
            && let Ok(port) = val.parse()
        {
            self.mqtt.broker_port = port;
        }
        if let Some(val) = lookup("MESHBRIDGE_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = lookup("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cloud.site.trim().is_empty() {
            return Err(ConfigError::Validation("cloud.site must be set".to_string()));
        }
        if self.cloud.username.trim().is_empty() {
            return Err(ConfigError::Validation(
                "cloud.username must be set".to_string(),
            ));
        }
        if self.mqtt.broker_port == 0 {
            return Err(ConfigError::Validation(
                "mqtt.broker_port must be non-zero".to_string(),
            ));
        }
        if self.mesh.connection_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "mesh.connection_timeout_secs must be non-zero".to_string(),
            ));
        }
        if self.mesh.reconnect_delay_ms == 0 {
            return Err(ConfigError::Validation(
                "mesh.reconnect_delay_ms must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Inputs of the bootstrap sequence.
    #[must_use]
    pub fn bootstrap_settings(&self) -> BootstrapSettings {
        let on_failure = match self.bootstrap.on_failure {
            OnFailure::FailFast => FailurePolicy::FailFast,
            OnFailure::Retry => {
                let delay = Duration::from_millis(self.bootstrap.retry_delay_ms);
                FailurePolicy::Retry(match self.bootstrap.max_attempts {
                    0 => RetryPolicy::fixed(delay),
                    max => RetryPolicy::bounded(delay, max),
                })
            }
        };
        BootstrapSettings {
            site: self.cloud.site.trim().to_string(),
            connection_timeout: Duration::from_secs(self.mesh.connection_timeout_secs),
            write_queue_wait: Duration::from_millis(self.mesh.write_queue_wait_ms),
            reconnect: RetryPolicy::fixed(Duration::from_millis(self.mesh.reconnect_delay_ms)),
            on_failure,
        }
    }

    /// Account credentials presented to the cloud.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.cloud.username.clone(),
            password: self.cloud.password.clone(),
        }
    }
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            site: "Home".to_string(),
            username: String::new(),
            password: String::new(),
            include_rooms_as_lights: false,
        }
    }
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            connection_timeout_secs: 2,
            write_queue_wait_ms: 400,
            reconnect_delay_ms: 10_000,
        }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            on_failure: OnFailure::FailFast,
            retry_delay_ms: 10_000,
            max_attempts: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "meshbridged=info,meshbridge=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
