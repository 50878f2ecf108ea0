//! MQTT bus configuration.

use serde::Deserialize;

/// Configuration for the MQTT bus client.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    /// MQTT broker hostname or IP address.
    pub broker_host: String,
    /// MQTT broker port.
    pub broker_port: u16,
    /// Broker user, if the broker requires authentication.
    pub username: Option<String>,
    /// Broker password, used together with `username`.
    pub password: Option<String>,
    /// MQTT client identifier.
    pub client_id: String,
    /// Prefix under which discovery configs are published.
    pub discovery_prefix: String,
    /// Node id, also the root of state, command and scene topics.
    pub node_id: String,
    /// Keep-alive interval in seconds.
    pub keep_alive_secs: u16,
    /// Capacity of the outgoing request queue.
    pub request_capacity: usize,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            broker_host: "localhost".to_string(),
            broker_port: 1883,
            username: None,
            password: None,
            client_id: "meshbridge".to_string(),
            discovery_prefix: "homeassistant".to_string(),
            node_id: "meshbridge".to_string(),
            keep_alive_secs: 30,
            request_capacity: 64,
        }
    }
}

impl MqttConfig {
    /// Broker credentials, only when both parts are set and the user is not empty.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.username.as_deref(), self.password.as_deref()) {
            (Some(user), password) if !user.is_empty() => Some((user, password.unwrap_or(""))),
            _ => None,
        }
    }
}
