//! MQTT adapter error types.

use meshbridge_domain::command::CommandParseError;
use meshbridge_domain::error::BridgeError;

/// Errors specific to the MQTT adapter.
#[derive(Debug, thiserror::Error)]
pub enum MqttError {
    /// `start()` was called twice.
    #[error("MQTT client already started")]
    AlreadyStarted,

    /// The rumqttc client returned an error.
    #[error("MQTT client error")]
    Client(#[from] rumqttc::ClientError),

    /// Failed to encode an outgoing payload as JSON.
    #[error("failed to encode MQTT payload")]
    PayloadEncode(#[source] serde_json::Error),

    /// An incoming command could not be decoded.
    #[error("failed to decode command on {topic}")]
    Command {
        topic: String,
        #[source]
        source: CommandParseError,
    },
}

impl MqttError {
    /// Convert into a [`BridgeError::Bus`] for propagation across port
    /// boundaries.
    #[must_use]
    pub fn into_domain(self) -> BridgeError {
        BridgeError::Bus(Box::new(self))
    }
}

impl From<MqttError> for BridgeError {
    fn from(err: MqttError) -> Self {
        err.into_domain()
    }
}
