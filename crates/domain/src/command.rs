//! Command: a request from the automation bus to change a device.
//!
//! The bus speaks two shapes: switches send a bare `ON`/`OFF` string, lights
//! send a JSON object with a `state` field and any number of extra fields
//! (brightness, color, transition, …). Both are resolved once, at the bus
//! boundary, into [`Command`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The literal state value that means "on". Anything else means off.
pub const STATE_ON: &str = "ON";
pub const STATE_OFF: &str = "OFF";

/// Resolved on/off intent of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchState {
    On,
    Off,
}

impl SwitchState {
    /// Resolve a raw state value. Only the exact string `"ON"` is on.
    #[must_use]
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::String(text)) => Self::from_text(text),
            _ => Self::Off,
        }
    }

    #[must_use]
    pub fn from_text(text: &str) -> Self {
        if text == STATE_ON { Self::On } else { Self::Off }
    }

    /// Numeric flag used in optimistic state echoes (`1` on, `0` off).
    #[must_use]
    pub fn as_flag(self) -> u8 {
        match self {
            Self::On => 1,
            Self::Off => 0,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::On => STATE_ON,
            Self::Off => STATE_OFF,
        }
    }
}

impl std::fmt::Display for SwitchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Legacy switch command: a bare state string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SwitchCommand {
    pub state: String,
}

impl SwitchCommand {
    #[must_use]
    pub fn new(state: impl Into<String>) -> Self {
        Self {
            state: state.into(),
        }
    }

    #[must_use]
    pub fn switch_state(&self) -> SwitchState {
        SwitchState::from_text(&self.state)
    }
}

/// Structured command: a `state` field plus arbitrary extra fields.
///
/// The extra fields are carried untouched. Serializing reproduces exactly the
/// fields that were received; a missing `state` stays missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedCommand {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DetailedCommand {
    /// A command holding nothing but `state`.
    #[must_use]
    pub fn with_state(state: impl Into<String>) -> Self {
        Self {
            state: Some(Value::String(state.into())),
            extra: Map::new(),
        }
    }

    /// Split a JSON object into `state` and the remaining fields.
    #[must_use]
    pub fn from_object(mut fields: Map<String, Value>) -> Self {
        let state = fields.remove("state");
        Self {
            state,
            extra: fields,
        }
    }

    #[must_use]
    pub fn switch_state(&self) -> SwitchState {
        SwitchState::from_value(self.state.as_ref())
    }

    /// Read an extra field (e.g. `"brightness"`).
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

/// A command received from the bus, in one of its two shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Command {
    Switch(SwitchCommand),
    Detailed(DetailedCommand),
}

impl Command {
    /// Decode a raw bus payload.
    ///
    /// A JSON object becomes [`Command::Detailed`]. Anything else (bare text
    /// such as `ON`, a JSON string, a number) is treated as a switch command
    /// holding the trimmed text.
    ///
    /// # Errors
    ///
    /// Returns [`CommandParseError`] when the payload is empty or not UTF-8.
    pub fn from_payload(payload: &[u8]) -> Result<Self, CommandParseError> {
        let text = std::str::from_utf8(payload).map_err(CommandParseError::InvalidUtf8)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(CommandParseError::Empty);
        }
        let command = match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(fields)) => Self::Detailed(DetailedCommand::from_object(fields)),
            Ok(Value::String(state)) => Self::Switch(SwitchCommand::new(state)),
            _ => Self::Switch(SwitchCommand::new(text)),
        };
        Ok(command)
    }

    #[must_use]
    pub fn switch_state(&self) -> SwitchState {
        match self {
            Self::Switch(cmd) => cmd.switch_state(),
            Self::Detailed(cmd) => cmd.switch_state(),
        }
    }
}

/// Why a bus payload could not be decoded into a [`Command`].
#[derive(Debug, thiserror::Error)]
pub enum CommandParseError {
    #[error("command payload is empty")]
    Empty,

    #[error("command payload is not valid UTF-8")]
    InvalidUtf8(#[source] std::str::Utf8Error),
}
