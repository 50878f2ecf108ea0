//! Command translator: turns a bus command into a mesh dispatch decision.
//!
//! Scenes are triggered regardless of the payload. Bare switch commands are
//! widened into a structured command and produce an optimistic state echo,
//! because switches never report their state back through the mesh.
//! Structured commands pass through untouched.

use serde_json::json;

use meshbridge_domain::command::{Command, DetailedCommand, SwitchState};
use meshbridge_domain::device::Device;
use meshbridge_domain::id::DeviceId;

/// What to send to the mesh for one bus command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    TriggerScene(DeviceId),
    TurnOn(DeviceId, DetailedCommand),
    TurnOff(DeviceId, DetailedCommand),
}

/// State published to the bus right away, before the mesh confirms anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateEcho {
    pub device_id: DeviceId,
    pub state: SwitchState,
}

impl StateEcho {
    /// Bus payload: `{"state": 1}` for on, `{"state": 0}` for off.
    #[must_use]
    pub fn payload(&self) -> serde_json::Value {
        json!({ "state": self.state.as_flag() })
    }
}

/// Outcome of [`translate`]. When present, `echo` is published before
/// `dispatch` is executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub echo: Option<StateEcho>,
    pub dispatch: Dispatch,
}

/// Resolve a command addressed to `device`.
#[must_use]
pub fn translate(device: &Device, command: Command) -> Translation {
    if device.is_scene() {
        return Translation {
            echo: None,
            dispatch: Dispatch::TriggerScene(device.id),
        };
    }

    let (command, echo) = match command {
        Command::Switch(switch) => {
            let echo = StateEcho {
                device_id: device.id,
                state: switch.switch_state(),
            };
            (DetailedCommand::with_state(switch.state), Some(echo))
        }
        Command::Detailed(detailed) => (detailed, None),
    };

    let dispatch = match command.switch_state() {
        SwitchState::On => Dispatch::TurnOn(device.id, command),
        SwitchState::Off => Dispatch::TurnOff(device.id, command),
    };

    Translation { echo, dispatch }
}
