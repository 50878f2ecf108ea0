//! State relay: forwards mesh events to the bus and bus commands to the mesh.
//!
//! The relay holds no state of its own beyond the immutable device set.
//! Failures of the collaborators are logged and dropped; nothing is retried
//! here.

use meshbridge_domain::command::Command;
use meshbridge_domain::device::DeviceSet;
use meshbridge_domain::id::DeviceId;

use crate::ports::{BusClient, BusEvent, MeshEvent, MeshTransport};
use crate::services::translator::{self, Dispatch, Translation};

/// Stateless two-way forwarder between a mesh transport and a bus client.
pub struct StateRelay<M, B> {
    mesh: M,
    bus: B,
    devices: DeviceSet,
}

impl<M, B> StateRelay<M, B>
where
    M: MeshTransport,
    B: BusClient,
{
    pub fn new(mesh: M, bus: B, devices: DeviceSet) -> Self {
        Self { mesh, bus, devices }
    }

    pub fn mesh(&self) -> &M {
        &self.mesh
    }

    pub fn devices(&self) -> &DeviceSet {
        &self.devices
    }

    /// Forward a mesh state or scene event to the bus.
    ///
    /// Connection events are the supervisor's business and are ignored here.
    pub async fn forward_mesh_event(&self, event: MeshEvent) {
        match event {
            MeshEvent::StateChanged { device_id, state } => {
                tracing::debug!(%device_id, %state, "relaying mesh state to bus");
                if let Err(err) = self.bus.update_state(device_id, state).await {
                    tracing::warn!(%device_id, error = %err, "unable to publish device state");
                }
            }
            MeshEvent::SceneTriggered {
                device_id,
                scene_id,
            } => {
                tracing::debug!(%device_id, %scene_id, "relaying scene trigger to bus");
                if let Err(err) = self.bus.scene_triggered(scene_id).await {
                    tracing::warn!(%scene_id, error = %err, "unable to publish scene trigger");
                }
            }
            MeshEvent::ConnectFailed | MeshEvent::Authenticated => {}
        }
    }

    /// React to a bus event: announce devices on connect, dispatch commands.
    pub async fn handle_bus_event(&self, event: BusEvent) {
        match event {
            BusEvent::Connected => {
                tracing::info!(devices = self.devices.len(), "connected to bus, publishing discovery");
                if let Err(err) = self.bus.discover(&self.devices).await {
                    tracing::warn!(error = %err, "unable to publish device discovery");
                }
            }
            BusEvent::Command { device_id, command } => {
                self.handle_command(device_id, command).await;
            }
        }
    }

    /// Translate and execute one command coming from the bus.
    #[tracing::instrument(skip(self, command))]
    pub async fn handle_command(&self, device_id: DeviceId, command: Command) {
        let device = match self.devices.require(device_id) {
            Ok(device) => device,
            Err(err) => {
                tracing::warn!(error = %err, "dropping command for unknown device");
                return;
            }
        };
        let translation = translator::translate(device, command);
        self.execute(translation).await;
    }

    /// Publish the optimistic echo (if any), then send the dispatch to the mesh.
    pub async fn execute(&self, translation: Translation) {
        let Translation { echo, dispatch } = translation;

        if let Some(echo) = echo {
            if let Err(err) = self.bus.update_state(echo.device_id, echo.payload()).await {
                tracing::warn!(device_id = %echo.device_id, error = %err, "unable to echo switch state");
            }
        }

        let result = match &dispatch {
            Dispatch::TriggerScene(device_id) => self.mesh.trigger_scene(*device_id).await,
            Dispatch::TurnOn(device_id, command) => self.mesh.turn_on(*device_id, command).await,
            Dispatch::TurnOff(device_id, command) => self.mesh.turn_off(*device_id, command).await,
        };
        if let Err(err) = result {
            tracing::warn!(?dispatch, error = %err, "mesh dispatch failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use meshbridge_domain::command::{DetailedCommand, SwitchCommand};
    use meshbridge_domain::id::SceneId;

    use crate::testing::{self, BusCall, Call, MeshCall, SpyBus, SpyMesh};

    fn relay() -> (StateRelay<Arc<SpyMesh>, Arc<SpyBus>>, testing::CallLog) {
        let log = testing::CallLog::default();
        let mesh = Arc::new(SpyMesh::new(log.clone()));
        let bus = Arc::new(SpyBus::new(log.clone()));
        (StateRelay::new(mesh, bus, testing::site_devices()), log)
    }

    fn detailed(value: serde_json::Value) -> Command {
        Command::Detailed(serde_json::from_value(value).unwrap())
    }

    #[tokio::test]
    async fn should_echo_before_turning_on_switch_command() {
        let (relay, log) = relay();
        relay
            .handle_bus_event(BusEvent::Command {
                device_id: DeviceId::new(1),
                command: Command::Switch(SwitchCommand::new("ON")),
            })
            .await;

        assert_eq!(
            log.calls(),
            vec![
                Call::Bus(BusCall::UpdateState(DeviceId::new(1), json!({"state": 1}))),
                Call::Mesh(MeshCall::TurnOn(
                    DeviceId::new(1),
                    DetailedCommand::with_state("ON")
                )),
            ]
        );
    }

    #[tokio::test]
    async fn should_echo_zero_before_turning_off_switch_command() {
        let (relay, log) = relay();
        relay
            .handle_command(DeviceId::new(4), Command::Switch(SwitchCommand::new("OFF")))
            .await;

        assert_eq!(
            log.calls(),
            vec![
                Call::Bus(BusCall::UpdateState(DeviceId::new(4), json!({"state": 0}))),
                Call::Mesh(MeshCall::TurnOff(
                    DeviceId::new(4),
                    DetailedCommand::with_state("OFF")
                )),
            ]
        );
    }

    #[tokio::test]
    async fn should_turn_off_with_full_detailed_command_and_no_echo() {
        let (relay, log) = relay();
        relay
            .handle_command(
                DeviceId::new(2),
                detailed(json!({"state": "OFF", "brightness": 10})),
            )
            .await;

        let calls = log.calls();
        assert_eq!(calls.len(), 1);
        let Call::Mesh(MeshCall::TurnOff(id, command)) = &calls[0] else {
            panic!("expected a turn-off call, got {calls:?}");
        };
        assert_eq!(*id, DeviceId::new(2));
        assert_eq!(
            serde_json::to_value(command).unwrap(),
            json!({"state": "OFF", "brightness": 10})
        );
    }

    #[tokio::test]
    async fn should_only_trigger_scene_for_scene_device() {
        let (relay, log) = relay();
        relay
            .handle_command(DeviceId::new(5), Command::Switch(SwitchCommand::new("ON")))
            .await;
        relay
            .handle_command(DeviceId::new(5), detailed(json!({"state": "OFF"})))
            .await;

        assert_eq!(
            log.calls(),
            vec![
                Call::Mesh(MeshCall::TriggerScene(DeviceId::new(5))),
                Call::Mesh(MeshCall::TriggerScene(DeviceId::new(5))),
            ]
        );
    }

    #[tokio::test]
    async fn should_drop_command_for_unknown_device() {
        let (relay, log) = relay();
        relay
            .handle_command(DeviceId::new(99), Command::Switch(SwitchCommand::new("ON")))
            .await;
        assert!(log.calls().is_empty());
    }

    #[tokio::test]
    async fn should_forward_mesh_state_verbatim() {
        let (relay, log) = relay();
        let state = json!({"state": "ON", "brightness": 77});
        relay
            .forward_mesh_event(MeshEvent::StateChanged {
                device_id: DeviceId::new(2),
                state: state.clone(),
            })
            .await;
        assert_eq!(
            log.calls(),
            vec![Call::Bus(BusCall::UpdateState(DeviceId::new(2), state))]
        );
    }

    #[tokio::test]
    async fn should_forward_scene_trigger_to_bus() {
        let (relay, log) = relay();
        relay
            .forward_mesh_event(MeshEvent::SceneTriggered {
                device_id: DeviceId::new(5),
                scene_id: SceneId::new(3),
            })
            .await;
        assert_eq!(
            log.calls(),
            vec![Call::Bus(BusCall::SceneTriggered(SceneId::new(3)))]
        );
    }

    #[tokio::test]
    async fn should_ignore_connection_events() {
        let (relay, log) = relay();
        relay.forward_mesh_event(MeshEvent::ConnectFailed).await;
        relay.forward_mesh_event(MeshEvent::Authenticated).await;
        assert!(log.calls().is_empty());
    }

    #[tokio::test]
    async fn should_publish_discovery_when_bus_connects() {
        let (relay, log) = relay();
        relay.handle_bus_event(BusEvent::Connected).await;
        assert_eq!(log.calls(), vec![Call::Bus(BusCall::Discover(4))]);
    }

    #[tokio::test]
    async fn should_swallow_mesh_dispatch_failure() {
        let (relay, log) = relay();
        relay.mesh().fail_commands();
        relay
            .handle_command(DeviceId::new(2), detailed(json!({"state": "ON"})))
            .await;
        assert_eq!(log.calls().len(), 1);
    }
}
