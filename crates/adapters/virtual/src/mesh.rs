//! Virtual lighting mesh.
//!
//! Commands are applied instantly and reported back the way a real mesh
//! reports a device changing state. Switches are write-only and never report.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use serde_json::{Value, json};

use meshbridge_app::ports::{MeshConnector, MeshEvent, MeshEventSender, MeshParams, MeshTransport};
use meshbridge_domain::command::{DetailedCommand, SwitchState};
use meshbridge_domain::device::{Device, DeviceKind, DeviceSet};
use meshbridge_domain::error::BridgeError;
use meshbridge_domain::id::{DeviceId, SceneId};

use crate::error::VirtualError;

/// Brightness reported when a dimmable light is turned on without one.
const FULL_BRIGHTNESS: u64 = 255;

/// Builds [`VirtualMesh`] transports.
#[derive(Debug, Clone, Default)]
pub struct VirtualMeshConnector {
    fail_first_attempts: u32,
}

impl VirtualMeshConnector {
    /// A connector whose meshes refuse the first `attempts` connections.
    #[must_use]
    pub fn new(fail_first_attempts: u32) -> Self {
        Self {
            fail_first_attempts,
        }
    }
}

impl MeshConnector for VirtualMeshConnector {
    type Transport = VirtualMesh;

    fn connect(&self, params: MeshParams, events: MeshEventSender) -> Result<VirtualMesh, BridgeError> {
        tracing::debug!(
            devices = params.devices.len(),
            timeout_ms = params.connection_timeout.as_millis(),
            "building virtual mesh"
        );
        Ok(VirtualMesh {
            devices: params.devices,
            events,
            write_delay: params.write_queue_wait,
            fail_first_attempts: self.fail_first_attempts,
            attempts: AtomicU32::new(0),
        })
    }
}

/// In-process [`MeshTransport`].
pub struct VirtualMesh {
    devices: DeviceSet,
    events: MeshEventSender,
    write_delay: Duration,
    fail_first_attempts: u32,
    attempts: AtomicU32,
}

impl VirtualMesh {
    /// Number of `init` calls so far.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    async fn emit(&self, event: MeshEvent) -> Result<(), BridgeError> {
        self.events
            .send(event)
            .await
            .map_err(|_| VirtualError::EventsClosed.into())
    }

    async fn write(&self, device: &Device, state: SwitchState, command: &DetailedCommand) -> Result<(), BridgeError> {
        tokio::time::sleep(self.write_delay).await;
        tracing::debug!(device_id = %device.id, %state, "virtual mesh write");
        match reported_state(device, state, command) {
            Some(state) => {
                self.emit(MeshEvent::StateChanged {
                    device_id: device.id,
                    state,
                })
                .await
            }
            None => Ok(()),
        }
    }
}

/// The state a device reports after a write, `None` for devices that do not
/// report.
fn reported_state(device: &Device, state: SwitchState, command: &DetailedCommand) -> Option<Value> {
    if device.kind == DeviceKind::Switch {
        return None;
    }
    if !device.dimmable {
        return Some(json!({ "state": state.as_str() }));
    }
    let brightness = match state {
        SwitchState::On => command
            .field("brightness")
            .and_then(Value::as_u64)
            .map_or(FULL_BRIGHTNESS, |level| level.min(FULL_BRIGHTNESS)),
        SwitchState::Off => 0,
    };
    Some(json!({ "state": state.as_str(), "brightness": brightness }))
}

impl MeshTransport for VirtualMesh {
    async fn init(&self) -> Result<(), BridgeError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt <= self.fail_first_attempts {
            tracing::debug!(attempt, "virtual mesh refusing connection");
            return self.emit(MeshEvent::ConnectFailed).await;
        }
        tracing::debug!(attempt, "virtual mesh authenticated");
        self.emit(MeshEvent::Authenticated).await
    }

    async fn trigger_scene(&self, device_id: DeviceId) -> Result<(), BridgeError> {
        let device = self.devices.require(device_id)?;
        self.emit(MeshEvent::SceneTriggered {
            device_id: device.id,
            scene_id: SceneId::new(device.id.value()),
        })
        .await
    }

    async fn turn_on(&self, device_id: DeviceId, command: &DetailedCommand) -> Result<(), BridgeError> {
        let device = self.devices.require(device_id)?;
        self.write(device, SwitchState::On, command).await
    }

    async fn turn_off(&self, device_id: DeviceId, command: &DetailedCommand) -> Result<(), BridgeError> {
        let device = self.devices.require(device_id)?;
        self.write(device, SwitchState::Off, command).await
    }
}

#[cfg(test)]
mod tests {
    use meshbridge_domain::site::CryptoKey;
    use tokio::sync::mpsc;

    use super::*;

    fn devices() -> DeviceSet {
        let device = |id: u32, name: &str, kind: DeviceKind, dimmable: bool| {
            Device::builder()
                .id(DeviceId::new(id))
                .name(name)
                .kind(kind)
                .dimmable(dimmable)
                .build()
                .unwrap()
        };
        DeviceSet::new([
            device(1, "Hallway", DeviceKind::Light, true),
            device(2, "Garden", DeviceKind::Light, false),
            device(3, "Porch", DeviceKind::Switch, false),
            device(4, "Evening", DeviceKind::Scene, false),
        ])
        .unwrap()
    }

    fn connect(fail_first: u32) -> (VirtualMesh, mpsc::Receiver<MeshEvent>) {
        let (tx, rx) = mpsc::channel(16);
        let params = MeshParams {
            crypto_key: CryptoKey::new("key"),
            devices: devices(),
            connection_timeout: Duration::from_secs(2),
            write_queue_wait: Duration::from_millis(400),
        };
        let mesh = VirtualMeshConnector::new(fail_first).connect(params, tx).unwrap();
        (mesh, rx)
    }

    #[tokio::test]
    async fn should_authenticate_on_first_attempt_by_default() {
        let (mesh, mut rx) = connect(0);
        mesh.init().await.unwrap();
        assert_eq!(rx.recv().await, Some(MeshEvent::Authenticated));
        assert_eq!(mesh.attempts(), 1);
    }

    #[tokio::test]
    async fn should_fail_configured_number_of_attempts() {
        let (mesh, mut rx) = connect(2);
        for _ in 0..3 {
            mesh.init().await.unwrap();
        }
        assert_eq!(rx.recv().await, Some(MeshEvent::ConnectFailed));
        assert_eq!(rx.recv().await, Some(MeshEvent::ConnectFailed));
        assert_eq!(rx.recv().await, Some(MeshEvent::Authenticated));
    }

    #[tokio::test(start_paused = true)]
    async fn should_report_brightness_of_dimmable_light() {
        let (mesh, mut rx) = connect(0);
        let mut command = serde_json::Map::new();
        command.insert("state".to_string(), json!("ON"));
        command.insert("brightness".to_string(), json!(120));
        mesh.turn_on(DeviceId::new(1), &DetailedCommand::from_object(command))
            .await
            .unwrap();
        assert_eq!(
            rx.recv().await,
            Some(MeshEvent::StateChanged {
                device_id: DeviceId::new(1),
                state: json!({ "state": "ON", "brightness": 120 }),
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_default_to_full_brightness() {
        let (mesh, mut rx) = connect(0);
        mesh.turn_on(DeviceId::new(1), &DetailedCommand::with_state("ON"))
            .await
            .unwrap();
        let Some(MeshEvent::StateChanged { state, .. }) = rx.recv().await else {
            panic!("expected a state change");
        };
        assert_eq!(state["brightness"], 255);
    }

    #[tokio::test(start_paused = true)]
    async fn should_report_plain_state_of_non_dimmable_light() {
        let (mesh, mut rx) = connect(0);
        mesh.turn_off(DeviceId::new(2), &DetailedCommand::with_state("OFF"))
            .await
            .unwrap();
        assert_eq!(
            rx.recv().await,
            Some(MeshEvent::StateChanged {
                device_id: DeviceId::new(2),
                state: json!({ "state": "OFF" }),
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_not_report_switch_writes() {
        let (mesh, mut rx) = connect(0);
        mesh.turn_on(DeviceId::new(3), &DetailedCommand::with_state("ON"))
            .await
            .unwrap();
        drop(mesh);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn should_wait_between_writes() {
        let (mesh, _rx) = connect(0);
        let start = tokio::time::Instant::now();
        mesh.turn_on(DeviceId::new(2), &DetailedCommand::with_state("ON"))
            .await
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(400));
    }

    #[tokio::test]
    async fn should_emit_scene_trigger() {
        let (mesh, mut rx) = connect(0);
        mesh.trigger_scene(DeviceId::new(4)).await.unwrap();
        assert_eq!(
            rx.recv().await,
            Some(MeshEvent::SceneTriggered {
                device_id: DeviceId::new(4),
                scene_id: SceneId::new(4),
            })
        );
    }

    #[tokio::test]
    async fn should_reject_unknown_device() {
        let (mesh, _rx) = connect(0);
        let err = mesh
            .turn_on(DeviceId::new(99), &DetailedCommand::with_state("ON"))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::NotFound(_)));
    }

    #[tokio::test]
    async fn should_fail_when_receiver_is_gone() {
        let (mesh, rx) = connect(0);
        drop(rx);
        let err = mesh.init().await.unwrap_err();
        assert!(matches!(err, BridgeError::Mesh(_)));
    }
}
