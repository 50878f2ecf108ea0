//! Mesh transport port: the connection to the physical lighting network.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use meshbridge_domain::command::DetailedCommand;
use meshbridge_domain::device::DeviceSet;
use meshbridge_domain::error::BridgeError;
use meshbridge_domain::id::{DeviceId, SceneId};
use meshbridge_domain::site::CryptoKey;

/// Something the mesh transport reports.
#[derive(Debug, Clone, PartialEq)]
pub enum MeshEvent {
    /// A connection attempt failed. The transport stays idle until
    /// [`MeshTransport::init`] is called again.
    ConnectFailed,
    /// The mesh handshake succeeded.
    Authenticated,
    /// A device reported a new state. `state` is relayed to the bus verbatim.
    StateChanged {
        device_id: DeviceId,
        state: serde_json::Value,
    },
    /// A scene was triggered from the mesh side (wall switch, app, …).
    SceneTriggered {
        device_id: DeviceId,
        scene_id: SceneId,
    },
}

/// Channel through which a transport reports [`MeshEvent`]s.
pub type MeshEventSender = mpsc::Sender<MeshEvent>;

/// Everything a transport needs to join the mesh.
#[derive(Debug, Clone)]
pub struct MeshParams {
    pub crypto_key: CryptoKey,
    pub devices: DeviceSet,
    /// How long a single connection attempt may take.
    pub connection_timeout: Duration,
    /// Pause between two writes of the outgoing command queue.
    pub write_queue_wait: Duration,
}

/// An established (or establishing) mesh transport.
pub trait MeshTransport {
    /// Start a connection attempt.
    ///
    /// The outcome is reported through the event channel
    /// ([`MeshEvent::Authenticated`] or [`MeshEvent::ConnectFailed`]).
    /// An `Err` means the attempt could not even be started.
    fn init(&self) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Trigger the scene backed by `device_id`.
    fn trigger_scene(
        &self,
        device_id: DeviceId,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Turn a device on, applying the extra fields of `command`.
    fn turn_on(
        &self,
        device_id: DeviceId,
        command: &DetailedCommand,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Turn a device off.
    fn turn_off(
        &self,
        device_id: DeviceId,
        command: &DetailedCommand,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}

impl<T: MeshTransport + Send + Sync> MeshTransport for Arc<T> {
    fn init(&self) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).init()
    }

    fn trigger_scene(
        &self,
        device_id: DeviceId,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).trigger_scene(device_id)
    }

    fn turn_on(
        &self,
        device_id: DeviceId,
        command: &DetailedCommand,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).turn_on(device_id, command)
    }

    fn turn_off(
        &self,
        device_id: DeviceId,
        command: &DetailedCommand,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).turn_off(device_id, command)
    }
}

/// Creates a [`MeshTransport`] once the crypto key and devices are known.
pub trait MeshConnector {
    type Transport: MeshTransport;

    /// Build the transport. This must not start connecting yet; the bridge
    /// calls [`MeshTransport::init`] itself.
    ///
    /// # Errors
    ///
    /// Returns an error when the transport cannot be constructed (for
    /// instance no radio adapter is available).
    fn connect(
        &self,
        params: MeshParams,
        events: MeshEventSender,
    ) -> Result<Self::Transport, BridgeError>;
}

impl<T: MeshConnector> MeshConnector for Arc<T> {
    type Transport = T::Transport;

    fn connect(
        &self,
        params: MeshParams,
        events: MeshEventSender,
    ) -> Result<Self::Transport, BridgeError> {
        (**self).connect(params, events)
    }
}
