//! Bus client port: the home-automation publish/subscribe connection.

use std::future::Future;
use std::sync::Arc;

use meshbridge_domain::command::Command;
use meshbridge_domain::device::DeviceSet;
use meshbridge_domain::error::BridgeError;
use meshbridge_domain::id::{DeviceId, SceneId};

/// Something the bus client reports.
#[derive(Debug, Clone, PartialEq)]
pub enum BusEvent {
    /// The client is connected (or reconnected) and ready to publish.
    Connected,
    /// The automation system asked for a device to change.
    Command {
        device_id: DeviceId,
        command: Command,
    },
}

/// Client of the automation bus.
///
/// Implementations report [`BusEvent`]s through a channel handed to them at
/// construction time.
pub trait BusClient {
    /// Connect to the broker. Returns once the connection task is running;
    /// readiness is signalled by [`BusEvent::Connected`].
    fn start(&self) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Announce every device of the site.
    fn discover(&self, devices: &DeviceSet) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Publish the state of a device.
    fn update_state(
        &self,
        device_id: DeviceId,
        state: serde_json::Value,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Notify that a scene was triggered.
    fn scene_triggered(
        &self,
        scene_id: SceneId,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}

impl<T: BusClient + Send + Sync> BusClient for Arc<T> {
    fn start(&self) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).start()
    }

    fn discover(&self, devices: &DeviceSet) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).discover(devices)
    }

    fn update_state(
        &self,
        device_id: DeviceId,
        state: serde_json::Value,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).update_state(device_id, state)
    }

    fn scene_triggered(
        &self,
        scene_id: SceneId,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).scene_triggered(scene_id)
    }
}
