//! Topic layout of the bus.
//!
//! Discovery configs live under `{prefix}/{component}/{node}/{id}/config`;
//! everything else lives under the node id:
//!
//! | topic                         | direction | retained |
//! |-------------------------------|-----------|----------|
//! | `{node}/{id}/state`           | out       | yes      |
//! | `{node}/{id}/set`             | in        | -        |
//! | `{node}/scene/triggered`      | out       | no       |
//! | `{node}/availability`         | out       | yes      |

use meshbridge_domain::device::{Device, DeviceKind};
use meshbridge_domain::id::DeviceId;

/// Payload published on the availability topic once connected.
pub const ONLINE: &str = "online";
/// Last-will payload of the availability topic.
pub const OFFLINE: &str = "offline";

/// The automation-side kind a device is announced as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Light,
    Switch,
}

impl Component {
    /// Lights, rooms and unknown kinds are lights; switches and scenes are
    /// switches.
    #[must_use]
    pub fn for_kind(kind: &DeviceKind) -> Self {
        match kind {
            DeviceKind::Switch | DeviceKind::Scene => Self::Switch,
            DeviceKind::Light | DeviceKind::Room | DeviceKind::Other(_) => Self::Light,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Switch => "switch",
        }
    }
}

/// Builds and parses the topics of one bridge instance.
#[derive(Debug, Clone)]
pub struct Topics {
    discovery_prefix: String,
    node_id: String,
}

impl Topics {
    #[must_use]
    pub fn new(discovery_prefix: impl Into<String>, node_id: impl Into<String>) -> Self {
        Self {
            discovery_prefix: discovery_prefix.into(),
            node_id: node_id.into(),
        }
    }

    #[must_use]
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    #[must_use]
    pub fn config(&self, device: &Device) -> String {
        format!(
            "{}/{}/{}/{}/config",
            self.discovery_prefix,
            Component::for_kind(&device.kind).as_str(),
            self.node_id,
            device.id
        )
    }

    #[must_use]
    pub fn state(&self, device_id: DeviceId) -> String {
        format!("{}/{device_id}/state", self.node_id)
    }

    #[must_use]
    pub fn command(&self, device_id: DeviceId) -> String {
        format!("{}/{device_id}/set", self.node_id)
    }

    /// Filter matching the command topic of every device.
    #[must_use]
    pub fn command_filter(&self) -> String {
        format!("{}/+/set", self.node_id)
    }

    #[must_use]
    pub fn scene_triggered(&self) -> String {
        format!("{}/scene/triggered", self.node_id)
    }

    #[must_use]
    pub fn availability(&self) -> String {
        format!("{}/availability", self.node_id)
    }

    /// Extract the device id from a command topic, `None` for any other topic.
    #[must_use]
    pub fn parse_command(&self, topic: &str) -> Option<DeviceId> {
        let rest = topic.strip_prefix(self.node_id.as_str())?.strip_prefix('/')?;
        let id = rest.strip_suffix("/set")?;
        id.parse().ok()
    }
}
