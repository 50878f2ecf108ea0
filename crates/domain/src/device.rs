//! Device: a controllable node of the lighting mesh, or a scene.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, NotFoundError, ValidationError};
use crate::id::DeviceId;

/// Type tag of a device.
///
/// Only [`Scene`](Self::Scene) changes how commands are dispatched; the other
/// kinds decide how the device is announced on the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Light,
    Switch,
    Room,
    Scene,
    Other(String),
}

impl DeviceKind {
    /// Map a cloud type name (e.g. `"Scene"`, `"Light"`) to a kind.
    #[must_use]
    pub fn from_type_name(type_name: &str) -> Self {
        match type_name {
            "Light" => Self::Light,
            "Switch" => Self::Switch,
            "Room" => Self::Room,
            "Scene" => Self::Scene,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn is_scene(&self) -> bool {
        matches!(self, Self::Scene)
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => f.write_str("Light"),
            Self::Switch => f.write_str("Switch"),
            Self::Room => f.write_str("Room"),
            Self::Scene => f.write_str("Scene"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// Mesh-specific addressing data, opaque to the bridge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeshAddress(String);

impl MeshAddress {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A device (or scene) of the selected site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub kind: DeviceKind,
    pub dimmable: bool,
    pub room: Option<String>,
    pub address: MeshAddress,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }

    #[must_use]
    pub fn is_scene(&self) -> bool {
        self.kind.is_scene()
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    kind: Option<DeviceKind>,
    dimmable: bool,
    room: Option<String>,
    address: Option<MeshAddress>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: DeviceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: DeviceKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn dimmable(mut self, dimmable: bool) -> Self {
        self.dimmable = dimmable;
        self
    }

    #[must_use]
    pub fn room(mut self, room: impl Into<String>) -> Self {
        self.room = Some(room.into());
        self
    }

    #[must_use]
    pub fn address(mut self, address: MeshAddress) -> Self {
        self.address = Some(address);
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// Missing kind defaults to [`DeviceKind::Light`].
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<Device, BridgeError> {
        let device = Device {
            id: self.id.unwrap_or(DeviceId::new(0)),
            name: self.name.unwrap_or_default(),
            kind: self.kind.unwrap_or(DeviceKind::Light),
            dimmable: self.dimmable,
            room: self.room,
            address: self.address.unwrap_or_default(),
        };
        device.validate()?;
        Ok(device)
    }
}

/// The immutable device collection of a site, keyed by [`DeviceId`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSet {
    devices: BTreeMap<DeviceId, Device>,
}

impl DeviceSet {
    /// Build the set, enforcing that identifiers are unique.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::DuplicateDevice`] on the first repeated id.
    pub fn new(devices: impl IntoIterator<Item = Device>) -> Result<Self, BridgeError> {
        let mut map = BTreeMap::new();
        for device in devices {
            let id = device.id;
            if map.insert(id, device).is_some() {
                return Err(ValidationError::DuplicateDevice(id).into());
            }
        }
        Ok(Self { devices: map })
    }

    #[must_use]
    pub fn get(&self, id: DeviceId) -> Option<&Device> {
        self.devices.get(&id)
    }

    /// Look up a device, returning an error if it is not part of the site.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::NotFound`] for unknown ids.
    pub fn require(&self, id: DeviceId) -> Result<&Device, BridgeError> {
        self.get(id).ok_or_else(|| {
            NotFoundError {
                entity: "Device",
                id: id.to_string(),
            }
            .into()
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Device> {
        self.devices.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

impl<'a> IntoIterator for &'a DeviceSet {
    type Item = &'a Device;
    type IntoIter = std::collections::btree_map::Values<'a, DeviceId, Device>;

    fn into_iter(self) -> Self::IntoIter {
        self.devices.values()
    }
}
