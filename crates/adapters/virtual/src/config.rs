//! The site served by the virtual cloud.

use serde::Deserialize;

use meshbridge_domain::id::SiteId;

/// A device of the simulated site.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulatedDevice {
    pub id: u32,
    pub name: String,
    /// Cloud type name (`Light`, `Switch`, `Scene`, …).
    #[serde(rename = "type", default = "default_type")]
    pub type_name: String,
    #[serde(default)]
    pub dimmable: bool,
    #[serde(default)]
    pub room: Option<String>,
    /// Mesh address handed to the mesh transport; empty when unset.
    #[serde(default)]
    pub address: String,
}

fn default_type() -> String {
    "Light".to_string()
}

/// A room of the simulated site. Exposed as a light when rooms are
/// included.
#[derive(Debug, Clone, Deserialize)]
pub struct SimulatedRoom {
    pub id: u32,
    pub name: String,
}

/// The `[simulation]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Site identifier, generated at startup when unset.
    pub site_id: Option<SiteId>,
    pub title: String,
    pub crypto_key: String,
    /// Credentials the virtual cloud accepts. Any login succeeds when unset.
    pub username: Option<String>,
    pub password: Option<String>,
    /// Number of mesh connection attempts that fail before one succeeds.
    pub fail_first_attempts: u32,
    pub devices: Vec<SimulatedDevice>,
    pub rooms: Vec<SimulatedRoom>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let device = |id: u32, name: &str, type_name: &str, dimmable: bool, room: &str| SimulatedDevice {
            id,
            name: name.to_string(),
            type_name: type_name.to_string(),
            dimmable,
            room: Some(room.to_string()),
            address: format!("{id:02x}"),
        };
        Self {
            site_id: None,
            title: "Home".to_string(),
            crypto_key: "00000000000000000000000000000000".to_string(),
            username: None,
            password: None,
            fail_first_attempts: 0,
            devices: vec![
                device(11, "Hallway", "Light", true, "Entrance"),
                device(12, "Kitchen", "Light", true, "Kitchen"),
                device(13, "Porch", "Switch", false, "Entrance"),
                device(20, "Evening", "Scene", false, "Living room"),
            ],
            rooms: vec![SimulatedRoom {
                id: 100,
                name: "Living room".to_string(),
            }],
        }
    }
}
