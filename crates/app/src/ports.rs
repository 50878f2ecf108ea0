//! Port definitions: traits that adapters implement.
//!
//! Ports are the boundaries between the bridge core and the outside world.
//! They are defined here (in `app`) so that both the core and the adapter
//! layer can depend on them without creating circular dependencies.

pub mod bus;
pub mod cloud;
pub mod mesh;

pub use bus::{BusClient, BusEvent};
pub use cloud::CloudApi;
pub use mesh::{MeshConnector, MeshEvent, MeshEventSender, MeshParams, MeshTransport};
