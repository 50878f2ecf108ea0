//! # meshbridge-adapter-virtual
//!
//! Virtual cloud and lighting mesh, so the bridge can run end to end without
//! an account or radio hardware.
//!
//! | Component | Port | Behaviour |
//! |-----------|------|-----------|
//! | [`VirtualCloud`] | `CloudApi` | Serves one configured site, checks credentials |
//! | [`VirtualMeshConnector`] | `MeshConnector` | Builds a [`VirtualMesh`] |
//! | [`VirtualMesh`] | `MeshTransport` | Fails the first N connections, echoes writes as state changes |
//!
//! ## Dependency rule
//!
//! Depends on `meshbridge-app` (port traits) and `meshbridge-domain` only.

pub mod cloud;
pub mod config;
pub mod error;
pub mod mesh;

pub use cloud::{Credentials, VirtualCloud};
pub use config::SimulationConfig;
pub use error::VirtualError;
pub use mesh::{VirtualMesh, VirtualMeshConnector};
