//! Bridge services: the pieces the bridge loop is assembled from.
//!
//! Each service accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod bootstrap;
pub mod relay;
pub mod supervisor;
pub mod translator;
