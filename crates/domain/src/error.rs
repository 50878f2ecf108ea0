//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`BridgeError`]
//! at port boundaries.

use crate::id::DeviceId;

/// Boxed source error coming from an external collaborator.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Base error type shared by every crate of the workspace.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// A looked-up item does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The cloud API client failed.
    #[error("cloud api error")]
    Cloud(#[source] BoxError),

    /// The mesh transport failed.
    #[error("mesh transport error")]
    Mesh(#[source] BoxError),

    /// The bus client failed.
    #[error("bus client error")]
    Bus(#[source] BoxError),
}

/// Domain invariant violations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("device {0} appears more than once in the site")]
    DuplicateDevice(DeviceId),
}

/// A named item could not be found.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
