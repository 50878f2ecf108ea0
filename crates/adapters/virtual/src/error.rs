//! Virtual adapter error types.

use meshbridge_domain::error::BridgeError;
use meshbridge_domain::id::SiteId;

#[derive(Debug, thiserror::Error)]
pub enum VirtualError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("not logged in")]
    NotLoggedIn,

    #[error("site {0} does not exist")]
    UnknownSite(SiteId),

    #[error("mesh event receiver dropped")]
    EventsClosed,
}

impl VirtualError {
    /// Convert into the [`BridgeError`] variant of the side that failed.
    #[must_use]
    pub fn into_domain(self) -> BridgeError {
        match self {
            Self::InvalidCredentials | Self::NotLoggedIn | Self::UnknownSite(_) => {
                BridgeError::Cloud(Box::new(self))
            }
            Self::EventsClosed => BridgeError::Mesh(Box::new(self)),
        }
    }
}

impl From<VirtualError> for BridgeError {
    fn from(err: VirtualError) -> Self {
        err.into_domain()
    }
}
