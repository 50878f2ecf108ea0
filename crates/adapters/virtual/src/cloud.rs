//! Virtual cloud serving a single configured site.

use meshbridge_app::ports::CloudApi;
use meshbridge_domain::device::{Device, DeviceKind, MeshAddress};
use meshbridge_domain::error::BridgeError;
use meshbridge_domain::id::{DeviceId, SiteId};
use meshbridge_domain::site::{CryptoKey, Site};

use crate::config::SimulationConfig;
use crate::error::VirtualError;

/// Account credentials presented to the cloud.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// In-process [`CloudApi`].
pub struct VirtualCloud {
    site: Site,
    config: SimulationConfig,
    credentials: Credentials,
    include_rooms: bool,
    logged_in: bool,
    site_loaded: bool,
}

impl VirtualCloud {
    #[must_use]
    pub fn new(config: SimulationConfig, credentials: Credentials, include_rooms: bool) -> Self {
        let site = Site {
            id: config.site_id.unwrap_or_default(),
            title: config.title.clone(),
        };
        Self {
            site,
            config,
            credentials,
            include_rooms,
            logged_in: false,
            site_loaded: false,
        }
    }

    #[must_use]
    pub fn site(&self) -> &Site {
        &self.site
    }

    fn accepts(&self, credentials: &Credentials) -> bool {
        let user_ok = self
            .config
            .username
            .as_deref()
            .is_none_or(|expected| expected == credentials.username);
        let password_ok = self
            .config
            .password
            .as_deref()
            .is_none_or(|expected| expected == credentials.password);
        user_ok && password_ok
    }

    fn devices(&self) -> Vec<Device> {
        let devices = self.config.devices.iter().map(|device| {
            let mut builder = Device::builder()
                .id(DeviceId::new(device.id))
                .name(&device.name)
                .kind(DeviceKind::from_type_name(&device.type_name))
                .dimmable(device.dimmable)
                .address(MeshAddress::new(&device.address));
            if let Some(room) = &device.room {
                builder = builder.room(room);
            }
            builder.build()
        });
        let rooms = self
            .config
            .rooms
            .iter()
            .filter(|_| self.include_rooms)
            .map(|room| {
                Device::builder()
                    .id(DeviceId::new(room.id))
                    .name(&room.name)
                    .kind(DeviceKind::Room)
                    .dimmable(true)
                    .room(&room.name)
                    .build()
            });

        devices
            .chain(rooms)
            .filter_map(|result| match result {
                Ok(device) => Some(device),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping invalid simulated device");
                    None
                }
            })
            .collect()
    }
}

impl CloudApi for VirtualCloud {
    async fn login(&mut self) -> Result<(), BridgeError> {
        if !self.accepts(&self.credentials) {
            return Err(VirtualError::InvalidCredentials.into());
        }
        tracing::debug!(username = %self.credentials.username, "virtual cloud login");
        self.logged_in = true;
        Ok(())
    }

    async fn get_sites(&mut self) -> Result<Vec<Site>, BridgeError> {
        if !self.logged_in {
            return Err(VirtualError::NotLoggedIn.into());
        }
        Ok(vec![self.site.clone()])
    }

    async fn get_site(&mut self, site_id: SiteId) -> Result<CryptoKey, BridgeError> {
        if !self.logged_in {
            return Err(VirtualError::NotLoggedIn.into());
        }
        if site_id != self.site.id {
            return Err(VirtualError::UnknownSite(site_id).into());
        }
        self.site_loaded = true;
        Ok(CryptoKey::new(&self.config.crypto_key))
    }

    fn get_devices(&self) -> Vec<Device> {
        if !self.site_loaded {
            return Vec::new();
        }
        self.devices()
    }
}
