//! Cloud API port: account login, site listing, key resolution, devices.

use std::future::Future;

use meshbridge_domain::device::Device;
use meshbridge_domain::error::BridgeError;
use meshbridge_domain::id::SiteId;
use meshbridge_domain::site::{CryptoKey, Site};

/// Client of the vendor cloud that manages the lighting mesh.
///
/// Calls are made in a fixed order by the bootstrap sequencer:
///
/// 1. [`login`](Self::login)
/// 2. [`get_sites`](Self::get_sites)
/// 3. [`get_site`](Self::get_site) for the selected site
/// 4. [`get_devices`](Self::get_devices)
pub trait CloudApi {
    /// Authenticate with the configured credentials.
    fn login(&mut self) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// List the sites visible to the logged-in account.
    fn get_sites(&mut self) -> impl Future<Output = Result<Vec<Site>, BridgeError>> + Send;

    /// Load a site and return its crypto key.
    fn get_site(
        &mut self,
        site_id: SiteId,
    ) -> impl Future<Output = Result<CryptoKey, BridgeError>> + Send;

    /// Devices of the site loaded by [`get_site`](Self::get_site).
    ///
    /// This is a transform of data already fetched, so it cannot fail.
    fn get_devices(&self) -> Vec<Device>;
}
