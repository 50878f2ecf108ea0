//! Bootstrap sequencer: turns cloud API answers into a running bridge.
//!
//! The chain is strictly sequential, each step feeding the next:
//!
//! 1. log in
//! 2. list sites and select the configured one
//! 3. resolve the crypto key of that site
//! 4. enumerate its devices
//! 5. start the bus client, build the mesh transport and start connecting
//!
//! Both event channels exist before step 5 starts, so no event emitted once a
//! client is ready can be missed.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;

use meshbridge_domain::device::DeviceSet;
use meshbridge_domain::error::{BridgeError, NotFoundError};
use meshbridge_domain::site::{CryptoKey, Site};

use crate::bridge::Bridge;
use crate::ports::{BusClient, BusEvent, CloudApi, MeshConnector, MeshParams};
use crate::services::relay::StateRelay;
use crate::services::supervisor::{ConnectionSupervisor, RetryPolicy};

/// Capacity of the channel carrying mesh events to the bridge loop.
pub const MESH_EVENT_CAPACITY: usize = 64;

/// What to do when one of the cloud steps fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Give up and report the error.
    #[default]
    FailFast,
    /// Restart the chain from the login step.
    Retry(RetryPolicy),
}

/// Immutable inputs of the bootstrap sequence.
#[derive(Debug, Clone)]
pub struct BootstrapSettings {
    /// Site id or title to select among the account's sites.
    pub site: String,
    pub connection_timeout: Duration,
    pub write_queue_wait: Duration,
    /// Reconnect policy handed to the connection supervisor.
    pub reconnect: RetryPolicy,
    pub on_failure: FailurePolicy,
}

/// Bootstrap step, used to report where the chain broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStep {
    Login,
    SelectSite,
    ResolveKey,
    EnumerateDevices,
    StartBus,
    StartMesh,
}

impl BootstrapStep {
    /// Whether the failure policy may restart the chain after this step
    /// failed. Only the steps before the crypto key is known qualify, so the
    /// key is resolved at most once.
    #[must_use]
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Login | Self::SelectSite | Self::ResolveKey)
    }
}

impl fmt::Display for BootstrapStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Login => "login",
            Self::SelectSite => "site selection",
            Self::ResolveKey => "crypto key resolution",
            Self::EnumerateDevices => "device enumeration",
            Self::StartBus => "bus client start",
            Self::StartMesh => "mesh transport start",
        })
    }
}

/// The bootstrap chain broke at `step`.
#[derive(Debug, thiserror::Error)]
#[error("bootstrap failed during {step}")]
pub struct BootstrapError {
    pub step: BootstrapStep,
    #[source]
    pub source: BridgeError,
}

trait StepContext<T> {
    fn during(self, step: BootstrapStep) -> Result<T, BootstrapError>;
}

impl<T> StepContext<T> for Result<T, BridgeError> {
    fn during(self, step: BootstrapStep) -> Result<T, BootstrapError> {
        self.map_err(|source| BootstrapError { step, source })
    }
}

/// Cloud data resolved by steps 1–4.
struct Resolved {
    site: Site,
    crypto_key: CryptoKey,
    devices: DeviceSet,
}

/// Runs the startup chain and assembles the [`Bridge`].
pub struct Bootstrap<C, B, K> {
    cloud: C,
    bus: B,
    connector: K,
    bus_events: mpsc::Receiver<BusEvent>,
    settings: BootstrapSettings,
}

impl<C, B, K> Bootstrap<C, B, K>
where
    C: CloudApi,
    B: BusClient,
    K: MeshConnector,
{
    /// `bus_events` must be the receiving end of the channel `bus` reports to.
    pub fn new(
        cloud: C,
        bus: B,
        connector: K,
        bus_events: mpsc::Receiver<BusEvent>,
        settings: BootstrapSettings,
    ) -> Self {
        Self {
            cloud,
            bus,
            connector,
            bus_events,
            settings,
        }
    }

    /// Run all five steps and return a bridge whose mesh transport is
    /// already connecting.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError`] naming the failing step. Cloud failures
    /// are retried first when the failure policy asks for it.
    pub async fn run(mut self) -> Result<Bridge<K::Transport, B>, BootstrapError> {
        let Resolved {
            site,
            crypto_key,
            devices,
        } = self.resolve().await?;
        tracing::info!(site = %site.title, devices = devices.len(), "site resolved");

        self.bus.start().await.during(BootstrapStep::StartBus)?;

        let (mesh_tx, mesh_rx) = mpsc::channel(MESH_EVENT_CAPACITY);
        let params = MeshParams {
            crypto_key,
            devices: devices.clone(),
            connection_timeout: self.settings.connection_timeout,
            write_queue_wait: self.settings.write_queue_wait,
        };
        let mesh = self
            .connector
            .connect(params, mesh_tx)
            .during(BootstrapStep::StartMesh)?;

        let relay = StateRelay::new(mesh, self.bus, devices);
        let supervisor = ConnectionSupervisor::new(self.settings.reconnect);
        let mut bridge = Bridge::new(relay, supervisor, mesh_rx, self.bus_events);
        bridge.connect_mesh().await;
        Ok(bridge)
    }

    /// Steps 1–4, restarted from the login according to the failure policy
    /// when one of the first three steps fails.
    async fn resolve(&mut self) -> Result<Resolved, BootstrapError> {
        let mut failures: u32 = 0;
        loop {
            let err = match self.resolve_once().await {
                Ok(resolved) => return Ok(resolved),
                Err(err) => err,
            };
            failures = failures.saturating_add(1);
            let delay = match self.settings.on_failure {
                FailurePolicy::Retry(policy) if err.step.is_retryable() => {
                    policy.delay_for(failures)
                }
                FailurePolicy::Retry(_) | FailurePolicy::FailFast => None,
            };
            let Some(delay) = delay else {
                tracing::error!(step = %err.step, error = %err.source, "bootstrap failed");
                return Err(err);
            };
            tracing::warn!(
                step = %err.step,
                error = %err.source,
                failures,
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                "bootstrap failed, restarting from login"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn resolve_once(&mut self) -> Result<Resolved, BootstrapError> {
        self.cloud.login().await.during(BootstrapStep::Login)?;
        tracing::info!("logged in to the cloud api");

        let sites = self
            .cloud
            .get_sites()
            .await
            .during(BootstrapStep::SelectSite)?;
        let site = select_site(sites, &self.settings.site).during(BootstrapStep::SelectSite)?;
        tracing::info!(site_id = %site.id, title = %site.title, "site selected");

        let crypto_key = self
            .cloud
            .get_site(site.id)
            .await
            .during(BootstrapStep::ResolveKey)?;

        let devices =
            DeviceSet::new(self.cloud.get_devices()).during(BootstrapStep::EnumerateDevices)?;

        Ok(Resolved {
            site,
            crypto_key,
            devices,
        })
    }
}

fn select_site(sites: Vec<Site>, selector: &str) -> Result<Site, BridgeError> {
    sites
        .into_iter()
        .find(|site| site.matches(selector))
        .ok_or_else(|| {
            NotFoundError {
                entity: "Site",
                id: selector.to_string(),
            }
            .into()
        })
}
