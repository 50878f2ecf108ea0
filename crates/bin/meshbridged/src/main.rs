//! # meshbridged: mesh to MQTT bridge daemon
//!
//! Composition root that wires all adapters together and runs the bridge.
//!
//! ## Responsibilities
//! - Load configuration (config file, env vars)
//! - Install logging
//! - Construct the cloud, mesh and bus adapters and their event channels
//! - Run the bootstrap sequence, then the bridge loop
//! - Stop on Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;
mod telemetry;

use anyhow::Context;
use tokio::sync::mpsc;

use meshbridge_adapter_mqtt::MqttBusClient;
use meshbridge_adapter_virtual::{VirtualCloud, VirtualMeshConnector};
use meshbridge_app::services::bootstrap::Bootstrap;

use crate::config::Config;

/// Capacity of the channel carrying bus events to the bridge loop.
const BUS_EVENT_CAPACITY: usize = 64;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    telemetry::init(&config.logging.filter).context("failed to initialise logging")?;
    tracing::info!("Starting meshbridge v{}", env!("CARGO_PKG_VERSION"));

    let (bus_tx, bus_rx) = mpsc::channel(BUS_EVENT_CAPACITY);
    let bus = MqttBusClient::new(&config.mqtt, bus_tx);
    let cloud = VirtualCloud::new(
        config.simulation.clone(),
        config.credentials(),
        config.cloud.include_rooms_as_lights,
    );
    let connector = VirtualMeshConnector::new(config.simulation.fail_first_attempts);
    let bootstrap = Bootstrap::new(cloud, bus, connector, bus_rx, config.bootstrap_settings());

    let bridge = tokio::select! {
        result = bootstrap.run() => result.context("failed to start the bridge")?,
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for Ctrl-C")?;
            tracing::info!("shutdown requested during startup");
            return Ok(());
        }
    };

    tokio::select! {
        () = bridge.run() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for Ctrl-C")?;
            tracing::info!("shutdown requested");
        }
    }
    Ok(())
}
