//! Bridge: the single event loop that drives the relay and the supervisor.
//!
//! Bus events, mesh events and the (at most one) pending reconnect timer are
//! multiplexed with `tokio::select!`. Each event is handled to completion
//! before the next one is looked at, so nothing here needs a lock.

use std::pin::Pin;

use tokio::sync::mpsc;
use tokio::time::Sleep;

use crate::ports::{BusClient, BusEvent, MeshEvent, MeshTransport};
use crate::services::relay::StateRelay;
use crate::services::supervisor::{ConnectionState, ConnectionSupervisor};

/// A fully bootstrapped bridge, ready to [`run`](Self::run).
pub struct Bridge<M, B> {
    relay: StateRelay<M, B>,
    supervisor: ConnectionSupervisor,
    mesh_events: mpsc::Receiver<MeshEvent>,
    bus_events: mpsc::Receiver<BusEvent>,
    retry: Option<Pin<Box<Sleep>>>,
}

impl<M, B> Bridge<M, B>
where
    M: MeshTransport,
    B: BusClient,
{
    pub fn new(
        relay: StateRelay<M, B>,
        supervisor: ConnectionSupervisor,
        mesh_events: mpsc::Receiver<MeshEvent>,
        bus_events: mpsc::Receiver<BusEvent>,
    ) -> Self {
        Self {
            relay,
            supervisor,
            mesh_events,
            bus_events,
            retry: None,
        }
    }

    pub fn relay(&self) -> &StateRelay<M, B> {
        &self.relay
    }

    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.supervisor.state()
    }

    /// Start a mesh connection attempt.
    ///
    /// An attempt that cannot even be started is handled like a reported
    /// connection failure.
    pub async fn connect_mesh(&mut self) {
        tracing::debug!("initialising mesh transport");
        if let Err(err) = self.relay.mesh().init().await {
            tracing::warn!(error = %err, "mesh initialisation failed");
            self.on_connect_failed();
        }
    }

    fn on_connect_failed(&mut self) {
        if let Some(delay) = self.supervisor.on_connect_failed() {
            self.retry = Some(Box::pin(tokio::time::sleep(delay)));
        }
    }

    async fn on_mesh_event(&mut self, event: MeshEvent) {
        match event {
            MeshEvent::ConnectFailed => self.on_connect_failed(),
            MeshEvent::Authenticated => {
                tracing::info!("connected to the mesh");
                self.supervisor.on_connected();
            }
            other => self.relay.forward_mesh_event(other).await,
        }
    }

    async fn on_retry_due(&mut self) {
        self.retry = None;
        self.supervisor.on_retry_due();
        self.connect_mesh().await;
    }

    /// Run until both the bus and the mesh event channels are closed.
    pub async fn run(mut self) {
        tracing::info!("bridge running");
        loop {
            let retry_scheduled = self.retry.is_some();
            tokio::select! {
                Some(event) = self.mesh_events.recv() => self.on_mesh_event(event).await,
                Some(event) = self.bus_events.recv() => self.relay.handle_bus_event(event).await,
                () = wait_retry(&mut self.retry), if retry_scheduled => self.on_retry_due().await,
                else => break,
            }
        }
        tracing::info!("event sources closed, bridge stopped");
    }
}

async fn wait_retry(retry: &mut Option<Pin<Box<Sleep>>>) {
    if let Some(sleep) = retry.as_mut() {
        sleep.await;
    }
}
