//! # meshbridge-adapter-mqtt
//!
//! MQTT adapter: exposes the mesh devices on a Home-Assistant style bus.
//!
//! ## Responsibilities
//! - Connect to the broker and keep the connection alive (rumqttc reconnects
//!   on the next poll after a failure)
//! - Announce every device through retained discovery configs
//! - Publish device states and scene triggers
//! - Decode commands received on `{node}/{id}/set` into [`BusEvent::Command`]
//!
//! ## Dependency rule
//! Depends on `meshbridge-app` (for the [`BusClient`] port) and
//! `meshbridge-domain`.

pub mod config;
pub mod discovery;
pub mod error;
pub mod topics;

use std::sync::Mutex;
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, LastWill, MqttOptions, Packet, QoS};
use tokio::sync::mpsc;

use meshbridge_app::ports::{BusClient, BusEvent};
use meshbridge_domain::command::Command;
use meshbridge_domain::device::DeviceSet;
use meshbridge_domain::error::BridgeError;
use meshbridge_domain::id::{DeviceId, SceneId};

pub use config::MqttConfig;
pub use error::MqttError;

use crate::topics::{OFFLINE, ONLINE, Topics};

/// Pause after a connection error before polling again.
const RECONNECT_PAUSE: Duration = Duration::from_secs(1);

/// [`BusClient`] backed by an rumqttc connection.
pub struct MqttBusClient {
    client: AsyncClient,
    event_loop: Mutex<Option<EventLoop>>,
    topics: Topics,
    events: mpsc::Sender<BusEvent>,
}

impl MqttBusClient {
    /// Build the client. Nothing is sent to the broker until
    /// [`BusClient::start`] is called.
    #[must_use]
    pub fn new(config: &MqttConfig, events: mpsc::Sender<BusEvent>) -> Self {
        let topics = Topics::new(&config.discovery_prefix, &config.node_id);

        let mut options = MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
        options.set_keep_alive(Duration::from_secs(u64::from(config.keep_alive_secs)));
        options.set_last_will(LastWill::new(
            topics.availability(),
            OFFLINE,
            QoS::AtLeastOnce,
            true,
        ));
        if let Some((username, password)) = config.credentials() {
            options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(options, config.request_capacity);
        Self {
            client,
            event_loop: Mutex::new(Some(event_loop)),
            topics,
            events,
        }
    }

    #[must_use]
    pub fn topics(&self) -> &Topics {
        &self.topics
    }

    async fn publish(&self, topic: String, retain: bool, payload: Vec<u8>) -> Result<(), MqttError> {
        self.client
            .publish(topic, QoS::AtLeastOnce, retain, payload)
            .await?;
        Ok(())
    }

    async fn publish_state(&self, device_id: DeviceId, state: &serde_json::Value) -> Result<(), MqttError> {
        let payload = serde_json::to_vec(state).map_err(MqttError::PayloadEncode)?;
        self.publish(self.topics.state(device_id), true, payload).await
    }

    async fn announce(&self, devices: &DeviceSet) -> Result<(), MqttError> {
        for announcement in discovery::announcements(&self.topics, devices)? {
            tracing::debug!(topic = %announcement.topic, "announcing device");
            self.publish(announcement.topic, true, announcement.payload)
                .await?;
        }
        tracing::info!(count = devices.len(), "devices announced");
        Ok(())
    }

    fn take_event_loop(&self) -> Result<EventLoop, MqttError> {
        self.event_loop
            .lock()
            .ok()
            .and_then(|mut slot| slot.take())
            .ok_or(MqttError::AlreadyStarted)
    }
}

impl BusClient for MqttBusClient {
    async fn start(&self) -> Result<(), BridgeError> {
        let event_loop = self.take_event_loop()?;
        tokio::spawn(run_event_loop(
            event_loop,
            self.client.clone(),
            self.topics.clone(),
            self.events.clone(),
        ));
        Ok(())
    }

    async fn discover(&self, devices: &DeviceSet) -> Result<(), BridgeError> {
        self.announce(devices).await.map_err(MqttError::into_domain)
    }

    async fn update_state(
        &self,
        device_id: DeviceId,
        state: serde_json::Value,
    ) -> Result<(), BridgeError> {
        self.publish_state(device_id, &state)
            .await
            .map_err(MqttError::into_domain)
    }

    async fn scene_triggered(&self, scene_id: SceneId) -> Result<(), BridgeError> {
        self.publish(
            self.topics.scene_triggered(),
            false,
            scene_id.to_string().into_bytes(),
        )
        .await
        .map_err(MqttError::into_domain)
    }
}

/// Turn an incoming publish into a bus event.
///
/// Returns `Ok(None)` for topics that are not command topics.
///
/// # Errors
///
/// Returns [`MqttError::Command`] when the payload of a command topic cannot
/// be decoded.
pub fn decode_command(
    topics: &Topics,
    topic: &str,
    payload: &[u8],
) -> Result<Option<BusEvent>, MqttError> {
    let Some(device_id) = topics.parse_command(topic) else {
        return Ok(None);
    };
    let command = Command::from_payload(payload).map_err(|source| MqttError::Command {
        topic: topic.to_string(),
        source,
    })?;
    Ok(Some(BusEvent::Command { device_id, command }))
}

/// Subscribe and mark the bridge online after each (re)connection.
///
/// Uses the non-blocking client calls: the event loop is the one draining
/// the request queue, so awaiting here could stall it.
fn on_connected(client: &AsyncClient, topics: &Topics) {
    if let Err(err) = client.try_subscribe(topics.command_filter(), QoS::AtLeastOnce) {
        tracing::warn!(error = %err, "failed to subscribe to command topics");
    }
    if let Err(err) = client.try_publish(topics.availability(), QoS::AtLeastOnce, true, ONLINE) {
        tracing::warn!(error = %err, "failed to publish availability");
    }
}

async fn run_event_loop(
    mut event_loop: EventLoop,
    client: AsyncClient,
    topics: Topics,
    events: mpsc::Sender<BusEvent>,
) {
    loop {
        let event = match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                tracing::info!("connected to MQTT broker");
                on_connected(&client, &topics);
                Some(BusEvent::Connected)
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                match decode_command(&topics, &publish.topic, &publish.payload) {
                    Ok(event) => event,
                    Err(err) => {
                        tracing::warn!(error = %err, "ignoring malformed command");
                        None
                    }
                }
            }
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(error = %err, "MQTT connection error");
                tokio::time::sleep(RECONNECT_PAUSE).await;
                None
            }
        };

        if let Some(event) = event
            && events.send(event).await.is_err()
        {
            tracing::debug!("bus event receiver dropped, stopping MQTT loop");
            break;
        }
    }
}
