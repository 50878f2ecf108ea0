//! Discovery configs announcing each device to the automation system.

use serde::Serialize;

use meshbridge_domain::device::{Device, DeviceSet};

use crate::error::MqttError;
use crate::topics::{Component, OFFLINE, ONLINE, Topics};

#[derive(Debug, Serialize)]
struct DeviceInfo<'a> {
    identifiers: Vec<String>,
    name: &'a str,
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggested_area: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct DiscoveryConfig<'a> {
    name: &'a str,
    unique_id: String,
    state_topic: String,
    command_topic: String,
    availability_topic: String,
    payload_available: &'static str,
    payload_not_available: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    brightness: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value_template: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_on: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    state_off: Option<&'static str>,
    device: DeviceInfo<'a>,
}

fn config_for<'a>(topics: &Topics, device: &'a Device) -> DiscoveryConfig<'a> {
    let unique_id = format!("{}_{}", topics.node_id(), device.id);
    let component = Component::for_kind(&device.kind);
    let (schema, brightness, value_template, state_on, state_off) = match component {
        Component::Light => (Some("json"), Some(device.dimmable), None, None, None),
        Component::Switch => (
            None,
            None,
            Some("{{ value_json.state }}"),
            Some("1"),
            Some("0"),
        ),
    };
    DiscoveryConfig {
        name: &device.name,
        unique_id: unique_id.clone(),
        state_topic: topics.state(device.id),
        command_topic: topics.command(device.id),
        availability_topic: topics.availability(),
        payload_available: ONLINE,
        payload_not_available: OFFLINE,
        schema,
        brightness,
        value_template,
        state_on,
        state_off,
        device: DeviceInfo {
            identifiers: vec![unique_id],
            name: &device.name,
            model: device.kind.to_string(),
            suggested_area: device.room.as_deref(),
        },
    }
}

/// A retained message to publish.
#[derive(Debug, Clone, PartialEq)]
pub struct Announcement {
    pub topic: String,
    pub payload: Vec<u8>,
}

/// One discovery announcement per device, in id order.
///
/// # Errors
///
/// Returns [`MqttError::PayloadEncode`] if a config cannot be serialized.
pub fn announcements(topics: &Topics, devices: &DeviceSet) -> Result<Vec<Announcement>, MqttError> {
    devices
        .iter()
        .map(|device| {
            let payload =
                serde_json::to_vec(&config_for(topics, device)).map_err(MqttError::PayloadEncode)?;
            Ok(Announcement {
                topic: topics.config(device),
                payload,
            })
        })
        .collect()
}
