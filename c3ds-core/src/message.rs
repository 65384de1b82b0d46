//! Canonical message payloads
//!
//! A payload is serialized exactly once. Those bytes are signed and those
//! same bytes are transmitted, so [`Payload`] owns the rendered JSON and
//! exposes no way to re-render it.
//!
//! Field order is fixed by the struct declarations below:
//!
//! ```json
//! {"device_id":"node-1","timestamp":"2025-01-18T14:30:45Z","message_type":"heartbeat",
//!  "data":{"status":"online","uptime":120,"signal_strength":-67,"free_memory":41232}}
//! ```

use alloc::string::String;

use serde::Serialize;

use crate::constants::protocol::{ALERT_CONFIDENCE, HEARTBEAT_STATUS_ONLINE};
use crate::constants::sensors::{
    BUTTON_EVENT, BUTTON_SENSOR_TYPE, ULTRASONIC_EVENT, ULTRASONIC_SENSOR_TYPE,
};
use crate::errors::MessageError;
use crate::time::IsoTimestamp;

/// Message kinds understood by the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Periodic liveness report
    Heartbeat,
    /// Detection report
    Alert,
}

/// Periodic liveness report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeartbeatData {
    /// Always `online` while the node can send
    pub status: &'static str,
    /// Seconds since boot
    pub uptime: u64,
    /// Radio signal strength (dBm)
    pub signal_strength: i32,
    /// Free heap (bytes)
    pub free_memory: u32,
}

impl HeartbeatData {
    /// Heartbeat of a running node
    pub fn online(uptime: u64, signal_strength: i32, free_memory: u32) -> Self {
        Self {
            status: HEARTBEAT_STATUS_ONLINE,
            uptime,
            signal_strength,
            free_memory,
        }
    }
}

/// Detection report
///
/// The distance fields are present only for the ultrasonic sensor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertData {
    /// Event name, `button_press` or `ultrasonic_detection`
    pub event: &'static str,
    /// Sensor that produced the event
    pub sensor_type: &'static str,
    /// Fixed at 1.0 for both sensors
    pub confidence: f32,
    /// Last valid distance (ultrasonic only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_cm: Option<f32>,
    /// Seconds since entering detection (ultrasonic only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
    /// Wall-clock time of entry (ultrasonic only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_detected_at: Option<IsoTimestamp>,
}

impl AlertData {
    /// Manual button press
    pub fn button() -> Self {
        Self {
            event: BUTTON_EVENT,
            sensor_type: BUTTON_SENSOR_TYPE,
            confidence: ALERT_CONFIDENCE,
            distance_cm: None,
            duration_seconds: None,
            first_detected_at: None,
        }
    }

    /// Ongoing ultrasonic detection
    pub fn ultrasonic(distance_cm: f32, duration_seconds: u64, first_detected_at: IsoTimestamp) -> Self {
        Self {
            event: ULTRASONIC_EVENT,
            sensor_type: ULTRASONIC_SENSOR_TYPE,
            confidence: ALERT_CONFIDENCE,
            distance_cm: Some(distance_cm),
            duration_seconds: Some(duration_seconds),
            first_detected_at: Some(first_detected_at),
        }
    }
}

/// Type-specific part of a message
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MessageData {
    /// Heartbeat body
    Heartbeat(HeartbeatData),
    /// Alert body
    Alert(AlertData),
}

impl MessageData {
    /// Value of the `message_type` field
    pub fn message_type(&self) -> MessageType {
        match self {
            MessageData::Heartbeat(_) => MessageType::Heartbeat,
            MessageData::Alert(_) => MessageType::Alert,
        }
    }
}

impl From<HeartbeatData> for MessageData {
    fn from(data: HeartbeatData) -> Self {
        MessageData::Heartbeat(data)
    }
}

impl From<AlertData> for MessageData {
    fn from(data: AlertData) -> Self {
        MessageData::Alert(data)
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    device_id: &'a str,
    timestamp: &'a IsoTimestamp,
    message_type: MessageType,
    data: &'a MessageData,
}

/// Rendered JSON body, the exact bytes that are signed and sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    json: String,
    message_type: MessageType,
}

impl Payload {
    /// Exact bytes to sign and send
    pub fn as_bytes(&self) -> &[u8] {
        self.json.as_bytes()
    }

    /// String form
    pub fn as_str(&self) -> &str {
        &self.json
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.json.len()
    }

    /// Whether there are no bytes
    pub fn is_empty(&self) -> bool {
        self.json.is_empty()
    }

    /// Kind of message this payload carries
    pub fn message_type(&self) -> MessageType {
        self.message_type
    }
}

/// Builds payloads for one device
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    device_id: String,
}

impl MessageBuilder {
    /// Builder for one device
    ///
    /// Fails on an empty device id.
    pub fn new(device_id: impl Into<String>) -> Result<Self, MessageError> {
        let device_id = device_id.into();
        if device_id.is_empty() {
            return Err(MessageError::MissingDeviceId);
        }
        Ok(Self { device_id })
    }

    /// Device id stamped into every payload
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Render one message
    pub fn build(&self, timestamp: &IsoTimestamp, data: &MessageData) -> Result<Payload, MessageError> {
        let message_type = data.message_type();
        let envelope = Envelope {
            device_id: &self.device_id,
            timestamp,
            message_type,
            data,
        };

        let json = serde_json::to_string(&envelope).map_err(|_| MessageError::Serialization)?;
        Ok(Payload { json, message_type })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at() -> IsoTimestamp {
        IsoTimestamp::from_unix(1_737_210_645).unwrap()
    }

    #[test]
    fn heartbeat_layout_is_fixed() {
        let builder = MessageBuilder::new("node-1").unwrap();
        let payload = builder
            .build(&at(), &HeartbeatData::online(120, -67, 41_232).into())
            .unwrap();

        assert_eq!(
            payload.as_str(),
            r#"{"device_id":"node-1","timestamp":"2025-01-18T14:30:45Z","message_type":"heartbeat","data":{"status":"online","uptime":120,"signal_strength":-67,"free_memory":41232}}"#
        );
        assert_eq!(payload.message_type(), MessageType::Heartbeat);
    }

    #[test]
    fn button_alert_omits_distance_fields() {
        let builder = MessageBuilder::new("node-1").unwrap();
        let payload = builder.build(&at(), &AlertData::button().into()).unwrap();

        assert_eq!(
            payload.as_str(),
            r#"{"device_id":"node-1","timestamp":"2025-01-18T14:30:45Z","message_type":"alert","data":{"event":"button_press","sensor_type":"manual","confidence":1.0}}"#
        );
    }

    #[test]
    fn ultrasonic_alert_carries_detection_details() {
        let builder = MessageBuilder::new("node-1").unwrap();
        let first = IsoTimestamp::from_unix(1_737_210_633).unwrap();
        let payload = builder
            .build(&at(), &AlertData::ultrasonic(18.5, 12, first).into())
            .unwrap();

        assert_eq!(
            payload.as_str(),
            r#"{"device_id":"node-1","timestamp":"2025-01-18T14:30:45Z","message_type":"alert","data":{"event":"ultrasonic_detection","sensor_type":"HC-SR04","confidence":1.0,"distance_cm":18.5,"duration_seconds":12,"first_detected_at":"2025-01-18T14:30:33Z"}}"#
        );
    }

    #[test]
    fn unsynchronised_timestamp_is_epoch() {
        let builder = MessageBuilder::new("node-1").unwrap();
        let payload = builder
            .build(&IsoTimestamp::epoch(), &AlertData::button().into())
            .unwrap();
        assert!(payload.as_str().contains(r#""timestamp":"1970-01-01T00:00:00Z""#));
    }

    #[test]
    fn build_is_deterministic() {
        let builder = MessageBuilder::new("node-1").unwrap();
        let data: MessageData = HeartbeatData::online(5, -40, 1000).into();
        assert_eq!(builder.build(&at(), &data).unwrap(), builder.build(&at(), &data).unwrap());
    }

    #[test]
    fn empty_device_id_is_rejected() {
        assert_eq!(MessageBuilder::new("").unwrap_err(), MessageError::MissingDeviceId);
    }
}
