//! Common test utilities for integration tests
//!
//! This module provides:
//! - Recording mock collaborators (transport, status LED, board health)
//! - A deterministic test key and node assembly helpers
//! - Reading scenarios for the detection state machines

#![allow(dead_code)]

pub mod scenarios;

use c3ds_core::config::{DeviceIdentity, NodeConfig};
use c3ds_core::detection::{Classify, DetectionStateMachine};
use c3ds_core::node::{Collaborators, DeviceStatus, SensorNode, SignedMessage, StatusIndicator, Transport};
use c3ds_core::signer::{PrivateKey, Signer};
use c3ds_core::time::FixedTime;
use c3ds_core::transport::{StatusPattern, TransportOutcome};

/// Device id used throughout the integration tests
pub const DEVICE_ID: &str = "c3ds-test-node";

/// Stand-in for the base64 PEM certificate
pub const CERTIFICATE_B64: &str = "LS0tLS1CRUdJTiBDRVJUSUZJQ0FURS0tLS0t";

/// 2025-01-18T14:30:45Z
pub const SYNCED_UNIX_TIME: i64 = 1_737_210_645;

/// Deterministic, valid P-256 test key
pub fn test_key() -> PrivateKey {
    let mut bytes = [0u8; 32];
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = 0xc0 ^ (i as u8);
    }
    PrivateKey::from_bytes(&bytes).unwrap()
}

/// One request as seen by the collector
#[derive(Debug, Clone)]
pub struct Captured {
    pub body: String,
    pub signature: String,
    pub certificate: String,
    pub headers: Vec<(String, String)>,
}

/// Transport that records every request and replies from a script
///
/// Once the script is exhausted the last outcome repeats.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub sent: Vec<Captured>,
    script: Vec<TransportOutcome>,
}

impl RecordingTransport {
    pub fn replying(outcome: TransportOutcome) -> Self {
        Self { sent: Vec::new(), script: vec![outcome] }
    }

    pub fn scripted(script: Vec<TransportOutcome>) -> Self {
        Self { sent: Vec::new(), script }
    }

    pub fn bodies(&self) -> Vec<serde_json::Value> {
        self.sent
            .iter()
            .map(|c| serde_json::from_str(&c.body).unwrap())
            .collect()
    }
}

impl Transport for RecordingTransport {
    fn post(&mut self, message: &SignedMessage, certificate_b64: &str) -> TransportOutcome {
        let headers = message
            .headers(certificate_b64)
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        self.sent.push(Captured {
            body: message.payload.as_str().to_string(),
            signature: message.signature.as_str().to_string(),
            certificate: certificate_b64.to_string(),
            headers,
        });

        let index = (self.sent.len() - 1).min(self.script.len().saturating_sub(1));
        self.script
            .get(index)
            .copied()
            .unwrap_or(TransportOutcome::Response(200))
    }
}

/// Status LED that records patterns and level changes
#[derive(Debug, Default)]
pub struct RecordingIndicator {
    pub patterns: Vec<StatusPattern>,
    pub levels: Vec<bool>,
}

impl StatusIndicator for RecordingIndicator {
    fn show(&mut self, pattern: StatusPattern) {
        self.patterns.push(pattern);
    }

    fn set_level(&mut self, lit: bool) {
        self.levels.push(lit);
    }
}

/// Board health with fixed figures
#[derive(Debug, Clone, Copy)]
pub struct FixedBoard {
    pub rssi: i32,
    pub free_heap: u32,
}

impl Default for FixedBoard {
    fn default() -> Self {
        Self { rssi: -67, free_heap: 41_232 }
    }
}

impl DeviceStatus for FixedBoard {
    fn signal_strength(&self) -> i32 {
        self.rssi
    }

    fn free_memory(&self) -> u32 {
        self.free_heap
    }
}

pub type TestNode<C> = SensorNode<C, RecordingTransport, RecordingIndicator, FixedTime, FixedBoard>;

pub fn test_config() -> NodeConfig {
    NodeConfig::new(DeviceIdentity::new(DEVICE_ID, CERTIFICATE_B64))
}

/// Node booted at t=0 with a synchronised wall clock
pub fn test_node<C: Classify>(
    detector: DetectionStateMachine<C>,
    transport: RecordingTransport,
) -> TestNode<C> {
    SensorNode::new(
        &test_config(),
        detector,
        Signer::new(test_key()),
        Collaborators {
            transport,
            indicator: RecordingIndicator::default(),
            clock: FixedTime::new(0).with_wall_clock(SYNCED_UNIX_TIME),
            device: FixedBoard::default(),
        },
        0,
    )
    .unwrap()
}
