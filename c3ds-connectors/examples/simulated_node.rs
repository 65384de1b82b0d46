//! C3DS Simulated Sensor Node
//!
//! Runs the full control loop on a host against a real collector:
//! - Simulated HC-SR04 echo pulses (a person walks up, stays, leaves)
//! - Hysteresis detection, alert and heartbeat scheduling
//! - ECDSA P-256 signed payloads posted over HTTP
//!
//! ## Usage
//!
//! ```text
//! RUST_LOG=info cargo run -p c3ds-connectors --example simulated_node -- \
//!     http://127.0.0.1:8080/api/telemetry 60
//! ```
//!
//! The device key is generated per run; its public key is printed so the
//! collector can verify `X-Device-Signature`.

use std::thread;
use std::time::Duration;

use c3ds_connectors::{ConnectorError, HttpConfig, HttpTransport};
use c3ds_core::config::{DeviceIdentity, NodeConfig};
use c3ds_core::detection::DetectionStateMachine;
use c3ds_core::node::{Collaborators, DeviceStatus, SensorNode, StatusIndicator};
use c3ds_core::signer::{PrivateKey, Signer};
use c3ds_core::time::{SystemTime, TimeSource, Timestamp};
use c3ds_core::transport::StatusPattern;
use log::info;
use rand::Rng;

const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080/api/telemetry";

/// Person in front of the sensor between these times
const ARRIVES_MS: Timestamp = 5_000;
const LEAVES_MS: Timestamp = 28_000;

/// Echo pulses for the walk-up scenario, with noise and dropouts
struct EchoSimulator {
    speed_of_sound_cm_per_us: f32,
}

impl EchoSimulator {
    fn pulse_us(&self, now: Timestamp) -> u32 {
        let mut rng = rand::thread_rng();

        // roughly one dropout in twenty pings
        if rng.gen_ratio(1, 20) {
            return 0;
        }

        let distance = if (ARRIVES_MS..LEAVES_MS).contains(&now) {
            18.0 + rng.gen_range(-1.0..1.0)
        } else {
            150.0 + rng.gen_range(-5.0..5.0)
        };
        (distance * 2.0 / self.speed_of_sound_cm_per_us) as u32
    }
}

/// Status LED rendered as log lines
struct LogIndicator;

impl StatusIndicator for LogIndicator {
    fn show(&mut self, pattern: StatusPattern) {
        let (on_ms, count, pause_ms) = pattern.timing();
        info!("LED {:?}: {} x {}ms, pause {}ms", pattern, count, on_ms, pause_ms);
    }

    fn set_level(&mut self, lit: bool) {
        log::debug!("LED {}", if lit { "on" } else { "off" });
    }
}

struct HostStatus;

impl DeviceStatus for HostStatus {
    fn signal_strength(&self) -> i32 {
        -55
    }

    fn free_memory(&self) -> u32 {
        40_960
    }
}

fn main() -> Result<(), ConnectorError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let endpoint = args.next().unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
    let run_secs: u64 = match args.next() {
        Some(s) => s
            .parse()
            .map_err(|_| ConnectorError::Config(format!("invalid duration: {}", s)))?,
        None => 60,
    };

    let key = PrivateKey::from_bytes(&rand::random::<[u8; 32]>())?;
    let public = key.public_key().to_sec1_bytes();
    println!("device public key (SEC1): {}", hex(&public));

    let config = NodeConfig::new(DeviceIdentity::new("sim-node-01", "U0lNVUxBVEVEIENFUlRJRklDQVRF"));
    let transport = HttpTransport::new(HttpConfig::for_node(&config, endpoint))?;
    let echo = config.echo;
    let simulator = EchoSimulator { speed_of_sound_cm_per_us: echo.speed_of_sound_cm_per_us };

    let clock = SystemTime::new();
    let mut node = SensorNode::new(
        &config,
        DetectionStateMachine::ultrasonic(&config.hysteresis),
        Signer::new(key),
        Collaborators {
            transport,
            indicator: LogIndicator,
            clock: clock.clone(),
            device: HostStatus,
        },
        clock.now(),
    )?;

    info!("running for {}s, posting to {}", run_secs, node.collaborators().transport.config().endpoint);

    let run_ms = run_secs * 1_000;
    loop {
        let now = clock.now();
        if now >= run_ms {
            break;
        }

        let reading = node
            .poll_due(now)
            .then(|| echo.distance_from_echo(simulator.pulse_us(now)));
        let report = node.step(now, reading);

        if let Some(event) = report.event {
            info!("t={}ms {:?}", now, event);
        }

        thread::sleep(Duration::from_millis(20));
    }

    let stats = node.collaborators().transport.stats();
    println!(
        "sent {} / failed {} ({} bytes), last error: {}",
        stats.messages_sent,
        stats.messages_failed,
        stats.bytes_sent,
        stats.last_error.as_deref().unwrap_or("none")
    );
    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
