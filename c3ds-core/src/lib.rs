//! Secure telemetry pipeline for C3DS sensor nodes
//!
//! Decides when an event is worth reporting, renders the report, signs it,
//! and interprets the collector's answer. Hardware and network access stay
//! outside, behind the traits in [`node`].
//!
//! Key constraints:
//! - Runs on ESP8266-class devices (`no_std` + `alloc`)
//! - Bounded buffers for every signature encoding step
//! - No error ever stops the control loop
//!
//! ```
//! use c3ds_core::message::{HeartbeatData, MessageBuilder};
//! use c3ds_core::signer::{PrivateKey, Signer};
//! use c3ds_core::time::IsoTimestamp;
//!
//! let builder = MessageBuilder::new("sensor-01").unwrap();
//! let payload = builder
//!     .build(&IsoTimestamp::epoch(), &HeartbeatData::online(60, -70, 40_000).into())
//!     .unwrap();
//!
//! let signer = Signer::new(PrivateKey::from_bytes(&[0x5a; 32]).unwrap());
//! let signature = signer.sign(payload.as_bytes()).unwrap();
//! assert_eq!(signature.as_str().len() % 4, 0);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

#[macro_use]
mod logging;

pub mod config;
pub mod constants;
pub mod detection;
pub mod errors;
pub mod message;
pub mod node;
pub mod scheduler;
pub mod signer;
pub mod time;
pub mod transport;

// Public API
pub use config::{DeviceIdentity, NodeConfig};
pub use detection::{DetectionEvent, DetectionState, DetectionStateMachine, SensorReading};
pub use errors::{DeliveryError, PipelineError, SigningError};
pub use message::{MessageBuilder, MessageData, Payload};
pub use node::{SensorNode, SignedMessage, StepReport, Transport};
pub use scheduler::Scheduler;
pub use signer::{Base64Signature, PrivateKey, Signer};
pub use transport::{Classification, StatusPattern, TransportError, TransportOutcome};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
