//! Constants for C3DS Core
//!
//! This module provides centralized, documented constants used throughout the
//! node firmware. All numeric values live here with a note on their purpose
//! and source, so the state machines and encoders never carry magic numbers.
//!
//! ## Organization
//!
//! Constants are grouped by domain:
//! - **Time**: Intervals, debounce windows and clock thresholds
//! - **Sensors**: HC-SR04 geometry, detection thresholds and echo physics
//! - **Crypto**: Fixed sizes of keys, digests and encoded signatures
//! - **Protocol**: HTTP header names, timestamp format, indicator patterns
//!
//! ## Usage Guidelines
//!
//! 1. Always use these constants instead of magic numbers
//! 2. Use descriptive names that include units
//! 3. Defaults for [`crate::config::NodeConfig`] come from here

/// Timer intervals, debounce windows and wall-clock thresholds.
pub mod time;

/// Ultrasonic and button sensor parameters.
pub mod sensors;

/// Sizes and tags for keys, digests and DER/base64 signatures.
pub mod crypto;

/// Wire-level names and status indicator timings.
pub mod protocol;

// Re-export commonly used constants for convenience
pub use time::{
    MS_PER_SECOND, HEARTBEAT_INTERVAL_MS, ALERT_INTERVAL_MS,
    SENSOR_POLL_INTERVAL_MS, HTTP_TIMEOUT_MS, MIN_VALID_UNIX_TIMESTAMP,
};

pub use sensors::{
    DETECTION_THRESHOLD_CM, DETECTION_HYSTERESIS_CM, CONSECUTIVE_READINGS_REQUIRED,
    SENSOR_MIN_DISTANCE_CM, SENSOR_MAX_DISTANCE_CM,
};

pub use crypto::{
    PRIVATE_KEY_LEN, DIGEST_LEN, RAW_SIGNATURE_LEN, MAX_DER_SIGNATURE_LEN,
};
