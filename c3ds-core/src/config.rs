//! Node configuration
//!
//! All tunables of a sensor node in one serde-friendly struct. Defaults come
//! from [`crate::constants`] and match the deployed firmware, so a config
//! file only needs to carry the device identity:
//!
//! ```
//! use c3ds_core::config::NodeConfig;
//!
//! let config = NodeConfig::from_json(r#"{
//!     "identity": { "device_id": "sensor-07", "certificate_b64": "LS0tLS1CRUdJTi..." },
//!     "alert_interval_ms": 5000
//! }"#).unwrap();
//!
//! assert_eq!(config.heartbeat_interval_ms, 20_000);
//! assert_eq!(config.alert_interval_ms, 5_000);
//! ```

use alloc::string::String;

use serde::{Deserialize, Serialize};

use crate::constants::sensors::{
    CONSECUTIVE_READINGS_REQUIRED, DETECTION_HYSTERESIS_CM, DETECTION_THRESHOLD_CM,
};
use crate::constants::time::{
    ALERT_INTERVAL_MS, DEBOUNCE_WINDOW_MS, HEARTBEAT_INTERVAL_MS, HTTP_TIMEOUT_MS,
    MIN_PRESS_INTERVAL_MS, SENSOR_POLL_INTERVAL_MS,
};
use crate::detection::EchoConfig;
use crate::errors::ConfigError;

/// Static credentials sent with every message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Identifier registered with the collector
    pub device_id: String,
    /// Base64 PEM certificate, sent verbatim in `X-Device-Certificate`
    pub certificate_b64: String,
}

impl DeviceIdentity {
    /// Bundle the values
    pub fn new(device_id: impl Into<String>, certificate_b64: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            certificate_b64: certificate_b64.into(),
        }
    }
}

/// Button debouncing and rate limiting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// A level must be stable for longer than this before it is committed
    pub window_ms: u64,
    /// Minimum spacing between two accepted presses
    pub min_press_interval_ms: u64,
    /// Pressed reads low (button to ground with pull-up)
    pub active_low: bool,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            window_ms: DEBOUNCE_WINDOW_MS,
            min_press_interval_ms: MIN_PRESS_INTERVAL_MS,
            active_low: true,
        }
    }
}

/// Ultrasonic detection zone
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HysteresisConfig {
    /// Enter detection at or below this distance (cm)
    pub threshold_cm: f32,
    /// Extra margin before leaving detection (cm)
    pub hysteresis_cm: f32,
    /// Readings needed to confirm entry or exit
    pub consecutive_readings: u8,
}

impl Default for HysteresisConfig {
    fn default() -> Self {
        Self {
            threshold_cm: DETECTION_THRESHOLD_CM,
            hysteresis_cm: DETECTION_HYSTERESIS_CM,
            consecutive_readings: CONSECUTIVE_READINGS_REQUIRED,
        }
    }
}

/// Complete node configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Credentials sent with every message
    pub identity: DeviceIdentity,
    /// Heartbeat cadence
    pub heartbeat_interval_ms: u64,
    /// Alert cadence while detecting
    pub alert_interval_ms: u64,
    /// Sensor sampling cadence
    pub sensor_poll_interval_ms: u64,
    /// Upper bound handed to the transport for one exchange
    pub http_timeout_ms: u64,
    /// Button timing
    pub debounce: DebounceConfig,
    /// Ultrasonic thresholds
    pub hysteresis: HysteresisConfig,
    /// HC-SR04 echo conversion
    pub echo: EchoConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            identity: DeviceIdentity::default(),
            heartbeat_interval_ms: HEARTBEAT_INTERVAL_MS,
            alert_interval_ms: ALERT_INTERVAL_MS,
            sensor_poll_interval_ms: SENSOR_POLL_INTERVAL_MS,
            http_timeout_ms: HTTP_TIMEOUT_MS,
            debounce: DebounceConfig::default(),
            hysteresis: HysteresisConfig::default(),
            echo: EchoConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Defaults for the given device
    pub fn new(identity: DeviceIdentity) -> Self {
        Self { identity, ..Self::default() }
    }

    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(|_| ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Override the heartbeat cadence
    pub fn heartbeat_interval_ms(mut self, ms: u64) -> Self {
        self.heartbeat_interval_ms = ms;
        self
    }

    /// Override the alert cadence
    pub fn alert_interval_ms(mut self, ms: u64) -> Self {
        self.alert_interval_ms = ms;
        self
    }

    /// Override the sensor poll cadence
    pub fn sensor_poll_interval_ms(mut self, ms: u64) -> Self {
        self.sensor_poll_interval_ms = ms;
        self
    }

    /// Override the transport timeout
    pub fn http_timeout_ms(mut self, ms: u64) -> Self {
        self.http_timeout_ms = ms;
        self
    }

    /// Override button timing
    pub fn debounce(mut self, debounce: DebounceConfig) -> Self {
        self.debounce = debounce;
        self
    }

    /// Override ultrasonic thresholds
    pub fn hysteresis(mut self, hysteresis: HysteresisConfig) -> Self {
        self.hysteresis = hysteresis;
        self
    }

    /// Override echo conversion
    pub fn echo(mut self, echo: EchoConfig) -> Self {
        self.echo = echo;
        self
    }

    /// Reject configurations the control loop cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let result = self.check();
        if let Err(e) = &result {
            log_warn!("invalid node config: {}", e);
        }
        result
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.identity.device_id.trim().is_empty() {
            return Err(ConfigError::EmptyDeviceId);
        }

        let intervals = [
            ("heartbeat_interval_ms", self.heartbeat_interval_ms),
            ("alert_interval_ms", self.alert_interval_ms),
            ("sensor_poll_interval_ms", self.sensor_poll_interval_ms),
            ("http_timeout_ms", self.http_timeout_ms),
        ];
        if let Some((name, _)) = intervals.iter().find(|(_, ms)| *ms == 0) {
            return Err(ConfigError::ZeroInterval { name: *name });
        }

        let zone = &self.hysteresis;
        if !(zone.threshold_cm.is_finite() && zone.threshold_cm > 0.0) {
            return Err(ConfigError::InvalidThreshold { reason: "threshold must be positive" });
        }
        if !(zone.hysteresis_cm.is_finite() && zone.hysteresis_cm >= 0.0) {
            return Err(ConfigError::InvalidThreshold { reason: "hysteresis must not be negative" });
        }
        if zone.consecutive_readings == 0 {
            return Err(ConfigError::InvalidThreshold { reason: "consecutive readings must be non-zero" });
        }

        let echo = &self.echo;
        if !(echo.min_distance_cm > 0.0 && echo.min_distance_cm < echo.max_distance_cm) {
            return Err(ConfigError::InvalidThreshold { reason: "echo range is empty" });
        }
        if !(echo.speed_of_sound_cm_per_us.is_finite() && echo.speed_of_sound_cm_per_us > 0.0) {
            return Err(ConfigError::InvalidThreshold { reason: "speed of sound must be positive" });
        }

        Ok(())
    }
}
