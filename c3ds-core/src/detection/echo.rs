//! HC-SR04 echo pulse to distance conversion
//!
//! The ranger reports the round-trip time of a 40 kHz burst. Distance is
//! half the round trip times the speed of sound:
//!
//! ```text
//! distance_cm = (pulse_us / 2) * 0.0343
//! ```
//!
//! The pulse is validated before it becomes a distance. A missing echo is an
//! invalid reading, never a zero distance.

use serde::{Deserialize, Serialize};

use crate::constants::sensors::{
    SENSOR_MAX_DISTANCE_CM, SENSOR_MIN_DISTANCE_CM, SENSOR_PULSE_TIMEOUT_US,
    SPEED_OF_SOUND_CM_PER_US,
};
use crate::errors::{SensorError, SensorResult};

/// Echo sensor geometry and physics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EchoConfig {
    /// Closest reliable distance (cm)
    pub min_distance_cm: f32,
    /// Farthest reliable distance (cm)
    pub max_distance_cm: f32,
    /// Longest pulse waited for (µs)
    pub pulse_timeout_us: u32,
    /// Speed of sound (cm/µs)
    pub speed_of_sound_cm_per_us: f32,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            min_distance_cm: SENSOR_MIN_DISTANCE_CM,
            max_distance_cm: SENSOR_MAX_DISTANCE_CM,
            pulse_timeout_us: SENSOR_PULSE_TIMEOUT_US,
            speed_of_sound_cm_per_us: SPEED_OF_SOUND_CM_PER_US,
        }
    }
}

impl EchoConfig {
    /// Shortest pulse that converts to at least `min_distance_cm`
    pub fn min_pulse_us(&self) -> u32 {
        let exact = 2.0 * self.min_distance_cm / self.speed_of_sound_cm_per_us;
        let whole = exact as u32;
        if (whole as f32) < exact { whole + 1 } else { whole }
    }

    /// Convert a measured echo pulse into a distance
    pub fn distance_from_echo(&self, pulse_us: u32) -> SensorResult<f32> {
        if pulse_us == 0 || pulse_us > self.pulse_timeout_us {
            return Err(SensorError::EchoTimeout { pulse_us });
        }

        let distance_cm = (pulse_us as f32 / 2.0) * self.speed_of_sound_cm_per_us;
        if !distance_cm.is_finite() {
            return Err(SensorError::InvalidValue);
        }

        if distance_cm < self.min_distance_cm {
            return Err(SensorError::TooClose {
                pulse_us,
                min_pulse_us: self.min_pulse_us(),
            });
        }

        if distance_cm > self.max_distance_cm {
            return Err(SensorError::OutOfRange {
                distance_cm,
                min_cm: self.min_distance_cm,
                max_cm: self.max_distance_cm,
            });
        }

        Ok(distance_cm)
    }
}
