//! Sensor Specifications and Limits
//!
//! Operational limits for the HC-SR04 ultrasonic ranger and the detection
//! thresholds used by the hysteresis state machine.

// ===== DETECTION THRESHOLDS =====

/// Entry threshold: an object at or closer than this is in range (cm).
pub const DETECTION_THRESHOLD_CM: f32 = 25.0;

/// Hysteresis margin added to the entry threshold while detecting (cm).
///
/// Detection is released only beyond 27 cm, so an object hovering at the
/// boundary does not toggle the state on every sample.
pub const DETECTION_HYSTERESIS_CM: f32 = 2.0;

/// Consecutive valid readings needed to enter or leave detection.
pub const CONSECUTIVE_READINGS_REQUIRED: u8 = 2;

// ===== HC-SR04 SPECIFICATIONS =====

/// Minimum reliable distance (cm). Closer echoes are treated as noise.
///
/// Source: HC-SR04 datasheet
pub const SENSOR_MIN_DISTANCE_CM: f32 = 2.0;

/// Maximum reliable distance (cm).
///
/// Source: HC-SR04 datasheet
pub const SENSOR_MAX_DISTANCE_CM: f32 = 400.0;

/// Echo pulse timeout (µs). Roughly 500 cm of round trip.
pub const SENSOR_PULSE_TIMEOUT_US: u32 = 30_000;

/// Speed of sound at 20°C (cm/µs). 343 m/s.
pub const SPEED_OF_SOUND_CM_PER_US: f32 = 0.0343;

// ===== SENSOR LABELS =====

/// `sensor_type` reported for the ultrasonic ranger.
pub const ULTRASONIC_SENSOR_TYPE: &str = "HC-SR04";

/// `event` reported for an ultrasonic detection.
pub const ULTRASONIC_EVENT: &str = "ultrasonic_detection";

/// `sensor_type` reported for the push button.
pub const BUTTON_SENSOR_TYPE: &str = "manual";

/// `event` reported for a button press.
pub const BUTTON_EVENT: &str = "button_press";
