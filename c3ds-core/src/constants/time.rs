//! Time-Related Constants
//!
//! Intervals and windows used by the scheduler and the detection state
//! machines. Values match the deployed C3DS sensor templates.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

// ===== SCHEDULER INTERVALS =====

/// Heartbeat interval (milliseconds).
///
/// One liveness message every 20 seconds regardless of detection state.
/// Also the natural retry cadence after a failed heartbeat.
pub const HEARTBEAT_INTERVAL_MS: u64 = 20_000;

/// Alert interval while an object is detected (milliseconds).
pub const ALERT_INTERVAL_MS: u64 = 10_000;

/// Sensor poll interval (milliseconds).
///
/// The ultrasonic sensor is sampled twice per second.
pub const SENSOR_POLL_INTERVAL_MS: u64 = 500;

/// Upper bound on a single HTTP exchange (milliseconds).
///
/// Bounds the worst-case stall of the control loop.
pub const HTTP_TIMEOUT_MS: u64 = 10_000;

// ===== BUTTON TIMING =====

/// A level must be stable for longer than this before it is committed (milliseconds).
pub const DEBOUNCE_WINDOW_MS: u64 = 50;

/// Minimum spacing between two accepted presses (milliseconds).
///
/// Rate limiting on top of debouncing: a press committed sooner than this
/// after the previous accepted press is ignored.
pub const MIN_PRESS_INTERVAL_MS: u64 = 2_000;

// ===== INDICATOR TIMING =====

/// Status LED toggle period while an object is detected (milliseconds).
pub const DETECTION_BLINK_INTERVAL_MS: u64 = 300;

// ===== WALL CLOCK =====

/// Smallest unix time (seconds) accepted as a synchronised wall clock.
///
/// Anything below this (Jan 2, 1970) means NTP has not completed yet.
pub const MIN_VALID_UNIX_TIMESTAMP: i64 = 100_000;
