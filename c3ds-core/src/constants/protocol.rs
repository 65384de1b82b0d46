//! Wire Protocol and Status Indicator Constants

// ===== HTTP HEADERS =====

/// Body content type.
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Header carrying the base64 PEM device certificate.
pub const HEADER_DEVICE_CERTIFICATE: &str = "X-Device-Certificate";

/// Header carrying the base64 DER signature of the body.
pub const HEADER_DEVICE_SIGNATURE: &str = "X-Device-Signature";

// ===== TIMESTAMPS =====

/// Length of `YYYY-MM-DDTHH:MM:SSZ`.
pub const ISO_TIMESTAMP_LEN: usize = 20;

/// Placeholder sent while the wall clock is not synchronised.
pub const EPOCH_TIMESTAMP: &str = "1970-01-01T00:00:00Z";

// ===== HEARTBEAT =====

/// `status` reported by every heartbeat.
pub const HEARTBEAT_STATUS_ONLINE: &str = "online";

/// Confidence attached to every alert. Both sensors are binary detectors.
pub const ALERT_CONFIDENCE: f32 = 1.0;

// ===== STATUS INDICATOR =====

/// One long blink acknowledges an accepted message (ms).
pub const SUCCESS_BLINK_MS: u64 = 1000;

/// Blink length of an error pattern (ms).
pub const ERROR_BLINK_MS: u64 = 200;

/// Pause after an error pattern (ms).
pub const ERROR_PAUSE_MS: u64 = 500;

/// Short acknowledgement blink for an accepted button press (ms).
pub const PRESS_ACK_BLINK_MS: u64 = 100;

/// Error blinks: 400 Bad Request.
pub const BLINKS_BAD_REQUEST: u8 = 3;

/// Error blinks: 401/403 authentication failure.
pub const BLINKS_AUTH_FAILURE: u8 = 4;

/// Error blinks: 5xx server error.
pub const BLINKS_SERVER_ERROR: u8 = 5;

/// Error blinks: any other unexpected status.
pub const BLINKS_UNEXPECTED_STATUS: u8 = 6;

/// Error blinks: transport failure (no HTTP status).
pub const BLINKS_NETWORK_ERROR: u8 = 10;
