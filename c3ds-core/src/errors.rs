//! Error Types for the Secure Telemetry Pipeline
//!
//! ## Design Philosophy
//!
//! The node runs a single cooperative loop that must never stop, so every
//! error here is a value the loop inspects and moves past:
//!
//! 1. **Small Size**: Variants carry only inline data (codes, lengths,
//!    `&'static str`), no heap, so they can be returned from hot paths.
//!
//! 2. **Copy Semantics**: All leaf errors are `Copy`, which keeps the
//!    per-step report cheap to build and inspect.
//!
//! 3. **One Enum per Concern**: sensing, encoding, signing, messaging and
//!    delivery fail for different reasons and are handled differently.
//!
//! ## Error Categories
//!
//! ### Sensor
//! - [`SensorError`]: a reading that must not be folded into detection state.
//!   Recovered silently: confirmation counters reset, nothing is sent.
//!
//! ### Signing
//! - [`SigningError`] / [`DerError`]: fatal for one message, never for the
//!   device. The send is skipped and the timers still advance.
//!
//! ### Delivery
//! - [`DeliveryError`]: the collector rejected the message or the transport
//!   failed. Authentication failures are kept distinct from other client
//!   errors because they recur every interval until re-provisioning.
//!
//! ## Error Handling Strategy
//!
//! ```rust
//! use c3ds_core::errors::DeliveryError;
//!
//! fn on_delivery(result: Result<(), DeliveryError>) {
//!     match result {
//!         Ok(()) => {}
//!         Err(DeliveryError::AuthFailure { .. }) => {
//!             // certificate or signature rejected, operator must act
//!         }
//!         Err(e) if e.is_transient() => {
//!             // next heartbeat/alert tick is the retry
//!         }
//!         Err(_) => {
//!             // client bug, retrying faster will not help
//!         }
//!     }
//! }
//! ```

use thiserror_no_std::Error;

use crate::transport::TransportError;

/// Result type for sensor conversions
pub type SensorResult<T> = Result<T, SensorError>;

/// A sensor sample that carries no usable measurement
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SensorError {
    /// No echo within the timeout (or no echo at all)
    #[error("Echo timeout after {pulse_us}us")]
    EchoTimeout {
        /// Measured pulse width, 0 when nothing came back
        pulse_us: u32,
    },

    /// Echo arrived too fast to be a real object
    #[error("Echo of {pulse_us}us is below the {min_pulse_us}us noise floor")]
    TooClose {
        /// Measured pulse width
        pulse_us: u32,
        /// Shortest pulse accepted as a real echo
        min_pulse_us: u32,
    },

    /// Converted distance outside the sensor's reliable range
    #[error("Distance {distance_cm}cm outside range [{min_cm}, {max_cm}]")]
    OutOfRange {
        /// Converted distance
        distance_cm: f32,
        /// Minimum reliable distance
        min_cm: f32,
        /// Maximum reliable distance
        max_cm: f32,
    },

    /// NaN or infinite distance
    #[error("Invalid value: not a valid number")]
    InvalidValue,
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::EchoTimeout { pulse_us } =>
                defmt::write!(fmt, "Echo timeout after {}us", pulse_us),
            Self::TooClose { pulse_us, min_pulse_us } =>
                defmt::write!(fmt, "Echo {}us below {}us", pulse_us, min_pulse_us),
            Self::OutOfRange { distance_cm, min_cm, max_cm } =>
                defmt::write!(fmt, "Distance {} outside [{}, {}]", distance_cm, min_cm, max_cm),
            Self::InvalidValue =>
                defmt::write!(fmt, "Invalid value"),
        }
    }
}

/// ASN.1 DER encoding and decoding failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerError {
    /// r or s is zero, which no valid ECDSA signature contains
    #[error("Signature component is zero")]
    ZeroInteger,

    /// Input ended before the announced length
    #[error("DER input truncated")]
    Truncated,

    /// Wrong tag at a known position
    #[error("Expected tag {expected:#04x}, found {found:#04x}")]
    UnexpectedTag {
        /// Tag required at this position
        expected: u8,
        /// Tag actually present
        found: u8,
    },

    /// Length byte is long-form, or disagrees with the content
    #[error("DER length mismatch")]
    LengthMismatch,

    /// INTEGER body longer than a padded P-256 scalar
    #[error("INTEGER of {len} bytes does not fit a 32-byte scalar")]
    IntegerTooLong {
        /// Body length found
        len: usize,
    },

    /// INTEGER has a redundant leading `0x00`
    #[error("INTEGER is not minimally encoded")]
    NonMinimalInteger,

    /// INTEGER has its sign bit set
    #[error("INTEGER is negative")]
    NegativeInteger,
}

/// Reasons a payload could not be signed
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningError {
    /// Key bytes are zero, not 32 bytes, or not below the curve order
    #[error("Private key is invalid")]
    InvalidKey,

    /// The ECDSA primitive reported failure (e.g. RNG exhaustion)
    #[error("ECDSA signing primitive failed")]
    Primitive,

    /// The raw signature could not be DER encoded
    #[error("DER encoding failed: {0}")]
    Encoding(DerError),
}

impl From<DerError> for SigningError {
    fn from(e: DerError) -> Self {
        SigningError::Encoding(e)
    }
}

/// Reasons a received signature does not authenticate a payload
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    /// Header value is not standard base64
    #[error("Signature is not valid base64")]
    InvalidBase64,

    /// Decoded bytes are not a DER ECDSA signature
    #[error("Malformed DER signature: {0}")]
    Der(DerError),

    /// Public key is not a SEC1 encoded P-256 point
    #[error("Public key is invalid")]
    InvalidPublicKey,

    /// Signature does not match payload and key
    #[error("Signature does not verify")]
    BadSignature,
}

/// Reasons a payload could not be built
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageError {
    /// The collector rejects messages without a device id
    #[error("Device id is empty")]
    MissingDeviceId,

    /// serde_json could not render the payload
    #[error("Payload serialization failed")]
    Serialization,
}

/// Invalid node configuration
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// Device id missing from the identity
    #[error("Device id is empty")]
    EmptyDeviceId,

    /// A timer interval of zero would fire on every loop iteration
    #[error("Interval {name} must be non-zero")]
    ZeroInterval {
        /// Name of the offending field
        name: &'static str,
    },

    /// Detection threshold or hysteresis is not a positive number
    #[error("Invalid detection geometry: {reason}")]
    InvalidThreshold {
        /// What is wrong
        reason: &'static str,
    },

    /// JSON config could not be parsed
    #[error("Config parse failed")]
    Parse,
}

/// A message that left the device but was not accepted
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// 400: malformed payload or missing fields
    #[error("Bad request ({status})")]
    BadRequest {
        /// HTTP status
        status: u16,
    },

    /// 401/403: certificate, signature or revocation problem
    #[error("Authentication failed ({status})")]
    AuthFailure {
        /// HTTP status
        status: u16,
    },

    /// Any other non-2xx, non-5xx status
    #[error("Client error ({status})")]
    ClientError {
        /// HTTP status
        status: u16,
    },

    /// 5xx: collector-side, transient
    #[error("Server error ({status})")]
    ServerError {
        /// HTTP status
        status: u16,
    },

    /// Read timeout from the transport
    #[error("Request timed out")]
    Timeout,

    /// Transport failed before a status was received
    #[error("Network error: {0}")]
    Network(TransportError),
}

impl DeliveryError {
    /// Transient errors are retried on the next natural tick
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            DeliveryError::ServerError { .. } | DeliveryError::Timeout | DeliveryError::Network(_)
        )
    }
}

/// Failure to produce a signed message at all
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineError {
    /// Payload construction failed
    #[error("Message build failed: {0}")]
    Message(MessageError),

    /// Signing failed
    #[error("Signing failed: {0}")]
    Signing(SigningError),
}

impl From<MessageError> for PipelineError {
    fn from(e: MessageError) -> Self {
        PipelineError::Message(e)
    }
}

impl From<SigningError> for PipelineError {
    fn from(e: SigningError) -> Self {
        PipelineError::Signing(e)
    }
}
