//! Response classification and status indicator patterns
//!
//! The core never owns a socket. A transport collaborator reports either the
//! HTTP status it received or a negative transport code, and this module
//! decides what that means:
//!
//! | Outcome                | Classification          | Indicator        |
//! |------------------------|-------------------------|------------------|
//! | 2xx                    | `Success`               | one 1000 ms blink|
//! | 400                    | `ClientError` (bad req) | 3 blinks         |
//! | 401 / 403              | `ClientError` (auth)    | 4 blinks         |
//! | other status           | `ClientError` (other)   | 6 blinks         |
//! | 5xx                    | `ServerError`           | 5 blinks         |
//! | negative code          | `NetworkError`          | 10 blinks        |
//!
//! Nothing here retries. The next scheduler tick is the retry.

use core::fmt;

use crate::constants::protocol::{
    BLINKS_AUTH_FAILURE, BLINKS_BAD_REQUEST, BLINKS_NETWORK_ERROR, BLINKS_SERVER_ERROR,
    BLINKS_UNEXPECTED_STATUS, ERROR_BLINK_MS, ERROR_PAUSE_MS, PRESS_ACK_BLINK_MS,
    SUCCESS_BLINK_MS,
};
use crate::constants::time::DETECTION_BLINK_INTERVAL_MS;
use crate::errors::DeliveryError;
use crate::time::Timestamp;

/// Transport-level failure before any HTTP status was read
///
/// Codes follow the ESP8266 HTTP client so operator tooling keeps working.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// -1
    ConnectionFailed,
    /// -2
    SendHeaderFailed,
    /// -3
    SendPayloadFailed,
    /// -4
    NotConnected,
    /// -5
    ConnectionLost,
    /// -11
    ReadTimeout,
    /// Any other negative code
    Other(i32),
}

impl TransportError {
    /// Map a negative client return code
    pub const fn from_code(code: i32) -> Self {
        match code {
            -1 => TransportError::ConnectionFailed,
            -2 => TransportError::SendHeaderFailed,
            -3 => TransportError::SendPayloadFailed,
            -4 => TransportError::NotConnected,
            -5 => TransportError::ConnectionLost,
            -11 => TransportError::ReadTimeout,
            other => TransportError::Other(other),
        }
    }

    /// Raw client return code
    pub const fn code(&self) -> i32 {
        match self {
            TransportError::ConnectionFailed => -1,
            TransportError::SendHeaderFailed => -2,
            TransportError::SendPayloadFailed => -3,
            TransportError::NotConnected => -4,
            TransportError::ConnectionLost => -5,
            TransportError::ReadTimeout => -11,
            TransportError::Other(code) => *code,
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self {
            TransportError::ConnectionFailed => "connection failed",
            TransportError::SendHeaderFailed => "send header failed",
            TransportError::SendPayloadFailed => "send payload failed",
            TransportError::NotConnected => "not connected",
            TransportError::ConnectionLost => "connection lost",
            TransportError::ReadTimeout => "read timeout",
            TransportError::Other(_) => "transport error",
        };
        write!(f, "{} ({})", what, self.code())
    }
}

/// What the transport collaborator observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportOutcome {
    /// An HTTP status line was received (body ignored)
    Response(u16),
    /// No status: the exchange failed at the transport layer
    Failed(TransportError),
}

impl TransportOutcome {
    /// Interpret a raw client return value: positive is a status, negative a transport code
    ///
    /// The server answered if the code is positive, so a status too large for
    /// `u16` saturates to `u16::MAX` and classifies as an unknown client error.
    pub fn from_code(code: i32) -> Self {
        if code > 0 {
            TransportOutcome::Response(u16::try_from(code).unwrap_or(u16::MAX))
        } else {
            TransportOutcome::Failed(TransportError::from_code(code))
        }
    }
}

/// Kinds of client error the operator can tell apart
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    /// 400: payload malformed or fields missing
    BadRequest,
    /// 401/403: certificate, signature or revocation
    AuthFailure,
    /// Any other non-success, non-5xx status
    Other,
}

/// Classified send outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// 2xx: accepted
    Success {
        /// HTTP status
        status: u16,
    },
    /// Rejected by the collector, not worth retrying as is
    ClientError {
        /// HTTP status
        status: u16,
        /// Which kind of rejection
        kind: ClientErrorKind,
    },
    /// 5xx: collector trouble
    ServerError {
        /// HTTP status
        status: u16,
    },
    /// No HTTP response at all
    NetworkError(TransportError),
}

impl Classification {
    /// Map an outcome onto the collector's response classes
    pub fn classify(outcome: TransportOutcome) -> Self {
        match outcome {
            TransportOutcome::Failed(e) => Classification::NetworkError(e),
            TransportOutcome::Response(status) => match status {
                200..=299 => Classification::Success { status },
                400 => Classification::ClientError { status, kind: ClientErrorKind::BadRequest },
                401 | 403 => Classification::ClientError { status, kind: ClientErrorKind::AuthFailure },
                500..=599 => Classification::ServerError { status },
                _ => Classification::ClientError { status, kind: ClientErrorKind::Other },
            },
        }
    }

    /// 2xx status
    pub fn is_success(&self) -> bool {
        matches!(self, Classification::Success { .. })
    }

    /// 401 or 403
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self,
            Classification::ClientError { kind: ClientErrorKind::AuthFailure, .. }
        )
    }

    /// Indicator feedback for this outcome
    pub fn indicator_pattern(&self) -> StatusPattern {
        let blinks = match self {
            Classification::Success { .. } => return StatusPattern::Success,
            Classification::ClientError { kind: ClientErrorKind::BadRequest, .. } => BLINKS_BAD_REQUEST,
            Classification::ClientError { kind: ClientErrorKind::AuthFailure, .. } => BLINKS_AUTH_FAILURE,
            Classification::ClientError { kind: ClientErrorKind::Other, .. } => BLINKS_UNEXPECTED_STATUS,
            Classification::ServerError { .. } => BLINKS_SERVER_ERROR,
            Classification::NetworkError(_) => BLINKS_NETWORK_ERROR,
        };
        StatusPattern::Error { blinks }
    }

    /// `Ok` only for a 2xx status
    pub fn into_result(self) -> Result<(), DeliveryError> {
        match self {
            Classification::Success { .. } => Ok(()),
            Classification::ClientError { status, kind } => Err(match kind {
                ClientErrorKind::BadRequest => DeliveryError::BadRequest { status },
                ClientErrorKind::AuthFailure => DeliveryError::AuthFailure { status },
                ClientErrorKind::Other => DeliveryError::ClientError { status },
            }),
            Classification::ServerError { status } => Err(DeliveryError::ServerError { status }),
            Classification::NetworkError(TransportError::ReadTimeout) => Err(DeliveryError::Timeout),
            Classification::NetworkError(e) => Err(DeliveryError::Network(e)),
        }
    }
}

impl From<TransportOutcome> for Classification {
    fn from(outcome: TransportOutcome) -> Self {
        Classification::classify(outcome)
    }
}

/// Feedback shown on the status LED
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusPattern {
    /// One long blink
    Success,
    /// `blinks` short blinks, then a pause
    Error { blinks: u8 },
    /// Short blink acknowledging an accepted button press
    PressAck,
}

impl StatusPattern {
    /// `(on_ms, count, pause_ms)`
    pub const fn timing(&self) -> (u64, u8, u64) {
        match self {
            StatusPattern::Success => (SUCCESS_BLINK_MS, 1, 0),
            StatusPattern::Error { blinks } => (ERROR_BLINK_MS, *blinks, ERROR_PAUSE_MS),
            StatusPattern::PressAck => (PRESS_ACK_BLINK_MS, 1, 0),
        }
    }
}

/// LED toggling while an object is detected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionBlinker {
    interval_ms: u64,
    last_toggle: Timestamp,
    lit: bool,
}

impl Default for DetectionBlinker {
    fn default() -> Self {
        Self::new(DETECTION_BLINK_INTERVAL_MS)
    }
}

impl DetectionBlinker {
    /// Toggle every `interval_ms` while detecting
    pub const fn new(interval_ms: u64) -> Self {
        Self { interval_ms, last_toggle: 0, lit: false }
    }

    /// Desired LED level, or `None` if unchanged since the last call
    pub fn update(&mut self, now: Timestamp, detecting: bool) -> Option<bool> {
        if !detecting {
            if self.lit {
                self.lit = false;
                return Some(false);
            }
            return None;
        }

        if now.saturating_sub(self.last_toggle) >= self.interval_ms {
            self.last_toggle = now;
            self.lit = !self.lit;
            return Some(self.lit);
        }
        None
    }

    /// Current LED level
    pub fn is_lit(&self) -> bool {
        self.lit
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(status: u16) -> Classification {
        Classification::classify(TransportOutcome::Response(status))
    }

    #[test]
    fn statuses_map_to_classes() {
        assert_eq!(classify(200), Classification::Success { status: 200 });
        assert_eq!(classify(201), Classification::Success { status: 201 });
        assert_eq!(
            classify(400),
            Classification::ClientError { status: 400, kind: ClientErrorKind::BadRequest }
        );
        assert!(classify(401).is_auth_failure());
        assert!(classify(403).is_auth_failure());
        assert!(!classify(404).is_auth_failure());
        assert_eq!(classify(503), Classification::ServerError { status: 503 });
        assert_eq!(
            classify(302),
            Classification::ClientError { status: 302, kind: ClientErrorKind::Other }
        );
    }

    #[test]
    fn transport_codes_roundtrip() {
        for code in [-1, -2, -3, -4, -5, -11, -7] {
            assert_eq!(TransportError::from_code(code).code(), code);
        }
        assert_eq!(
            TransportOutcome::from_code(-11),
            TransportOutcome::Failed(TransportError::ReadTimeout)
        );
        assert_eq!(TransportOutcome::from_code(200), TransportOutcome::Response(200));
        assert_eq!(
            TransportOutcome::from_code(0),
            TransportOutcome::Failed(TransportError::Other(0))
        );
    }

    #[test]
    fn oversized_status_is_a_response() {
        let outcome = TransportOutcome::from_code(70_000);
        assert_eq!(outcome, TransportOutcome::Response(u16::MAX));
        assert_eq!(
            Classification::classify(outcome),
            Classification::ClientError { status: u16::MAX, kind: ClientErrorKind::Other }
        );
    }

    #[test]
    fn indicator_blink_counts() {
        let blinks = |c: Classification| match c.indicator_pattern() {
            StatusPattern::Error { blinks } => blinks,
            other => panic!("unexpected {:?}", other),
        };

        assert_eq!(classify(204).indicator_pattern(), StatusPattern::Success);
        assert_eq!(blinks(classify(400)), 3);
        assert_eq!(blinks(classify(401)), 4);
        assert_eq!(blinks(classify(403)), 4);
        assert_eq!(blinks(classify(500)), 5);
        assert_eq!(blinks(classify(418)), 6);
        assert_eq!(
            blinks(Classification::classify(TransportOutcome::Failed(TransportError::ConnectionLost))),
            10
        );
    }

    #[test]
    fn delivery_errors_keep_auth_distinct() {
        assert_eq!(classify(200).into_result(), Ok(()));
        assert_eq!(classify(401).into_result(), Err(DeliveryError::AuthFailure { status: 401 }));
        assert_eq!(classify(404).into_result(), Err(DeliveryError::ClientError { status: 404 }));
        assert_eq!(
            Classification::from(TransportOutcome::Failed(TransportError::ReadTimeout)).into_result(),
            Err(DeliveryError::Timeout)
        );
        assert_eq!(
            Classification::from(TransportOutcome::Failed(TransportError::NotConnected)).into_result(),
            Err(DeliveryError::Network(TransportError::NotConnected))
        );
    }

    #[test]
    fn pattern_timing() {
        assert_eq!(StatusPattern::Success.timing(), (1000, 1, 0));
        assert_eq!(StatusPattern::Error { blinks: 4 }.timing(), (200, 4, 500));
        assert_eq!(StatusPattern::PressAck.timing(), (100, 1, 0));
    }

    #[test]
    fn blinker_toggles_while_detecting() {
        let mut blinker = DetectionBlinker::default();

        assert_eq!(blinker.update(300, true), Some(true));
        assert_eq!(blinker.update(500, true), None);
        assert_eq!(blinker.update(600, true), Some(false));
        assert_eq!(blinker.update(900, true), Some(true));
        assert_eq!(blinker.update(950, false), Some(false));
        assert_eq!(blinker.update(1300, false), None);
        assert!(!blinker.is_lit());
    }
}
