//! Network collaborators for C3DS sensor nodes
//!
//! ## Overview
//!
//! The core pipeline never owns a socket. It hands a signed message to a
//! [`Transport`](c3ds_core::node::Transport) and gets back either an HTTP
//! status or a negative transport code. This crate provides that
//! collaborator for hosts with `std`.
//!
//! ## HTTP/HTTPS
//!
//! One `POST` per message to the collector endpoint with three headers:
//!
//! | Header                 | Value                              |
//! |------------------------|------------------------------------|
//! | `Content-Type`         | `application/json`                 |
//! | `X-Device-Certificate` | base64 PEM device certificate      |
//! | `X-Device-Signature`   | base64 DER ECDSA P-256 signature   |
//!
//! The body is the exact payload bytes that were signed.
//!
//! ## Retry Policy
//!
//! None. A failed send is reported once and the node's scheduler waits a
//! full interval before the next attempt. No request is queued.
//!
//! ## Example Usage
//!
//! ```no_run
//! use c3ds_connectors::http::{HttpConfig, HttpTransport};
//!
//! let config = HttpConfig::new("https://collector.local/api/telemetry")
//!     .timeout_ms(10_000)
//!     .header("X-Site", "warehouse-2");
//!
//! let transport = HttpTransport::new(config)?;
//! assert_eq!(transport.stats().messages_sent, 0);
//! # Ok::<(), c3ds_connectors::ConnectorError>(())
//! ```

pub mod http;

pub use http::{HttpConfig, HttpError, HttpTransport};

use c3ds_core::errors::{ConfigError, SigningError};
use c3ds_core::transport::TransportOutcome;
use thiserror::Error;

/// Errors raised while assembling a node's collaborators
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("HTTP connector: {0}")]
    Http(#[from] HttpError),

    #[error("node configuration: {0}")]
    Node(#[from] ConfigError),

    #[error("device key: {0}")]
    Key(#[from] SigningError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Connection statistics common to all connectors
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Requests answered with a 2xx status
    pub messages_sent: u64,
    /// Requests answered with any other status, or not answered at all
    pub messages_failed: u64,
    /// Payload bytes of accepted requests
    pub bytes_sent: u64,
    /// Last error message
    pub last_error: Option<String>,
}

impl ConnectionStats {
    /// Account for one request carrying `bytes` of payload
    pub fn record(&mut self, outcome: &TransportOutcome, bytes: usize) {
        match outcome {
            TransportOutcome::Response(status) if (200..300).contains(status) => {
                self.messages_sent += 1;
                self.bytes_sent += bytes as u64;
            }
            TransportOutcome::Response(status) => {
                self.messages_failed += 1;
                self.last_error = Some(format!("HTTP {}", status));
            }
            TransportOutcome::Failed(e) => {
                self.messages_failed += 1;
                self.last_error = Some(e.to_string());
            }
        }
    }
}
