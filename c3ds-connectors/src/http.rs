//! HTTP/HTTPS transport for the collector endpoint
//!
//! ## Overview
//!
//! [`HttpTransport`] implements the core's [`Transport`] seam on top of a
//! blocking `ureq` agent. Every call is a single request with a fixed
//! timeout. The response body is never read; only the status matters.
//!
//! ## Outcome Mapping
//!
//! | `ureq` result                       | [`TransportOutcome`]                  |
//! |-------------------------------------|---------------------------------------|
//! | any status line (2xx..5xx)          | `Response(status)`                    |
//! | DNS / connect failure               | `Failed(ConnectionFailed)` (-1)       |
//! | bad URL or header                   | `Failed(SendHeaderFailed)` (-2)       |
//! | I/O timeout                         | `Failed(ReadTimeout)` (-11)           |
//! | reset, broken pipe, early EOF       | `Failed(ConnectionLost)` (-5)         |
//! | anything else                       | `Failed(SendPayloadFailed)` (-3)      |
//!
//! ## Example Usage
//!
//! ```no_run
//! use c3ds_connectors::http::{HttpConfig, HttpTransport};
//! use c3ds_core::config::NodeConfig;
//!
//! # fn example(node: &NodeConfig) -> Result<(), c3ds_connectors::HttpError> {
//! let config = HttpConfig::for_node(node, "https://collector.local/api/telemetry");
//! let transport = HttpTransport::new(config)?;
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::io;
use std::time::Duration;

use c3ds_core::config::NodeConfig;
use c3ds_core::constants::time::HTTP_TIMEOUT_MS;
use c3ds_core::node::{SignedMessage, Transport};
use c3ds_core::transport::{TransportError, TransportOutcome};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ConnectionStats;

/// HTTP-specific errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// Endpoint is not an http:// or https:// URL
    #[error("Invalid endpoint {0}: must start with http:// or https://")]
    InvalidUrl(String),

    #[error("Timeout must be non-zero")]
    ZeroTimeout,

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// HTTP configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Collector URL messages are posted to
    pub endpoint: String,
    /// Whole-request timeout
    pub timeout_ms: u64,
    /// User agent string
    pub user_agent: String,
    /// Extra headers sent with every request
    pub headers: HashMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self::new("")
    }
}

impl HttpConfig {
    /// Create new configuration for an endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout_ms: HTTP_TIMEOUT_MS,
            user_agent: format!("c3ds-node/{}", c3ds_core::VERSION),
            headers: HashMap::new(),
        }
    }

    /// Configuration using the node's HTTP timeout
    pub fn for_node(node: &NodeConfig, endpoint: impl Into<String>) -> Self {
        Self::new(endpoint).timeout_ms(node.http_timeout_ms)
    }

    /// Parse from JSON, missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self, HttpError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| HttpError::Serialization(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Set request timeout in milliseconds
    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.timeout_ms = ms;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Add custom header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn validate(&self) -> Result<(), HttpError> {
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(HttpError::InvalidUrl(self.endpoint.clone()));
        }
        if self.timeout_ms == 0 {
            return Err(HttpError::ZeroTimeout);
        }
        Ok(())
    }
}

/// Collector transport using the lightweight ureq client
pub struct HttpTransport {
    config: HttpConfig,
    agent: ureq::Agent,
    stats: ConnectionStats,
}

impl HttpTransport {
    pub fn new(config: HttpConfig) -> Result<Self, HttpError> {
        config.validate()?;

        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .build();

        Ok(Self { config, agent, stats: ConnectionStats::default() })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    fn send(&self, message: &SignedMessage, certificate_b64: &str) -> TransportOutcome {
        let mut request = self.agent.post(&self.config.endpoint);
        for (name, value) in &self.config.headers {
            request = request.set(name, value);
        }
        for (name, value) in message.headers(certificate_b64) {
            request = request.set(name, value);
        }

        match request.send_bytes(message.payload.as_bytes()) {
            Ok(response) => TransportOutcome::Response(response.status()),
            Err(ureq::Error::Status(status, _)) => TransportOutcome::Response(status),
            Err(ureq::Error::Transport(e)) => {
                warn!("POST {} failed: {}", self.config.endpoint, e);
                TransportOutcome::Failed(transport_error(&e))
            }
        }
    }
}

impl Transport for HttpTransport {
    fn post(&mut self, message: &SignedMessage, certificate_b64: &str) -> TransportOutcome {
        let outcome = self.send(message, certificate_b64);
        debug!(
            "POST {} ({} bytes) -> {:?}",
            self.config.endpoint,
            message.payload.len(),
            outcome
        );
        self.stats.record(&outcome, message.payload.len());
        outcome
    }
}

fn transport_error(e: &ureq::Transport) -> TransportError {
    use ureq::ErrorKind;

    match e.kind() {
        ErrorKind::Dns | ErrorKind::ConnectionFailed | ErrorKind::ProxyConnect => {
            TransportError::ConnectionFailed
        }
        ErrorKind::InvalidUrl | ErrorKind::UnknownScheme | ErrorKind::BadHeader => {
            TransportError::SendHeaderFailed
        }
        ErrorKind::Io => io_kind(e).map_or(TransportError::SendPayloadFailed, |kind| match kind {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TransportError::ReadTimeout,
            io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof => TransportError::ConnectionLost,
            io::ErrorKind::ConnectionRefused => TransportError::ConnectionFailed,
            _ => TransportError::SendPayloadFailed,
        }),
        _ => TransportError::SendPayloadFailed,
    }
}

fn io_kind(e: &ureq::Transport) -> Option<io::ErrorKind> {
    std::error::Error::source(e)
        .and_then(|source| source.downcast_ref::<io::Error>())
        .map(io::Error::kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use c3ds_core::message::{HeartbeatData, MessageBuilder};
    use c3ds_core::signer::{PrivateKey, Signer};
    use c3ds_core::time::IsoTimestamp;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    fn message() -> SignedMessage {
        let payload = MessageBuilder::new("node-1")
            .unwrap()
            .build(&IsoTimestamp::epoch(), &HeartbeatData::online(20, -60, 30_000).into())
            .unwrap();
        let signature = Signer::new(PrivateKey::from_bytes(&[0x42; 32]).unwrap())
            .sign(payload.as_bytes())
            .unwrap();
        SignedMessage { payload, signature }
    }

    /// Accept one connection, capture the request, answer with `status_line`
    fn serve_once(status_line: &'static str) -> (String, thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/api/telemetry", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];

            loop {
                let n = stream.read(&mut buf).unwrap();
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(end) = text.find("\r\n\r\n") {
                    let length = text[..end]
                        .lines()
                        .filter_map(|l| l.split_once(':'))
                        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                        .map(|(_, v)| v.trim().parse::<usize>().unwrap())
                        .unwrap_or(0);
                    if request.len() >= end + 4 + length {
                        break;
                    }
                }
                if n == 0 {
                    break;
                }
            }

            let response = format!("HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n", status_line);
            stream.write_all(response.as_bytes()).unwrap();
            String::from_utf8(request).unwrap()
        });

        (url, handle)
    }

    fn header<'a>(request: &'a str, name: &str) -> Option<&'a str> {
        request
            .lines()
            .filter_map(|l| l.split_once(':'))
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.trim())
    }

    #[test]
    fn test_config_builder() {
        let config = HttpConfig::new("https://collector.example.com/api/telemetry")
            .timeout_ms(5_000)
            .user_agent("bench")
            .header("X-Site", "lab");

        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.user_agent, "bench");
        assert_eq!(config.headers.get("X-Site").map(String::as_str), Some("lab"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_url_validation() {
        assert!(matches!(
            HttpTransport::new(HttpConfig::new("not-a-url")),
            Err(HttpError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpTransport::new(HttpConfig::new("http://valid.url").timeout_ms(0)),
            Err(HttpError::ZeroTimeout)
        ));
        assert!(HttpTransport::new(HttpConfig::new("https://valid.url")).is_ok());
    }

    #[test]
    fn from_json_fills_defaults() {
        let config = HttpConfig::from_json(r#"{"endpoint":"http://10.0.0.5:8080/ingest"}"#).unwrap();
        assert_eq!(config.timeout_ms, HTTP_TIMEOUT_MS);
        assert!(config.headers.is_empty());

        assert!(matches!(HttpConfig::from_json("{"), Err(HttpError::Serialization(_))));
        assert!(matches!(
            HttpConfig::from_json(r#"{"endpoint":"ftp://x"}"#),
            Err(HttpError::InvalidUrl(_))
        ));
    }

    #[test]
    fn for_node_uses_node_timeout() {
        let node = NodeConfig::new(c3ds_core::DeviceIdentity::new("n", "c")).http_timeout_ms(2_500);
        assert_eq!(HttpConfig::for_node(&node, "http://h").timeout_ms, 2_500);
    }

    #[test]
    fn posts_signed_payload_with_device_headers() {
        let (url, server) = serve_once("200 OK");
        let mut transport = HttpTransport::new(HttpConfig::new(url).header("X-Site", "lab")).unwrap();
        let message = message();

        let outcome = transport.post(&message, "Y2VydA==");
        let request = server.join().unwrap();

        assert_eq!(outcome, TransportOutcome::Response(200));
        assert!(request.starts_with("POST /api/telemetry HTTP/1.1"));
        assert_eq!(header(&request, "Content-Type"), Some("application/json"));
        assert_eq!(header(&request, "X-Device-Certificate"), Some("Y2VydA=="));
        assert_eq!(header(&request, "X-Device-Signature"), Some(message.signature.as_str()));
        assert_eq!(header(&request, "X-Site"), Some("lab"));
        assert!(request.ends_with(message.payload.as_str()));

        assert_eq!(transport.stats().messages_sent, 1);
        assert_eq!(transport.stats().bytes_sent, message.payload.len() as u64);
    }

    #[test]
    fn error_status_is_a_response() {
        let (url, server) = serve_once("401 Unauthorized");
        let mut transport = HttpTransport::new(HttpConfig::new(url)).unwrap();

        let outcome = transport.post(&message(), "Y2VydA==");
        server.join().unwrap();

        assert_eq!(outcome, TransportOutcome::Response(401));
        assert_eq!(transport.stats().messages_failed, 1);
        assert_eq!(transport.stats().last_error.as_deref(), Some("HTTP 401"));
    }

    #[test]
    fn refused_connection_is_connection_failed() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);

        let mut transport = HttpTransport::new(HttpConfig::new(url).timeout_ms(2_000)).unwrap();
        let outcome = transport.post(&message(), "Y2VydA==");

        assert_eq!(outcome, TransportOutcome::Failed(TransportError::ConnectionFailed));
        assert_eq!(transport.stats().messages_failed, 1);
    }
}
