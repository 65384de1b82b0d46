//! Sensor node control loop
//!
//! [`SensorNode`] owns every piece of per-device state and is advanced by
//! one [`SensorNode::step`] per loop iteration. Hardware and network sit
//! behind small traits so the loop runs unchanged on a board, on a host, or
//! in tests:
//!
//! - [`Transport`]: posts one signed message, reports status or failure
//! - [`StatusIndicator`]: status LED
//! - [`WallClock`]: NTP time for message timestamps
//! - [`DeviceStatus`]: signal strength and free memory for heartbeats
//!
//! Each send runs build → sign → post → classify → indicate. Heartbeat and
//! alert timers are marked on every attempt, successful or not.

use crate::config::{DeviceIdentity, NodeConfig};
use crate::constants::protocol::{
    CONTENT_TYPE_JSON, HEADER_DEVICE_CERTIFICATE, HEADER_DEVICE_SIGNATURE,
};
use crate::detection::{
    Classify, DetectionEvent, DetectionState, DetectionStateMachine, SensorReading,
};
use crate::errors::{ConfigError, PipelineError};
use crate::message::{AlertData, HeartbeatData, MessageBuilder, MessageData, MessageType, Payload};
use crate::scheduler::Scheduler;
use crate::signer::{Base64Signature, Signer};
use crate::time::{IsoTimestamp, Timestamp, WallClock};
use crate::transport::{Classification, DetectionBlinker, StatusPattern, TransportOutcome};

/// Payload plus its detached signature
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedMessage {
    /// Exact bytes that were signed
    pub payload: Payload,
    /// Base64 DER signature over `payload`
    pub signature: Base64Signature,
}

impl SignedMessage {
    /// Request headers for this message
    pub fn headers<'a>(&'a self, certificate_b64: &'a str) -> [(&'static str, &'a str); 3] {
        [
            ("Content-Type", CONTENT_TYPE_JSON),
            (HEADER_DEVICE_CERTIFICATE, certificate_b64),
            (HEADER_DEVICE_SIGNATURE, self.signature.as_str()),
        ]
    }
}

/// Delivers signed messages to the collector
pub trait Transport {
    /// POST `message.payload` with the headers from [`SignedMessage::headers`]
    ///
    /// Must not retry. Must return within the configured timeout.
    fn post(&mut self, message: &SignedMessage, certificate_b64: &str) -> TransportOutcome;
}

/// Status LED
pub trait StatusIndicator {
    /// Play a feedback pattern
    fn show(&mut self, pattern: StatusPattern);

    /// Drive the LED directly (detection blinking)
    fn set_level(&mut self, lit: bool);
}

/// Health figures reported in heartbeats
pub trait DeviceStatus {
    /// dBm
    fn signal_strength(&self) -> i32;
    /// Bytes of free heap
    fn free_memory(&self) -> u32;
}

/// Outcome of one send attempt
pub type SendResult = Result<Classification, PipelineError>;

/// What happened during one [`SensorNode::step`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// Detection event produced by this step, if any
    pub event: Option<DetectionEvent>,
    /// Alert send attempted this step
    pub alert: Option<SendResult>,
    /// Heartbeat send attempted this step
    pub heartbeat: Option<SendResult>,
}

impl StepReport {
    /// Whether a send was attempted
    pub fn sent_anything(&self) -> bool {
        self.alert.is_some() || self.heartbeat.is_some()
    }
}

/// Hardware and network collaborators of a node
#[derive(Debug, Clone)]
pub struct Collaborators<T, I, W, D> {
    /// Collector transport
    pub transport: T,
    /// Status LED
    pub indicator: I,
    /// Monotonic and wall clock
    pub clock: W,
    /// Radio and heap statistics
    pub device: D,
}

/// One sensor node
pub struct SensorNode<C: Classify, T, I, W, D> {
    identity: DeviceIdentity,
    detector: DetectionStateMachine<C>,
    scheduler: Scheduler,
    builder: MessageBuilder,
    signer: Signer,
    blinker: DetectionBlinker,
    io: Collaborators<T, I, W, D>,
}

impl<C, T, I, W, D> SensorNode<C, T, I, W, D>
where
    C: Classify,
    T: Transport,
    I: StatusIndicator,
    W: WallClock,
    D: DeviceStatus,
{
    /// Assemble a node; timers start at `started_at`
    pub fn new(
        config: &NodeConfig,
        detector: DetectionStateMachine<C>,
        signer: Signer,
        io: Collaborators<T, I, W, D>,
        started_at: Timestamp,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let builder = MessageBuilder::new(config.identity.device_id.as_str())
            .map_err(|_| ConfigError::EmptyDeviceId)?;

        log_info!(
            "node {} ready: heartbeat every {}ms, alerts every {}ms",
            config.identity.device_id,
            config.heartbeat_interval_ms,
            config.alert_interval_ms
        );

        Ok(Self {
            identity: config.identity.clone(),
            detector,
            scheduler: Scheduler::new(config, started_at),
            builder,
            signer,
            blinker: DetectionBlinker::default(),
            io,
        })
    }

    /// Detection state machine
    pub fn detector(&self) -> &DetectionStateMachine<C> {
        &self.detector
    }

    /// Node timers
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Hardware and network collaborators
    pub fn collaborators(&self) -> &Collaborators<T, I, W, D> {
        &self.io
    }

    /// Mutable collaborators, for tests and reconfiguration
    pub fn collaborators_mut(&mut self) -> &mut Collaborators<T, I, W, D> {
        &mut self.io
    }

    /// Whether the caller should take a sensor sample now
    pub fn poll_due(&self, now: Timestamp) -> bool {
        self.scheduler.poll_due(now)
    }

    /// Run one loop iteration
    ///
    /// `reading` is the sample taken this iteration, if any.
    pub fn step(&mut self, now: Timestamp, reading: Option<C::Reading>) -> StepReport {
        let mut report = StepReport::default();

        if let Some(value) = reading {
            self.scheduler.poll.mark_sent(now);
            report.event = self.detector.update(SensorReading::new(value, now), &self.io.clock);
        }

        match report.event {
            Some(DetectionEvent::Started { .. }) => self.scheduler.alert.force_due(),
            Some(DetectionEvent::Triggered) => {
                self.io.indicator.show(StatusPattern::PressAck);
                report.alert = Some(self.send(MessageData::Alert(AlertData::button())));
                self.scheduler.alert.mark_sent(now);
            }
            _ => {}
        }

        if let Some(level) = self.blinker.update(now, self.detector.is_detecting()) {
            self.io.indicator.set_level(level);
        }

        if report.alert.is_none() && self.scheduler.alert_due(now, self.detector.is_detecting()) {
            let data = self.ultrasonic_alert(now);
            report.alert = Some(self.send(MessageData::Alert(data)));
            self.scheduler.alert.mark_sent(now);
        }

        if self.scheduler.heartbeat_due(now) {
            let data = HeartbeatData::online(
                now / crate::constants::time::MS_PER_SECOND,
                self.io.device.signal_strength(),
                self.io.device.free_memory(),
            );
            report.heartbeat = Some(self.send(MessageData::Heartbeat(data)));
            self.scheduler.heartbeat.mark_sent(now);
        }

        report
    }

    fn ultrasonic_alert(&self, now: Timestamp) -> AlertData {
        let first_detected_at = match self.detector.state() {
            DetectionState::Detecting { first_detected_at, .. } => first_detected_at.clone(),
            DetectionState::Idle => IsoTimestamp::epoch(),
        };
        AlertData::ultrasonic(
            self.detector.last_distance_cm().unwrap_or(0.0),
            self.detector.duration_secs(now),
            first_detected_at,
        )
    }

    /// Build, sign, post and classify one message
    fn send(&mut self, data: MessageData) -> SendResult {
        let kind = data.message_type();
        let timestamp = IsoTimestamp::now(&self.io.clock);

        let result = self.sign(&timestamp, &data).map(|message| {
            let outcome = self.io.transport.post(&message, &self.identity.certificate_b64);
            let classification = Classification::classify(outcome);
            self.io.indicator.show(classification.indicator_pattern());
            classification
        });

        report_outcome(kind, &result);
        result
    }

    fn sign(&self, timestamp: &IsoTimestamp, data: &MessageData) -> Result<SignedMessage, PipelineError> {
        let payload = self.builder.build(timestamp, data)?;
        let signature = self.signer.sign(payload.as_bytes())?;
        Ok(SignedMessage { payload, signature })
    }
}

fn report_outcome(kind: MessageType, result: &SendResult) {
    match result {
        Ok(Classification::Success { status }) => {
            log_info!("{:?} accepted ({})", kind, status);
        }
        Ok(c) if c.is_auth_failure() => {
            log_warn!("{:?} rejected: authentication failed ({:?}), check certificate and key", kind, c);
        }
        Ok(c) => {
            log_warn!("{:?} not delivered: {:?}", kind, c);
        }
        Err(e) => {
            log_warn!("{:?} skipped: {}", kind, e);
        }
    }
}
