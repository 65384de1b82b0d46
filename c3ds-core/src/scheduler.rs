//! Send scheduling
//!
//! Three monotonic timers drive the control loop:
//!
//! | Timer     | Due when                                           |
//! |-----------|----------------------------------------------------|
//! | heartbeat | `now - last >= heartbeat_interval`                 |
//! | alert     | detecting, and never sent or `now - last >= alert_interval` |
//! | poll      | `now - last >= sensor_poll_interval`               |
//!
//! Timers are marked on every attempt, whatever the outcome, so a failing
//! collector is retried once per interval and never in a tight loop.

use crate::config::NodeConfig;
use crate::time::Timestamp;

/// Fixed-period timer, started at construction time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalTimer {
    interval_ms: u64,
    last: Timestamp,
}

impl IntervalTimer {
    /// First due one full interval after `started_at`
    pub const fn new(interval_ms: u64, started_at: Timestamp) -> Self {
        Self { interval_ms, last: started_at }
    }

    /// Whether a full interval has passed
    pub fn is_due(&self, now: Timestamp) -> bool {
        now.saturating_sub(self.last) >= self.interval_ms
    }

    /// Restart the interval from `now`, whatever the send outcome
    pub fn mark_sent(&mut self, now: Timestamp) {
        self.last = now;
    }

    /// Configured interval
    pub const fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Milliseconds until due, 0 if already due
    pub fn remaining_ms(&self, now: Timestamp) -> u64 {
        self.interval_ms.saturating_sub(now.saturating_sub(self.last))
    }
}

/// Alert timer, only due while an event is active
///
/// `None` means "never sent since entering detection": due on the next check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertTimer {
    interval_ms: u64,
    last: Option<Timestamp>,
}

impl AlertTimer {
    /// Timer that has never sent
    pub const fn new(interval_ms: u64) -> Self {
        Self { interval_ms, last: None }
    }

    /// Never due while idle
    pub fn is_due(&self, now: Timestamp, detecting: bool) -> bool {
        if !detecting {
            return false;
        }
        match self.last {
            None => true,
            Some(last) => now.saturating_sub(last) >= self.interval_ms,
        }
    }

    /// Restart the interval from `now`
    pub fn mark_sent(&mut self, now: Timestamp) {
        self.last = Some(now);
    }

    /// Make the next check due, used on entry into detection
    pub fn force_due(&mut self) {
        self.last = None;
    }

    /// Time of the last alert since entering detection
    pub fn last_sent(&self) -> Option<Timestamp> {
        self.last
    }
}

/// The node's timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scheduler {
    /// Heartbeat cadence, independent of detection
    pub heartbeat: IntervalTimer,
    /// Alert cadence, only while detecting
    pub alert: AlertTimer,
    /// Sensor sampling
    pub poll: IntervalTimer,
}

impl Scheduler {
    /// All timers start counting at `started_at`
    pub fn new(config: &NodeConfig, started_at: Timestamp) -> Self {
        Self {
            heartbeat: IntervalTimer::new(config.heartbeat_interval_ms, started_at),
            alert: AlertTimer::new(config.alert_interval_ms),
            poll: IntervalTimer::new(config.sensor_poll_interval_ms, started_at),
        }
    }

    /// Heartbeat timer elapsed
    pub fn heartbeat_due(&self, now: Timestamp) -> bool {
        self.heartbeat.is_due(now)
    }

    /// Alert timer elapsed
    pub fn alert_due(&self, now: Timestamp, detecting: bool) -> bool {
        self.alert.is_due(now, detecting)
    }

    /// Sensor poll timer elapsed
    pub fn poll_due(&self, now: Timestamp) -> bool {
        self.poll.is_due(now)
    }
}
