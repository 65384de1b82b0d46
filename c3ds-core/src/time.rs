//! Time management for sensor nodes
//!
//! The core needs two independent notions of time:
//! - Monotonic milliseconds since boot, for every timer and debounce window
//! - Wall-clock UTC, only to stamp messages (`timestamp`, `first_detected_at`)
//!
//! The wall clock comes from NTP and may not be synchronised yet. Messages
//! are still built in that case, stamped with the epoch placeholder, so a
//! missing time sync never blocks reporting.

use core::fmt::{self, Write};

use chrono::{DateTime, Datelike, Timelike};
use serde::{Serialize, Serializer};

use crate::constants::protocol::{EPOCH_TIMESTAMP, ISO_TIMESTAMP_LEN};
use crate::constants::time::MIN_VALID_UNIX_TIMESTAMP;

/// Monotonic timestamp in milliseconds since device boot
pub type Timestamp = u64;

/// Monotonic source of time for the control loop
pub trait TimeSource {
    /// Milliseconds since boot. Never goes backwards.
    fn now(&self) -> Timestamp;
}

/// Wall-clock source (NTP-synchronised RTC on the device)
pub trait WallClock {
    /// Seconds since the unix epoch, `None` while not synchronised
    fn unix_time(&self) -> Option<i64>;

    /// Whether the clock holds a plausible, synchronised time
    fn is_synchronized(&self) -> bool {
        matches!(self.unix_time(), Some(t) if t >= MIN_VALID_UNIX_TIMESTAMP)
    }
}

/// ISO-8601 UTC timestamp with second precision: `YYYY-MM-DDTHH:MM:SSZ`
///
/// Stored inline so detection state can hold one without allocating.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct IsoTimestamp(heapless::String<ISO_TIMESTAMP_LEN>);

impl IsoTimestamp {
    /// The placeholder used while the wall clock is unsynchronised
    pub fn epoch() -> Self {
        let mut s = heapless::String::new();
        // EPOCH_TIMESTAMP is exactly ISO_TIMESTAMP_LEN bytes
        let _ = s.push_str(EPOCH_TIMESTAMP);
        Self(s)
    }

    /// Format a unix time. Returns `None` for years outside 0..=9999.
    pub fn from_unix(secs: i64) -> Option<Self> {
        let dt = DateTime::from_timestamp(secs, 0)?;
        if !(0..=9999).contains(&dt.year()) {
            return None;
        }

        let mut s = heapless::String::new();
        write!(
            s,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}Z",
            dt.year(),
            dt.month(),
            dt.day(),
            dt.hour(),
            dt.minute(),
            dt.second(),
        )
        .ok()?;
        Some(Self(s))
    }

    /// Current wall-clock time, or the epoch placeholder if not synchronised
    pub fn now<W: WallClock + ?Sized>(clock: &W) -> Self {
        match clock.unix_time() {
            Some(secs) if secs >= MIN_VALID_UNIX_TIMESTAMP => {
                Self::from_unix(secs).unwrap_or_else(Self::epoch)
            }
            _ => Self::epoch(),
        }
    }

    /// Whether this is the unsynchronised placeholder
    pub fn is_epoch(&self) -> bool {
        self.0.as_str() == EPOCH_TIMESTAMP
    }

    /// `YYYY-MM-DDTHH:MM:SSZ`
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Default for IsoTimestamp {
    fn default() -> Self {
        Self::epoch()
    }
}

impl fmt::Debug for IsoTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IsoTimestamp({})", self.as_str())
    }
}

impl fmt::Display for IsoTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for IsoTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Whole seconds elapsed between two monotonic timestamps
pub fn elapsed_secs(since: Timestamp, now: Timestamp) -> u64 {
    now.saturating_sub(since) / crate::constants::time::MS_PER_SECOND
}

/// Fixed time source for testing
///
/// Serves both clocks: monotonic millis and an optional wall clock that
/// moves with it once set.
#[derive(Debug, Clone)]
pub struct FixedTime {
    timestamp: Timestamp,
    wall_base: Option<i64>,
}

impl FixedTime {
    /// Monotonic clock at `timestamp`, wall clock unsynchronised
    pub fn new(timestamp: Timestamp) -> Self {
        Self { timestamp, wall_base: None }
    }

    /// Synchronise the wall clock so that `now()` corresponds to `unix_secs`
    pub fn with_wall_clock(mut self, unix_secs: i64) -> Self {
        self.sync_wall_clock(unix_secs);
        self
    }

    /// Synchronise the wall clock in place
    pub fn sync_wall_clock(&mut self, unix_secs: i64) {
        let boot_secs = (self.timestamp / crate::constants::time::MS_PER_SECOND) as i64;
        self.wall_base = Some(unix_secs - boot_secs);
    }

    /// Jump the monotonic clock to `timestamp`
    pub fn set(&mut self, timestamp: Timestamp) {
        self.timestamp = timestamp;
    }

    /// Move the monotonic clock forward by `ms`
    pub fn advance(&mut self, ms: u64) {
        self.timestamp += ms;
    }
}

impl TimeSource for FixedTime {
    fn now(&self) -> Timestamp {
        self.timestamp
    }
}

impl WallClock for FixedTime {
    fn unix_time(&self) -> Option<i64> {
        self.wall_base
            .map(|base| base + (self.timestamp / crate::constants::time::MS_PER_SECOND) as i64)
    }
}

/// Host clocks (requires std)
///
/// Monotonic time counts from construction, wall clock reads the system time.
#[cfg(feature = "std")]
#[derive(Debug, Clone)]
pub struct SystemTime {
    boot: std::time::Instant,
}

#[cfg(feature = "std")]
impl SystemTime {
    /// Start counting monotonic time now
    pub fn new() -> Self {
        Self { boot: std::time::Instant::now() }
    }
}

#[cfg(feature = "std")]
impl Default for SystemTime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl TimeSource for SystemTime {
    fn now(&self) -> Timestamp {
        self.boot.elapsed().as_millis() as Timestamp
    }
}

#[cfg(feature = "std")]
impl WallClock for SystemTime {
    fn unix_time(&self) -> Option<i64> {
        use std::time::{SystemTime as StdSystemTime, UNIX_EPOCH};

        StdSystemTime::now()
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs() as i64)
    }
}
