//! Detection state machines
//!
//! Turns a stream of raw samples into "event active" decisions. Two sensor
//! kinds share one machine and differ only in their classifier and
//! confirmation policy:
//!
//! - **Debounce** (push button): a level must hold for longer than the
//!   debounce window before it is committed. Each committed press is a
//!   one-shot [`DetectionEvent::Triggered`], rate limited so that presses
//!   closer than the minimum interval are [`DetectionEvent::Suppressed`].
//!   The machine never enters [`DetectionState::Detecting`].
//!
//! - **Hysteresis** (ultrasonic ranger): `N` consecutive in-range readings
//!   enter `Detecting`; `N` consecutive out-of-range readings, counted only
//!   while the in-range streak is zero, leave it. Invalid readings break the
//!   in-range streak but leave the out-of-range streak alone, so a sensor
//!   dropout is never mistaken for the object leaving.
//!
//! ```text
//!            N × InRange                   N × OutOfRange
//!   Idle ────────────────▶ Detecting ────────────────────▶ Idle
//!    ▲  Invalid: in=0        │  ▲   InRange: out=0
//!    └───────────────────────┘  └─ Invalid: in=0, out kept
//! ```
//!
//! ## Example
//!
//! ```
//! use c3ds_core::config::HysteresisConfig;
//! use c3ds_core::detection::{DetectionEvent, DetectionStateMachine, SensorReading};
//! use c3ds_core::time::FixedTime;
//!
//! let clock = FixedTime::new(0);
//! let mut detector = DetectionStateMachine::ultrasonic(&HysteresisConfig::default());
//!
//! assert_eq!(detector.update(SensorReading::new(Ok(24.0), 0), &clock), None);
//! assert!(matches!(
//!     detector.update(SensorReading::new(Ok(24.0), 500), &clock),
//!     Some(DetectionEvent::Started { .. })
//! ));
//! ```

pub mod classify;
pub mod echo;

pub use classify::{Classify, DistanceClassifier, LevelClassifier, ReadingClass};
pub use echo::EchoConfig;

use crate::config::{DebounceConfig, HysteresisConfig};
use crate::time::{IsoTimestamp, Timestamp, WallClock};

/// One raw sample and the monotonic time it was taken
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading<T> {
    /// Sensor value
    pub value: T,
    /// Monotonic time of the sample
    pub at: Timestamp,
}

impl<T> SensorReading<T> {
    /// Bundle the values
    pub const fn new(value: T, at: Timestamp) -> Self {
        Self { value, at }
    }
}

/// Current detection state
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DetectionState {
    /// Nothing in range
    #[default]
    Idle,
    /// Object or press confirmed
    Detecting {
        /// Wall-clock time of entry (epoch placeholder if unsynchronised)
        first_detected_at: IsoTimestamp,
        /// Monotonic time of entry
        first_detected_at_millis: Timestamp,
    },
}

impl DetectionState {
    /// Whether an object or press is active
    pub fn is_detecting(&self) -> bool {
        matches!(self, DetectionState::Detecting { .. })
    }
}

/// Outcome of folding one reading into the machine
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectionEvent {
    /// Accepted button press
    Triggered,
    /// Press committed sooner than the minimum interval after the last accepted one
    Suppressed {
        /// Time since the last accepted press
        since_last_ms: u64,
    },
    /// Entered `Detecting`
    Started {
        /// Distance of the confirming reading
        distance_cm: Option<f32>,
    },
    /// Returned to `Idle`
    Ended {
        /// Time spent detecting
        duration_ms: u64,
    },
}

#[derive(Debug, Clone)]
enum Policy {
    Debounce {
        window_ms: u64,
        min_interval_ms: u64,
        last_raw: ReadingClass,
        stable: ReadingClass,
        last_change: Timestamp,
        last_press: Option<Timestamp>,
    },
    Hysteresis {
        required: u8,
        in_range: u8,
        out_of_range: u8,
    },
}

/// Detection state machine over any [`Classify`] input
#[derive(Debug, Clone)]
pub struct DetectionStateMachine<C: Classify> {
    classifier: C,
    policy: Policy,
    state: DetectionState,
    last_distance_cm: Option<f32>,
}

impl DetectionStateMachine<LevelClassifier> {
    /// Button with the level polarity taken from `config`
    pub fn button(config: &DebounceConfig) -> Self {
        let classifier = if config.active_low {
            LevelClassifier::active_low()
        } else {
            LevelClassifier::active_high()
        };
        Self::debounce(classifier, config)
    }
}

impl DetectionStateMachine<DistanceClassifier> {
    /// Ultrasonic ranger with thresholds taken from `config`
    pub fn ultrasonic(config: &HysteresisConfig) -> Self {
        Self::hysteresis(DistanceClassifier::from(config), config)
    }
}

impl<C: Classify> DetectionStateMachine<C> {
    /// Debounced one-shot variant
    pub fn debounce(classifier: C, config: &DebounceConfig) -> Self {
        Self {
            classifier,
            policy: Policy::Debounce {
                window_ms: config.window_ms,
                min_interval_ms: config.min_press_interval_ms,
                last_raw: ReadingClass::OutOfRange,
                stable: ReadingClass::OutOfRange,
                last_change: 0,
                last_press: None,
            },
            state: DetectionState::Idle,
            last_distance_cm: None,
        }
    }

    /// Hysteresis-confirmed variant
    ///
    /// A `consecutive_readings` of zero is treated as one.
    pub fn hysteresis(classifier: C, config: &HysteresisConfig) -> Self {
        Self {
            classifier,
            policy: Policy::Hysteresis {
                required: config.consecutive_readings.max(1),
                in_range: 0,
                out_of_range: 0,
            },
            state: DetectionState::Idle,
            last_distance_cm: None,
        }
    }

    /// Current state
    pub fn state(&self) -> &DetectionState {
        &self.state
    }

    /// Whether an object or press is active
    pub fn is_detecting(&self) -> bool {
        self.state.is_detecting()
    }

    /// Most recent valid distance, if the input carries one
    pub fn last_distance_cm(&self) -> Option<f32> {
        self.last_distance_cm
    }

    /// Whole seconds since entering `Detecting`, 0 while idle
    pub fn duration_secs(&self, now: Timestamp) -> u64 {
        match self.state {
            DetectionState::Detecting { first_detected_at_millis, .. } => {
                crate::time::elapsed_secs(first_detected_at_millis, now)
            }
            DetectionState::Idle => 0,
        }
    }

    /// Current `(in_range, out_of_range)` confirmation streaks
    pub fn streaks(&self) -> (u8, u8) {
        match self.policy {
            Policy::Hysteresis { in_range, out_of_range, .. } => (in_range, out_of_range),
            Policy::Debounce { .. } => (0, 0),
        }
    }

    /// Fold one reading into the machine
    pub fn update<W: WallClock + ?Sized>(
        &mut self,
        reading: SensorReading<C::Reading>,
        clock: &W,
    ) -> Option<DetectionEvent> {
        let active = self.state.is_detecting();
        let class = self.classifier.classify(&reading.value, active);
        let distance = self.classifier.distance_cm(&reading.value);
        if distance.is_some() {
            self.last_distance_cm = distance;
        }

        match &mut self.policy {
            Policy::Debounce {
                window_ms,
                min_interval_ms,
                last_raw,
                stable,
                last_change,
                last_press,
            } => {
                if class == ReadingClass::Invalid {
                    return None;
                }

                let now = reading.at;
                if class != *last_raw {
                    *last_change = now;
                }
                *last_raw = class;

                if now.saturating_sub(*last_change) <= *window_ms || class == *stable {
                    return None;
                }
                *stable = class;

                if class != ReadingClass::InRange {
                    return None;
                }

                match *last_press {
                    Some(prev) if now.saturating_sub(prev) < *min_interval_ms => {
                        log_info!("button press ignored (too soon)");
                        Some(DetectionEvent::Suppressed {
                            since_last_ms: now.saturating_sub(prev),
                        })
                    }
                    _ => {
                        *last_press = Some(now);
                        log_info!("button press accepted at {}ms", now);
                        Some(DetectionEvent::Triggered)
                    }
                }
            }

            Policy::Hysteresis { required, in_range, out_of_range } => {
                match class {
                    ReadingClass::Invalid => {
                        log_debug!("invalid sensor reading (timeout or out of range)");
                        *in_range = 0;
                        return None;
                    }
                    ReadingClass::InRange => *in_range = in_range.saturating_add(1),
                    ReadingClass::OutOfRange => *in_range = 0,
                }

                if !active && *in_range >= *required {
                    *in_range = 0;
                    let first_detected_at = IsoTimestamp::now(clock);
                    log_info!(
                        "object detected at {:?}cm, first detected at {}",
                        distance,
                        first_detected_at
                    );
                    self.state = DetectionState::Detecting {
                        first_detected_at,
                        first_detected_at_millis: reading.at,
                    };
                    return Some(DetectionEvent::Started { distance_cm: distance });
                }

                if active && class == ReadingClass::OutOfRange && *in_range == 0 {
                    *out_of_range = out_of_range.saturating_add(1);
                    if *out_of_range >= *required {
                        *out_of_range = 0;
                        let since = match self.state {
                            DetectionState::Detecting { first_detected_at_millis, .. } => {
                                first_detected_at_millis
                            }
                            DetectionState::Idle => reading.at,
                        };
                        let duration_ms = reading.at.saturating_sub(since);
                        log_info!("object left detection zone after {}s", duration_ms / 1000);
                        self.state = DetectionState::Idle;
                        return Some(DetectionEvent::Ended { duration_ms });
                    }
                } else {
                    *out_of_range = 0;
                }

                None
            }
        }
    }
}
