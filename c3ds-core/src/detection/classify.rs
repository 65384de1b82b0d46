//! Raw reading classifiers
//!
//! The detection state machine never looks at raw values. A classifier maps
//! each reading to [`ReadingClass`], given whether detection is currently
//! active, which is all the state machine needs.

use crate::config::HysteresisConfig;
use crate::errors::SensorResult;

/// Where a single reading falls relative to the detection zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReadingClass {
    /// Counts toward entering (or staying in) detection
    InRange,
    /// Counts toward leaving detection
    OutOfRange,
    /// Carries no measurement, resets the in-range streak only
    Invalid,
}

/// Maps raw readings to [`ReadingClass`]
pub trait Classify {
    /// Raw sample type
    type Reading: Copy;

    /// Classify one reading
    ///
    /// `active` is true while the machine is detecting, so classifiers with
    /// hysteresis can widen the zone.
    fn classify(&self, reading: &Self::Reading, active: bool) -> ReadingClass;

    /// Distance carried by the reading, for alert payloads
    fn distance_cm(&self, _reading: &Self::Reading) -> Option<f32> {
        None
    }
}

/// Binary input (push button)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelClassifier {
    active_level: bool,
}

impl LevelClassifier {
    /// Pressed reads low (input with pull-up)
    pub const fn active_low() -> Self {
        Self { active_level: false }
    }

    /// Pressed reads high
    pub const fn active_high() -> Self {
        Self { active_level: true }
    }
}

impl Classify for LevelClassifier {
    type Reading = bool;

    fn classify(&self, level: &bool, _active: bool) -> ReadingClass {
        if *level == self.active_level {
            ReadingClass::InRange
        } else {
            ReadingClass::OutOfRange
        }
    }
}

/// Distance input with asymmetric enter/exit thresholds
///
/// In range at or below `threshold_cm` while idle, and at or below
/// `threshold_cm + hysteresis_cm` while detecting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceClassifier {
    threshold_cm: f32,
    hysteresis_cm: f32,
}

impl DistanceClassifier {
    /// Enter below `threshold_cm`, leave above `threshold_cm + hysteresis_cm`
    pub const fn new(threshold_cm: f32, hysteresis_cm: f32) -> Self {
        Self { threshold_cm, hysteresis_cm }
    }

    /// Current boundary of the detection zone
    pub fn boundary_cm(&self, active: bool) -> f32 {
        if active {
            self.threshold_cm + self.hysteresis_cm
        } else {
            self.threshold_cm
        }
    }
}

impl From<&HysteresisConfig> for DistanceClassifier {
    fn from(config: &HysteresisConfig) -> Self {
        Self::new(config.threshold_cm, config.hysteresis_cm)
    }
}

impl Classify for DistanceClassifier {
    type Reading = SensorResult<f32>;

    fn classify(&self, reading: &SensorResult<f32>, active: bool) -> ReadingClass {
        match reading {
            Ok(d) if d.is_finite() => {
                if *d <= self.boundary_cm(active) {
                    ReadingClass::InRange
                } else {
                    ReadingClass::OutOfRange
                }
            }
            _ => ReadingClass::Invalid,
        }
    }

    fn distance_cm(&self, reading: &SensorResult<f32>) -> Option<f32> {
        reading.ok().filter(|d| d.is_finite())
    }
}
