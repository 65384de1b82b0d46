//! Reading scenarios for the detection state machines
//!
//! Each scenario is a timed sequence of samples plus the transitions it
//! must produce.

use c3ds_core::errors::{SensorError, SensorResult};
use c3ds_core::time::Timestamp;

/// Sample spacing matching the 500 ms poll interval
pub const POLL_MS: Timestamp = 500;

pub struct DistanceScenario {
    pub name: &'static str,
    pub readings: Vec<SensorResult<f32>>,
    /// Index of the reading that enters detection
    pub enters_at: Option<usize>,
    /// Index of the reading that leaves detection
    pub leaves_at: Option<usize>,
}

impl DistanceScenario {
    /// `(timestamp, reading)` pairs starting at `start`
    pub fn timed(&self, start: Timestamp) -> impl Iterator<Item = (Timestamp, SensorResult<f32>)> + '_ {
        self.readings
            .iter()
            .enumerate()
            .map(move |(i, r)| (start + POLL_MS * i as Timestamp, *r))
    }
}

fn timeout() -> SensorResult<f32> {
    Err(SensorError::EchoTimeout { pulse_us: 0 })
}

pub struct Scenarios;

impl Scenarios {
    /// Person walks up, stands for a while, walks away
    pub fn walk_up_and_leave() -> DistanceScenario {
        let mut readings: Vec<SensorResult<f32>> = vec![Ok(180.0), Ok(120.0), Ok(60.0), Ok(30.0)];
        readings.extend([Ok(22.0), Ok(18.0)]);
        readings.extend(core::iter::repeat(Ok(17.5)).take(30));
        readings.extend([Ok(35.0), Ok(90.0), Ok(200.0)]);

        DistanceScenario {
            name: "walk_up_and_leave",
            readings,
            enters_at: Some(5),
            leaves_at: Some(37),
        }
    }

    /// Object hovering around the threshold never toggles once detected
    pub fn boundary_hover() -> DistanceScenario {
        let readings: Vec<SensorResult<f32>> = vec![
            Ok(24.0), Ok(24.5), Ok(26.0), Ok(25.5), Ok(26.5), Ok(24.0),
            Ok(26.9), Ok(26.0), Ok(25.1), Ok(26.4),
        ];

        DistanceScenario {
            name: "boundary_hover",
            readings,
            enters_at: Some(1),
            leaves_at: None,
        }
    }

    /// Flaky sensor while an object is present: dropouts never end detection
    pub fn dropouts_while_present() -> DistanceScenario {
        let readings: Vec<SensorResult<f32>> = vec![
            Ok(15.0), Ok(15.0),
            timeout(), Ok(16.0), timeout(), timeout(), Ok(15.5),
            Ok(50.0), timeout(), Ok(15.0),
        ];

        DistanceScenario {
            name: "dropouts_while_present",
            readings,
            enters_at: Some(1),
            leaves_at: None,
        }
    }

    /// Single noisy in-range spikes never enter detection
    pub fn isolated_spikes() -> DistanceScenario {
        let readings: Vec<SensorResult<f32>> = vec![
            Ok(150.0), Ok(12.0), Ok(150.0), Ok(150.0), Ok(9.0), timeout(), Ok(11.0), Ok(140.0),
        ];

        DistanceScenario {
            name: "isolated_spikes",
            readings,
            enters_at: None,
            leaves_at: None,
        }
    }

    pub fn all() -> Vec<DistanceScenario> {
        vec![
            Self::walk_up_and_leave(),
            Self::boundary_hover(),
            Self::dropouts_while_present(),
            Self::isolated_spikes(),
        ]
    }
}
