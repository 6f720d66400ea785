//! Aircraft state sample and flight profile phase

use serde::{Deserialize, Serialize};

// ============================================================================
// Flight Phase
// ============================================================================

/// Phase of the synthetic climb/descent training profile
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FlightPhase {
    #[default]
    Climb,
    Descent,
}

impl std::fmt::Display for FlightPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlightPhase::Climb => write!(f, "CLIMB"),
            FlightPhase::Descent => write!(f, "DESCENT"),
        }
    }
}

// ============================================================================
// Aircraft State
// ============================================================================

/// One telemetry sample, produced once per tick.
///
/// Immutable once generated; the stream owner hands it on by value or
/// reference (generator → evaluator → transport).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AircraftState {
    /// Seconds since session start
    pub timestamp: f64,
    /// Altitude (ft), never negative
    pub altitude: f64,
    /// Indicated airspeed (kt), never negative
    pub airspeed: f64,
    /// Vertical speed (ft/min)
    pub vertical_speed: f64,
    /// Heading (deg)
    pub heading: f64,
    /// `true` = gear down
    pub landing_gear_state: bool,
    /// Flap setting (deg)
    pub flaps_setting: u8,
}

impl AircraftState {
    /// `true` when the landing gear is extended.
    pub fn gear_down(&self) -> bool {
        self.landing_gear_state
    }
}

impl Default for AircraftState {
    fn default() -> Self {
        Self {
            timestamp: 0.0,
            altitude: 0.0,
            airspeed: 0.0,
            vertical_speed: 0.0,
            heading: 360.0,
            landing_gear_state: true,
            flaps_setting: 20,
        }
    }
}
