//! System-wide default constants.
//!
//! Grouped by subsystem. Values that operators may tune live in
//! [`super::TrainerConfig`]; the ones here are fixed model constants.

// ============================================================================
// Flight Profile
// ============================================================================

/// Descent target altitude (ft). The descent phase always aims for the ground.
pub const DESCENT_TARGET_ALTITUDE_FT: f64 = 0.0;

/// Flap setting used for approach and at session start (deg).
pub const FLAPS_APPROACH_DEG: u8 = 20;

// ============================================================================
// Turbulence
// ============================================================================

/// Wind speed above which conditions count as gusty (kt).
pub const GUSTY_WIND_THRESHOLD_KT: f64 = 10.0;

/// Noise amplitude in gusty wind.
pub const TURBULENCE_GUSTY: f64 = 5.0;

/// Noise amplitude on a wet runway.
pub const TURBULENCE_WET_RUNWAY: f64 = 2.0;

/// Noise amplitude otherwise.
pub const TURBULENCE_CALM: f64 = 0.5;

// ============================================================================
// Injections
// ============================================================================

/// How long a sensor failure suppresses the pilot policy (seconds).
pub const SENSOR_FAILURE_WINDOW_SECS: f64 = 30.0;

/// How long a distraction raises the skip probability (seconds).
pub const DISTRACTION_WINDOW_SECS: f64 = 20.0;

/// Policy skip probability while distracted.
pub const DISTRACTION_ERROR_PROBABILITY: f64 = 0.5;

// ============================================================================
// Simulation CLI
// ============================================================================

/// Base delay for the batch `--speed` flag (ms between cycles at speed 1).
///
/// `delay_ms = BATCH_BASE_DELAY_MS / speed`
pub const BATCH_BASE_DELAY_MS: u64 = 1_000;

// ============================================================================
// Storage
// ============================================================================

/// Current snapshot file format. Older or newer versions are ignored on load.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;
