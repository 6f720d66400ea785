//! Telemetry generation
//!
//! Produces the synthetic aircraft state stream a training session is
//! evaluated against. See [`generator`] for the flight profile and the pilot
//! policy model.

pub mod generator;

pub use generator::{generate_stream, tick_count, turbulence_factor, TelemetryGenerator};
