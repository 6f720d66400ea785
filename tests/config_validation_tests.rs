//! Config Validation Tests
//!
//! Typo detection, range validation and file loading for `TrainerConfig`,
//! exercised independently from the rest of the training loop.

use sop_trainer::config::validation::{
    known_config_keys, suggest_correction, validate_ranges, validate_unknown_keys,
};
use sop_trainer::config::{ConfigError, TrainerConfig};
use std::io::Write;

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_simulation_key_warns_with_suggestion() {
    let toml_str = r#"
[simulation]
tick_per_second = 4
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("tick_per_second"));
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("simulation.ticks_per_second"),
        "Should suggest the correct spelling"
    );
}

#[test]
fn typo_in_live_section_warns() {
    let toml_str = r#"
[live]
tick_intervl_ms = 50
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].suggestion.as_deref(), Some("live.tick_interval_ms"));
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[simulation]
duration_minutes = 1.5
ticks_per_second = 2
blend_factor = 0.1
error_probability = 0.05
seed = 42

[live]
tick_interval_ms = 100
push_queue_capacity = 16
max_dropped_frames = 10

[server]
addr = "127.0.0.1:9000"

[storage]
snapshot_enabled = false
snapshot_path = "/tmp/session.json"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(warnings.is_empty(), "Unexpected warnings: {:?}", warnings);
}

#[test]
fn unknown_section_warns_without_suggestion() {
    let toml_str = r#"
[autopilot]
mode = "lnav"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 2, "section and key both unknown");
    assert!(warnings.iter().all(|w| w.field.starts_with("autopilot")));
}

#[test]
fn multiple_typos_all_warned() {
    let toml_str = r#"
[simulation]
blend_facter = 0.1
error_probabilty = 0.1

[storage]
snapshot_enabeld = true
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 3);
    assert!(warnings.iter().all(|w| w.suggestion.is_some()));
}

#[test]
fn garbage_key_gets_no_suggestion() {
    let known = known_config_keys();
    assert!(suggest_correction("zzzzzzzzzzzzzzzz", &known).is_none());
}

// ============================================================================
// Range Validation
// ============================================================================

#[test]
fn default_config_is_valid() {
    assert!(validate_ranges(&TrainerConfig::default()).is_empty());
}

#[test]
fn every_out_of_range_field_is_reported() {
    let mut config = TrainerConfig::default();
    config.simulation.duration_minutes = 0.0;
    config.simulation.ticks_per_second = 0;
    config.simulation.blend_factor = 1.5;
    config.simulation.error_probability = -0.1;
    config.live.tick_interval_ms = 0;
    config.live.push_queue_capacity = 0;

    let errors = validate_ranges(&config);
    assert_eq!(errors.len(), 6, "errors: {:?}", errors);
}

#[test]
fn nan_duration_is_rejected() {
    let mut config = TrainerConfig::default();
    config.simulation.duration_minutes = f64::NAN;
    let errors = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("duration_minutes")));
}

#[test]
fn error_probability_bounds_are_inclusive() {
    let mut config = TrainerConfig::default();
    config.simulation.error_probability = 0.0;
    assert!(validate_ranges(&config).is_empty());
    config.simulation.error_probability = 1.0;
    assert!(validate_ranges(&config).is_empty());
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn load_from_file_applies_values() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[simulation]\nduration_minutes = 0.5\nseed = 9\n\n[live]\ntick_interval_ms = 250"
    )
    .unwrap();

    let config = TrainerConfig::load_from_file(file.path()).unwrap();
    assert_eq!(config.simulation.duration_minutes, 0.5);
    assert_eq!(config.simulation.seed, Some(9));
    assert_eq!(config.live.tick_interval_ms, 250);
    // Untouched sections keep their defaults
    assert_eq!(config.server, TrainerConfig::default().server);
}

#[test]
fn load_from_file_rejects_invalid_ranges() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[simulation]\nblend_factor = 0.0").unwrap();

    match TrainerConfig::load_from_file(file.path()) {
        Err(ConfigError::Validation(errors)) => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].contains("blend_factor"));
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn load_from_file_reports_parse_errors_with_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[simulation]\nticks_per_second = \"fast\"").unwrap();

    let err = TrainerConfig::load_from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(ref p, _) if p == file.path()));
    assert!(err.to_string().contains("Config parse error"));
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = TrainerConfig::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(..)));
}
