//! Trainer Configuration - operator-tunable TOML values
//!
//! Each section implements `Default`, so a missing file or a partial file
//! behaves exactly like the built-in profile.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "SOP_TRAINER_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "trainer_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a trainer deployment.
///
/// Load with `TrainerConfig::load()` which searches:
/// 1. `$SOP_TRAINER_CONFIG` env var
/// 2. `./trainer_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainerConfig {
    /// Telemetry generator and pilot model
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Live (wall-clock) cadence
    #[serde(default)]
    pub live: LiveConfig,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Session snapshot persistence
    #[serde(default)]
    pub storage: StorageConfig,
}

impl TrainerConfig {
    /// Load configuration using the standard search order.
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded trainer config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./trainer_config.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded trainer config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are logged as warnings and otherwise ignored.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Reject values the generator or live loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let errors = super::validation::validate_ranges(self);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Simulation
// ============================================================================

/// Flight profile and pilot model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Session length (minutes)
    pub duration_minutes: f64,
    /// Telemetry resolution (ticks per simulated second)
    pub ticks_per_second: u32,
    /// Exponential smoothing factor toward the phase target
    pub blend_factor: f64,
    /// Chance the pilot skips the gear/flaps policy on a tick
    pub error_probability: f64,
    /// Fixed seed for reproducible runs; cycle N uses `seed + N`
    pub seed: Option<u64>,
    pub climb_target_altitude_ft: f64,
    pub climb_target_airspeed_kt: f64,
    pub descent_target_airspeed_kt: f64,
    /// Gear up / flaps 0 above this altitude while climbing
    pub gear_retract_altitude_ft: f64,
    /// Gear down / flaps 20 below this altitude while descending
    pub gear_extend_altitude_ft: f64,
    pub runway_heading_deg: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            duration_minutes: 2.0,
            ticks_per_second: 2,
            blend_factor: 0.05,
            error_probability: 0.02,
            seed: None,
            climb_target_altitude_ft: 2000.0,
            climb_target_airspeed_kt: 160.0,
            descent_target_airspeed_kt: 140.0,
            gear_retract_altitude_ft: 300.0,
            gear_extend_altitude_ft: 800.0,
            runway_heading_deg: 360.0,
        }
    }
}

impl SimulationConfig {
    /// Seed for a given cycle, if runs are seeded.
    pub fn cycle_seed(&self, cycle: u64) -> Option<u64> {
        self.seed.map(|s| s.wrapping_add(cycle))
    }
}

// ============================================================================
// Live Cadence
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveConfig {
    /// Wall-clock delay between pushed ticks (ms). 100 = 10 Hz.
    pub tick_interval_ms: u64,
    /// Bounded outbound queue per viewer
    pub push_queue_capacity: usize,
    /// Consecutive dropped frames before the viewer counts as disconnected
    pub max_dropped_frames: usize,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            push_queue_capacity: 64,
            max_dropped_frames: 50,
        }
    }
}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP server bind address.
    ///
    /// Can be overridden by `SOP_TRAINER_SERVER_ADDR` env var or `--addr` CLI flag.
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Write a snapshot after each completed cycle
    pub snapshot_enabled: bool,
    pub snapshot_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_enabled: true,
            snapshot_path: PathBuf::from("./data/last_session.json"),
        }
    }
}
