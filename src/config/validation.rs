//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! Two-pass parse: the raw TOML is first walked as a `toml::Value` tree and
//! every key is compared against the known field names, producing warnings
//! with "did you mean?" suggestions. Serde deserialization follows. Unknown
//! keys never fail a load; out-of-range values do.

use std::collections::HashSet;

use super::TrainerConfig;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Every valid dotted key path of `TrainerConfig`.
///
/// Kept by hand in step with trainer_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [simulation]
        "simulation",
        "simulation.duration_minutes",
        "simulation.ticks_per_second",
        "simulation.blend_factor",
        "simulation.error_probability",
        "simulation.seed",
        "simulation.climb_target_altitude_ft",
        "simulation.climb_target_airspeed_kt",
        "simulation.descent_target_airspeed_kt",
        "simulation.gear_retract_altitude_ft",
        "simulation.gear_extend_altitude_ft",
        "simulation.runway_heading_deg",
        // [live]
        "live",
        "live.tick_interval_ms",
        "live.push_queue_capacity",
        "live.max_dropped_frames",
        // [server]
        "server",
        "server.addr",
        // [storage]
        "storage",
        "storage.snapshot_enabled",
        "storage.snapshot_path",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1)
                .min(curr[j] + 1)
                .min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for &k in known {
        let dist = levenshtein(unknown, k);
        if dist <= 3 {
            if let Some((_, best_dist)) = best {
                if dist < best_dist {
                    best = Some((k, dist));
                }
            } else {
                best = Some((k, dist));
            }
        }
    }
    best.map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors surface from serde
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Values the generator or the live loop cannot run with.
pub fn validate_ranges(config: &TrainerConfig) -> Vec<String> {
    let mut errors = Vec::new();
    let sim = &config.simulation;

    if !(sim.duration_minutes.is_finite() && sim.duration_minutes > 0.0) {
        errors.push(format!(
            "simulation.duration_minutes = {} must be > 0",
            sim.duration_minutes
        ));
    }
    if sim.ticks_per_second == 0 {
        errors.push("simulation.ticks_per_second must be > 0".to_string());
    }
    if !(sim.blend_factor > 0.0 && sim.blend_factor <= 1.0) {
        errors.push(format!(
            "simulation.blend_factor = {} must be in (0, 1]",
            sim.blend_factor
        ));
    }
    if !(0.0..=1.0).contains(&sim.error_probability) {
        errors.push(format!(
            "simulation.error_probability = {} must be in [0, 1]",
            sim.error_probability
        ));
    }
    if sim.gear_retract_altitude_ft < 0.0 || sim.gear_extend_altitude_ft < 0.0 {
        errors.push("simulation gear altitudes cannot be negative".to_string());
    }
    if config.live.tick_interval_ms == 0 {
        errors.push("live.tick_interval_ms must be > 0".to_string());
    }
    if config.live.push_queue_capacity == 0 {
        errors.push("live.push_queue_capacity must be > 0".to_string());
    }

    errors
}

// ============================================================================
// Tests
// ============================================================================
