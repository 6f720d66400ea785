//! Versioned snapshot of the last completed session
//!
//! Written after the mutate step so a restarted trainer resumes with the
//! scenario the previous run handed off. The file is replaced atomically
//! (write to `<path>.tmp`, then rename). Missing, corrupt, or
//! version-mismatched files load as `None`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::defaults::SNAPSHOT_SCHEMA_VERSION;
use crate::types::{ScenarioParameters, ViolationLog, WeaknessSummary};

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("snapshot schema version {found}, expected {expected}")]
    SchemaMismatch { found: u32, expected: u32 },

    #[error("snapshot cycle {0} is out of range")]
    CycleOutOfRange(u64),
}

/// Everything a restarted trainer needs to continue the adaptive loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub schema_version: u32,
    /// Zero-based cycle number of the completed session
    pub cycle: u64,
    pub completed_at: DateTime<Utc>,
    /// Scenario the completed session ran under
    pub scenario_id: String,
    pub violations: ViolationLog,
    pub weakness: WeaknessSummary,
    /// Parameters for the next session
    pub next_scenario: ScenarioParameters,
}

impl SessionSnapshot {
    pub fn new(
        cycle: u64,
        scenario_id: &str,
        violations: ViolationLog,
        weakness: WeaknessSummary,
        next_scenario: ScenarioParameters,
    ) -> Self {
        Self {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            cycle,
            completed_at: Utc::now(),
            scenario_id: scenario_id.to_string(),
            violations,
            weakness,
            next_scenario,
        }
    }
}

/// Single-file snapshot location.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the stored snapshot. Parent directories are created as needed.
    pub fn save(&self, snapshot: &SessionSnapshot) -> Result<(), SnapshotError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        info!(
            path = %self.path.display(),
            cycle = snapshot.cycle,
            violations = snapshot.violations.len(),
            "Session snapshot saved"
        );
        Ok(())
    }

    /// Read the stored snapshot. `Ok(None)` when no file exists.
    pub fn try_load(&self) -> Result<Option<SessionSnapshot>, SnapshotError> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(j) => j,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let snapshot: SessionSnapshot = serde_json::from_str(&json)?;
        if snapshot.schema_version != SNAPSHOT_SCHEMA_VERSION {
            return Err(SnapshotError::SchemaMismatch {
                found: snapshot.schema_version,
                expected: SNAPSHOT_SCHEMA_VERSION,
            });
        }
        // The resumed loop continues at cycle + 1
        if snapshot.cycle == u64::MAX {
            return Err(SnapshotError::CycleOutOfRange(snapshot.cycle));
        }
        Ok(Some(snapshot))
    }

    /// Most recent snapshot, or `None` when missing, corrupt, or from another
    /// schema version.
    pub fn load(&self) -> Option<SessionSnapshot> {
        match self.try_load() {
            Ok(Some(snapshot)) => {
                info!(
                    path = %self.path.display(),
                    cycle = snapshot.cycle,
                    next_scenario = %snapshot.next_scenario.scenario_id,
                    "Session snapshot loaded"
                );
                Some(snapshot)
            }
            Ok(None) => {
                debug!(path = %self.path.display(), "No session snapshot found");
                None
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Unusable session snapshot, ignoring");
                None
            }
        }
    }
}
