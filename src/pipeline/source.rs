//! Telemetry source abstraction for session evaluation.
//!
//! Provides a unified trait for reading aircraft states from different
//! sources: a generated stream (replay) and stdin (JSON lines).

use crate::types::AircraftState;
use anyhow::Result;
use async_trait::async_trait;

/// Events produced by a telemetry source.
pub enum TelemetryEvent {
    /// A valid aircraft state was read.
    State(AircraftState),
    /// Source reached end of data.
    Eof,
}

/// Trait abstracting where aircraft states come from.
///
/// The evaluation loop calls [`next_state`](TelemetrySource::next_state) in
/// a `select!` with cancellation.
#[async_trait]
pub trait TelemetrySource: Send {
    /// Read the next state from the source.
    ///
    /// Returns `TelemetryEvent::Eof` when no more data is available.
    async fn next_state(&mut self) -> Result<TelemetryEvent>;

    /// Human-readable name for logging (e.g. "replay", "stdin").
    fn source_name(&self) -> &str;
}

// ============================================================================
// Replay Source (generated stream)
// ============================================================================

/// Replays a pre-generated stream with optional inter-tick delay.
pub struct ReplaySource {
    states: std::vec::IntoIter<AircraftState>,
    delay_ms: u64,
    yielded_first: bool,
}

impl ReplaySource {
    pub fn new(states: Vec<AircraftState>, delay_ms: u64) -> Self {
        Self {
            states: states.into_iter(),
            delay_ms,
            yielded_first: false,
        }
    }
}

#[async_trait]
impl TelemetrySource for ReplaySource {
    async fn next_state(&mut self) -> Result<TelemetryEvent> {
        // No delay before the first tick
        if self.yielded_first && self.delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.delay_ms)).await;
        }
        match self.states.next() {
            Some(s) => {
                self.yielded_first = true;
                Ok(TelemetryEvent::State(s))
            }
            None => Ok(TelemetryEvent::Eof),
        }
    }

    fn source_name(&self) -> &str {
        "replay"
    }
}

// ============================================================================
// Stdin Source (JSON aircraft states, one per line)
// ============================================================================

/// Reads JSON-formatted aircraft states line by line.
///
/// Used with the standalone generator:
/// `simulation --format json | sop-trainer replay-stdin`
pub struct StdinSource<R = tokio::io::Stdin> {
    reader: tokio::io::BufReader<R>,
    line_buffer: String,
}

impl StdinSource {
    pub fn new() -> Self {
        Self::from_reader(tokio::io::stdin())
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: tokio::io::AsyncRead + Unpin + Send> StdinSource<R> {
    /// Read JSON lines from any async reader.
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader: tokio::io::BufReader::new(reader),
            line_buffer: String::with_capacity(256),
        }
    }
}

#[async_trait]
impl<R: tokio::io::AsyncRead + Unpin + Send> TelemetrySource for StdinSource<R> {
    async fn next_state(&mut self) -> Result<TelemetryEvent> {
        use tokio::io::AsyncBufReadExt;
        loop {
            self.line_buffer.clear();
            let bytes = self.reader.read_line(&mut self.line_buffer).await?;
            if bytes == 0 {
                return Ok(TelemetryEvent::Eof);
            }
            let line = self.line_buffer.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<AircraftState>(line) {
                Ok(state) => return Ok(TelemetryEvent::State(state)),
                Err(e) => {
                    tracing::warn!("[StdinSource] Failed to parse aircraft state: {}", e);
                }
            }
        }
    }

    fn source_name(&self) -> &str {
        "stdin"
    }
}
