//! Training Pipeline
//!
//! ```text
//! generate ──► evaluate (per tick) ──► report ──► analyze ──► mutate
//!    ▲                                                         │
//!    └──────────── next scenario (in memory + snapshot) ◄──────┘
//! ```
//!
//! The batch cadence runs cycles back to back, the live cadence paces one
//! tick per interval to a connected viewer. Both go through the
//! [`TrainingCoordinator`], which allows at most one active session.

mod coordinator;
pub mod live;
pub mod processing_loop;
mod session;
pub mod source;
mod state;

pub use coordinator::{BatchPhase, CycleOutcome, SessionEnd, SessionError, TrainingCoordinator};
pub use live::{LiveExit, LiveMessage, LiveRunner, SessionCommand};
pub use processing_loop::{EvaluationLoop, LoopExit};
pub use session::TrainingSession;
pub use state::*;
