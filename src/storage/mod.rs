//! Persistent storage for completed training sessions
//!
//! Only the most recent session is kept, as a versioned JSON snapshot.

pub mod snapshot;

pub use snapshot::{SessionSnapshot, SnapshotError, SnapshotStore};
