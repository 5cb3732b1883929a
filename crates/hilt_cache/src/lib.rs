//! Incremental delta tracking.
//!
//! Classifies every file under a watched root (a class directory or a jar's
//! entries) as added, changed, removed or unchanged since the previous
//! invocation, persists the per-file signatures that make the next
//! comparison cheap, and maps input paths onto output paths so removals can
//! be mirrored.

#![warn(missing_docs)]

pub mod delta;
pub mod error;
pub mod state;
pub mod tracker;

pub use delta::{diff, DeltaEntry, DeltaStatus, RootDelta};
pub use error::DeltaError;
pub use state::{DeltaState, FileSignature, RootKind, RootState};
pub use tracker::DeltaTracker;
