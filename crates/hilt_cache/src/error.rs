//! Error types for delta tracking.

use std::path::PathBuf;

/// Errors that can occur while computing or persisting a delta.
///
/// A missing or unreadable state file is not an error: it turns the next
/// invocation into a clean one. Failures to read the inputs themselves are
/// fatal for the step.
#[derive(Debug, thiserror::Error)]
pub enum DeltaError {
    /// An I/O error occurred while scanning a root or writing state.
    #[error("delta I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A jar root could not be read.
    #[error("cannot read archive {path}: {reason}")]
    Archive {
        /// The archive path.
        path: PathBuf,
        /// Description of the archive problem.
        reason: String,
    },

    /// The state could not be serialized.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}

impl DeltaError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
