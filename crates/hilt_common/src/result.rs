//! Result and internal-error types shared by every crate.

use std::path::Path;

/// Result type for operations whose only failure mode is a broken invariant.
pub type HiltResult<T> = Result<T, InternalError>;

/// A violated pipeline invariant: a bug in the toolchain or in how a
/// transform was registered, never a problem with the user's inputs.
///
/// User-facing failures (ambiguous chains, missing generated classes, I/O)
/// have their own error enums in the crate that detects them.
#[derive(Debug, thiserror::Error)]
#[error("internal error: {message}")]
pub struct InternalError {
    /// Description of the violated invariant.
    pub message: String,
}

impl InternalError {
    /// Creates a new internal error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// A transform registered an output that does not exist after it ran.
    pub fn missing_output(transform: &str, output: &Path) -> Self {
        Self::new(format!(
            "transform '{transform}' registered output {} but did not produce it",
            output.display()
        ))
    }
}

impl From<String> for InternalError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
