//! Error types for class-file decoding and rewriting.

use std::path::PathBuf;

use hilt_common::InternalError;

/// A byte sequence that does not decode as a class file.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason} at offset {offset}")]
pub struct ClassFormatError {
    /// Byte offset where decoding failed.
    pub offset: usize,
    /// What was wrong.
    pub reason: String,
}

impl ClassFormatError {
    /// Creates an error at `offset`.
    pub fn new(offset: usize, reason: impl Into<String>) -> Self {
        Self {
            offset,
            reason: reason.into(),
        }
    }
}

/// Errors raised while rewriting entry-point classes.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    /// A marked class's generated superclass is not in the class pool.
    #[error(
        "class '{class}' is marked as an entry point but its generated superclass \
         '{superclass}' was not found"
    )]
    MissingSuperclass {
        /// Binary name of the marked class, `/`-separated.
        class: String,
        /// The generated name that was looked up.
        superclass: String,
    },

    /// Bytes that should be a class file failed to decode.
    #[error("malformed class file {path}: {source}")]
    Malformed {
        /// The file or `jar!/entry` being read.
        path: PathBuf,
        /// The decoding failure.
        source: ClassFormatError,
    },

    /// An I/O error occurred while reading an input or writing an output.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path being read or written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A jar could not be read.
    #[error("invalid archive {path}: {reason}")]
    Archive {
        /// The archive path.
        path: PathBuf,
        /// Description of the archive problem.
        reason: String,
    },

    /// The transformer was used in a way its mode does not allow.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl RewriteError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn archive(path: impl Into<PathBuf>, err: zip::result::ZipError) -> Self {
        Self::Archive {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}
