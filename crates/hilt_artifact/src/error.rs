//! Error types for chain resolution and transform execution.

use std::path::PathBuf;

use hilt_common::InternalError;

/// Errors raised while resolving or executing a transform chain.
///
/// [`NoTransform`](TransformError::NoTransform) and
/// [`AmbiguousChains`](TransformError::AmbiguousChains) are configuration
/// errors: they are detected before any file is touched and mean the
/// registry itself is wrong.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// No chain of transforms leads from the produced type to the request.
    #[error("no transform found from '{from}' to '{to}'")]
    NoTransform {
        /// The artifact's native type.
        from: String,
        /// The type the consumer asked for.
        to: String,
    },

    /// Several equally short chains survive every disambiguation rule.
    #[error(
        "multiple transformation chains found from '{from}' to '{to}': {}",
        .candidates.join("; ")
    )]
    AmbiguousChains {
        /// The artifact's native type.
        from: String,
        /// The type the consumer asked for.
        to: String,
        /// Every surviving chain, rendered as `a -[t]-> b`.
        candidates: Vec<String>,
    },

    /// An artifact path is neither a directory nor a jar.
    #[error("cannot infer an artifact type for {0}: not a directory or a .jar file")]
    UnknownNativeType(PathBuf),

    /// The consumer asked for a type the registry does not know.
    #[error("unknown artifact type '{0}'")]
    UnknownType(String),

    /// An I/O error occurred while reading an input or writing an output.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path being read or written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A jar could not be read or written.
    #[error("invalid archive {path}: {reason}")]
    Archive {
        /// The archive path.
        path: PathBuf,
        /// Description of the archive problem.
        reason: String,
    },

    /// A transform broke the registration contract.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl TransformError {
    /// Builds an [`Io`](TransformError::Io) error for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Builds an [`Archive`](TransformError::Archive) error from a zip failure.
    pub fn archive(path: impl Into<PathBuf>, err: zip::result::ZipError) -> Self {
        Self::Archive {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    /// Returns `true` for errors caused by the registry rather than by the
    /// artifacts being transformed.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NoTransform { .. } | Self::AmbiguousChains { .. } | Self::UnknownType(_)
        )
    }
}
