//! Error type for the Hilt build steps.

use std::path::PathBuf;

use hilt_artifact::TransformError;
use hilt_bytecode::RewriteError;
use hilt_cache::DeltaError;
use hilt_common::InternalError;
use hilt_config::ConfigError;

/// Errors raised while configuring the plugin or running a step.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    /// No Android plugin was applied before evaluation finished.
    #[error("the Hilt plugin can only be applied to an Android project")]
    NotAndroidProject,

    /// A required dependency is not declared.
    #[error("the Hilt plugin is applied but no {coordinate} dependency was found")]
    MissingDependency {
        /// The expected `group:name`.
        coordinate: String,
    },

    /// The step was cancelled before every file was processed.
    #[error("step '{step}' was cancelled")]
    Cancelled {
        /// Name of the cancelled step.
        step: String,
    },

    /// Chain resolution or execution failed.
    #[error(transparent)]
    Transform(#[from] TransformError),

    /// A class could not be rewritten.
    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    /// Delta tracking failed.
    #[error(transparent)]
    Delta(#[from] DeltaError),

    /// The project configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An I/O error occurred while preparing or writing outputs.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The path being read or written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A pipeline invariant was broken.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl PluginError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_dependency_names_coordinate() {
        let err = PluginError::MissingDependency {
            coordinate: "com.google.dagger:hilt-android".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "the Hilt plugin is applied but no com.google.dagger:hilt-android dependency was found"
        );
    }

    #[test]
    fn wrapped_errors_keep_their_message() {
        let err: PluginError = RewriteError::MissingSuperclass {
            class: "a/A".to_string(),
            superclass: "a/Hilt_A".to_string(),
        }
        .into();
        assert!(err.to_string().contains("'a/A'"));
    }
}
