//! Point-to-point transform executors.
//!
//! Each executor converts one artifact of type A into type B. It reads its
//! input, writes into a private work directory, and registers every output
//! it produced in a [`TransformOutputs`]. The chain runner verifies that
//! each registered output exists once the executor returns.

use std::path::{Path, PathBuf};

use crate::error::TransformError;
use crate::types::ArtifactType;

mod aggregated;
mod copy;
mod identity;
mod unzip;

pub use aggregated::{is_aggregated_entry, AggregatedPackagesTransform, AGGREGATED_PACKAGES};
pub use copy::CopyTransform;
pub use identity::IdentityTransform;
pub use unzip::UnzipTransform;

/// A single conversion step between two artifact types.
pub trait ArtifactTransform: Send + Sync {
    /// Short name used in chain descriptions and work-directory names.
    fn name(&self) -> &str;

    /// Converts `ctx.input`, registering every produced path in `outputs`.
    fn transform(
        &self,
        ctx: &TransformContext<'_>,
        outputs: &mut TransformOutputs,
    ) -> Result<(), TransformError>;
}

/// Inputs handed to an executor for one artifact.
#[derive(Debug, Clone, Copy)]
pub struct TransformContext<'a> {
    /// The artifact being converted: a directory or a jar.
    pub input: &'a Path,
    /// The type this step produces.
    pub target: &'a ArtifactType,
    /// Consumers of `target` only read class files.
    pub classes_only: bool,
}

/// Outputs registered by an executor.
///
/// Paths handed out by [`dir`](Self::dir) and [`file`](Self::file) live
/// under the step's private work directory.
#[derive(Debug)]
pub struct TransformOutputs {
    work_dir: PathBuf,
    registered: Vec<PathBuf>,
}

impl TransformOutputs {
    /// Creates an empty output set rooted at `work_dir`.
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            registered: Vec::new(),
        }
    }

    /// Registers an output directory, creating it.
    pub fn dir(&mut self, name: &str) -> Result<PathBuf, TransformError> {
        let path = self.work_dir.join(name);
        std::fs::create_dir_all(&path).map_err(|e| TransformError::io(&path, e))?;
        self.registered.push(path.clone());
        Ok(path)
    }

    /// Registers an output file. The executor must create it.
    pub fn file(&mut self, name: &str) -> Result<PathBuf, TransformError> {
        std::fs::create_dir_all(&self.work_dir)
            .map_err(|e| TransformError::io(&self.work_dir, e))?;
        let path = self.work_dir.join(name);
        self.registered.push(path.clone());
        Ok(path)
    }

    /// The step's private work directory.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Every registered output in registration order.
    pub fn registered(&self) -> &[PathBuf] {
        &self.registered
    }

    /// Consumes the set, returning the registered outputs.
    pub fn into_paths(self) -> Vec<PathBuf> {
        self.registered
    }
}

/// File name of `path`, for naming an output after its input.
pub(crate) fn file_name(path: &Path) -> Result<&str, TransformError> {
    path.file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| TransformError::UnknownNativeType(path.to_path_buf()))
}
