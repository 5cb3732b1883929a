//! Executes resolved chains on disk.

use std::fmt;
use std::path::{Path, PathBuf};

use hilt_common::{ContentHash, InternalError};
use tracing::info;

use crate::error::TransformError;
use crate::registry::TransformRegistry;
use crate::resolve::{resolve, TransformChain};
use crate::transforms::{TransformContext, TransformOutputs};
use crate::types::{ArtifactType, NativeKind};

/// Identifies the component that owns an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ComponentId {
    /// A project in the same build, by project name.
    Project(String),
    /// An external module, by `group:name` coordinate.
    Module(String),
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project(name) => write!(f, "project :{name}"),
            Self::Module(coordinate) => f.write_str(coordinate),
        }
    }
}

/// An upstream build artifact: a class directory or a jar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Location on disk.
    pub path: PathBuf,
    /// Owning component.
    pub component: ComponentId,
}

impl Artifact {
    /// Creates an artifact owned by `component`.
    pub fn new(path: impl Into<PathBuf>, component: ComponentId) -> Self {
        Self {
            path: path.into(),
            component,
        }
    }

    /// The artifact type inferred from what is on disk.
    pub fn native_type(&self) -> Result<ArtifactType, TransformError> {
        NativeKind::of(&self.path).map(NativeKind::artifact_type)
    }
}

/// Runs transform chains, giving every step a private work directory.
#[derive(Debug)]
pub struct ChainRunner<'a> {
    registry: &'a TransformRegistry,
    work_root: PathBuf,
}

impl<'a> ChainRunner<'a> {
    /// Creates a runner writing under `work_root`.
    pub fn new(registry: &'a TransformRegistry, work_root: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            work_root: work_root.into(),
        }
    }

    /// Resolves the chain for `artifact` without touching the filesystem
    /// beyond inferring its native type.
    pub fn resolve_for(
        &self,
        artifact: &Artifact,
        requested: &ArtifactType,
    ) -> Result<TransformChain, TransformError> {
        resolve(self.registry, &artifact.native_type()?, requested)
    }

    /// Resolves and runs the chain for `artifact`.
    pub fn run(
        &self,
        artifact: &Artifact,
        requested: &ArtifactType,
    ) -> Result<Vec<PathBuf>, TransformError> {
        let chain = self.resolve_for(artifact, requested)?;
        self.run_chain(artifact, &chain)
    }

    /// Runs an already resolved chain, returning the final outputs.
    ///
    /// Every output of one step is fed to the next. A step may produce no
    /// output at all, which ends that branch of the chain.
    pub fn run_chain(
        &self,
        artifact: &Artifact,
        chain: &TransformChain,
    ) -> Result<Vec<PathBuf>, TransformError> {
        let mut inputs = vec![artifact.path.clone()];
        let artifact_dir = self.work_root.join(work_key(&artifact.path));

        for (i, step) in chain.steps.iter().enumerate() {
            let transform = self.registry.transform(step.transform).ok_or_else(|| {
                InternalError::new(format!("no transform registered at index {}", step.transform))
            })?;
            let classes_only = self.registry.types().is_classes_only(&step.to);
            let mut produced = Vec::new();

            for (j, input) in inputs.iter().enumerate() {
                let work_dir = artifact_dir.join(format!("{i}-{}", step.name)).join(j.to_string());
                hilt_common::files::reset_dir(&work_dir)
                    .map_err(|e| TransformError::io(&work_dir, e))?;

                let ctx = TransformContext {
                    input,
                    target: &step.to,
                    classes_only,
                };
                let mut outputs = TransformOutputs::new(&work_dir);
                transform.transform(&ctx, &mut outputs)?;

                for output in outputs.into_paths() {
                    if !output.exists() {
                        return Err(InternalError::missing_output(&step.name, &output).into());
                    }
                    produced.push(output);
                }
            }
            inputs = produced;
        }

        info!(
            artifact = %artifact.path.display(),
            component = %artifact.component,
            chain = %chain,
            outputs = inputs.len(),
            "ran transform chain"
        );
        Ok(inputs)
    }
}

/// Stable, collision-free directory name for an artifact's work files.
fn work_key(path: &Path) -> String {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    let hash = ContentHash::from_bytes(path.to_string_lossy().as_bytes()).to_string();
    format!("{name}-{}", &hash[..12])
}
