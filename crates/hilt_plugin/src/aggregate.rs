//! Classpath aggregation views.
//!
//! A view asks for one artifact type over a set of upstream artifacts,
//! optionally dropping artifacts owned by some component. Every chain is
//! resolved before any transform runs, so an ambiguous or missing chain
//! fails the view without touching the filesystem.

use std::path::PathBuf;

use hilt_artifact::{Artifact, ArtifactType, ChainRunner, ComponentId, TransformChain};
use tracing::{debug, info};

use crate::error::PluginError;

/// Which upstream components a view keeps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentFilter {
    /// Every artifact.
    All,
    /// Everything except artifacts of the named project.
    ExcludeProject(String),
}

impl ComponentFilter {
    /// Returns `true` if artifacts of `component` belong in the view.
    pub fn accepts(&self, component: &ComponentId) -> bool {
        match (self, component) {
            (Self::ExcludeProject(name), ComponentId::Project(project)) => project != name,
            _ => true,
        }
    }
}

/// A request for one artifact type over a set of configurations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationView {
    /// Consumer of the view, e.g. `hiltAggregateDepsDebug`.
    pub name: String,
    /// The artifact type every artifact is converted to.
    pub requested: ArtifactType,
    /// Component filter.
    pub filter: ComponentFilter,
    /// Names of the configurations the view reads, in order.
    pub configurations: Vec<String>,
}

/// An artifact with its resolved chain.
#[derive(Debug, Clone)]
pub struct ResolvedArtifact {
    /// The upstream artifact.
    pub artifact: Artifact,
    /// The chain to the view's requested type.
    pub chain: TransformChain,
}

/// Resolves the chain of every artifact the view keeps.
pub fn resolve_view(
    runner: &ChainRunner<'_>,
    view: &AggregationView,
    artifacts: &[Artifact],
) -> Result<Vec<ResolvedArtifact>, PluginError> {
    let mut resolved = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        if !view.filter.accepts(&artifact.component) {
            debug!(view = %view.name, component = %artifact.component, "filtered out");
            continue;
        }
        let chain = runner.resolve_for(artifact, &view.requested)?;
        resolved.push(ResolvedArtifact {
            artifact: artifact.clone(),
            chain,
        });
    }
    Ok(resolved)
}

/// Runs a view, returning the files of the aggregated classpath.
///
/// `configurations` holds the artifacts of each configuration the view
/// reads; their results are concatenated in order.
pub fn aggregate(
    runner: &ChainRunner<'_>,
    view: &AggregationView,
    configurations: &[Vec<Artifact>],
) -> Result<Vec<PathBuf>, PluginError> {
    let mut resolved = Vec::new();
    for artifacts in configurations {
        resolved.extend(resolve_view(runner, view, artifacts)?);
    }

    let mut files = Vec::new();
    for item in &resolved {
        files.extend(runner.run_chain(&item.artifact, &item.chain)?);
    }
    info!(
        view = %view.name,
        requested = %view.requested,
        artifacts = resolved.len(),
        files = files.len(),
        "aggregated classpath"
    );
    Ok(files)
}
