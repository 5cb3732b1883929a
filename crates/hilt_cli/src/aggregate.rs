//! `hilt aggregate`: runs every artifact through its chain to one type.
//!
//! Project artifacts are read first, then dependency artifacts, and the
//! resulting files are printed in that order. With `--exclude-project` the
//! project's own artifacts are dropped, as in the experimental compile
//! classpath.

use std::path::Path;

use hilt_artifact::{Artifact, ArtifactType, ChainRunner, ComponentId, TransformRegistry};
use hilt_plugin::{aggregate, AggregationView, ComponentFilter};

use crate::pipeline::load_project;
use crate::{AggregateArgs, GlobalArgs, ReportFormat};

/// Project name used when there is no `hilt.toml`.
const DEFAULT_PROJECT: &str = "project";

/// Runs the `hilt aggregate` command.
pub fn run(args: &AggregateArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    if args.artifacts.is_empty() && args.project_artifacts.is_empty() {
        return Err("no artifacts given".into());
    }
    let config = load_project(global)?;
    let project = config
        .as_ref()
        .map_or(DEFAULT_PROJECT, |c| c.project.name.as_str())
        .to_string();

    let registry = TransformRegistry::hilt_defaults();
    let runner = ChainRunner::new(&registry, &args.work_dir);
    let (view, configurations) = build_view(args, &project);
    let files = aggregate(&runner, &view, &configurations)?;

    match args.format {
        ReportFormat::Text => {
            for file in &files {
                println!("{}", file.display());
            }
            if !global.quiet {
                eprintln!("   Aggregated {} file(s) as {}", files.len(), view.requested);
            }
        }
        ReportFormat::Json => {
            let paths: Vec<_> = files.iter().map(|f| f.display().to_string()).collect();
            println!("{}", serde_json::to_string_pretty(&paths)?);
        }
    }
    Ok(0)
}

fn build_view(args: &AggregateArgs, project: &str) -> (AggregationView, Vec<Vec<Artifact>>) {
    let owned = args
        .project_artifacts
        .iter()
        .map(|p| Artifact::new(p, ComponentId::Project(project.to_string())))
        .collect();
    let dependencies = args
        .artifacts
        .iter()
        .map(|p| Artifact::new(p, ComponentId::Module(module_name(p))))
        .collect();
    let filter = if args.exclude_project {
        ComponentFilter::ExcludeProject(project.to_string())
    } else {
        ComponentFilter::All
    };
    let view = AggregationView {
        name: "aggregate".to_string(),
        requested: ArtifactType::new(args.requested.as_str()),
        filter,
        configurations: vec!["project".to_string(), "dependencies".to_string()],
    };
    (view, vec![owned, dependencies])
}

fn module_name(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
