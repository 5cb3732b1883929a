use std::fs::File;
use std::io::{BufReader, BufWriter};

use tracing::debug;
use walkdir::WalkDir;

use super::{ArtifactTransform, TransformContext, TransformOutputs};
use crate::error::TransformError;

/// Packages holding the classes the aggregating processor consumes.
pub const AGGREGATED_PACKAGES: &[&str] = &[
    "dagger/hilt/internal/aggregatedroot/codegen",
    "dagger/hilt/internal/processedrootsentinel/codegen",
    "dagger/hilt/internal/componenttreedeps/codegen",
    "dagger/hilt/android/internal/earlyentrypoint/codegen",
    "dagger/hilt/android/internal/uninstallmodules/codegen",
    "hilt_aggregated_deps",
];

/// Name of the jar written for an archive input with matching entries.
pub const AGGREGATED_JAR: &str = "hiltAggregated.jar";

/// Returns `true` if a `/`-separated path is a class directly inside one of
/// the [`AGGREGATED_PACKAGES`].
pub fn is_aggregated_entry(path: &str) -> bool {
    if !hilt_common::files::is_class_entry(path) {
        return false;
    }
    let package = path.rsplit_once('/').map_or("", |(pkg, _)| pkg);
    AGGREGATED_PACKAGES.contains(&package)
}

/// Keeps only the aggregated-metadata classes of an artifact.
///
/// A jar input yields [`AGGREGATED_JAR`] holding the matching entries, or no
/// output at all when nothing matches. A directory input yields a directory
/// of the matching class files under their original relative paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct AggregatedPackagesTransform;

impl ArtifactTransform for AggregatedPackagesTransform {
    fn name(&self) -> &str {
        "aggregated-packages"
    }

    fn transform(
        &self,
        ctx: &TransformContext<'_>,
        outputs: &mut TransformOutputs,
    ) -> Result<(), TransformError> {
        if ctx.input.is_dir() {
            extract_from_dir(ctx, outputs)
        } else {
            extract_from_jar(ctx, outputs)
        }
    }
}

fn extract_from_jar(
    ctx: &TransformContext<'_>,
    outputs: &mut TransformOutputs,
) -> Result<(), TransformError> {
    let file = File::open(ctx.input).map_err(|e| TransformError::io(ctx.input, e))?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file))
        .map_err(|e| TransformError::archive(ctx.input, e))?;

    let matching: Vec<usize> = (0..archive.len())
        .filter(|&i| {
            archive
                .name_for_index(i)
                .is_some_and(is_aggregated_entry)
        })
        .collect();
    if matching.is_empty() {
        debug!(input = %ctx.input.display(), "no aggregated classes");
        return Ok(());
    }

    let out = outputs.file(AGGREGATED_JAR)?;
    let out_file = File::create(&out).map_err(|e| TransformError::io(&out, e))?;
    let mut writer = zip::ZipWriter::new(BufWriter::new(out_file));
    for &i in &matching {
        let entry = archive
            .by_index_raw(i)
            .map_err(|e| TransformError::archive(ctx.input, e))?;
        writer
            .raw_copy_file(entry)
            .map_err(|e| TransformError::archive(&out, e))?;
    }
    writer
        .finish()
        .map_err(|e| TransformError::archive(&out, e))?;

    debug!(input = %ctx.input.display(), entries = matching.len(), "extracted aggregated classes");
    Ok(())
}

fn extract_from_dir(
    ctx: &TransformContext<'_>,
    outputs: &mut TransformOutputs,
) -> Result<(), TransformError> {
    let name = super::file_name(ctx.input)?;
    let out_dir = outputs.dir(name)?;
    let mut copied = 0usize;
    for entry in WalkDir::new(ctx.input).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(ctx.input).to_path_buf();
            TransformError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(relative) = entry
            .path()
            .strip_prefix(ctx.input)
            .ok()
            .and_then(hilt_common::files::to_slash_path)
        else {
            continue;
        };
        if !is_aggregated_entry(&relative) {
            continue;
        }
        let dest = hilt_common::files::join_slash_path(&out_dir, &relative);
        hilt_common::files::copy_file(entry.path(), &dest)
            .map_err(|e| TransformError::io(&dest, e))?;
        copied += 1;
    }
    debug!(input = %ctx.input.display(), files = copied, "extracted aggregated classes");
    Ok(())
}
