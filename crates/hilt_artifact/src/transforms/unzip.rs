use std::fs::File;
use std::io::BufReader;

use tracing::debug;

use super::{ArtifactTransform, TransformContext, TransformOutputs};
use crate::error::TransformError;

/// Expands a jar into a directory, keeping entry paths.
///
/// When the target type is classes-only, resources are left behind.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnzipTransform;

impl ArtifactTransform for UnzipTransform {
    fn name(&self) -> &str {
        "unzip"
    }

    fn transform(
        &self,
        ctx: &TransformContext<'_>,
        outputs: &mut TransformOutputs,
    ) -> Result<(), TransformError> {
        let stem = ctx
            .input
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| TransformError::UnknownNativeType(ctx.input.to_path_buf()))?;
        let out_dir = outputs.dir(stem)?;

        let file = File::open(ctx.input).map_err(|e| TransformError::io(ctx.input, e))?;
        let mut archive = zip::ZipArchive::new(BufReader::new(file))
            .map_err(|e| TransformError::archive(ctx.input, e))?;

        let mut extracted = 0usize;
        for i in 0..archive.len() {
            let mut entry = archive
                .by_index(i)
                .map_err(|e| TransformError::archive(ctx.input, e))?;
            if entry.is_dir() {
                continue;
            }
            if ctx.classes_only && !hilt_common::files::is_class_entry(entry.name()) {
                continue;
            }
            let Some(relative) = entry.enclosed_name().map(|p| p.to_path_buf()) else {
                return Err(TransformError::Archive {
                    path: ctx.input.to_path_buf(),
                    reason: format!("entry '{}' escapes the archive root", entry.name()),
                });
            };
            let dest = out_dir.join(relative);
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent).map_err(|e| TransformError::io(parent, e))?;
            }
            let mut out = File::create(&dest).map_err(|e| TransformError::io(&dest, e))?;
            std::io::copy(&mut entry, &mut out).map_err(|e| TransformError::io(&dest, e))?;
            extracted += 1;
        }

        debug!(input = %ctx.input.display(), entries = extracted, "unzipped");
        Ok(())
    }
}
