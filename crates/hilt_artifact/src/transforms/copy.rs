use tracing::debug;
use walkdir::WalkDir;

use super::{file_name, ArtifactTransform, TransformContext, TransformOutputs};
use crate::error::TransformError;

/// Copies a directory tree verbatim under a new type tag.
///
/// Registered as the `directory -> hilt-all-classes` edge. The extra hop it
/// adds to the unzip path is what makes the identity path the unique
/// shortest chain for jars.
#[derive(Debug, Default, Clone, Copy)]
pub struct CopyTransform;

impl ArtifactTransform for CopyTransform {
    fn name(&self) -> &str {
        "copy"
    }

    fn transform(
        &self,
        ctx: &TransformContext<'_>,
        outputs: &mut TransformOutputs,
    ) -> Result<(), TransformError> {
        let out_dir = outputs.dir(file_name(ctx.input)?)?;
        let mut copied = 0usize;
        for entry in WalkDir::new(ctx.input).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(ctx.input).to_path_buf();
                TransformError::io(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(ctx.input)
                .map_err(|_| TransformError::UnknownNativeType(entry.path().to_path_buf()))?;
            let dest = out_dir.join(relative);
            hilt_common::files::copy_file(entry.path(), &dest)
                .map_err(|e| TransformError::io(&dest, e))?;
            copied += 1;
        }
        debug!(input = %ctx.input.display(), files = copied, "copied directory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ArtifactType;

    #[test]
    fn copies_whole_tree() {
        let tmp = tempfile::tempdir().unwrap();
        let input = tmp.path().join("classes");
        hilt_common::files::write_file(&input.join("com/example/Foo.class"), b"foo").unwrap();
        hilt_common::files::write_file(&input.join("res/strings.xml"), b"<xml/>").unwrap();

        let mut outputs = TransformOutputs::new(tmp.path().join("work"));
        let ctx = TransformContext {
            input: &input,
            target: &ArtifactType::HILT_ALL_CLASSES,
            classes_only: true,
        };
        CopyTransform.transform(&ctx, &mut outputs).unwrap();

        let out = &outputs.registered()[0];
        assert_eq!(std::fs::read(out.join("com/example/Foo.class")).unwrap(), b"foo");
        assert!(out.join("res/strings.xml").is_file());
    }
}
