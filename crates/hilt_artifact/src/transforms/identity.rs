use tracing::debug;

use super::{file_name, ArtifactTransform, TransformContext, TransformOutputs};
use crate::error::TransformError;

/// Byte-for-byte copy of an archive under a new type tag.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityTransform;

impl ArtifactTransform for IdentityTransform {
    fn name(&self) -> &str {
        "identity"
    }

    fn transform(
        &self,
        ctx: &TransformContext<'_>,
        outputs: &mut TransformOutputs,
    ) -> Result<(), TransformError> {
        let out = outputs.file(file_name(ctx.input)?)?;
        std::fs::copy(ctx.input, &out).map_err(|e| TransformError::io(ctx.input, e))?;
        debug!(input = %ctx.input.display(), output = %out.display(), "identity copy");
        Ok(())
    }
}
