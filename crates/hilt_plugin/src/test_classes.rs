//! Rewriting of the classes local (JVM) tests run against.
//!
//! Local tests see the main variant's compiled classes without the
//! entry-point rewrite. This step rewrites every marked class on the test
//! runtime classpath into a fresh output directory, which is then placed
//! ahead of the original classpath. Unmarked classes are not written;
//! resources found next to classes in directory roots are copied through.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hilt_bytecode::{ClassPoolBuilder, ClassTransformer, FileOutcome, RewriteMode, RewriteOptions};
use hilt_common::files::{is_jar_file, reset_dir, to_slash_path};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::PluginError;

/// Emit-only rewrite of a test runtime classpath.
pub struct TestClassesStep {
    task_name: String,
    options: RewriteOptions,
    cancel: Arc<AtomicBool>,
}

impl TestClassesStep {
    /// Creates the step. The mode is always emit-only.
    pub fn new(options: RewriteOptions, task_name: impl Into<String>) -> Self {
        Self {
            task_name: task_name.into(),
            options: options.with_mode(RewriteMode::EmitOnlyRewritten),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shares a cancel flag with the caller.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// Rewrites the marked classes of `classpath` into `output_dir`,
    /// returning how many were written.
    ///
    /// The output directory is cleared first. Roots are visited last to
    /// first so that a class present in several roots ends up as the copy
    /// from the earliest one.
    pub fn run(&self, classpath: &[PathBuf], output_dir: &Path) -> Result<usize, PluginError> {
        reset_dir(output_dir).map_err(|e| PluginError::io(output_dir, e))?;

        let mut builder = ClassPoolBuilder::new();
        for root in classpath {
            builder.add_root(root)?;
        }
        let pool = builder.build();
        let transformer = ClassTransformer::new(&pool, self.options.clone(), &self.task_name);

        let mut written = 0;
        for root in classpath.iter().rev() {
            if root.is_dir() {
                written += self.transform_directory(&transformer, root, output_dir)?;
            } else if is_jar_file(root) {
                self.check_cancelled()?;
                written += transformer.transform_jar_contents(root, output_dir)?;
            } else {
                debug!(root = %root.display(), "skipping missing classpath root");
            }
        }
        info!(task = %self.task_name, written, "rewrote test classes");
        Ok(written)
    }

    fn transform_directory(
        &self,
        transformer: &ClassTransformer<'_>,
        root: &Path,
        output_dir: &Path,
    ) -> Result<usize, PluginError> {
        let mut written = 0;
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                PluginError::io(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            self.check_cancelled()?;
            let Some(relative) = entry.path().strip_prefix(root).ok().and_then(to_slash_path)
            else {
                continue;
            };
            if let FileOutcome::Rewritten(_) =
                transformer.transform_file(entry.path(), &relative, output_dir)?
            {
                written += 1;
            }
        }
        Ok(written)
    }

    fn check_cancelled(&self) -> Result<(), PluginError> {
        if self.cancel.load(Ordering::Relaxed) {
            return Err(PluginError::Cancelled {
                step: self.task_name.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hilt_common::files::write_file;

    #[test]
    fn output_is_reset_and_missing_roots_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        let out = tmp.path().join("out");
        write_file(&out.join("stale/Old.class"), b"old").unwrap();

        let step = TestClassesStep::new(RewriteOptions::default(), "hiltTransformForJUnitDebug");
        let written = step.run(&[tmp.path().join("missing")], &out).unwrap();
        assert_eq!(written, 0);
        assert!(out.is_dir());
        assert!(!out.join("stale").exists());
    }

    #[test]
    fn resources_are_copied_through() {
        let tmp = tempfile::tempdir().unwrap();
        let classes = tmp.path().join("classes");
        write_file(&classes.join("res/config.properties"), b"mode=test").unwrap();

        let out = tmp.path().join("out");
        let step = TestClassesStep::new(RewriteOptions::default(), "hiltTransformForJUnitDebug");
        assert_eq!(step.run(&[classes], &out).unwrap(), 0);
        assert_eq!(
            std::fs::read(out.join("res/config.properties")).unwrap(),
            b"mode=test"
        );
    }

    #[test]
    fn cancelled_step_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let classes = tmp.path().join("classes");
        write_file(&classes.join("a/A.class"), b"not read").unwrap();

        let cancel = Arc::new(AtomicBool::new(true));
        let step = TestClassesStep::new(RewriteOptions::default(), "t").with_cancel(cancel);
        let err = step.run(&[classes], &tmp.path().join("out")).unwrap_err();
        assert!(matches!(err, PluginError::Cancelled { .. }));
    }
}
