//! The incremental entry-point rewrite step.
//!
//! Project class directories are rewritten file by file under a delta:
//! added and changed files go through the [`ClassTransformer`], removed
//! files have their outputs deleted, unchanged files are skipped. Jars are
//! copied whole. A clean invocation clears the output first.
//!
//! Outputs land under `<output>/classes/<name>-<hash>/` for each directory
//! and `<output>/jars/<name>-<hash>.jar` for jars, so roots that contain the
//! same relative path never share an output file.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hilt_bytecode::{ClassPoolBuilder, ClassTransformer, FileOutcome, RewriteMode, RewriteOptions};
use hilt_cache::delta::archive_dir_name;
use hilt_cache::{DeltaStatus, DeltaTracker, RootDelta, RootKind};
use hilt_common::files::{copy_file, join_slash_path, remove_file_if_exists};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::error::PluginError;

/// Output subdirectory for rewritten class directories.
pub const CLASSES_DIR: &str = "classes";

/// Output subdirectory for copied jars.
pub const JARS_DIR: &str = "jars";

/// Inputs of one invocation.
#[derive(Debug, Clone, Default)]
pub struct EntryPointInputs {
    /// Roots whose files are written to the output.
    pub inputs: Vec<PathBuf>,
    /// Roots only used to resolve generated superclasses.
    pub referenced: Vec<PathBuf>,
}

/// What an invocation did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Whether the invocation compared against a previous state.
    pub incremental: bool,
    /// Classes rewritten to extend their generated superclass.
    pub rewritten: usize,
    /// Files copied unchanged.
    pub copied: usize,
    /// Class files not written (emit-only mode).
    pub dropped: usize,
    /// Outputs deleted because their input disappeared.
    pub removed: usize,
    /// Jars copied whole.
    pub jars_copied: usize,
}

/// The copy-through entry-point rewrite, run once per variant.
pub struct EntryPointStep {
    task_name: String,
    options: RewriteOptions,
    parallel: bool,
    cancel: Arc<AtomicBool>,
}

impl EntryPointStep {
    /// Default task name used in logs.
    pub const NAME: &'static str = "AndroidEntryPointTransform";

    /// Creates the step. The mode is always copy-through.
    pub fn new(options: RewriteOptions) -> Self {
        Self {
            task_name: Self::NAME.to_string(),
            options: options.with_mode(RewriteMode::CopyThrough),
            parallel: true,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Overrides the task name shown in logs.
    pub fn with_task_name(mut self, name: impl Into<String>) -> Self {
        self.task_name = name.into();
        self
    }

    /// Rewrites files on the rayon pool when `true`.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Shares a cancel flag with the caller.
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    /// The flag that stops new per-file work when set.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Key under which delta state is stored. Changing rewrite settings
    /// invalidates the previous state.
    pub fn fingerprint(&self) -> String {
        format!(
            "entry-point;markers={};prefix={}",
            self.options.markers.join(","),
            self.options.prefix
        )
    }

    /// Runs one invocation, incremental if a compatible state is found in
    /// `state_dir`.
    pub fn run(
        &self,
        inputs: &EntryPointInputs,
        output_root: &Path,
        state_dir: &Path,
    ) -> Result<StepReport, PluginError> {
        let tracker = DeltaTracker::load_or_create(state_dir, &self.fingerprint())?;
        self.run_with(tracker, inputs, output_root)
    }

    /// Runs one invocation, ignoring any previous state.
    pub fn run_clean(
        &self,
        inputs: &EntryPointInputs,
        output_root: &Path,
        state_dir: &Path,
    ) -> Result<StepReport, PluginError> {
        let tracker = DeltaTracker::clean(state_dir, &self.fingerprint())?;
        self.run_with(tracker, inputs, output_root)
    }

    fn run_with(
        &self,
        mut tracker: DeltaTracker,
        inputs: &EntryPointInputs,
        output_root: &Path,
    ) -> Result<StepReport, PluginError> {
        tracker.prepare_output(output_root)?;
        let mut report = StepReport {
            incremental: tracker.is_incremental(),
            ..StepReport::default()
        };

        let mut builder = ClassPoolBuilder::new();
        for root in inputs.inputs.iter().chain(&inputs.referenced) {
            builder.add_root(root)?;
        }
        let pool = builder.build();
        debug!(task = %self.task_name, classes = pool.len(), "class pool ready");
        let transformer = ClassTransformer::new(&pool, self.options.clone(), &self.task_name);

        let mut work = Vec::new();
        for delta in tracker.diff_roots(&inputs.inputs)? {
            match delta.kind {
                RootKind::Archive => self.sync_jar(&delta, output_root, &mut report)?,
                RootKind::Directory => {
                    let classes_dir = classes_output(output_root, &delta.root);
                    report.removed += tracker.apply_removals(&delta, &classes_dir)?;
                    work.extend(delta.dirty().map(|entry| WorkItem {
                        input: join_slash_path(&delta.root, &entry.relative_path),
                        relative: entry.relative_path.clone(),
                        output_dir: classes_dir.clone(),
                    }));
                }
            }
        }

        let process = |item: &WorkItem| {
            if self.cancel.load(Ordering::Relaxed) {
                return Ok(None);
            }
            transformer
                .transform_file(&item.input, &item.relative, &item.output_dir)
                .map(Some)
        };
        let outcomes: Vec<Option<FileOutcome>> = if self.parallel {
            work.par_iter().map(process).collect::<Result<_, _>>()?
        } else {
            work.iter().map(process).collect::<Result<_, _>>()?
        };

        let mut cancelled = false;
        for outcome in outcomes {
            match outcome {
                Some(FileOutcome::Rewritten(_)) => report.rewritten += 1,
                Some(FileOutcome::Copied(_)) => report.copied += 1,
                Some(FileOutcome::Dropped) => report.dropped += 1,
                None => cancelled = true,
            }
        }
        if cancelled {
            info!(task = %self.task_name, "cancelled, next run will be clean");
            return Err(PluginError::Cancelled {
                step: self.task_name.clone(),
            });
        }

        tracker.save()?;
        info!(
            task = %self.task_name,
            incremental = report.incremental,
            rewritten = report.rewritten,
            copied = report.copied,
            removed = report.removed,
            jars = report.jars_copied,
            "entry-point step finished"
        );
        Ok(report)
    }

    fn sync_jar(
        &self,
        delta: &RootDelta,
        output_root: &Path,
        report: &mut StepReport,
    ) -> Result<(), PluginError> {
        let output = jar_output(output_root, &delta.root);
        match jar_status(delta) {
            DeltaStatus::Added | DeltaStatus::Changed => {
                copy_file(&delta.root, &output).map_err(|e| PluginError::io(&output, e))?;
                report.jars_copied += 1;
            }
            DeltaStatus::Removed => {
                remove_file_if_exists(&output).map_err(|e| PluginError::io(&output, e))?;
                report.removed += 1;
            }
            DeltaStatus::Unchanged => {}
        }
        Ok(())
    }
}

/// One dirty file of a directory root.
struct WorkItem {
    input: PathBuf,
    relative: String,
    output_dir: PathBuf,
}

/// Where the outputs of the class directory `root` live under `output_root`.
pub fn classes_output(output_root: &Path, root: &Path) -> PathBuf {
    output_root.join(CLASSES_DIR).join(archive_dir_name(root))
}

/// Where the copy of `jar` lives under `output_root`.
pub fn jar_output(output_root: &Path, jar: &Path) -> PathBuf {
    output_root
        .join(JARS_DIR)
        .join(format!("{}.jar", archive_dir_name(jar)))
}

/// Collapses a jar's per-entry delta into one status for the whole jar.
pub fn jar_status(delta: &RootDelta) -> DeltaStatus {
    let all = |status| delta.entries.iter().all(|e| e.status == status);
    if delta.entries.is_empty() {
        // An empty jar has no entries to compare; copy it if it exists.
        return if delta.root.is_file() {
            DeltaStatus::Added
        } else {
            DeltaStatus::Removed
        };
    }
    if all(DeltaStatus::Unchanged) {
        DeltaStatus::Unchanged
    } else if all(DeltaStatus::Removed) {
        DeltaStatus::Removed
    } else if all(DeltaStatus::Added) {
        DeltaStatus::Added
    } else {
        DeltaStatus::Changed
    }
}
