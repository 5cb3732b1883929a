//! High-level delta tracker for one step.
//!
//! The `DeltaTracker` ties the persisted [`DeltaState`] to the per-root
//! [`diff`]. It decides whether the invocation is clean or incremental,
//! clears the output root on clean runs, mirrors removals into the output
//! root, and writes the new state once the step has succeeded.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::delta::{diff, DeltaEntry, DeltaStatus, RootDelta};
use crate::error::DeltaError;
use crate::state::DeltaState;

/// Delta tracking for every root of one step.
///
/// The state from the previous invocation is consumed when the tracker is
/// opened: the file is deleted right away and only rewritten by
/// [`save`](Self::save). A step that fails or is cancelled therefore leaves
/// no state behind, and the next invocation is clean.
pub struct DeltaTracker {
    /// Directory holding `delta-state.json`.
    state_dir: PathBuf,

    /// State from the previous invocation; `None` on a clean run.
    previous: Option<DeltaState>,

    /// State being built for the next invocation.
    next: DeltaState,
}

impl DeltaTracker {
    /// Opens the tracker, loading and consuming any compatible state.
    ///
    /// A missing, corrupt, or incompatible state makes this a clean run.
    pub fn load_or_create(state_dir: &Path, fingerprint: &str) -> Result<Self, DeltaError> {
        let previous = DeltaState::load(state_dir).filter(|s| s.is_compatible(fingerprint));
        DeltaState::discard(state_dir)?;
        Ok(Self {
            state_dir: state_dir.to_path_buf(),
            previous,
            next: DeltaState::new(fingerprint),
        })
    }

    /// Opens the tracker for a clean run, ignoring any previous state.
    pub fn clean(state_dir: &Path, fingerprint: &str) -> Result<Self, DeltaError> {
        DeltaState::discard(state_dir)?;
        Ok(Self {
            state_dir: state_dir.to_path_buf(),
            previous: None,
            next: DeltaState::new(fingerprint),
        })
    }

    /// Returns `true` if a previous state is being compared against.
    pub fn is_incremental(&self) -> bool {
        self.previous.is_some()
    }

    /// Readies `output_root`: cleared on a clean run, created otherwise.
    pub fn prepare_output(&self, output_root: &Path) -> Result<(), DeltaError> {
        if self.is_incremental() {
            std::fs::create_dir_all(output_root).map_err(|e| DeltaError::io(output_root, e))
        } else {
            info!(output = %output_root.display(), "clean run, clearing outputs");
            hilt_common::files::reset_dir(output_root).map_err(|e| DeltaError::io(output_root, e))
        }
    }

    /// Diffs every root against the previous state.
    ///
    /// Roots that were tracked before but are no longer inputs come back as
    /// deltas whose entries are all removed.
    pub fn diff_roots(&mut self, roots: &[PathBuf]) -> Result<Vec<RootDelta>, DeltaError> {
        let mut deltas = Vec::with_capacity(roots.len());
        let mut seen = BTreeSet::new();

        for root in roots {
            let key = root_key(root);
            let previous = self.previous.as_ref().and_then(|s| s.roots.get(&key));
            let (delta, state) = diff(root, previous)?;
            debug!(
                root = %root.display(),
                added = delta.count(DeltaStatus::Added),
                changed = delta.count(DeltaStatus::Changed),
                removed = delta.count(DeltaStatus::Removed),
                "diffed root"
            );
            self.next.roots.insert(key.clone(), state);
            seen.insert(key);
            deltas.push(delta);
        }

        if let Some(previous) = &self.previous {
            for (key, state) in &previous.roots {
                if seen.contains(key) {
                    continue;
                }
                deltas.push(RootDelta {
                    root: PathBuf::from(key),
                    kind: state.kind,
                    entries: state
                        .files
                        .keys()
                        .map(|path| DeltaEntry {
                            relative_path: path.clone(),
                            status: DeltaStatus::Removed,
                        })
                        .collect(),
                });
            }
        }
        Ok(deltas)
    }

    /// Deletes the output of every removed entry. Returns how many files
    /// were deleted.
    pub fn apply_removals(&self, delta: &RootDelta, output_root: &Path) -> Result<usize, DeltaError> {
        let mut deleted = 0;
        for entry in delta.removed() {
            let output = delta.output_path(output_root, &entry.relative_path);
            if output.exists() {
                hilt_common::files::remove_file_if_exists(&output)
                    .map_err(|e| DeltaError::io(&output, e))?;
                debug!(output = %output.display(), "removed output");
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// Persists the state for the next invocation.
    pub fn save(&self) -> Result<(), DeltaError> {
        self.next.save(&self.state_dir)
    }

    /// The state that [`save`](Self::save) will write.
    pub fn next_state(&self) -> &DeltaState {
        &self.next
    }
}

fn root_key(root: &Path) -> String {
    root.to_string_lossy().into_owned()
}
