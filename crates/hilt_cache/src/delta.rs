//! Per-root change detection.
//!
//! Scans a directory tree or a jar's entries, builds a signature per file,
//! and compares the result with the previous [`RootState`] to classify each
//! file as added, changed, removed or unchanged.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use hilt_common::files::{join_slash_path, to_slash_path};
use hilt_common::ContentHash;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::DeltaError;
use crate::state::{FileSignature, RootKind, RootState};

/// How a file changed since the previous invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeltaStatus {
    /// Not present in the previous state.
    Added,
    /// Present before with a different size, timestamp or content.
    Changed,
    /// Present before, gone now.
    Removed,
    /// Same content as before.
    Unchanged,
}

impl fmt::Display for DeltaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Added => "ADDED",
            Self::Changed => "CHANGED",
            Self::Removed => "REMOVED",
            Self::Unchanged => "UNCHANGED",
        })
    }
}

/// One file of a root and how it changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaEntry {
    /// Path relative to the root, `/`-separated on every platform.
    pub relative_path: String,
    /// Classification against the previous invocation.
    pub status: DeltaStatus,
}

/// Every entry of one root, ordered lexically by relative path.
#[derive(Debug, Clone)]
pub struct RootDelta {
    /// The directory or jar that was scanned.
    pub root: PathBuf,
    /// The root's shape.
    pub kind: RootKind,
    /// Entries in lexical order of `relative_path`.
    pub entries: Vec<DeltaEntry>,
}

impl RootDelta {
    /// Returns `true` if nothing was added, changed or removed.
    pub fn is_empty(&self) -> bool {
        self.entries
            .iter()
            .all(|e| e.status == DeltaStatus::Unchanged)
    }

    /// Number of entries with the given status.
    pub fn count(&self, status: DeltaStatus) -> usize {
        self.entries.iter().filter(|e| e.status == status).count()
    }

    /// Entries that need processing: added or changed.
    pub fn dirty(&self) -> impl Iterator<Item = &DeltaEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.status, DeltaStatus::Added | DeltaStatus::Changed))
    }

    /// Entries that disappeared.
    pub fn removed(&self) -> impl Iterator<Item = &DeltaEntry> {
        self.entries
            .iter()
            .filter(|e| e.status == DeltaStatus::Removed)
    }

    /// Where the output for `relative` lives under `output_root`.
    ///
    /// Directory roots map straight onto the output root. Each jar gets its
    /// own subdirectory so entries of different jars cannot collide.
    pub fn output_path(&self, output_root: &Path, relative: &str) -> PathBuf {
        match self.kind {
            RootKind::Directory => join_slash_path(output_root, relative),
            RootKind::Archive => {
                join_slash_path(&output_root.join(archive_dir_name(&self.root)), relative)
            }
        }
    }
}

/// Output subdirectory for a jar root: its stem plus a short path hash.
pub fn archive_dir_name(root: &Path) -> String {
    let stem = root
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    let hash = ContentHash::from_bytes(root.to_string_lossy().as_bytes()).to_string();
    format!("{stem}-{}", &hash[..8])
}

/// Compares `root` as it is now against `previous`.
///
/// With no previous state every file is [`Added`](DeltaStatus::Added). A
/// root that no longer exists yields only removals. Returns the delta and
/// the state to persist for the next invocation.
pub fn diff(
    root: &Path,
    previous: Option<&RootState>,
) -> Result<(RootDelta, RootState), DeltaError> {
    let kind = if root.is_dir() {
        RootKind::Directory
    } else if root.exists() {
        RootKind::Archive
    } else {
        previous.map_or(RootKind::Directory, |p| p.kind)
    };
    // A root that changed shape shares no signatures with its old self.
    let previous = previous.filter(|p| p.kind == kind);

    let files = if !root.exists() {
        BTreeMap::new()
    } else {
        match kind {
            RootKind::Directory => scan_directory(root, previous)?,
            RootKind::Archive => scan_archive(root, previous)?,
        }
    };
    let current = RootState { kind, files };

    let entries = match previous {
        None => current
            .files
            .keys()
            .map(|path| DeltaEntry {
                relative_path: path.clone(),
                status: DeltaStatus::Added,
            })
            .collect(),
        Some(prev) => compare(prev, &current),
    };
    for entry in &entries {
        debug!(root = %root.display(), path = %entry.relative_path, status = %entry.status, "delta");
    }

    Ok((
        RootDelta {
            root: root.to_path_buf(),
            kind,
            entries,
        },
        current,
    ))
}

fn compare(previous: &RootState, current: &RootState) -> Vec<DeltaEntry> {
    let mut paths: BTreeSet<&String> = previous.files.keys().collect();
    paths.extend(current.files.keys());
    paths
        .into_iter()
        .filter_map(|path| {
            let status = match (previous.files.get(path), current.files.get(path)) {
                (None, Some(_)) => DeltaStatus::Added,
                (Some(_), None) => DeltaStatus::Removed,
                (Some(old), Some(new)) if new.changed_since(old) => DeltaStatus::Changed,
                (Some(_), Some(_)) => DeltaStatus::Unchanged,
                (None, None) => return None,
            };
            Some(DeltaEntry {
                relative_path: path.clone(),
                status,
            })
        })
        .collect()
}

fn scan_directory(
    root: &Path,
    previous: Option<&RootState>,
) -> Result<BTreeMap<String, FileSignature>, DeltaError> {
    let mut files = BTreeMap::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            DeltaError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(relative) = entry
            .path()
            .strip_prefix(root)
            .ok()
            .and_then(to_slash_path)
        else {
            continue;
        };
        let metadata = entry
            .metadata()
            .map_err(|e| DeltaError::io(entry.path(), e.into()))?;
        let modified = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .and_then(|d| u64::try_from(d.as_nanos()).ok());

        let mut signature = FileSignature {
            size: metadata.len(),
            modified,
            crc32: None,
            content_hash: ContentHash::from_bytes(&[]),
        };
        signature.content_hash = match previous.and_then(|p| p.files.get(&relative)) {
            Some(old) if old.same_stamp(&signature) => old.content_hash,
            _ => ContentHash::from_file(entry.path()).map_err(|e| DeltaError::io(entry.path(), e))?,
        };
        files.insert(relative, signature);
    }
    Ok(files)
}

fn scan_archive(
    root: &Path,
    previous: Option<&RootState>,
) -> Result<BTreeMap<String, FileSignature>, DeltaError> {
    let archive_err = |e: zip::result::ZipError| DeltaError::Archive {
        path: root.to_path_buf(),
        reason: e.to_string(),
    };
    let file = File::open(root).map_err(|e| DeltaError::io(root, e))?;
    let mut archive = zip::ZipArchive::new(BufReader::new(file)).map_err(archive_err)?;

    let mut files = BTreeMap::new();
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(archive_err)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();
        let mut signature = FileSignature {
            size: entry.size(),
            modified: None,
            crc32: Some(entry.crc32()),
            content_hash: ContentHash::from_bytes(&[]),
        };
        signature.content_hash = match previous.and_then(|p| p.files.get(&name)) {
            Some(old) if old.same_stamp(&signature) => old.content_hash,
            _ => ContentHash::from_reader(&mut entry).map_err(|e| DeltaError::io(root, e))?,
        };
        files.insert(name, signature);
    }
    Ok(files)
}
