//! Persisted per-file signatures from the previous invocation.
//!
//! The state is stored as `delta-state.json` in the step's state directory.
//! It records one signature per tracked file, keyed by root and by the
//! file's `/`-separated path relative to that root.

use std::collections::BTreeMap;
use std::path::Path;

use hilt_common::ContentHash;
use serde::{Deserialize, Serialize};

use crate::error::DeltaError;

/// Name of the state file within the state directory.
const STATE_FILE: &str = "delta-state.json";

/// Signatures of every root tracked by one step.
///
/// A state written under a different fingerprint (tool version or rewrite
/// options) is treated as absent, which makes the next run a clean one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeltaState {
    /// Tool version and options that produced this state.
    pub fingerprint: String,

    /// Per-root state, keyed by the root's path.
    pub roots: BTreeMap<String, RootState>,
}

/// Whether a root is a directory tree or a jar's entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RootKind {
    /// A directory; files are tracked by relative path.
    Directory,
    /// A jar; entries are tracked by entry name.
    Archive,
}

/// Signatures of every file under one root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootState {
    /// The root's shape.
    pub kind: RootKind,

    /// Signature per relative path, in lexical order.
    pub files: BTreeMap<String, FileSignature>,
}

impl RootState {
    /// An empty state of the given kind.
    pub fn empty(kind: RootKind) -> Self {
        Self {
            kind,
            files: BTreeMap::new(),
        }
    }
}

/// What is remembered about one file.
///
/// `size` and `modified` (directory files) or `size` and `crc32` (archive
/// entries) are the stamp. A different stamp means the file changed; the
/// content is only rehashed then, and decides alone when no timestamp is
/// known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSignature {
    /// Length in bytes.
    pub size: u64,

    /// Modification time in nanoseconds since the epoch, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<u64>,

    /// CRC-32 from the archive directory, for jar entries.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crc32: Option<u32>,

    /// Hash of the content.
    pub content_hash: ContentHash,
}

impl FileSignature {
    /// Returns `true` if the cheap metadata matches, meaning the content
    /// need not be read again.
    pub fn same_stamp(&self, other: &FileSignature) -> bool {
        if self.size != other.size {
            return false;
        }
        match (self.crc32, other.crc32) {
            (Some(a), Some(b)) => return a == b,
            (None, None) => {}
            _ => return false,
        }
        matches!((self.modified, other.modified), (Some(a), Some(b)) if a == b)
    }

    /// Returns `true` if the file differs from `previous` in size,
    /// timestamp, archive CRC or, without a timestamp on either side,
    /// content.
    pub fn changed_since(&self, previous: &FileSignature) -> bool {
        if self.same_stamp(previous) {
            return self.content_hash != previous.content_hash;
        }
        let stamped = self.crc32.is_some()
            || previous.crc32.is_some()
            || (self.modified.is_some() && previous.modified.is_some());
        stamped || self.content_hash != previous.content_hash
    }
}

impl DeltaState {
    /// Creates an empty state for the given fingerprint.
    pub fn new(fingerprint: &str) -> Self {
        Self {
            fingerprint: fingerprint.to_string(),
            roots: BTreeMap::new(),
        }
    }

    /// Loads the state from the state directory, returning `None` if the
    /// file does not exist or cannot be parsed.
    pub fn load(state_dir: &Path) -> Option<Self> {
        let path = state_dir.join(STATE_FILE);
        let content = std::fs::read_to_string(&path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Saves the state to the state directory, creating it if needed.
    pub fn save(&self, state_dir: &Path) -> Result<(), DeltaError> {
        std::fs::create_dir_all(state_dir).map_err(|e| DeltaError::io(state_dir, e))?;
        let path = state_dir.join(STATE_FILE);
        let json = serde_json::to_string_pretty(self).map_err(|e| DeltaError::Serialization {
            reason: e.to_string(),
        })?;
        std::fs::write(&path, json).map_err(|e| DeltaError::io(path, e))
    }

    /// Deletes the state file. A later load returns `None`.
    pub fn discard(state_dir: &Path) -> Result<(), DeltaError> {
        let path = state_dir.join(STATE_FILE);
        hilt_common::files::remove_file_if_exists(&path).map_err(|e| DeltaError::io(path, e))
    }

    /// Returns `true` if this state was written under `fingerprint`.
    pub fn is_compatible(&self, fingerprint: &str) -> bool {
        self.fingerprint == fingerprint
    }
}
