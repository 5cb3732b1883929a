//! The class-resolution pool.
//!
//! A pool answers one question: does a class with this internal name exist
//! on the step's inputs? It is populated from every input root (directories
//! and jars, including referenced-only dependency roots) and then frozen.
//! Population finishes before any rewrite starts, and the frozen pool is
//! shared read-only across rewrite workers.

use std::path::Path;

use hilt_common::files::{is_class_entry, is_jar_file, to_slash_path, CLASS_EXT};
use hilt_common::{FrozenSymbols, SymbolTable};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::RewriteError;
use crate::name::class_name_from_entry;

/// Collects class names from input roots.
#[derive(Default)]
pub struct ClassPoolBuilder {
    symbols: SymbolTable,
}

impl ClassPoolBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds every class under a directory or inside a jar.
    ///
    /// Roots that do not exist are skipped: classpath entries for variants
    /// that compiled nothing are often absent.
    pub fn add_root(&mut self, root: &Path) -> Result<(), RewriteError> {
        let before = self.symbols.len();
        if root.is_dir() {
            self.add_directory(root)?;
        } else if is_jar_file(root) {
            self.add_jar(root)?;
        } else {
            debug!(root = %root.display(), "skipping missing or non-class root");
            return Ok(());
        }
        debug!(
            root = %root.display(),
            classes = self.symbols.len() - before,
            "added root to class pool"
        );
        Ok(())
    }

    /// Adds a single class by internal name.
    pub fn add_class(&mut self, internal_name: &str) {
        self.symbols.intern(internal_name);
    }

    /// Ends population.
    pub fn build(self) -> ClassPool {
        ClassPool {
            symbols: self.symbols.freeze(),
        }
    }

    fn add_directory(&mut self, root: &Path) -> Result<(), RewriteError> {
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                RewriteError::io(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if entry.path().extension().and_then(|e| e.to_str()) != Some(CLASS_EXT) {
                continue;
            }
            let relative = entry.path().strip_prefix(root).ok().and_then(to_slash_path);
            if let Some(name) = relative.as_deref().and_then(class_name_from_entry) {
                self.symbols.intern(name);
            }
        }
        Ok(())
    }

    fn add_jar(&mut self, jar: &Path) -> Result<(), RewriteError> {
        let file = std::fs::File::open(jar).map_err(|e| RewriteError::io(jar, e))?;
        let archive = zip::ZipArchive::new(std::io::BufReader::new(file))
            .map_err(|e| RewriteError::archive(jar, e))?;
        for entry in archive.file_names().filter(|n| is_class_entry(n)) {
            if let Some(name) = class_name_from_entry(entry) {
                self.symbols.intern(name);
            }
        }
        Ok(())
    }
}

/// Frozen, thread-safe set of known class names.
pub struct ClassPool {
    symbols: FrozenSymbols,
}

impl ClassPool {
    /// Returns `true` if a class with this internal name was found on any
    /// root.
    pub fn contains(&self, internal_name: &str) -> bool {
        self.symbols.get(internal_name).is_some()
    }

    /// Number of known classes.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` if no class was found.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
