//! Path predicates and copy helpers shared by the transform crates.

use std::path::{Component, Path, PathBuf};

/// Extension of compiled class files.
pub const CLASS_EXT: &str = "class";

/// Extension of class archives.
pub const JAR_EXT: &str = "jar";

/// Returns `true` if `path` is an existing regular file ending in `.class`.
pub fn is_class_file(path: &Path) -> bool {
    path.is_file() && has_extension(path, CLASS_EXT)
}

/// Returns `true` if `path` is an existing regular file ending in `.jar`.
pub fn is_jar_file(path: &Path) -> bool {
    path.is_file() && has_extension(path, JAR_EXT)
}

/// Returns `true` if an archive entry name denotes a class file.
pub fn is_class_entry(name: &str) -> bool {
    !name.ends_with('/') && name.ends_with(".class")
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext)
}

/// Renders a relative path with `/` separators regardless of platform.
///
/// Returns `None` if the path escapes its root (`..`) or is absolute.
pub fn to_slash_path(relative: &Path) -> Option<String> {
    let mut parts = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_str()?.to_string()),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(parts.join("/"))
}

/// Joins a `/`-separated relative path onto `root`.
pub fn join_slash_path(root: &Path, relative: &str) -> PathBuf {
    let mut path = root.to_path_buf();
    for part in relative.split('/').filter(|p| !p.is_empty()) {
        path.push(part);
    }
    path
}

/// Copies `from` to `to`, creating missing parent directories and
/// overwriting any existing file.
pub fn copy_file(from: &Path, to: &Path) -> std::io::Result<u64> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(from, to)
}

/// Writes `bytes` to `to`, creating missing parent directories.
pub fn write_file(to: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = to.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(to, bytes)
}

/// Removes a file if it exists. Missing files are not an error.
pub fn remove_file_if_exists(path: &Path) -> std::io::Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Deletes everything under `dir` and recreates it empty.
pub fn reset_dir(dir: &Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(dir) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e),
        _ => {}
    }
    std::fs::create_dir_all(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_entry_names() {
        assert!(is_class_entry("com/example/Foo.class"));
        assert!(!is_class_entry("com/example/"));
        assert!(!is_class_entry("META-INF/MANIFEST.MF"));
    }

    #[test]
    fn slash_path_is_platform_independent() {
        let rel: PathBuf = ["com", "example", "Foo.class"].iter().collect();
        assert_eq!(to_slash_path(&rel).as_deref(), Some("com/example/Foo.class"));
    }

    #[test]
    fn slash_path_rejects_escapes() {
        assert!(to_slash_path(Path::new("../evil.class")).is_none());
    }

    #[test]
    fn join_round_trips() {
        let root = Path::new("/out");
        let joined = join_slash_path(root, "com/example/Foo.class");
        assert_eq!(joined, root.join("com").join("example").join("Foo.class"));
    }

    #[test]
    fn copy_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        std::fs::write(&src, b"resource").unwrap();
        let dst = dir.path().join("x/y/a.txt");
        copy_file(&src, &dst).unwrap();
        assert_eq!(std::fs::read(&dst).unwrap(), b"resource");
    }

    #[test]
    fn reset_dir_clears_contents() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        write_file(&out.join("stale/Old.class"), b"old").unwrap();
        reset_dir(&out).unwrap();
        assert!(out.is_dir());
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        remove_file_if_exists(&dir.path().join("nope")).unwrap();
    }
}
