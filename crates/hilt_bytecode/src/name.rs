//! Internal class-name helpers.
//!
//! Internal names are `/`-separated (`com/example/MainActivity`); nested
//! classes keep their `$` (`com/example/Outer$Inner`).

use hilt_common::files::CLASS_EXT;

/// Default prefix of generated entry-point base classes.
pub const DEFAULT_PREFIX: &str = "Hilt_";

/// The package part of an internal name, without the trailing `/`.
/// Empty for the default package.
pub fn package(class: &str) -> &str {
    class.rsplit_once('/').map_or("", |(pkg, _)| pkg)
}

/// The simple name, including any `$`-separated outer classes.
pub fn simple_name(class: &str) -> &str {
    class.rsplit_once('/').map_or(class, |(_, simple)| simple)
}

/// The name of the base class generated for an entry point.
///
/// The generated class sits in the same package, and nested-class
/// separators become underscores: `a/Outer$Inner` → `a/Hilt_Outer_Inner`.
pub fn generated_superclass_name(class: &str, prefix: &str) -> String {
    let simple = simple_name(class).replace('$', "_");
    match package(class) {
        "" => format!("{prefix}{simple}"),
        pkg => format!("{pkg}/{prefix}{simple}"),
    }
}

/// The field descriptor of a class type: `a/B` → `La/B;`.
pub fn descriptor(class: &str) -> String {
    format!("L{class};")
}

/// The internal name of the class stored at a `/`-separated relative path
/// or archive entry name. `None` if the path is not a class file.
pub fn class_name_from_entry(entry: &str) -> Option<&str> {
    let stem = entry.strip_suffix(CLASS_EXT)?.strip_suffix('.')?;
    if stem.is_empty() || stem.ends_with('/') {
        return None;
    }
    Some(stem)
}
