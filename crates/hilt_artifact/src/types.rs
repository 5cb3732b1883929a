//! Artifact type tags and the registry of known types.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::TransformError;

/// An immutable tag naming the shape of an artifact.
///
/// Types are compared by name only; two tags with the same name are the
/// same type no matter where they were created.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactType(Cow<'static, str>);

impl ArtifactType {
    /// A raw class archive.
    pub const JAR: ArtifactType = ArtifactType::from_static("jar");
    /// A raw directory of compiled output.
    pub const DIRECTORY: ArtifactType = ArtifactType::from_static("directory");
    /// The normalized archive type Android consumers request.
    pub const ANDROID_CLASSES_JAR: ArtifactType = ArtifactType::from_static("android-classes-jar");
    /// Every class of a dependency, normalized for aggregation.
    pub const HILT_ALL_CLASSES: ArtifactType = ArtifactType::from_static("hilt-all-classes");
    /// Only the aggregated-metadata classes of a dependency.
    pub const HILT_METADATA_CLASSES: ArtifactType =
        ArtifactType::from_static("hilt-metadata-classes");

    /// Creates a type tag from a static name.
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Creates a type tag from an owned name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// The type's name.
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ArtifactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArtifactType({})", self.0)
    }
}

impl From<&str> for ArtifactType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// The raw on-disk form an artifact is produced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeKind {
    /// A directory tree of class files and resources.
    Directory,
    /// A `.jar` archive.
    Jar,
}

impl NativeKind {
    /// Infers the native kind of an existing path.
    pub fn of(path: &Path) -> Result<Self, TransformError> {
        if path.is_dir() {
            Ok(Self::Directory)
        } else if hilt_common::files::is_jar_file(path) {
            Ok(Self::Jar)
        } else {
            Err(TransformError::UnknownNativeType(path.to_path_buf()))
        }
    }

    /// The artifact type an artifact of this kind starts out as.
    pub fn artifact_type(self) -> ArtifactType {
        match self {
            Self::Directory => ArtifactType::DIRECTORY,
            Self::Jar => ArtifactType::JAR,
        }
    }
}

/// What the registry knows about one artifact type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeInfo {
    /// Native types this one can originate from. Empty for native types.
    pub origins: Vec<NativeKind>,
    /// Consumers of this type only read class files, so resources may be
    /// dropped when producing it.
    pub classes_only: bool,
}

/// Named artifact types and the native types they originate from.
#[derive(Debug, Clone, Default)]
pub struct ArtifactTypeRegistry {
    types: BTreeMap<ArtifactType, TypeInfo>,
}

impl ArtifactTypeRegistry {
    /// Creates a registry holding only the two native types.
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register(ArtifactType::JAR, TypeInfo {
            origins: Vec::new(),
            classes_only: false,
        });
        registry.register(ArtifactType::DIRECTORY, TypeInfo {
            origins: Vec::new(),
            classes_only: false,
        });
        registry
    }

    /// Registers or replaces a type.
    pub fn register(&mut self, ty: ArtifactType, info: TypeInfo) {
        self.types.insert(ty, info);
    }

    /// Looks up a type.
    pub fn get(&self, ty: &ArtifactType) -> Option<&TypeInfo> {
        self.types.get(ty)
    }

    /// Returns `true` if the type is registered.
    pub fn contains(&self, ty: &ArtifactType) -> bool {
        self.types.contains_key(ty)
    }

    /// Returns `true` if consumers of `ty` only need class files.
    pub fn is_classes_only(&self, ty: &ArtifactType) -> bool {
        self.types.get(ty).is_some_and(|info| info.classes_only)
    }

    /// All registered types in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&ArtifactType, &TypeInfo)> {
        self.types.iter()
    }
}
