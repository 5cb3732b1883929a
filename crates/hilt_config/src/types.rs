//! Configuration types deserialized from `hilt.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};

/// Marker annotations rewritten by default, in internal form.
pub const DEFAULT_MARKERS: [&str; 2] = [
    "dagger/hilt/android/AndroidEntryPoint",
    "dagger/hilt/android/HiltAndroidApp",
];

/// Default prefix of generated entry-point base classes.
pub const DEFAULT_GENERATED_PREFIX: &str = "Hilt_";

/// Group of the Hilt runtime and compiler artifacts.
pub const LIBRARY_GROUP: &str = "com.google.dagger";

/// The top-level project configuration parsed from `hilt.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Project identity and kind.
    pub project: ProjectMeta,
    /// Hilt plugin options.
    #[serde(default)]
    pub hilt: HiltOptions,
    /// Bytecode rewrite settings.
    #[serde(default)]
    pub transform: TransformConfig,
    /// Declared build variants.
    #[serde(default)]
    pub variants: Vec<VariantConfig>,
    /// External dependencies as `group:name` or `group:name:version`.
    #[serde(default, deserialize_with = "deserialize_coordinates")]
    pub dependencies: Vec<Coordinate>,
}

/// Core project metadata required in every `hilt.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectMeta {
    /// The project name. Artifacts owned by this project are excluded from
    /// the experimental classpath aggregation view.
    pub name: String,
    /// What kind of Android project this is.
    pub kind: ProjectKind,
    /// Applied plugin ids, in application order.
    #[serde(default)]
    pub plugins: Vec<String>,
}

/// The kind of Android project, fixed once at load time.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    /// An application; components are generated in every variant.
    Application,
    /// A library; components are generated only in its test variants.
    Library,
    /// A standalone test project.
    Test,
}

impl ProjectKind {
    /// The name used in messages and plan output.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Application => "application",
            Self::Library => "library",
            Self::Test => "test",
        }
    }
}

/// Options of the `hilt { }` extension.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HiltOptions {
    /// Aggregate dependencies in a dedicated task.
    pub enable_aggregating_task: bool,
    /// Add the aggregated classpath to each root variant's compile classpath.
    pub enable_experimental_classpath_aggregation: bool,
    /// Skip the check that roots are not compiled in several modules.
    pub disable_cross_compilation_root_validation: bool,
    /// Rewrite classes used by local (JVM) tests.
    pub enable_transform_for_local_tests: bool,
}

impl Default for HiltOptions {
    fn default() -> Self {
        Self {
            enable_aggregating_task: true,
            enable_experimental_classpath_aggregation: false,
            disable_cross_compilation_root_validation: false,
            enable_transform_for_local_tests: false,
        }
    }
}

impl HiltOptions {
    /// Whether the compile classpath gets the aggregated view.
    ///
    /// The aggregating task already covers classpath aggregation, so the
    /// experimental mode only applies when the task is off.
    pub fn experimental_classpath_aggregation(&self) -> bool {
        self.enable_experimental_classpath_aggregation && !self.enable_aggregating_task
    }

    /// Whether cross-compilation root validation runs.
    pub fn cross_compilation_root_validation(&self) -> bool {
        !self.disable_cross_compilation_root_validation
    }
}

/// Bytecode rewrite settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TransformConfig {
    /// Marker annotations in internal form (`dagger/hilt/android/AndroidEntryPoint`).
    pub markers: Vec<String>,
    /// Prefix of generated base classes.
    pub generated_prefix: String,
    /// Rewrite files on a worker pool.
    pub parallel: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            markers: DEFAULT_MARKERS.iter().map(|m| m.to_string()).collect(),
            generated_prefix: DEFAULT_GENERATED_PREFIX.to_string(),
            parallel: true,
        }
    }
}

/// A declared build variant.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct VariantConfig {
    /// The variant name, e.g. `debug`.
    pub name: String,
    /// Whether the variant has a host unit-test component.
    #[serde(default)]
    pub unit_test: bool,
    /// Whether the variant has an instrumentation-test component.
    #[serde(default)]
    pub android_test: bool,
}

/// A `group:name` dependency coordinate. Versions are accepted and ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Coordinate {
    /// Maven group, e.g. `com.google.dagger`.
    pub group: String,
    /// Artifact name, e.g. `hilt-android`.
    pub name: String,
}

impl Coordinate {
    /// Parses `group:name` or `group:name:version`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split(':');
        let group = parts.next().filter(|p| !p.is_empty())?;
        let name = parts.next().filter(|p| !p.is_empty())?;
        if parts.count() > 1 {
            return None;
        }
        Some(Self {
            group: group.to_string(),
            name: name.to_string(),
        })
    }

    /// Returns `true` for `group:name`.
    pub fn is(&self, group: &str, name: &str) -> bool {
        self.group == group && self.name == name
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

/// Deserializes the dependency list, rejecting malformed coordinates.
fn deserialize_coordinates<'de, D>(deserializer: D) -> Result<Vec<Coordinate>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Coordinates;

    impl<'de> Visitor<'de> for Coordinates {
        type Value = Vec<Coordinate>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a list of \"group:name\" coordinates")
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut coordinates = Vec::new();
            while let Some(text) = seq.next_element::<String>()? {
                let coordinate = Coordinate::parse(&text).ok_or_else(|| {
                    de::Error::custom(format!("invalid dependency coordinate '{text}'"))
                })?;
                coordinates.push(coordinate);
            }
            Ok(coordinates)
        }
    }

    deserializer.deserialize_seq(Coordinates)
}
