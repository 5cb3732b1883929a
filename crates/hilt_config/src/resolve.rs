//! Variant resolution: which variants are Hilt roots for a project kind.
//!
//! A root variant is one where dependencies are aggregated and components
//! are generated. Every variant, root or not, still has its entry points
//! rewritten (see [`all_variants`]).

use crate::error::ConfigError;
use crate::types::{ProjectConfig, ProjectKind, VariantConfig};

/// What a variant component is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantRole {
    /// A main variant (`debug`, `release`).
    Main,
    /// Host unit tests of a main variant.
    UnitTest,
    /// Instrumentation tests of a main variant.
    AndroidTest,
}

impl VariantRole {
    /// Returns `true` for test components.
    pub fn is_test(self) -> bool {
        !matches!(self, Self::Main)
    }
}

/// A resolved variant component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootVariant {
    /// Component name, e.g. `debugUnitTest`.
    pub name: String,
    /// What the component is.
    pub role: VariantRole,
    /// The main variant under test, for test components.
    pub tested: Option<String>,
}

impl RootVariant {
    fn main(variant: &VariantConfig) -> Self {
        Self {
            name: variant.name.clone(),
            role: VariantRole::Main,
            tested: None,
        }
    }

    fn test(variant: &VariantConfig, role: VariantRole) -> Self {
        let suffix = match role {
            VariantRole::UnitTest => "UnitTest",
            VariantRole::AndroidTest => "AndroidTest",
            VariantRole::Main => "",
        };
        Self {
            name: format!("{}{suffix}", variant.name),
            role,
            tested: Some(variant.name.clone()),
        }
    }
}

impl ProjectKind {
    /// Selects the root variants among `variants`.
    ///
    /// Applications generate components everywhere. Libraries only generate
    /// them in their tests, and test projects only have main variants.
    pub fn root_variants(self, variants: &[VariantConfig]) -> Vec<RootVariant> {
        match self {
            Self::Application => with_tests(variants, true),
            Self::Library => with_tests(variants, false),
            Self::Test => variants.iter().map(RootVariant::main).collect(),
        }
    }
}

fn with_tests(variants: &[VariantConfig], include_main: bool) -> Vec<RootVariant> {
    let mut out = Vec::new();
    for variant in variants {
        if include_main {
            out.push(RootVariant::main(variant));
        }
        if variant.unit_test {
            out.push(RootVariant::test(variant, VariantRole::UnitTest));
        }
        if variant.android_test {
            out.push(RootVariant::test(variant, VariantRole::AndroidTest));
        }
    }
    out
}

/// Root variants of the configured project.
pub fn root_variants(config: &ProjectConfig) -> Vec<RootVariant> {
    config.project.kind.root_variants(&config.variants)
}

/// Every variant component, tests included, regardless of project kind.
pub fn all_variants(config: &ProjectConfig) -> Vec<RootVariant> {
    with_tests(&config.variants, true)
}

/// Looks up one variant component by name among [`all_variants`].
pub fn resolve_variant(config: &ProjectConfig, name: &str) -> Result<RootVariant, ConfigError> {
    all_variants(config)
        .into_iter()
        .find(|v| v.name == name)
        .ok_or_else(|| ConfigError::UnknownVariant(name.to_string()))
}
