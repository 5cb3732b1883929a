//! Hilt build steps.
//!
//! - [`aggregate`]: classpath aggregation views over upstream artifacts.
//! - [`entry_point`]: the incremental copy-through entry-point rewrite.
//! - [`test_classes`]: the emit-only rewrite of a local-test classpath.
//! - [`plugin`]: plugin application, dependency checks and variant plans.

#![warn(missing_docs)]

pub mod aggregate;
pub mod entry_point;
pub mod error;
pub mod plugin;
pub mod test_classes;

pub use aggregate::{aggregate, resolve_view, AggregationView, ComponentFilter, ResolvedArtifact};
pub use entry_point::{EntryPointInputs, EntryPointStep, StepReport};
pub use error::PluginError;
pub use plugin::{
    is_android_plugin, verify_dependencies, HiltPlugin, PluginConfiguration, RewritePlan,
    VariantPlan,
};
pub use test_classes::TestClassesStep;
