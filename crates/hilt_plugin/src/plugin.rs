//! Plugin application: the configure-once latch, dependency verification,
//! and the per-variant plans derived from `hilt.toml`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

use hilt_artifact::{ArtifactType, TransformRegistry};
use hilt_bytecode::{RewriteMode, RewriteOptions};
use hilt_common::InternalError;
use hilt_config::{
    all_variants, root_variants, Coordinate, ProjectConfig, ProjectKind, RootVariant,
    VariantRole, LIBRARY_GROUP,
};
use tracing::{debug, info};

use crate::aggregate::{AggregationView, ComponentFilter};
use crate::error::PluginError;

/// Plugin id every Android plugin applies.
pub const ANDROID_BASE_PLUGIN: &str = "com.android.base";

/// Android plugins that imply [`ANDROID_BASE_PLUGIN`].
pub const ANDROID_PLUGIN_IDS: [&str; 4] = [
    "com.android.application",
    "com.android.library",
    "com.android.test",
    "com.android.dynamic-feature",
];

/// Returns `true` if applying `id` makes the project an Android project.
pub fn is_android_plugin(id: &str) -> bool {
    id == ANDROID_BASE_PLUGIN || ANDROID_PLUGIN_IDS.contains(&id)
}

/// The Hilt plugin applied to one project.
///
/// Configuration runs at most once, on whichever Android plugin shows up
/// first. Evaluation then fails if none did.
pub struct HiltPlugin {
    config: ProjectConfig,
    configured: AtomicBool,
    configuration: OnceLock<PluginConfiguration>,
}

impl HiltPlugin {
    /// Creates the plugin for a loaded project configuration.
    pub fn new(config: ProjectConfig) -> Self {
        Self {
            config,
            configured: AtomicBool::new(false),
            configuration: OnceLock::new(),
        }
    }

    /// The project configuration.
    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    /// Applies the plugin: replays the project's plugin ids, then runs the
    /// after-evaluation checks.
    pub fn apply(&self) -> Result<&PluginConfiguration, PluginError> {
        for id in &self.config.project.plugins {
            self.plugin_applied(id);
        }
        self.after_evaluate()
    }

    /// Notifies the plugin that another plugin was applied. Returns `true`
    /// if this call configured the project.
    pub fn plugin_applied(&self, id: &str) -> bool {
        if !is_android_plugin(id) {
            return false;
        }
        if self
            .configured
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(plugin = id, "already configured");
            return false;
        }
        info!(project = %self.config.project.name, trigger = id, "configuring Hilt");
        self.configuration
            .get_or_init(|| PluginConfiguration::build(&self.config));
        true
    }

    /// Checks that the project was configured and has the Hilt dependencies.
    pub fn after_evaluate(&self) -> Result<&PluginConfiguration, PluginError> {
        if !self.configured.load(Ordering::Acquire) {
            return Err(PluginError::NotAndroidProject);
        }
        verify_dependencies(&self.config.dependencies)?;
        self.configuration()
            .ok_or_else(|| InternalError::new("configured latch set without a configuration").into())
    }

    /// The configuration, once the latch has fired.
    pub fn configuration(&self) -> Option<&PluginConfiguration> {
        self.configuration.get()
    }
}

/// Requires the Hilt runtime and one of the Hilt annotation processors.
pub fn verify_dependencies(dependencies: &[Coordinate]) -> Result<(), PluginError> {
    let has = |name: &str| dependencies.iter().any(|d| d.is(LIBRARY_GROUP, name));
    if !has("hilt-android") {
        return Err(PluginError::MissingDependency {
            coordinate: format!("{LIBRARY_GROUP}:hilt-android"),
        });
    }
    if !has("hilt-android-compiler") && !has("hilt-compiler") {
        return Err(PluginError::MissingDependency {
            coordinate: format!("{LIBRARY_GROUP}:hilt-compiler"),
        });
    }
    Ok(())
}

/// Everything the plugin derives from the project at configuration time.
pub struct PluginConfiguration {
    /// Artifact types, transforms and rules.
    pub registry: TransformRegistry,
    /// Root variants with their aggregation views.
    pub root_plans: Vec<VariantPlan>,
    /// Entry-point rewrite of every variant.
    pub rewrite_plans: Vec<RewritePlan>,
}

impl PluginConfiguration {
    /// Builds the configuration of `config`.
    pub fn build(config: &ProjectConfig) -> Self {
        let root_plans = root_variants(config)
            .into_iter()
            .map(|variant| VariantPlan::new(config, variant))
            .collect();
        Self {
            registry: TransformRegistry::hilt_defaults(),
            root_plans,
            rewrite_plans: rewrite_plans(config),
        }
    }

    /// The plan of a root variant.
    pub fn root_plan(&self, variant: &str) -> Option<&VariantPlan> {
        self.root_plans.iter().find(|p| p.variant.name == variant)
    }
}

/// How one root variant aggregates its dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantPlan {
    /// The root variant.
    pub variant: RootVariant,
    /// Whether components are generated for a test environment.
    pub test_environment: bool,
    /// Views, in the order their consumers run.
    pub views: Vec<AggregationView>,
}

impl VariantPlan {
    fn new(config: &ProjectConfig, variant: RootVariant) -> Self {
        let options = &config.hilt;
        let cap = capitalize(&variant.name);
        let mut views = Vec::new();

        if options.experimental_classpath_aggregation() {
            // The tested variant's runtime classpath still has the tested
            // dependencies; the test variant's own does not.
            let runtime = variant.tested.as_deref().unwrap_or(&variant.name);
            views.push(AggregationView {
                name: format!("{}CompileOnly", variant.name),
                requested: ArtifactType::HILT_ALL_CLASSES,
                filter: ComponentFilter::ExcludeProject(config.project.name.clone()),
                configurations: vec![runtime_configuration(runtime)],
            });
        }

        if options.enable_aggregating_task {
            let mut configurations = Vec::new();
            if let Some(tested) = &variant.tested {
                configurations.push(runtime_configuration(tested));
                configurations.push(compile_configuration(tested));
            }
            configurations.push(runtime_configuration(&variant.name));
            configurations.push(compile_configuration(&variant.name));
            configurations.push(format!("hiltCompileOnly{cap}"));

            views.push(AggregationView {
                name: format!("hiltAggregateDeps{cap}"),
                requested: ArtifactType::HILT_METADATA_CLASSES,
                filter: ComponentFilter::All,
                configurations: configurations.clone(),
            });
            views.push(AggregationView {
                name: format!("hiltJavaCompile{cap}"),
                requested: ArtifactType::HILT_ALL_CLASSES,
                filter: ComponentFilter::All,
                configurations,
            });
        }

        let test_environment = config.project.kind == ProjectKind::Test || variant.tested.is_some();
        Self {
            variant,
            test_environment,
            views,
        }
    }

    /// Looks up a view by consumer name.
    pub fn view(&self, name: &str) -> Option<&AggregationView> {
        self.views.iter().find(|v| v.name == name)
    }
}

/// One entry-point rewrite a variant runs.
#[derive(Debug, Clone)]
pub struct RewritePlan {
    /// The variant component.
    pub variant: String,
    /// Task name used in logs.
    pub task_name: String,
    /// Rewrite settings; the mode tells which step runs it.
    pub options: RewriteOptions,
}

fn rewrite_plans(config: &ProjectConfig) -> Vec<RewritePlan> {
    let base = RewriteOptions {
        markers: config.transform.markers.clone(),
        prefix: config.transform.generated_prefix.clone(),
        mode: RewriteMode::CopyThrough,
    };
    let mut plans = Vec::new();
    for variant in all_variants(config) {
        let cap = capitalize(&variant.name);
        plans.push(RewritePlan {
            variant: variant.name.clone(),
            task_name: format!("transform{cap}ClassesWithAsm"),
            options: base.clone(),
        });
        if variant.role == VariantRole::UnitTest && config.hilt.enable_transform_for_local_tests {
            plans.push(RewritePlan {
                variant: variant.name.clone(),
                task_name: format!("hiltTransformForJUnit{cap}"),
                options: base.clone().with_mode(RewriteMode::EmitOnlyRewritten),
            });
        }
    }
    plans
}

fn runtime_configuration(variant: &str) -> String {
    format!("{variant}RuntimeClasspath")
}

fn compile_configuration(variant: &str) -> String {
    format!("{variant}CompileClasspath")
}

/// Upper-cases the first character: `debugUnitTest` → `DebugUnitTest`.
pub fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
