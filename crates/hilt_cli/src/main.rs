//! Hilt CLI: drives the Hilt build-time transforms outside a build tool.
//!
//! Provides `hilt resolve` to inspect transform chains, `hilt aggregate` to
//! build an aggregated classpath, `hilt transform` and `hilt transform-tests`
//! for the entry-point rewrite, and `hilt plan` to show what the plugin
//! configures for a project.

#![warn(missing_docs)]

mod aggregate;
mod pipeline;
mod plan;
mod resolve;
mod transform;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};

/// Hilt: build-time transforms for Hilt entry points.
#[derive(Parser, Debug)]
#[command(name = "hilt", version, about = "Hilt build-time transforms")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `hilt.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the transform chain between two artifact types.
    Resolve(ResolveArgs),
    /// Convert artifacts to one type and print the aggregated classpath.
    Aggregate(AggregateArgs),
    /// Run the incremental entry-point rewrite.
    Transform(TransformArgs),
    /// Rewrite the entry points of a local-test classpath.
    TransformTests(TransformTestsArgs),
    /// Show the root variants and steps configured for the project.
    Plan(PlanArgs),
}

/// Arguments for the `hilt resolve` subcommand.
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// The produced artifact type, e.g. `jar`.
    pub from: String,

    /// The requested artifact type, e.g. `hilt-all-classes`.
    pub to: String,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `hilt aggregate` subcommand.
#[derive(Parser, Debug)]
pub struct AggregateArgs {
    /// Dependency artifacts (jars or class directories).
    pub artifacts: Vec<PathBuf>,

    /// Artifacts owned by the project itself.
    #[arg(long = "project-artifact")]
    pub project_artifacts: Vec<PathBuf>,

    /// The artifact type to convert everything to.
    #[arg(long = "type", default_value = "hilt-all-classes")]
    pub requested: String,

    /// Leave the project's own artifacts out of the view.
    #[arg(long)]
    pub exclude_project: bool,

    /// Directory holding transform outputs.
    #[arg(long, default_value = "build/hilt/transforms")]
    pub work_dir: PathBuf,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `hilt transform` subcommand.
#[derive(Parser, Debug)]
pub struct TransformArgs {
    /// Roots whose classes are rewritten into the output.
    #[arg(long = "input", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Roots only used to find generated superclasses.
    #[arg(long = "referenced")]
    pub referenced: Vec<PathBuf>,

    /// Output directory.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Directory for incremental state (default: next to the output).
    #[arg(long)]
    pub state_dir: Option<PathBuf>,

    /// Variant being transformed, checked against `hilt.toml`.
    #[arg(long)]
    pub variant: Option<String>,

    /// Ignore previous state and rebuild every output.
    #[arg(long)]
    pub clean: bool,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Arguments for the `hilt transform-tests` subcommand.
#[derive(Parser, Debug)]
pub struct TransformTestsArgs {
    /// Test runtime classpath, in classpath order.
    #[arg(long = "classpath", required = true)]
    pub classpath: Vec<PathBuf>,

    /// Output directory; cleared on every run.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Unit-test variant, checked against `hilt.toml`.
    #[arg(long)]
    pub variant: Option<String>,
}

/// Arguments for the `hilt plan` subcommand.
#[derive(Parser, Debug)]
pub struct PlanArgs {
    /// Output format.
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print verbose/debug information.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };
    pipeline::init_logging(&global);

    let result = match cli.command {
        Command::Resolve(ref args) => resolve::run(args, &global),
        Command::Aggregate(ref args) => aggregate::run(args, &global),
        Command::Transform(ref args) => transform::run(args, &global),
        Command::TransformTests(ref args) => transform::run_tests(args, &global),
        Command::Plan(ref args) => plan::run(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}
