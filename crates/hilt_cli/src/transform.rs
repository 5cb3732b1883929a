//! `hilt transform` and `hilt transform-tests`: the entry-point rewrite.

use hilt_config::VariantRole;
use hilt_plugin::plugin::capitalize;
use hilt_plugin::{EntryPointInputs, EntryPointStep, StepReport, TestClassesStep};
use serde_json::json;

use crate::pipeline::{check_variant, default_state_dir, load_project, rewrite_settings};
use crate::{GlobalArgs, ReportFormat, TransformArgs, TransformTestsArgs};

/// Runs the `hilt transform` command.
///
/// Incremental unless `--clean` is given or the previous state does not
/// match the current settings.
pub fn run(args: &TransformArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_project(global)?;
    check_variant(config.as_ref(), args.variant.as_deref())?;
    let (options, parallel) = rewrite_settings(config.as_ref());

    let task_name = args.variant.as_deref().map_or_else(
        || EntryPointStep::NAME.to_string(),
        |v| format!("transform{}ClassesWithAsm", capitalize(v)),
    );
    let step = EntryPointStep::new(options)
        .with_task_name(task_name)
        .with_parallel(parallel);
    let inputs = EntryPointInputs {
        inputs: args.inputs.clone(),
        referenced: args.referenced.clone(),
    };
    let state_dir = args
        .state_dir
        .clone()
        .unwrap_or_else(|| default_state_dir(&args.output));

    let report = if args.clean {
        step.run_clean(&inputs, &args.output, &state_dir)?
    } else {
        step.run(&inputs, &args.output, &state_dir)?
    };

    match args.format {
        ReportFormat::Text => {
            if !global.quiet {
                eprintln!("{}", summary(&report));
            }
        }
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report_json(&report))?),
    }
    Ok(0)
}

/// Runs the `hilt transform-tests` command.
pub fn run_tests(
    args: &TransformTestsArgs,
    global: &GlobalArgs,
) -> Result<i32, Box<dyn std::error::Error>> {
    let config = load_project(global)?;
    if let Some(variant) = check_variant(config.as_ref(), args.variant.as_deref())? {
        if variant.role != VariantRole::UnitTest {
            return Err(format!("'{}' is not a unit-test variant", variant.name).into());
        }
    }
    let (options, _) = rewrite_settings(config.as_ref());
    let task_name = format!(
        "hiltTransformForJUnit{}",
        capitalize(args.variant.as_deref().unwrap_or_default())
    );

    let written = TestClassesStep::new(options, task_name).run(&args.classpath, &args.output)?;
    if !global.quiet {
        eprintln!(
            "   Rewrote {written} test class(es) into {}",
            args.output.display()
        );
    }
    Ok(0)
}

fn summary(report: &StepReport) -> String {
    let mode = if report.incremental {
        "incremental"
    } else {
        "clean"
    };
    format!(
        "   Transformed ({mode}): {} rewritten, {} copied, {} jar(s) copied, {} removed",
        report.rewritten, report.copied, report.jars_copied, report.removed
    )
}

fn report_json(report: &StepReport) -> serde_json::Value {
    json!({
        "incremental": report.incremental,
        "rewritten": report.rewritten,
        "copied": report.copied,
        "dropped": report.dropped,
        "removed": report.removed,
        "jars_copied": report.jars_copied,
    })
}
