//! `hilt plan`: applies the plugin to the project and prints what it set up.

use hilt_bytecode::RewriteMode;
use hilt_config::load_config;
use hilt_plugin::{HiltPlugin, PluginConfiguration};
use serde_json::json;

use crate::pipeline::resolve_project_root;
use crate::{GlobalArgs, PlanArgs, ReportFormat};

/// Runs the `hilt plan` command.
///
/// Fails like plugin application would: on a project without an Android
/// plugin or without the Hilt dependencies.
pub fn run(args: &PlanArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let project_dir = resolve_project_root(global)?;
    let plugin = HiltPlugin::new(load_config(&project_dir)?);
    let configuration = plugin.apply()?;

    match args.format {
        ReportFormat::Text => print!("{}", render_text(&plugin, configuration)),
        ReportFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&render_json(&plugin, configuration))?
        ),
    }
    Ok(0)
}

fn mode_name(mode: RewriteMode) -> &'static str {
    match mode {
        RewriteMode::CopyThrough => "copy-through",
        RewriteMode::EmitOnlyRewritten => "emit-only",
    }
}

fn render_text(plugin: &HiltPlugin, configuration: &PluginConfiguration) -> String {
    let project = &plugin.config().project;
    let mut out = format!("{} ({})\n", project.name, project.kind.as_str());
    for plan in &configuration.root_plans {
        let marker = if plan.test_environment { " [test]" } else { "" };
        out.push_str(&format!("  root {}{marker}\n", plan.variant.name));
        for view in &plan.views {
            out.push_str(&format!(
                "    {} <- {} from {}\n",
                view.name,
                view.requested,
                view.configurations.join(", ")
            ));
        }
    }
    for rewrite in &configuration.rewrite_plans {
        out.push_str(&format!(
            "  rewrite {}: {} ({})\n",
            rewrite.variant,
            rewrite.task_name,
            mode_name(rewrite.options.mode)
        ));
    }
    out
}

fn render_json(plugin: &HiltPlugin, configuration: &PluginConfiguration) -> serde_json::Value {
    let project = &plugin.config().project;
    let roots: Vec<_> = configuration
        .root_plans
        .iter()
        .map(|plan| {
            let views: Vec<_> = plan
                .views
                .iter()
                .map(|view| {
                    json!({
                        "name": view.name,
                        "requested": view.requested.name(),
                        "configurations": view.configurations,
                    })
                })
                .collect();
            json!({
                "variant": plan.variant.name,
                "tested": plan.variant.tested,
                "test_environment": plan.test_environment,
                "views": views,
            })
        })
        .collect();
    let rewrites: Vec<_> = configuration
        .rewrite_plans
        .iter()
        .map(|rewrite| {
            json!({
                "variant": rewrite.variant,
                "task": rewrite.task_name,
                "mode": mode_name(rewrite.options.mode),
            })
        })
        .collect();
    json!({
        "project": project.name,
        "kind": project.kind.as_str(),
        "roots": roots,
        "rewrites": rewrites,
    })
}
