//! `hilt resolve`: prints the transform chain between two artifact types.

use hilt_artifact::{resolve, ArtifactType, TransformChain, TransformRegistry};
use serde_json::json;

use crate::{GlobalArgs, ReportFormat, ResolveArgs};

/// Runs the `hilt resolve` command.
pub fn run(args: &ResolveArgs, _global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let registry = TransformRegistry::hilt_defaults();
    let chain = resolve(
        &registry,
        &ArtifactType::new(args.from.as_str()),
        &ArtifactType::new(args.to.as_str()),
    )?;
    match args.format {
        ReportFormat::Text => println!("{chain}"),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&chain_json(&chain))?),
    }
    Ok(0)
}

fn chain_json(chain: &TransformChain) -> serde_json::Value {
    let steps: Vec<_> = chain
        .steps
        .iter()
        .map(|step| {
            json!({
                "from": step.from.name(),
                "via": step.via.as_ref().map(|v| v.name()),
                "to": step.to.name(),
                "transform": step.name,
            })
        })
        .collect();
    json!({
        "produced": chain.produced.name(),
        "requested": chain.requested.name(),
        "terminal": chain.terminal().name(),
        "steps": steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jar_prefers_the_identity_path() {
        let registry = TransformRegistry::hilt_defaults();
        let chain = resolve(
            &registry,
            &ArtifactType::JAR,
            &ArtifactType::HILT_ALL_CLASSES,
        )
        .unwrap();
        let value = chain_json(&chain);
        assert_eq!(value["produced"], "jar");
        assert_eq!(value["terminal"], "android-classes-jar");
        assert_eq!(value["steps"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn unknown_type_is_an_error() {
        let args = ResolveArgs {
            from: "jar".to_string(),
            to: "no-such-type".to_string(),
            format: ReportFormat::Text,
        };
        let global = GlobalArgs {
            quiet: true,
            verbose: false,
            config: None,
        };
        let err = run(&args, &global).unwrap_err();
        assert!(err.to_string().contains("no-such-type"));
    }
}
