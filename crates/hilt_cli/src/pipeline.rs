//! Shared helpers for CLI commands: logging setup, project root and
//! configuration lookup, and the rewrite settings derived from it.

use std::path::{Path, PathBuf};

use hilt_bytecode::RewriteOptions;
use hilt_config::{resolve_variant, ProjectConfig, RootVariant, CONFIG_FILE};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::GlobalArgs;

/// Default log level for the given flags. `--verbose` wins over `--quiet`.
pub fn default_level(global: &GlobalArgs) -> &'static str {
    if global.verbose {
        "debug"
    } else if global.quiet {
        "error"
    } else {
        "info"
    }
}

/// Installs the log subscriber. `RUST_LOG` overrides the flags.
pub fn init_logging(global: &GlobalArgs) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level(global))),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Walks up from `start` looking for the nearest directory containing `hilt.toml`.
///
/// Returns the directory containing `hilt.toml`, or an error if none is found.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the project root directory from global CLI args.
///
/// If `--config` is specified, uses that path (file → parent dir, dir → itself).
/// Otherwise walks up from the current directory looking for `hilt.toml`.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(ref config_path) = global.config {
        let p = PathBuf::from(config_path);
        if p.is_file() {
            Ok(p.parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| PathBuf::from(".")))
        } else {
            Ok(p)
        }
    } else {
        find_project_root(&std::env::current_dir()?)
    }
}

/// Loads the project configuration when there is one.
///
/// An explicit `--config` must load. Without it, a missing `hilt.toml`
/// just means the defaults apply.
pub fn load_project(
    global: &GlobalArgs,
) -> Result<Option<ProjectConfig>, Box<dyn std::error::Error>> {
    let root = match resolve_project_root(global) {
        Ok(root) => root,
        Err(e) if global.config.is_none() => {
            debug!("no project configuration: {e}");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    Ok(Some(hilt_config::load_config(&root)?))
}

/// Rewrite settings and parallelism from the configuration, or defaults.
pub fn rewrite_settings(config: Option<&ProjectConfig>) -> (RewriteOptions, bool) {
    match config {
        Some(config) => (
            RewriteOptions {
                markers: config.transform.markers.clone(),
                prefix: config.transform.generated_prefix.clone(),
                ..RewriteOptions::default()
            },
            config.transform.parallel,
        ),
        None => (RewriteOptions::default(), true),
    }
}

/// Checks `variant` against the configuration when both are present.
pub fn check_variant(
    config: Option<&ProjectConfig>,
    variant: Option<&str>,
) -> Result<Option<RootVariant>, Box<dyn std::error::Error>> {
    match (config, variant) {
        (Some(config), Some(name)) => Ok(Some(resolve_variant(config, name)?)),
        _ => Ok(None),
    }
}

/// State directory used when `--state-dir` is not given: a sibling of the
/// output named `<output>.state`.
pub fn default_state_dir(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "hilt".to_string());
    output.with_file_name(format!("{name}.state"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
[project]
name = "app"
kind = "application"

[transform]
generated_prefix = "Gen_"
parallel = false

[[variants]]
name = "debug"
unit_test = true
"#;

    fn global(config: Option<&Path>) -> GlobalArgs {
        GlobalArgs {
            quiet: false,
            verbose: false,
            config: config.map(|p| p.to_str().unwrap().to_string()),
        }
    }

    #[test]
    fn level_follows_flags() {
        let mut args = global(None);
        assert_eq!(default_level(&args), "info");
        args.quiet = true;
        assert_eq!(default_level(&args), "error");
        args.verbose = true;
        assert_eq!(default_level(&args), "debug");
    }

    #[test]
    fn find_root_walks_up() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), CONFIG).unwrap();
        let nested = tmp.path().join("src/main");
        fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_project_root(&nested).unwrap(), tmp.path());
    }

    #[test]
    fn find_root_fails_without_config() {
        let tmp = TempDir::new().unwrap();
        let err = find_project_root(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("hilt.toml"));
    }

    #[test]
    fn resolve_project_root_from_config_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join(CONFIG_FILE);
        fs::write(&config_path, CONFIG).unwrap();
        let root = resolve_project_root(&global(Some(&config_path))).unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn resolve_project_root_from_config_dir() {
        let tmp = TempDir::new().unwrap();
        let root = resolve_project_root(&global(Some(tmp.path()))).unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn explicit_config_must_load() {
        let tmp = TempDir::new().unwrap();
        assert!(load_project(&global(Some(tmp.path()))).is_err());

        fs::write(tmp.path().join(CONFIG_FILE), CONFIG).unwrap();
        let config = load_project(&global(Some(tmp.path()))).unwrap().unwrap();
        assert_eq!(config.project.name, "app");
    }

    #[test]
    fn settings_come_from_config() {
        let config = hilt_config::load_config_from_str(CONFIG).unwrap();
        let (options, parallel) = rewrite_settings(Some(&config));
        assert_eq!(options.prefix, "Gen_");
        assert_eq!(options.markers.len(), 2);
        assert!(!parallel);

        let (options, parallel) = rewrite_settings(None);
        assert_eq!(options.prefix, "Hilt_");
        assert!(parallel);
    }

    #[test]
    fn variants_are_checked_only_with_config() {
        let config = hilt_config::load_config_from_str(CONFIG).unwrap();
        assert!(check_variant(Some(&config), Some("debugUnitTest"))
            .unwrap()
            .is_some());
        assert!(check_variant(Some(&config), Some("staging")).is_err());
        assert!(check_variant(None, Some("staging")).unwrap().is_none());
    }

    #[test]
    fn state_dir_is_a_sibling() {
        assert_eq!(
            default_state_dir(Path::new("build/hilt/out")),
            PathBuf::from("build/hilt/out.state")
        );
    }
}
