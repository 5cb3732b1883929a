//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::collections::BTreeSet;
use std::path::Path;

/// Name of the configuration file inside a project directory.
pub const CONFIG_FILE: &str = "hilt.toml";

/// Loads and validates a `hilt.toml` configuration from a project directory.
///
/// Reads `<project_dir>/hilt.toml`, parses it, and validates required fields.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `hilt.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that required fields are present and configuration values are consistent.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }

    let prefix = &config.transform.generated_prefix;
    if prefix.is_empty() {
        return Err(ConfigError::MissingField(
            "transform.generated_prefix".to_string(),
        ));
    }
    if prefix.contains(['/', '.', '$', ';']) {
        return Err(ConfigError::ValidationError(format!(
            "generated prefix '{prefix}' must be a plain identifier"
        )));
    }

    for marker in &config.transform.markers {
        if marker.is_empty() || marker.contains('.') || marker.ends_with('/') {
            return Err(ConfigError::ValidationError(format!(
                "marker '{marker}' must be an internal class name such as \
                 'dagger/hilt/android/AndroidEntryPoint'"
            )));
        }
    }

    let mut names = BTreeSet::new();
    for variant in &config.variants {
        if variant.name.is_empty() {
            return Err(ConfigError::MissingField("variants.name".to_string()));
        }
        if !names.insert(variant.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "variant '{}' is declared more than once",
                variant.name
            )));
        }
    }
    Ok(())
}
