//! Parsing and validation of `hilt.toml` project configuration files.
//!
//! This crate reads the project configuration file and produces a strongly-typed
//! [`ProjectConfig`]: the project kind, the Hilt plugin options, rewrite settings,
//! declared variants, and dependency coordinates. [`root_variants`] selects the
//! variants where aggregation and rewriting run for the project's kind.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use resolve::{all_variants, resolve_variant, root_variants, RootVariant, VariantRole};
pub use types::*;
