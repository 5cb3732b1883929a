//! Typed artifact transform graph.
//!
//! Build artifacts (class directories and jars) carry an [`ArtifactType`].
//! A consumer asks for a type; the [`TransformRegistry`] knows the
//! point-to-point [`ArtifactTransform`]s plus the compatibility and
//! disambiguation rules, and [`resolve`] picks exactly one chain of
//! transforms for every artifact or fails with a configuration error.
//! The [`ChainRunner`] then executes the chain on disk.

#![warn(missing_docs)]

pub mod error;
pub mod registry;
pub mod resolve;
pub mod rules;
pub mod runner;
pub mod transforms;
pub mod types;

pub use error::TransformError;
pub use registry::TransformRegistry;
pub use resolve::{resolve, ChainStep, TransformChain};
pub use rules::{CompatibilityRule, CompatiblePair, DisambiguationRule, PreferCandidate};
pub use runner::{Artifact, ChainRunner, ComponentId};
pub use transforms::{ArtifactTransform, TransformContext, TransformOutputs};
pub use types::{ArtifactType, ArtifactTypeRegistry, NativeKind, TypeInfo};
