//! The registry of artifact types, transform edges and rules.

use std::collections::HashMap;
use std::sync::Arc;

use petgraph::graph::{DiGraph, EdgeIndex, NodeIndex};

use crate::rules::{CompatibilityRule, CompatiblePair, DisambiguationRule, PreferCandidate};
use crate::transforms::{
    AggregatedPackagesTransform, ArtifactTransform, CopyTransform, IdentityTransform,
    UnzipTransform,
};
use crate::types::{ArtifactType, ArtifactTypeRegistry, NativeKind, TypeInfo};

/// Types, transform edges and rules for one build configuration.
///
/// The transform graph is a directed multigraph: several edges may share
/// the same endpoints, each backed by a different executor. The registry is
/// built once and then only read by the resolver and the chain runner.
pub struct TransformRegistry {
    types: ArtifactTypeRegistry,
    graph: DiGraph<ArtifactType, usize>,
    nodes: HashMap<ArtifactType, NodeIndex>,
    transforms: Vec<Arc<dyn ArtifactTransform>>,
    compatibility: Vec<Box<dyn CompatibilityRule>>,
    disambiguation: Vec<Box<dyn DisambiguationRule>>,
}

impl TransformRegistry {
    /// Creates a registry knowing only the native types and no transforms.
    pub fn new() -> Self {
        let mut registry = Self {
            types: ArtifactTypeRegistry::new(),
            graph: DiGraph::new(),
            nodes: HashMap::new(),
            transforms: Vec::new(),
            compatibility: Vec::new(),
            disambiguation: Vec::new(),
        };
        for ty in [ArtifactType::JAR, ArtifactType::DIRECTORY] {
            registry.node(&ty);
        }
        registry
    }

    /// The registry used by the Hilt plugin.
    ///
    /// ```text
    /// jar       -[identity]->            android-classes-jar
    /// jar       -[unzip]->               directory
    /// directory -[copy]->                hilt-all-classes
    /// hilt-all-classes -[aggregated-packages]-> hilt-metadata-classes
    /// android-classes-jar satisfies hilt-all-classes
    /// ```
    ///
    /// The `copy` edge makes the unzip route one hop longer than the
    /// identity route, so jars resolve to `hilt-all-classes` through
    /// `android-classes-jar` while directories keep a route of their own.
    pub fn hilt_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_type(ArtifactType::ANDROID_CLASSES_JAR, TypeInfo {
            origins: vec![NativeKind::Jar],
            classes_only: false,
        });
        registry.register_type(ArtifactType::HILT_ALL_CLASSES, TypeInfo {
            origins: vec![NativeKind::Jar, NativeKind::Directory],
            classes_only: true,
        });
        registry.register_type(ArtifactType::HILT_METADATA_CLASSES, TypeInfo {
            origins: vec![NativeKind::Jar, NativeKind::Directory],
            classes_only: true,
        });

        registry.register_transform(
            ArtifactType::JAR,
            ArtifactType::ANDROID_CLASSES_JAR,
            IdentityTransform,
        );
        registry.register_transform(ArtifactType::JAR, ArtifactType::DIRECTORY, UnzipTransform);
        registry.register_transform(
            ArtifactType::DIRECTORY,
            ArtifactType::HILT_ALL_CLASSES,
            CopyTransform,
        );
        registry.register_transform(
            ArtifactType::HILT_ALL_CLASSES,
            ArtifactType::HILT_METADATA_CLASSES,
            AggregatedPackagesTransform,
        );

        registry.add_compatibility_rule(CompatiblePair::new(
            ArtifactType::HILT_ALL_CLASSES,
            ArtifactType::ANDROID_CLASSES_JAR,
        ));
        registry.add_disambiguation_rule(PreferCandidate::new(
            ArtifactType::HILT_ALL_CLASSES,
            ArtifactType::ANDROID_CLASSES_JAR,
        ));
        registry
    }

    /// Registers or replaces a type.
    pub fn register_type(&mut self, ty: ArtifactType, info: TypeInfo) {
        self.node(&ty);
        self.types.register(ty, info);
    }

    /// Adds an edge `from -> to` backed by `transform`.
    ///
    /// Unknown endpoint types are registered with default [`TypeInfo`].
    pub fn register_transform(
        &mut self,
        from: ArtifactType,
        to: ArtifactType,
        transform: impl ArtifactTransform + 'static,
    ) -> EdgeIndex {
        let a = self.node(&from);
        let b = self.node(&to);
        self.transforms.push(Arc::new(transform));
        self.graph.add_edge(a, b, self.transforms.len() - 1)
    }

    /// Adds a compatibility rule. Rules are consulted in registration order.
    pub fn add_compatibility_rule(&mut self, rule: impl CompatibilityRule + 'static) {
        self.compatibility.push(Box::new(rule));
    }

    /// Adds a disambiguation rule. The first rule that picks a candidate wins.
    pub fn add_disambiguation_rule(&mut self, rule: impl DisambiguationRule + 'static) {
        self.disambiguation.push(Box::new(rule));
    }

    /// Returns `true` if an artifact of type `produced` satisfies a request
    /// for `requested`, either by equality or through a compatibility rule.
    pub fn satisfies(&self, requested: &ArtifactType, produced: &ArtifactType) -> bool {
        requested == produced || self.is_compatible(requested, produced)
    }

    /// Returns `true` if some compatibility rule accepts the pair.
    pub fn is_compatible(&self, requested: &ArtifactType, produced: &ArtifactType) -> bool {
        self.compatibility
            .iter()
            .any(|rule| rule.is_compatible(requested, produced))
    }

    /// The type registry.
    pub fn types(&self) -> &ArtifactTypeRegistry {
        &self.types
    }

    /// The transform graph. Edge weights index [`transform`](Self::transform).
    pub fn graph(&self) -> &DiGraph<ArtifactType, usize> {
        &self.graph
    }

    /// Graph node for a registered type.
    pub fn node_of(&self, ty: &ArtifactType) -> Option<NodeIndex> {
        self.nodes.get(ty).copied()
    }

    /// The executor behind an edge weight.
    pub fn transform(&self, index: usize) -> Option<&Arc<dyn ArtifactTransform>> {
        self.transforms.get(index)
    }

    /// Disambiguation rules in registration order.
    pub fn disambiguation_rules(&self) -> &[Box<dyn DisambiguationRule>] {
        &self.disambiguation
    }

    fn node(&mut self, ty: &ArtifactType) -> NodeIndex {
        if let Some(&index) = self.nodes.get(ty) {
            return index;
        }
        if !self.types.contains(ty) {
            self.types.register(ty.clone(), TypeInfo {
                origins: Vec::new(),
                classes_only: false,
            });
        }
        let index = self.graph.add_node(ty.clone());
        self.nodes.insert(ty.clone(), index);
        index
    }
}

impl Default for TransformRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("types", &self.graph.node_count())
            .field("transforms", &self.transforms.len())
            .field("compatibility_rules", &self.compatibility.len())
            .field("disambiguation_rules", &self.disambiguation.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_register_every_type() {
        let registry = TransformRegistry::hilt_defaults();
        for ty in [
            ArtifactType::JAR,
            ArtifactType::DIRECTORY,
            ArtifactType::ANDROID_CLASSES_JAR,
            ArtifactType::HILT_ALL_CLASSES,
            ArtifactType::HILT_METADATA_CLASSES,
        ] {
            assert!(registry.node_of(&ty).is_some(), "{ty} missing");
        }
        assert_eq!(registry.graph().edge_count(), 4);
        assert!(registry.types().is_classes_only(&ArtifactType::HILT_ALL_CLASSES));
        assert!(!registry.types().is_classes_only(&ArtifactType::ANDROID_CLASSES_JAR));
    }

    #[test]
    fn directory_is_not_compatible_with_all_classes() {
        let registry = TransformRegistry::hilt_defaults();
        assert!(registry.satisfies(
            &ArtifactType::HILT_ALL_CLASSES,
            &ArtifactType::ANDROID_CLASSES_JAR
        ));
        assert!(!registry.satisfies(&ArtifactType::HILT_ALL_CLASSES, &ArtifactType::DIRECTORY));
    }

    #[test]
    fn parallel_edges_are_kept() {
        let mut registry = TransformRegistry::new();
        let target = ArtifactType::new("target");
        registry.register_transform(ArtifactType::DIRECTORY, target.clone(), CopyTransform);
        registry.register_transform(ArtifactType::DIRECTORY, target.clone(), CopyTransform);
        assert_eq!(registry.graph().edge_count(), 2);
        assert!(registry.types().contains(&target));
    }
}
