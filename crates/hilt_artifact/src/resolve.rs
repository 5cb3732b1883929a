//! Chain resolution over the transform graph.
//!
//! Resolution is a breadth-first search from the produced type. A type
//! satisfies the request when it equals the requested type or a
//! compatibility rule accepts it; that last hop is free. A compatibility
//! rule also lets an artifact take the outgoing edges of any type it
//! stands in for, again at no cost.
//!
//! Every shortest chain is collected. When there is more than one, the
//! disambiguation rules see the distinct types the chains end on and may
//! pick one. Anything still tied is a configuration error.

use std::collections::HashMap;
use std::fmt;

use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::visit::EdgeRef;
use tracing::debug;

use crate::error::TransformError;
use crate::registry::TransformRegistry;
use crate::types::ArtifactType;

/// One executed edge of a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainStep {
    /// Type of the artifact entering this step.
    pub from: ArtifactType,
    /// The type `from` stands in for through a compatibility rule, when the
    /// edge leaves that type rather than `from` itself.
    pub via: Option<ArtifactType>,
    /// Type produced by this step.
    pub to: ArtifactType,
    /// Executor index in the registry.
    pub transform: usize,
    /// Executor name, for descriptions.
    pub name: String,
}

/// The selected conversion from a produced type to a requested type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformChain {
    /// The artifact's native type.
    pub produced: ArtifactType,
    /// The type the consumer asked for.
    pub requested: ArtifactType,
    /// Steps in execution order. Empty when `produced` already satisfies
    /// the request.
    pub steps: Vec<ChainStep>,
}

impl TransformChain {
    /// The type the chain's output actually has.
    pub fn terminal(&self) -> &ArtifactType {
        self.steps.last().map_or(&self.produced, |s| &s.to)
    }

    /// Number of executed edges.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if no executor runs.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for TransformChain {
    /// Renders `jar -[identity]-> android-classes-jar ~> hilt-all-classes`,
    /// where `~>` marks a compatibility hop.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.produced)?;
        for step in &self.steps {
            if let Some(via) = &step.via {
                write!(f, " ~> {via}")?;
            }
            write!(f, " -[{}]-> {}", step.name, step.to)?;
        }
        if *self.terminal() != self.requested {
            write!(f, " ~> {}", self.requested)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct Pred {
    prev: NodeIndex,
    via: Option<NodeIndex>,
    edge: EdgeIndex,
}

/// Selects the unique shortest chain converting `produced` into `requested`.
///
/// # Errors
///
/// - [`TransformError::UnknownType`] if `requested` was never registered.
/// - [`TransformError::NoTransform`] if no chain exists.
/// - [`TransformError::AmbiguousChains`] if several shortest chains survive
///   disambiguation.
pub fn resolve(
    registry: &TransformRegistry,
    produced: &ArtifactType,
    requested: &ArtifactType,
) -> Result<TransformChain, TransformError> {
    if !registry.types().contains(requested) {
        return Err(TransformError::UnknownType(requested.to_string()));
    }
    if registry.satisfies(requested, produced) {
        return Ok(TransformChain {
            produced: produced.clone(),
            requested: requested.clone(),
            steps: Vec::new(),
        });
    }
    let no_transform = || TransformError::NoTransform {
        from: produced.to_string(),
        to: requested.to_string(),
    };
    let start = registry.node_of(produced).ok_or_else(no_transform)?;

    let (goal_nodes, preds) = search(registry, start, requested).ok_or_else(no_transform)?;

    let mut chains = Vec::new();
    for goal in goal_nodes {
        for steps in paths_to(registry, &preds, start, goal)? {
            chains.push(TransformChain {
                produced: produced.clone(),
                requested: requested.clone(),
                steps,
            });
        }
    }

    if chains.len() > 1 {
        let mut candidates: Vec<ArtifactType> =
            chains.iter().map(|c| c.terminal().clone()).collect();
        candidates.sort();
        candidates.dedup();
        for rule in registry.disambiguation_rules() {
            if let Some(choice) = rule.closest_match(requested, &candidates) {
                if candidates.contains(&choice) {
                    chains.retain(|c| *c.terminal() == choice);
                    break;
                }
            }
        }
    }

    if chains.len() > 1 {
        let mut described: Vec<String> = chains.iter().map(ToString::to_string).collect();
        described.sort();
        return Err(TransformError::AmbiguousChains {
            from: produced.to_string(),
            to: requested.to_string(),
            candidates: described,
        });
    }

    let chain = chains.pop().ok_or_else(no_transform)?;
    debug!(chain = %chain, "resolved transform chain");
    Ok(chain)
}

type Preds = HashMap<NodeIndex, Vec<Pred>>;

/// Layered BFS. Returns the satisfying nodes of the first layer that has
/// any, plus every predecessor link between consecutive layers.
fn search(
    registry: &TransformRegistry,
    start: NodeIndex,
    requested: &ArtifactType,
) -> Option<(Vec<NodeIndex>, Preds)> {
    let graph = registry.graph();
    let mut depth: HashMap<NodeIndex, usize> = HashMap::from([(start, 0)]);
    let mut preds: Preds = HashMap::new();
    let mut frontier = vec![start];
    let mut level = 0;

    while !frontier.is_empty() {
        let mut next = Vec::new();
        for &node in &frontier {
            for (source, via) in edge_sources(registry, node) {
                let mut edges: Vec<_> = graph.edges(source).collect();
                edges.sort_by_key(|e| e.id());
                for edge in edges {
                    let target = edge.target();
                    match depth.get(&target) {
                        Some(&d) if d != level + 1 => continue,
                        Some(_) => {}
                        None => {
                            depth.insert(target, level + 1);
                            next.push(target);
                        }
                    }
                    preds.entry(target).or_default().push(Pred {
                        prev: node,
                        via,
                        edge: edge.id(),
                    });
                }
            }
        }
        level += 1;

        let goals: Vec<NodeIndex> = next
            .iter()
            .copied()
            .filter(|&n| registry.satisfies(requested, &graph[n]))
            .collect();
        if !goals.is_empty() {
            return Some((goals, preds));
        }
        frontier = next;
    }
    None
}

/// Types whose outgoing edges an artifact of type `node` may take: its own,
/// and those of every type it is compatible with.
fn edge_sources(
    registry: &TransformRegistry,
    node: NodeIndex,
) -> Vec<(NodeIndex, Option<NodeIndex>)> {
    let graph = registry.graph();
    let mut sources = vec![(node, None)];
    for other in graph.node_indices() {
        if other != node && registry.is_compatible(&graph[other], &graph[node]) {
            sources.push((other, Some(other)));
        }
    }
    sources
}

fn paths_to(
    registry: &TransformRegistry,
    preds: &Preds,
    start: NodeIndex,
    node: NodeIndex,
) -> Result<Vec<Vec<ChainStep>>, TransformError> {
    if node == start {
        return Ok(vec![Vec::new()]);
    }
    let graph = registry.graph();
    let mut paths = Vec::new();
    for pred in preds.get(&node).map(Vec::as_slice).unwrap_or_default() {
        let transform = graph[pred.edge];
        let name = registry
            .transform(transform)
            .map(|t| t.name().to_string())
            .ok_or_else(|| {
                hilt_common::InternalError::new(format!(
                    "edge {} has no registered transform",
                    pred.edge.index()
                ))
            })?;
        for mut path in paths_to(registry, preds, start, pred.prev)? {
            path.push(ChainStep {
                from: graph[pred.prev].clone(),
                via: pred.via.map(|v| graph[v].clone()),
                to: graph[node].clone(),
                transform,
                name: name.clone(),
            });
            paths.push(path);
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{CompatiblePair, PreferCandidate};
    use crate::transforms::{ArtifactTransform, TransformContext, TransformOutputs};

    /// Executor that only carries a name; resolution never runs it.
    struct Named(&'static str);

    impl ArtifactTransform for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn transform(
            &self,
            _ctx: &TransformContext<'_>,
            _outputs: &mut TransformOutputs,
        ) -> Result<(), TransformError> {
            Ok(())
        }
    }

    fn ty(name: &str) -> ArtifactType {
        ArtifactType::new(name)
    }

    #[test]
    fn single_shortest_path_is_returned() {
        let mut registry = TransformRegistry::new();
        registry.register_transform(ArtifactType::DIRECTORY, ty("a"), Named("da"));
        registry.register_transform(ty("a"), ty("target"), Named("at"));
        registry.register_transform(ArtifactType::DIRECTORY, ty("b"), Named("db"));
        registry.register_transform(ty("b"), ty("c"), Named("bc"));
        registry.register_transform(ty("c"), ty("target"), Named("ct"));

        let chain = resolve(&registry, &ArtifactType::DIRECTORY, &ty("target")).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.to_string(), "directory -[da]-> a -[at]-> target");
    }

    #[test]
    fn equal_paths_without_rule_are_ambiguous() {
        let mut registry = TransformRegistry::new();
        registry.register_transform(ArtifactType::DIRECTORY, ty("a"), Named("da"));
        registry.register_transform(ty("a"), ty("target"), Named("at"));
        registry.register_transform(ArtifactType::DIRECTORY, ty("b"), Named("db"));
        registry.register_transform(ty("b"), ty("target"), Named("bt"));

        let err = resolve(&registry, &ArtifactType::DIRECTORY, &ty("target")).unwrap_err();
        match err {
            TransformError::AmbiguousChains {
                from,
                to,
                candidates,
            } => {
                assert_eq!(from, "directory");
                assert_eq!(to, "target");
                assert_eq!(
                    candidates,
                    vec![
                        "directory -[da]-> a -[at]-> target".to_string(),
                        "directory -[db]-> b -[bt]-> target".to_string(),
                    ]
                );
            }
            other => panic!("expected ambiguity, got {other:?}"),
        }
    }

    #[test]
    fn parallel_edges_are_ambiguous() {
        let mut registry = TransformRegistry::new();
        registry.register_transform(ArtifactType::DIRECTORY, ty("target"), Named("first"));
        registry.register_transform(ArtifactType::DIRECTORY, ty("target"), Named("second"));
        let err = resolve(&registry, &ArtifactType::DIRECTORY, &ty("target")).unwrap_err();
        assert!(err.to_string().contains("-[first]->"));
        assert!(err.to_string().contains("-[second]->"));
    }

    #[test]
    fn compatibility_shortens_one_of_two_equal_paths() {
        let mut registry = TransformRegistry::new();
        registry.register_transform(ArtifactType::DIRECTORY, ty("a"), Named("da"));
        registry.register_transform(ty("a"), ty("target"), Named("at"));
        registry.register_transform(ArtifactType::DIRECTORY, ty("b"), Named("db"));
        registry.register_transform(ty("b"), ty("target"), Named("bt"));
        registry.add_compatibility_rule(CompatiblePair::new(ty("target"), ty("b")));

        for _ in 0..3 {
            let chain = resolve(&registry, &ArtifactType::DIRECTORY, &ty("target")).unwrap();
            assert_eq!(chain.to_string(), "directory -[db]-> b ~> target");
            assert_eq!(chain.terminal(), &ty("b"));
        }
    }

    #[test]
    fn disambiguation_picks_among_terminal_types() {
        let mut registry = TransformRegistry::new();
        registry.register_transform(ArtifactType::DIRECTORY, ty("x"), Named("dx"));
        registry.register_transform(ArtifactType::DIRECTORY, ty("y"), Named("dy"));
        registry.add_compatibility_rule(CompatiblePair::new(ty("wanted"), ty("x")));
        registry.add_compatibility_rule(CompatiblePair::new(ty("wanted"), ty("y")));
        registry.register_type(ty("wanted"), crate::types::TypeInfo {
            origins: Vec::new(),
            classes_only: false,
        });

        assert!(resolve(&registry, &ArtifactType::DIRECTORY, &ty("wanted")).is_err());

        registry.add_disambiguation_rule(PreferCandidate::new(ty("wanted"), ty("y")));
        let chain = resolve(&registry, &ArtifactType::DIRECTORY, &ty("wanted")).unwrap();
        assert_eq!(chain.terminal(), &ty("y"));
    }

    #[test]
    fn missing_path_names_both_types() {
        let mut registry = TransformRegistry::new();
        registry.register_transform(ArtifactType::JAR, ty("target"), Named("jt"));
        let err = resolve(&registry, &ArtifactType::DIRECTORY, &ty("target")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "no transform found from 'directory' to 'target'"
        );
    }

    #[test]
    fn unknown_request_is_rejected() {
        let registry = TransformRegistry::new();
        let err = resolve(&registry, &ArtifactType::JAR, &ty("aar")).unwrap_err();
        assert!(matches!(err, TransformError::UnknownType(_)));
    }

    #[test]
    fn satisfied_request_needs_no_steps() {
        let registry = TransformRegistry::hilt_defaults();
        let chain = resolve(
            &registry,
            &ArtifactType::ANDROID_CLASSES_JAR,
            &ArtifactType::HILT_ALL_CLASSES,
        )
        .unwrap();
        assert!(chain.is_empty());
        assert_eq!(chain.to_string(), "android-classes-jar ~> hilt-all-classes");
    }

    #[test]
    fn defaults_jar_prefers_identity_route() {
        let registry = TransformRegistry::hilt_defaults();
        let chain =
            resolve(&registry, &ArtifactType::JAR, &ArtifactType::HILT_ALL_CLASSES).unwrap();
        assert_eq!(
            chain.to_string(),
            "jar -[identity]-> android-classes-jar ~> hilt-all-classes"
        );
    }

    #[test]
    fn defaults_directory_uses_copy_edge() {
        let registry = TransformRegistry::hilt_defaults();
        let chain = resolve(
            &registry,
            &ArtifactType::DIRECTORY,
            &ArtifactType::HILT_ALL_CLASSES,
        )
        .unwrap();
        assert_eq!(chain.to_string(), "directory -[copy]-> hilt-all-classes");
    }

    #[test]
    fn defaults_metadata_from_jar_crosses_compatibility_hop() {
        let registry = TransformRegistry::hilt_defaults();
        let chain = resolve(
            &registry,
            &ArtifactType::JAR,
            &ArtifactType::HILT_METADATA_CLASSES,
        )
        .unwrap();
        assert_eq!(
            chain.to_string(),
            "jar -[identity]-> android-classes-jar ~> hilt-all-classes \
             -[aggregated-packages]-> hilt-metadata-classes"
        );
    }

    #[test]
    fn defaults_metadata_from_directory() {
        let registry = TransformRegistry::hilt_defaults();
        let chain = resolve(
            &registry,
            &ArtifactType::DIRECTORY,
            &ArtifactType::HILT_METADATA_CLASSES,
        )
        .unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.terminal(), &ArtifactType::HILT_METADATA_CLASSES);
    }

    #[test]
    fn without_copy_edge_jar_routes_tie_and_fail() {
        // Both jar routes reach a satisfying type in one hop when directory
        // is also declared compatible.
        let mut registry = TransformRegistry::new();
        registry.register_transform(
            ArtifactType::JAR,
            ArtifactType::ANDROID_CLASSES_JAR,
            Named("identity"),
        );
        registry.register_transform(ArtifactType::JAR, ArtifactType::DIRECTORY, Named("unzip"));
        registry.register_type(ArtifactType::HILT_ALL_CLASSES, crate::types::TypeInfo {
            origins: Vec::new(),
            classes_only: true,
        });
        registry.add_compatibility_rule(CompatiblePair::new(
            ArtifactType::HILT_ALL_CLASSES,
            ArtifactType::ANDROID_CLASSES_JAR,
        ));
        registry.add_compatibility_rule(CompatiblePair::new(
            ArtifactType::HILT_ALL_CLASSES,
            ArtifactType::DIRECTORY,
        ));
        let err =
            resolve(&registry, &ArtifactType::JAR, &ArtifactType::HILT_ALL_CLASSES).unwrap_err();
        assert!(matches!(err, TransformError::AmbiguousChains { .. }));
    }
}
