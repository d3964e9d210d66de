//! Partial graph materialisation.
//!
//! A [`PartialGraph`] pairs a root target set with the
//! [`ActionGraph`](crate::rules::ActionGraph) reachable from it. The closure
//! traversal visits each target at most once; cycle safety comes from
//! [`TargetGraph`](crate::graph::TargetGraph) construction, which rejects
//! cyclic projects outright.

use std::collections::VecDeque;

use indexmap::IndexSet;

use crate::graph::{GraphError, TargetGraph, TargetId};
use crate::rules::{ActionGraph, RuleResolver};

/// A root target set together with its materialised dependency closure.
///
/// Immutable once constructed. The rule set of the action graph is exactly
/// the closure reachable from the roots, so every dependency referenced by a
/// contained rule is itself contained.
#[derive(Debug, Clone)]
pub struct PartialGraph {
    targets: IndexSet<TargetId>,
    action_graph: ActionGraph,
}

impl PartialGraph {
    /// Compute the transitive dependency closure of `roots` over `graph` and
    /// materialise every visited target into a rule via `resolver`.
    ///
    /// An empty root set is valid and yields an empty partial graph.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownTarget`] when a root is absent from
    /// `graph`; resolver failures propagate unchanged.
    pub fn materialise(
        graph: &TargetGraph,
        roots: IndexSet<TargetId>,
        resolver: &mut RuleResolver,
    ) -> Result<Self, GraphError> {
        let mut action_graph = ActionGraph::default();
        let mut queue: VecDeque<TargetId> = roots.iter().cloned().collect();
        while let Some(id) = queue.pop_front() {
            if action_graph.contains(&id) {
                continue;
            }
            let rule = resolver.resolve(graph, &id)?;
            if let Some(node) = graph.node(&id) {
                for dependency in node.dependencies() {
                    if !action_graph.contains(dependency) {
                        queue.push_back(dependency.clone());
                    }
                }
            }
            action_graph.insert(rule);
        }
        Ok(Self {
            targets: roots,
            action_graph,
        })
    }

    /// The root target set this partial graph was built from.
    #[must_use]
    pub fn targets(&self) -> &IndexSet<TargetId> {
        &self.targets
    }

    /// The materialised rule closure.
    #[must_use]
    pub fn action_graph(&self) -> &ActionGraph {
        &self.action_graph
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TargetKind;
    use crate::graph::TargetNode;

    fn chain_graph() -> TargetGraph {
        TargetGraph::new([
            TargetNode::new("bottom", TargetKind::Library),
            TargetNode::new("middle", TargetKind::Library).with_deps(["bottom"]),
            TargetNode::new("top", TargetKind::Binary).with_deps(["middle"]),
        ])
        .expect("valid graph")
    }

    #[test]
    fn closure_contains_transitive_dependencies() {
        let graph = chain_graph();
        let mut resolver = RuleResolver::new();
        let roots: IndexSet<TargetId> = ["top".into()].into_iter().collect();
        let partial = PartialGraph::materialise(&graph, roots, &mut resolver).expect("closure");
        assert_eq!(partial.action_graph().len(), 3);
        assert!(partial.action_graph().contains(&"bottom".into()));
    }

    #[test]
    fn closure_is_complete() {
        let graph = chain_graph();
        let mut resolver = RuleResolver::new();
        let roots: IndexSet<TargetId> = ["top".into(), "middle".into()].into_iter().collect();
        let partial = PartialGraph::materialise(&graph, roots, &mut resolver).expect("closure");
        for rule in partial.action_graph().rules() {
            for dep in rule.dep_ids() {
                assert!(
                    partial.action_graph().contains(dep),
                    "dependency {dep} missing from closure",
                );
            }
        }
    }

    #[test]
    fn empty_roots_yield_an_empty_graph() {
        let graph = chain_graph();
        let mut resolver = RuleResolver::new();
        let partial = PartialGraph::materialise(&graph, IndexSet::new(), &mut resolver)
            .expect("empty closure");
        assert!(partial.targets().is_empty());
        assert!(partial.action_graph().is_empty());
        assert!(resolver.is_empty());
    }

    #[test]
    fn unknown_root_is_fatal() {
        let graph = chain_graph();
        let mut resolver = RuleResolver::new();
        let roots: IndexSet<TargetId> = ["ghost".into()].into_iter().collect();
        let err = PartialGraph::materialise(&graph, roots, &mut resolver).expect_err("unknown");
        assert!(matches!(err, GraphError::UnknownTarget { .. }));
    }
}
