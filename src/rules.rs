//! Resolved build rules and rule graphs.
//!
//! A [`BuildRule`] is the materialised counterpart of a
//! [`TargetNode`](crate::graph::TargetNode): same id and kind, but with its
//! dependencies linked to other rules rather than raw names. Rules are only
//! created through a [`RuleResolver`], which guarantees at most one rule
//! instance per target within the resolver's lifetime. An [`ActionGraph`]
//! collects the rules reachable from some root set.

use std::sync::Arc;

use camino::Utf8PathBuf;
use indexmap::IndexMap;

use crate::ast::TargetKind;
use crate::graph::{GraphError, TargetGraph, TargetId, TargetNode};

/// A fully-linked build rule.
///
/// Rules are immutable and shared via [`Arc`]; the resolver that created a
/// rule owns the only cache entry for it.
#[derive(Debug)]
pub struct BuildRule {
    /// The target's unique name.
    pub id: TargetId,
    /// The declared kind.
    pub kind: TargetKind,
    /// Dependencies, resolved to rule references.
    pub deps: Vec<Arc<BuildRule>>,
    /// Source files consumed by the rule.
    pub srcs: Vec<Utf8PathBuf>,
    /// For tests: the target under test, kept as an id for relational tests
    /// against other graphs.
    pub subject: Option<TargetId>,
    /// For project configs: the grouped rule names.
    pub members: Vec<TargetId>,
}

impl BuildRule {
    fn from_node(node: &TargetNode, deps: Vec<Arc<Self>>) -> Self {
        Self {
            id: node.id.clone(),
            kind: node.kind,
            deps,
            srcs: node.srcs.clone(),
            subject: node.subject.clone(),
            members: node.members.clone(),
        }
    }

    /// Ids of the resolved dependencies.
    pub fn dep_ids(&self) -> impl Iterator<Item = &TargetId> {
        self.deps.iter().map(|dep| &dep.id)
    }
}

/// A set of build rules closed under dependencies, keyed by target id.
#[derive(Debug, Default, Clone)]
pub struct ActionGraph {
    rules: IndexMap<TargetId, Arc<BuildRule>>,
}

impl ActionGraph {
    pub(crate) fn insert(&mut self, rule: Arc<BuildRule>) {
        self.rules.insert(rule.id.clone(), rule);
    }

    /// Look up a rule by target id.
    #[must_use]
    pub fn rule(&self, id: &TargetId) -> Option<&Arc<BuildRule>> {
        self.rules.get(id)
    }

    /// Whether the graph holds a rule for `id`.
    #[must_use]
    pub fn contains(&self, id: &TargetId) -> bool {
        self.rules.contains_key(id)
    }

    /// Iterate over every rule in insertion order.
    pub fn rules(&self) -> impl Iterator<Item = &Arc<BuildRule>> {
        self.rules.values()
    }

    /// Iterate over every rule of the given kind.
    pub fn rules_of_kind(&self, kind: TargetKind) -> impl Iterator<Item = &Arc<BuildRule>> {
        self.rules.values().filter(move |rule| rule.kind == kind)
    }

    /// Iterate over every target id in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &TargetId> {
        self.rules.keys()
    }

    /// Number of rules in the graph.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the graph holds no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// A scope-isolated, memoising registry of build rules.
///
/// `resolve` constructs a rule (and, recursively, its dependencies) on first
/// access and returns the cached instance thereafter, so a resolver never
/// yields two distinct rule instances for the same target. The cache grows
/// monotonically and is never shared between resolver instances.
#[derive(Debug, Default)]
pub struct RuleResolver {
    rules: IndexMap<TargetId, Arc<BuildRule>>,
}

impl RuleResolver {
    /// Create an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve `id` against `graph`, materialising the rule and its
    /// dependency chain on first access.
    ///
    /// The graph must already be validated: dependency resolution recurses
    /// along declared edges and relies on the graph being acyclic.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnknownTarget`] when `id` is absent from
    /// `graph`.
    pub fn resolve(
        &mut self,
        graph: &TargetGraph,
        id: &TargetId,
    ) -> Result<Arc<BuildRule>, GraphError> {
        if let Some(rule) = self.rules.get(id) {
            return Ok(Arc::clone(rule));
        }
        let node = graph
            .node(id)
            .ok_or_else(|| GraphError::UnknownTarget { target: id.clone() })?;
        let mut deps = Vec::new();
        for dependency in node.dependencies() {
            deps.push(self.resolve(graph, dependency)?);
        }
        let rule = Arc::new(BuildRule::from_node(node, deps));
        self.rules.insert(id.clone(), Arc::clone(&rule));
        Ok(rule)
    }

    /// Look up an already-resolved rule without materialising anything.
    #[must_use]
    pub fn rule(&self, id: &TargetId) -> Option<&Arc<BuildRule>> {
        self.rules.get(id)
    }

    /// Whether the resolver has materialised `id`.
    #[must_use]
    pub fn contains(&self, id: &TargetId) -> bool {
        self.rules.contains_key(id)
    }

    /// Iterate over every resolved target id in resolution order.
    pub fn ids(&self) -> impl Iterator<Item = &TargetId> {
        self.rules.keys()
    }

    /// Number of rules the resolver has materialised.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the resolver has materialised nothing yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
