//! The full target dependency graph.
//!
//! This module defines the immutable declaration graph that every later
//! selection stage reads: [`TargetId`], [`TargetNode`], and [`TargetGraph`].
//! Construction validates the whole project once — duplicate declarations,
//! dangling references, and dependency cycles are all fatal here, so closure
//! traversal downstream never has to handle them.
//!
//! # Examples
//!
//! ```
//! use inro::ast::TargetKind;
//! use inro::graph::{TargetGraph, TargetNode};
//!
//! let graph = TargetGraph::new([
//!     TargetNode::new("core", TargetKind::Library),
//!     TargetNode::new("app", TargetKind::Binary).with_deps(["core"]),
//! ])
//! .expect("valid graph");
//! assert_eq!(graph.len(), 2);
//! ```

use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

use camino::Utf8PathBuf;
use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ast::{ProjectManifest, TargetDecl, TargetKind};

/// Globally unique, fully-qualified target name.
///
/// Equality, hashing, and ordering all follow the name itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    /// Wrap a target name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the underlying name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<&str> for TargetId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for TargetId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl AsRef<str> for TargetId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for TargetId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An immutable target declaration inside the graph.
///
/// Nodes are created once, when manifests are parsed, and never mutated.
/// Reference attributes (`deps`, `subject`, `members`) all contribute
/// dependency edges; [`TargetNode::dependencies`] yields their union.
#[derive(Debug, Clone)]
pub struct TargetNode {
    /// The target's unique name.
    pub id: TargetId,
    /// The declared kind.
    pub kind: TargetKind,
    /// Declared dependencies.
    pub deps: Vec<TargetId>,
    /// Declared source files.
    pub srcs: Vec<Utf8PathBuf>,
    /// For tests: the target under test.
    pub subject: Option<TargetId>,
    /// For project configs: the rules the project groups.
    pub members: Vec<TargetId>,
}

impl TargetNode {
    /// Create a node with no attributes beyond its name and kind.
    #[must_use]
    pub fn new(id: impl Into<TargetId>, kind: TargetKind) -> Self {
        Self {
            id: id.into(),
            kind,
            deps: Vec::new(),
            srcs: Vec::new(),
            subject: None,
            members: Vec::new(),
        }
    }

    /// Replace the declared dependencies.
    #[must_use]
    pub fn with_deps<I, T>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TargetId>,
    {
        self.deps = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Set the target under test.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<TargetId>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Replace the project member references.
    #[must_use]
    pub fn with_members<I, T>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TargetId>,
    {
        self.members = members.into_iter().map(Into::into).collect();
        self
    }

    fn from_decl(decl: &TargetDecl) -> Self {
        Self {
            id: TargetId::new(decl.name.clone()),
            kind: decl.kind,
            deps: decl.deps.map(|s| TargetId::from(s)),
            srcs: decl.srcs.map(|s| Utf8PathBuf::from(s)),
            subject: decl.subject.as_deref().map(|s| TargetId::from(s)),
            members: decl.members.map(|s| TargetId::from(s)),
        }
    }

    /// Every outgoing dependency edge: declared deps, the test subject, and
    /// project members, in declaration order.
    pub fn dependencies(&self) -> impl Iterator<Item = &TargetId> {
        self.deps
            .iter()
            .chain(self.subject.as_ref())
            .chain(self.members.iter())
    }
}

/// Error raised when graph construction or target resolution fails.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The same target name was declared more than once.
    #[error("target '{target}' is declared more than once")]
    DuplicateTarget {
        /// The name declared twice.
        target: TargetId,
    },

    /// A declared reference does not resolve to any known target.
    #[error("target '{target}' references '{dependency}', which is not declared in the project")]
    UnresolvedDependency {
        /// The declaring target.
        target: TargetId,
        /// The dangling reference.
        dependency: TargetId,
    },

    /// The declared dependencies form a cycle.
    #[error("dependency cycle detected: {}", .cycle.iter().join(" -> "))]
    CircularDependency {
        /// The cycle, starting and ending at the same target.
        cycle: Vec<TargetId>,
    },

    /// A requested target is absent from the graph being resolved against.
    #[error("unknown target '{target}'")]
    UnknownTarget {
        /// The missing target.
        target: TargetId,
    },
}

/// The complete, immutable dependency graph of all declared targets.
///
/// Built once per invocation and shared read-only across all selection
/// stages. A constructed graph is guaranteed duplicate-free, fully resolved,
/// and acyclic.
#[derive(Debug, Default)]
pub struct TargetGraph {
    nodes: IndexMap<TargetId, TargetNode>,
}

impl TargetGraph {
    /// Build a graph from individual nodes, validating the whole project.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateTarget`] when two nodes share a name,
    /// [`GraphError::UnresolvedDependency`] when a reference names an
    /// undeclared target, and [`GraphError::CircularDependency`] when the
    /// dependency edges contain a cycle.
    pub fn new(nodes: impl IntoIterator<Item = TargetNode>) -> Result<Self, GraphError> {
        let mut map: IndexMap<TargetId, TargetNode> = IndexMap::new();
        for node in nodes {
            if map.contains_key(&node.id) {
                return Err(GraphError::DuplicateTarget { target: node.id });
            }
            map.insert(node.id.clone(), node);
        }
        let graph = Self { nodes: map };
        graph.validate_references()?;
        graph.detect_cycles()?;
        Ok(graph)
    }

    /// Build a graph from every target declared across a set of manifests.
    ///
    /// # Errors
    ///
    /// Propagates the same validation failures as [`TargetGraph::new`].
    pub fn from_manifests(manifests: &[ProjectManifest]) -> Result<Self, GraphError> {
        Self::new(
            manifests
                .iter()
                .flat_map(|manifest| &manifest.targets)
                .map(TargetNode::from_decl),
        )
    }

    fn validate_references(&self) -> Result<(), GraphError> {
        for node in self.nodes.values() {
            for dependency in node.dependencies() {
                if !self.nodes.contains_key(dependency) {
                    return Err(GraphError::UnresolvedDependency {
                        target: node.id.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn detect_cycles(&self) -> Result<(), GraphError> {
        if let Some(cycle) = CycleDetector::find_cycle(&self.nodes) {
            return Err(GraphError::CircularDependency { cycle });
        }
        Ok(())
    }

    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: &TargetId) -> Option<&TargetNode> {
        self.nodes.get(id)
    }

    /// Whether the graph declares `id`.
    #[must_use]
    pub fn contains(&self, id: &TargetId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Iterate over every node in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &TargetNode> {
        self.nodes.values()
    }

    /// Iterate over every target id in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = &TargetId> {
        self.nodes.keys()
    }

    /// Number of declared targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph declares no targets.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids of every node matching `predicate`, in declaration order.
    pub fn targets_matching(
        &self,
        predicate: impl Fn(&TargetNode) -> bool,
    ) -> IndexSet<TargetId> {
        self.nodes
            .values()
            .filter(|node| predicate(node))
            .map(|node| node.id.clone())
            .collect()
    }

    /// Render the graph in DOT form with deterministic node and edge order.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph targets {\n");
        for node in self.nodes.values().sorted_by(|a, b| a.id.cmp(&b.id)) {
            out.push_str(&format!("  \"{}\";\n", node.id));
            for dependency in node.dependencies().sorted() {
                out.push_str(&format!("  \"{}\" -> \"{}\";\n", node.id, dependency));
            }
        }
        out.push_str("}\n");
        out
    }
}

/// Tracks the visitation state of a node during cycle detection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum VisitState {
    Visiting,
    Visited,
}

struct CycleDetector<'a> {
    nodes: &'a IndexMap<TargetId, TargetNode>,
    stack: Vec<TargetId>,
    states: HashMap<TargetId, VisitState>,
}

impl<'a> CycleDetector<'a> {
    fn find_cycle(nodes: &'a IndexMap<TargetId, TargetNode>) -> Option<Vec<TargetId>> {
        let mut detector = Self {
            nodes,
            stack: Vec::new(),
            states: HashMap::new(),
        };
        nodes
            .keys()
            .find_map(|id| detector.visit(id.clone()))
            .map(canonicalize_cycle)
    }

    fn visit(&mut self, id: TargetId) -> Option<Vec<TargetId>> {
        match self.states.get(&id) {
            Some(VisitState::Visited) => return None,
            Some(VisitState::Visiting) => {
                let start = self.stack.iter().position(|n| n == &id).unwrap_or(0);
                let mut cycle: Vec<TargetId> = self.stack.iter().skip(start).cloned().collect();
                cycle.push(id);
                return Some(cycle);
            }
            None => {
                self.states.insert(id.clone(), VisitState::Visiting);
            }
        }

        self.stack.push(id.clone());

        if let Some(node) = self.nodes.get(&id) {
            for dependency in node.dependencies() {
                if let Some(cycle) = self.visit(dependency.clone()) {
                    return Some(cycle);
                }
            }
        }

        self.stack.pop();
        self.states.insert(id, VisitState::Visited);
        None
    }
}

/// Rotate a cycle so its smallest node comes first, keeping the closing
/// repetition in step. Makes cycle errors stable across traversal orders.
fn canonicalize_cycle(mut cycle: Vec<TargetId>) -> Vec<TargetId> {
    if cycle.len() < 2 {
        return cycle;
    }
    let len = cycle.len() - 1;
    let start = cycle
        .iter()
        .take(len)
        .enumerate()
        .min_by(|(_, a), (_, b)| a.cmp(b))
        .map_or(0, |(idx, _)| idx);
    let (prefix, suffix) = cycle.split_at_mut(len);
    prefix.rotate_left(start);
    if let (Some(first), Some(slot)) = (prefix.first().cloned(), suffix.first_mut()) {
        slot.clone_from(&first);
    }
    cycle
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(name: &str) -> TargetId {
        TargetId::from(name)
    }

    fn library(name: &str, deps: &[&str]) -> TargetNode {
        TargetNode::new(name, TargetKind::Library).with_deps(deps.iter().copied())
    }

    #[test]
    fn cycle_detector_detects_self_edge_cycle() {
        let mut nodes = IndexMap::new();
        nodes.insert(id("a"), library("a", &["a"]));

        let cycle = CycleDetector::find_cycle(&nodes).expect("cycle");
        assert_eq!(cycle, vec![id("a"), id("a")]);
    }

    #[test]
    fn cycle_detector_identifies_two_node_cycle() {
        let mut nodes = IndexMap::new();
        nodes.insert(id("a"), library("a", &["b"]));
        nodes.insert(id("b"), library("b", &["a"]));

        let cycle = CycleDetector::find_cycle(&nodes).expect("cycle");
        assert_eq!(cycle, vec![id("a"), id("b"), id("a")]);
    }

    #[test]
    fn cycle_detector_accepts_diamond() {
        let mut nodes = IndexMap::new();
        nodes.insert(id("top"), library("top", &["left", "right"]));
        nodes.insert(id("left"), library("left", &["base"]));
        nodes.insert(id("right"), library("right", &["base"]));
        nodes.insert(id("base"), library("base", &[]));

        assert!(CycleDetector::find_cycle(&nodes).is_none());
    }

    #[test]
    fn canonicalize_cycle_rotates_smallest_node() {
        let cycle = vec![id("c"), id("a"), id("b"), id("c")];
        let canonical = canonicalize_cycle(cycle);
        assert_eq!(canonical, vec![id("a"), id("b"), id("c"), id("a")]);
    }

    #[test]
    fn subject_and_members_are_dependency_edges() {
        let node = TargetNode::new("p", TargetKind::ProjectConfig)
            .with_deps(["d"])
            .with_subject("s")
            .with_members(["m"]);
        let edges: Vec<&TargetId> = node.dependencies().collect();
        assert_eq!(edges, vec![&id("d"), &id("s"), &id("m")]);
    }
}
