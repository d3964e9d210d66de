//! The partial graph chain engine.
//!
//! Orchestrates a sequence of [`PartialGraph`] builds: stage 0 materialises
//! the closure of the initial roots, and every following [`Stage`] grows the
//! root set with rules that its association predicate ties to the previous
//! stage's graph. Root growth is strictly additive, and association is always
//! tested against the immediately preceding stage's action graph, never the
//! full project.
//!
//! Resolver lifecycles are the deliberate part: every intermediate build uses
//! a fresh, throwaway [`RuleResolver`], and only the final stage's build
//! populates the caller-supplied terminal resolver. After a successful call
//! the terminal resolver holds exactly the final graph's rules.

use indexmap::IndexSet;
use tracing::debug;

use crate::graph::{GraphError, TargetGraph, TargetId, TargetNode};
use crate::partial::PartialGraph;
use crate::rules::{ActionGraph, BuildRule, RuleResolver};

/// Picks additional candidate targets out of the full graph.
pub type SelectionPredicate<'a> = dyn Fn(&TargetNode) -> bool + 'a;

/// Decides whether a candidate rule belongs with an already-selected graph.
pub type AssociationPredicate<'a> = dyn Fn(&BuildRule, &ActionGraph) -> bool + 'a;

/// One step of the chain: a selection predicate paired with the association
/// predicate that filters its candidates.
pub struct Stage<'a> {
    selection: Box<SelectionPredicate<'a>>,
    association: Box<AssociationPredicate<'a>>,
}

impl<'a> Stage<'a> {
    /// Pair a selection predicate with an association predicate.
    pub fn new(
        selection: impl Fn(&TargetNode) -> bool + 'a,
        association: impl Fn(&BuildRule, &ActionGraph) -> bool + 'a,
    ) -> Self {
        Self {
            selection: Box::new(selection),
            association: Box::new(association),
        }
    }
}

/// Where the stage-0 roots come from.
///
/// Resolved exactly once, at the start of the chain.
pub enum RootSpec<'a> {
    /// Use this set verbatim.
    Explicit(IndexSet<TargetId>),
    /// Every target matching the predicate.
    Matching(Box<SelectionPredicate<'a>>),
    /// Every target in the project.
    All,
}

impl<'a> RootSpec<'a> {
    /// Explicit roots from any iterable of names.
    pub fn explicit<I, T>(targets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TargetId>,
    {
        Self::Explicit(targets.into_iter().map(Into::into).collect())
    }

    /// Roots selected by a predicate over the full graph.
    pub fn matching(predicate: impl Fn(&TargetNode) -> bool + 'a) -> Self {
        Self::Matching(Box::new(predicate))
    }

    fn resolve(self, graph: &TargetGraph) -> IndexSet<TargetId> {
        match self {
            Self::Explicit(targets) => targets,
            Self::Matching(predicate) => graph.targets_matching(predicate),
            Self::All => graph.ids().cloned().collect(),
        }
    }
}

/// Build the ordered chain of partial graphs described by `stages`.
///
/// Stage 0 is the closure of the resolved `roots`. For each stage, candidates
/// are selected from the full graph, materialised into a throwaway graph so
/// the association predicate can inspect fully-linked rules, and the matches
/// are unioned into the previous root set before the stage's graph is
/// rebuilt. The `terminal` resolver is written by exactly one build: the
/// final stage's (stage 0 itself when `stages` is empty).
///
/// Returns `stages.len() + 1` graphs, stage 0 first.
///
/// # Errors
///
/// Returns [`GraphError::UnknownTarget`] when an explicit root is absent
/// from `graph`; any stage failure aborts the whole chain with the
/// originating error.
pub fn build_partial_graph_chain(
    graph: &TargetGraph,
    roots: RootSpec<'_>,
    stages: &[Stage<'_>],
    terminal: &mut RuleResolver,
) -> Result<Vec<PartialGraph>, GraphError> {
    let roots = roots.resolve(graph);
    debug!(
        roots = roots.len(),
        stages = stages.len(),
        "building partial graph chain",
    );

    // Intermediate graphs must never leak into the caller-visible resolver,
    // so stage 0 only gets the terminal one when no stages follow.
    let mut previous = if stages.is_empty() {
        PartialGraph::materialise(graph, roots, terminal)?
    } else {
        PartialGraph::materialise(graph, roots, &mut RuleResolver::new())?
    };

    let mut chain = Vec::with_capacity(stages.len() + 1);
    for (index, stage) in stages.iter().enumerate() {
        let candidates = graph.targets_matching(&stage.selection);
        let candidate_graph =
            PartialGraph::materialise(graph, candidates, &mut RuleResolver::new())?;

        let mut roots = previous.targets().clone();
        let mut matched = 0usize;
        for rule in candidate_graph.action_graph().rules() {
            if (stage.association)(rule.as_ref(), previous.action_graph()) {
                roots.insert(rule.id.clone());
                matched += 1;
            }
        }
        debug!(
            stage = index,
            candidates = candidate_graph.action_graph().len(),
            matched,
            roots = roots.len(),
            "stage association complete",
        );

        let next = if index + 1 == stages.len() {
            PartialGraph::materialise(graph, roots, terminal)?
        } else {
            PartialGraph::materialise(graph, roots, &mut RuleResolver::new())?
        };
        chain.push(std::mem::replace(&mut previous, next));
    }
    chain.push(previous);
    Ok(chain)
}
