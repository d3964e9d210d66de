//! Standard selection and association predicates.
//!
//! The chain engine treats predicates as data; these constructors cover the
//! generation modes the CLI ships. Selection predicates look only at raw
//! declarations, association predicates at fully-linked rules and the
//! reference graph they are being tied to.

use crate::ast::TargetKind;
use crate::graph::TargetNode;
use crate::rules::{ActionGraph, BuildRule};

/// Selects every target of the given kind.
pub fn of_kind(kind: TargetKind) -> impl Fn(&TargetNode) -> bool {
    move |node| node.kind == kind
}

/// Matches a test rule whose subject is present in the reference graph.
pub fn associated_tests() -> impl Fn(&BuildRule, &ActionGraph) -> bool {
    |rule, reference| {
        rule.kind == TargetKind::Test
            && rule
                .subject
                .as_ref()
                .is_some_and(|subject| reference.contains(subject))
    }
}

/// Matches a project-config rule with at least one member present in the
/// reference graph.
pub fn associated_project_configs() -> impl Fn(&BuildRule, &ActionGraph) -> bool {
    |rule, reference| {
        rule.kind == TargetKind::ProjectConfig
            && rule.members.iter().any(|member| reference.contains(member))
    }
}
