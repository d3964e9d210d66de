//! Project description generator.
//!
//! This module converts a finished [`PartialGraph`] into the JSON document
//! consumed by IDE integrations. Projects, members, and tests are sorted so
//! the output is deterministic regardless of traversal order.

use itertools::Itertools;
use serde::Serialize;

use crate::ast::TargetKind;
use crate::partial::PartialGraph;
use crate::rules::BuildRule;

/// The rendered document: one entry per project config in the graph.
#[derive(Debug, Serialize)]
struct ProjectDocument {
    projects: Vec<ProjectEntry>,
}

/// One IDE project, derived from a `project_config` rule.
#[derive(Debug, Serialize)]
struct ProjectEntry {
    name: String,
    members: Vec<MemberEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tests: Vec<String>,
}

/// One member rule of a project.
#[derive(Debug, Serialize)]
struct MemberEntry {
    name: String,
    kind: TargetKind,
    srcs: Vec<String>,
    deps: Vec<String>,
}

impl MemberEntry {
    fn from_rule(rule: &BuildRule) -> Self {
        Self {
            name: rule.id.to_string(),
            kind: rule.kind,
            srcs: rule.srcs.iter().map(ToString::to_string).collect(),
            deps: rule.dep_ids().map(ToString::to_string).sorted().collect(),
        }
    }
}

/// Render the project document for `project_graph`.
///
/// Every `project_config` rule becomes one entry, listing the member rules
/// present in the graph. When `test_graph` is supplied, each entry also
/// lists the test rules whose subject belongs to the project.
///
/// # Errors
///
/// Returns a serialisation error if the document cannot be rendered as JSON.
pub fn generate(
    project_graph: &PartialGraph,
    test_graph: Option<&PartialGraph>,
) -> Result<String, serde_json::Error> {
    let graph = project_graph.action_graph();
    let projects = graph
        .rules_of_kind(TargetKind::ProjectConfig)
        .sorted_by(|a, b| a.id.cmp(&b.id))
        .map(|project| ProjectEntry {
            name: project.id.to_string(),
            members: project
                .members
                .iter()
                .filter_map(|member| graph.rule(member))
                .map(|rule| MemberEntry::from_rule(rule))
                .sorted_by(|a, b| a.name.cmp(&b.name))
                .collect(),
            tests: tests_for(project, test_graph),
        })
        .collect();
    serde_json::to_string_pretty(&ProjectDocument { projects })
}

fn tests_for(project: &BuildRule, test_graph: Option<&PartialGraph>) -> Vec<String> {
    let Some(tests) = test_graph else {
        return Vec::new();
    };
    tests
        .action_graph()
        .rules_of_kind(TargetKind::Test)
        .filter(|test| {
            test.subject
                .as_ref()
                .is_some_and(|subject| project.members.contains(subject))
        })
        .map(|test| test.id.to_string())
        .sorted()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TargetKind;
    use crate::graph::{TargetGraph, TargetNode};
    use crate::partial::PartialGraph;
    use crate::rules::RuleResolver;
    use indexmap::IndexSet;

    fn materialise_all(graph: &TargetGraph) -> PartialGraph {
        let roots: IndexSet<_> = graph.ids().cloned().collect();
        PartialGraph::materialise(graph, roots, &mut RuleResolver::new()).expect("closure")
    }

    #[test]
    fn document_is_sorted_and_complete() {
        let graph = TargetGraph::new([
            TargetNode::new("zeta", TargetKind::Library),
            TargetNode::new("alpha", TargetKind::Library),
            TargetNode::new("proj_b", TargetKind::ProjectConfig).with_members(["zeta"]),
            TargetNode::new("proj_a", TargetKind::ProjectConfig).with_members(["alpha", "zeta"]),
        ])
        .expect("valid graph");
        let partial = materialise_all(&graph);

        let document = generate(&partial, None).expect("render");
        let proj_a = document.find("proj_a").expect("proj_a present");
        let proj_b = document.find("proj_b").expect("proj_b present");
        assert!(proj_a < proj_b, "projects must be sorted by name");
        assert!(!document.contains("tests"));
    }

    #[test]
    fn tests_attach_only_to_their_project() {
        let graph = TargetGraph::new([
            TargetNode::new("core", TargetKind::Library),
            TargetNode::new("util", TargetKind::Library),
            TargetNode::new("core_test", TargetKind::Test).with_subject("core"),
            TargetNode::new("proj_core", TargetKind::ProjectConfig).with_members(["core"]),
            TargetNode::new("proj_util", TargetKind::ProjectConfig).with_members(["util"]),
        ])
        .expect("valid graph");
        let partial = materialise_all(&graph);

        let document = generate(&partial, Some(&partial)).expect("render");
        let value: serde_json::Value = serde_json::from_str(&document).expect("valid JSON");
        let projects = value
            .get("projects")
            .and_then(serde_json::Value::as_array)
            .expect("projects array");
        let core = projects
            .iter()
            .find(|p| p.get("name").is_some_and(|n| n == "proj_core"))
            .expect("proj_core");
        let util = projects
            .iter()
            .find(|p| p.get("name").is_some_and(|n| n == "proj_util"))
            .expect("proj_util");
        let core_tests = core
            .get("tests")
            .and_then(serde_json::Value::as_array)
            .expect("tests array");
        assert_eq!(core_tests.first().and_then(|t| t.as_str()), Some("core_test"));
        assert!(util.get("tests").is_none());
    }

    #[test]
    fn empty_graph_renders_an_empty_document() {
        let graph = TargetGraph::default();
        let partial = materialise_all(&graph);
        let document = generate(&partial, None).expect("render");
        assert!(document.contains("\"projects\": []"));
    }
}
