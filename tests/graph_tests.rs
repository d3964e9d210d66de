//! Tests for target graph construction and validation.

use inro::ast::TargetKind;
use inro::graph::{GraphError, TargetGraph, TargetNode};
use inro::manifest;
use rstest::rstest;

#[rstest]
fn duplicate_declarations_are_rejected() {
    let err = TargetGraph::new([
        TargetNode::new("twice", TargetKind::Library),
        TargetNode::new("twice", TargetKind::Binary),
    ])
    .expect_err("duplicate");
    assert!(matches!(err, GraphError::DuplicateTarget { .. }));
    assert!(err.to_string().contains("twice"));
}

#[rstest]
#[case(TargetNode::new("broken", TargetKind::Binary).with_deps(["ghost"]))]
#[case(TargetNode::new("broken", TargetKind::Test).with_subject("ghost"))]
#[case(TargetNode::new("broken", TargetKind::ProjectConfig).with_members(["ghost"]))]
fn dangling_references_are_rejected(#[case] node: TargetNode) {
    let err = TargetGraph::new([node]).expect_err("dangling reference");
    match err {
        GraphError::UnresolvedDependency { target, dependency } => {
            assert_eq!(target.as_str(), "broken");
            assert_eq!(dependency.as_str(), "ghost");
        }
        other => panic!("wrong error: {other:?}"),
    }
}

#[rstest]
fn cycles_are_fatal_at_construction() {
    let err = TargetGraph::new([
        TargetNode::new("a", TargetKind::Library).with_deps(["b"]),
        TargetNode::new("b", TargetKind::Library).with_deps(["a"]),
    ])
    .expect_err("cycle");
    assert_eq!(
        err.to_string(),
        "dependency cycle detected: a -> b -> a",
    );
}

#[rstest]
fn self_dependency_is_a_cycle() {
    let err = TargetGraph::new([TargetNode::new("a", TargetKind::Library).with_deps(["a"])])
        .expect_err("cycle");
    assert!(matches!(err, GraphError::CircularDependency { .. }));
}

#[rstest]
fn manifests_pool_their_targets() {
    let first = manifest::from_str(
        "inro_version: \"1.0.0\"\ntargets:\n  - name: core\n    kind: library",
    )
    .expect("parse");
    let second = manifest::from_str(
        "inro_version: \"1.0.0\"\ntargets:\n  - name: app\n    kind: binary\n    deps: core",
    )
    .expect("parse");

    let graph = TargetGraph::from_manifests(&[first, second]).expect("graph");
    assert_eq!(graph.len(), 2);
    assert!(graph.contains(&"app".into()));
}

#[rstest]
fn cross_manifest_references_resolve() {
    let config = manifest::from_str(
        "inro_version: \"1.0.0\"\ntargets:\n  - name: proj\n    kind: project_config\n    members: [lib]",
    )
    .expect("parse");
    let lib = manifest::from_str(
        "inro_version: \"1.0.0\"\ntargets:\n  - name: lib\n    kind: library",
    )
    .expect("parse");

    assert!(TargetGraph::from_manifests(&[config, lib]).is_ok());
}

#[rstest]
fn dot_output_is_deterministic() {
    let graph = TargetGraph::new([
        TargetNode::new("z", TargetKind::Library),
        TargetNode::new("a", TargetKind::Binary).with_deps(["z"]),
    ])
    .expect("graph");

    let dot = graph.to_dot();
    assert!(dot.starts_with("digraph targets {\n"));
    assert!(dot.contains("  \"a\" -> \"z\";\n"));
    let a_pos = dot.find("\"a\";").expect("node a");
    let z_pos = dot.find("\"z\";").expect("node z");
    assert!(a_pos < z_pos, "nodes must be sorted by name");
}

#[rstest]
fn targets_matching_preserves_declaration_order() {
    let graph = TargetGraph::new([
        TargetNode::new("one", TargetKind::Library),
        TargetNode::new("two", TargetKind::Binary),
        TargetNode::new("three", TargetKind::Library),
    ])
    .expect("graph");

    let libraries = graph.targets_matching(|node| node.kind == TargetKind::Library);
    let names: Vec<&str> = libraries.iter().map(inro::graph::TargetId::as_str).collect();
    assert_eq!(names, vec!["one", "three"]);
}
