//! CLI execution and command dispatch logic.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! handles command execution: it loads the project's manifests, builds the
//! full target graph, wires the generation mode's predicate pairs into the
//! chain engine, and writes the rendered output.

use std::io::Write;

use anyhow::{Context, Result, bail};
use camino::Utf8Path;
use tracing::{debug, info};

use crate::ast::TargetKind;
use crate::chain::{RootSpec, Stage, build_partial_graph_chain};
use crate::cli::{Cli, Commands, ProjectArgs};
use crate::graph::TargetGraph;
use crate::rules::RuleResolver;
use crate::{manifest, predicates, project_gen};

/// Execute the parsed [`Cli`] command.
///
/// # Errors
///
/// Returns an error if manifest loading, graph construction, chain
/// derivation, or output writing fails.
pub fn run(cli: &Cli) -> Result<()> {
    let command = cli
        .command
        .clone()
        .unwrap_or(Commands::Project(ProjectArgs::default()));
    match command {
        Commands::Project(args) => handle_project(cli, &args),
        Commands::Graph => handle_graph(cli),
    }
}

fn load_target_graph(cli: &Cli) -> Result<TargetGraph> {
    let includes = cli.include_patterns();
    let manifests = manifest::load_project(&cli.root, &includes)
        .with_context(|| format!("loading manifests under {}", cli.root))?;
    if manifests.is_empty() {
        bail!("no manifests matched {includes:?} under {}", cli.root);
    }
    debug!(manifests = manifests.len(), "loaded project manifests");
    let graph = TargetGraph::from_manifests(&manifests).context("building the target graph")?;
    info!(targets = graph.len(), "constructed full target graph");
    Ok(graph)
}

fn handle_project(cli: &Cli, args: &ProjectArgs) -> Result<()> {
    let graph = load_target_graph(cli)?;

    let roots = if args.targets.is_empty() {
        RootSpec::matching(predicates::of_kind(TargetKind::ProjectConfig))
    } else {
        RootSpec::explicit(args.targets.iter().cloned())
    };

    let mut stages = Vec::new();
    if args.with_tests {
        stages.push(Stage::new(
            predicates::of_kind(TargetKind::Test),
            predicates::associated_tests(),
        ));
    }
    stages.push(Stage::new(
        predicates::of_kind(TargetKind::ProjectConfig),
        predicates::associated_project_configs(),
    ));

    let mut resolver = RuleResolver::new();
    let graphs = build_partial_graph_chain(&graph, roots, &stages, &mut resolver)
        .context("deriving partial graphs")?;

    let test_graph = if args.with_tests { graphs.get(1) } else { None };
    let project_graph = graphs.last().context("chain returned no graphs")?;
    debug!(
        projects = project_graph.action_graph().len(),
        resolved = resolver.len(),
        "partial graph chain complete",
    );

    let document = project_gen::generate(project_graph, test_graph)
        .context("rendering the project document")?;
    write_output(args.out.as_deref(), &document)
}

fn handle_graph(cli: &Cli) -> Result<()> {
    let graph = load_target_graph(cli)?;
    write_stdout(&graph.to_dot())
}

fn write_output(out: Option<&Utf8Path>, document: &str) -> Result<()> {
    match out {
        Some(path) if path.as_str() != "-" => {
            std::fs::write(path, document)
                .with_context(|| format!("writing project document to {path}"))?;
            info!(path = %path, "project document written");
            Ok(())
        }
        _ => write_stdout(document),
    }
}

fn write_stdout(content: &str) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(content.as_bytes())
        .context("writing to stdout")?;
    if !content.ends_with('\n') {
        stdout.write_all(b"\n").context("writing to stdout")?;
    }
    Ok(())
}
