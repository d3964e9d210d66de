//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands. Option
//! parsing stays here; execution lives in [`crate::runner`].

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

use crate::manifest::DEFAULT_INCLUDE;

/// A manifest-driven IDE project generator built on predicate-selected build
/// graphs.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Project root directory scanned for `Inrofile` manifests.
    #[arg(short = 'C', long, value_name = "DIR", default_value = ".")]
    pub root: Utf8PathBuf,

    /// Glob patterns, relative to the root, selecting manifest files.
    ///
    /// Defaults to `**/Inrofile` when no pattern is given.
    #[arg(long = "include", value_name = "PATTERN")]
    pub includes: Vec<String>,

    /// Enable verbose diagnostic logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Optional subcommand to execute; defaults to `project` when omitted.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Apply the default command if none was specified.
    #[must_use]
    pub fn with_default_command(mut self) -> Self {
        if self.command.is_none() {
            self.command = Some(Commands::Project(ProjectArgs::default()));
        }
        self
    }

    /// The include patterns to apply, falling back to the default.
    #[must_use]
    pub fn include_patterns(&self) -> Vec<String> {
        if self.includes.is_empty() {
            vec![DEFAULT_INCLUDE.to_owned()]
        } else {
            self.includes.clone()
        }
    }
}

/// Arguments accepted by the `project` command.
#[derive(Debug, Args, Default, PartialEq, Eq, Clone)]
pub struct ProjectArgs {
    /// Write the project document to this path instead of stdout.
    ///
    /// Use `-` to write to stdout explicitly.
    #[arg(long, value_name = "FILE")]
    pub out: Option<Utf8PathBuf>,

    /// Also derive the associated test graph and attach tests to projects.
    #[arg(long)]
    pub with_tests: bool,

    /// Explicit root targets; project configs spanning them are selected.
    ///
    /// When omitted, every project config in the project is a root.
    pub targets: Vec<String>,
}

/// Available top-level commands for Inro.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone)]
pub enum Commands {
    /// Generate IDE project description files from the selected graph.
    Project(ProjectArgs),

    /// Print the full target dependency graph in DOT format.
    Graph,
}
