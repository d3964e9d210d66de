//! Inro manifest Abstract Syntax Tree structures.
//!
//! This module defines the data structures used to represent a parsed
//! `Inrofile`. They mirror the YAML schema of the manifest format and are
//! produced by the loader in [`crate::manifest`].
//!
//! The following example shows how to parse a minimal manifest string:
//!
//! ```rust
//! use inro::ast::{StringOrList, TargetKind};
//!
//! let yaml = "inro_version: \"1.0.0\"\ntargets:\n  - name: hello\n    kind: library";
//! let manifest = inro::manifest::from_str(yaml).expect("parse");
//! assert_eq!(manifest.targets.len(), 1);
//! assert_eq!(manifest.targets[0].kind, TargetKind::Library);
//! assert_eq!(manifest.targets[0].deps, StringOrList::Empty);
//! ```

use semver::Version;
use serde::{Deserialize, Serialize};

/// Top-level manifest structure parsed from an `Inrofile`.
///
/// Each field mirrors a key in the YAML manifest. A project may span several
/// manifest files; every file carries its own version stamp and contributes
/// its `targets` to the shared declaration pool.
///
/// ```yaml
/// inro_version: "1.0.0"
/// targets:
///   - name: core
///     kind: library
///     srcs: [core.c]
/// ```
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectManifest {
    /// Semantic version of the manifest format.
    pub inro_version: Version,

    /// Targets declared by this manifest file. Defaults to empty so a
    /// directory-level manifest may exist purely as a version marker.
    #[serde(default)]
    pub targets: Vec<TargetDecl>,
}

/// A single declared build target.
///
/// Declarations are unresolved: dependency references are plain names and are
/// only checked against the rest of the project when the target graph is
/// constructed.
#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TargetDecl {
    /// Fully-qualified target name, unique across the whole project.
    pub name: String,

    /// What kind of build unit the target declares.
    pub kind: TargetKind,

    /// Names of targets that must be resolved before this one.
    #[serde(default)]
    pub deps: StringOrList,

    /// Source files consumed by the target.
    #[serde(default)]
    pub srcs: StringOrList,

    /// For `test` targets: the name of the target under test.
    #[serde(default)]
    pub subject: Option<String>,

    /// For `project_config` targets: the rule names the project groups.
    #[serde(default)]
    pub members: StringOrList,
}

/// The closed set of target kinds a manifest may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    /// A compiled library.
    Library,
    /// An executable.
    Binary,
    /// A test whose `subject` names the target under test.
    Test,
    /// An IDE project grouping; its `members` name the rules it covers.
    ProjectConfig,
}

/// A helper for fields that accept either a single string or a list of
/// strings.
///
/// It mirrors YAML syntax where a scalar or sequence is allowed. Empty values
/// deserialize to `StringOrList::Empty`.
///
/// ```yaml
/// # Scalar
/// deps: core
/// # Sequence
/// deps:
///   - core
///   - util
/// ```
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
#[serde(untagged)]
pub enum StringOrList {
    /// No value provided.
    #[default]
    Empty,
    /// A single string item.
    String(String),
    /// A list of string items.
    List(Vec<String>),
}

impl StringOrList {
    /// Visit each item in declaration order, mapping it through `f`.
    pub fn map<T, F>(&self, f: F) -> Vec<T>
    where
        F: Fn(&str) -> T,
    {
        match self {
            Self::Empty => Vec::new(),
            Self::String(s) => vec![f(s)],
            Self::List(v) => v.iter().map(|s| f(s)).collect(),
        }
    }
}
