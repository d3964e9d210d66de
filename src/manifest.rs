//! Manifest loading helpers.
//!
//! This module turns `Inrofile` text into [`ProjectManifest`] values. YAML is
//! parsed first into a generic document and then deserialised into the AST,
//! so structural mismatches are reported separately from syntax errors and
//! carry the manifest name. [`load_project`] discovers every manifest under a
//! project root whose relative path matches an include pattern.

use camino::{Utf8Path, Utf8PathBuf};
use glob::Pattern;
use thiserror::Error;
use walkdir::WalkDir;

use crate::ast::ProjectManifest;

/// Include pattern applied when the caller supplies none.
pub const DEFAULT_INCLUDE: &str = "**/Inrofile";

/// Error raised when manifest loading fails.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The YAML text is malformed.
    #[error("YAML parse error in {name} at line {line}, column {column}: {source}")]
    Parse {
        /// Display name of the manifest source.
        name: String,
        /// One-based line of the failure, 1 when unknown.
        line: u64,
        /// One-based column of the failure, 1 when unknown.
        column: u64,
        /// The underlying YAML error.
        source: serde_saphyr::Error,
    },

    /// The YAML is well-formed but does not match the manifest schema.
    #[error("manifest structure error in {name}: {source}")]
    Structure {
        /// Display name of the manifest source.
        name: String,
        /// The underlying deserialisation error.
        source: serde_json::Error,
    },

    /// A discovered manifest file could not be read.
    #[error("failed to read manifest {path}")]
    Read {
        /// Path of the unreadable file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An include pattern is not valid glob syntax.
    #[error("invalid include pattern '{pattern}'")]
    Pattern {
        /// The offending pattern text.
        pattern: String,
        /// The underlying pattern error.
        source: glob::PatternError,
    },

    /// Walking the project root failed.
    #[error("failed to walk project root {root}")]
    Walk {
        /// The root being traversed.
        root: Utf8PathBuf,
        /// The underlying traversal error.
        source: walkdir::Error,
    },
}

fn map_yaml_error(err: serde_saphyr::Error, name: &str) -> ManifestError {
    let (line, column) = err.location().map_or((1, 1), |l| (l.line(), l.column()));
    ManifestError::Parse {
        name: name.to_owned(),
        line,
        column,
        source: err,
    }
}

fn from_str_named(yaml: &str, name: &str) -> Result<ProjectManifest, ManifestError> {
    let doc: serde_json::Value =
        serde_saphyr::from_str(yaml).map_err(|e| map_yaml_error(e, name))?;
    serde_json::from_value(doc).map_err(|e| ManifestError::Structure {
        name: name.to_owned(),
        source: e,
    })
}

/// Parse a manifest string.
///
/// # Errors
///
/// Returns [`ManifestError::Parse`] when the YAML is malformed and
/// [`ManifestError::Structure`] when it does not match the manifest schema.
pub fn from_str(yaml: &str) -> Result<ProjectManifest, ManifestError> {
    from_str_named(yaml, "Inrofile")
}

/// Load a [`ProjectManifest`] from the given file path.
///
/// # Errors
///
/// Returns an error if the file cannot be read or its content fails to parse.
pub fn from_path(path: impl AsRef<Utf8Path>) -> Result<ProjectManifest, ManifestError> {
    let path = path.as_ref();
    let data = std::fs::read_to_string(path).map_err(|e| ManifestError::Read {
        path: path.to_owned(),
        source: e,
    })?;
    from_str_named(&data, path.as_str())
}

fn compile_patterns(includes: &[String]) -> Result<Vec<Pattern>, ManifestError> {
    includes
        .iter()
        .map(|pattern| {
            Pattern::new(pattern).map_err(|e| ManifestError::Pattern {
                pattern: pattern.clone(),
                source: e,
            })
        })
        .collect()
}

/// Discover and parse every manifest under `root` whose root-relative path
/// matches one of the `includes` glob patterns.
///
/// Traversal is sorted by file name, so the returned manifests are in a
/// stable path order regardless of filesystem enumeration order. Paths that
/// are not valid UTF-8 are skipped.
///
/// # Errors
///
/// Returns an error if a pattern is invalid, the walk fails, or any matched
/// manifest cannot be read or parsed.
pub fn load_project(
    root: &Utf8Path,
    includes: &[String],
) -> Result<Vec<ProjectManifest>, ManifestError> {
    let patterns = compile_patterns(includes)?;
    let mut manifests = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| ManifestError::Walk {
            root: root.to_owned(),
            source: e,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(path) = Utf8Path::from_path(entry.path()) else {
            tracing::debug!(path = %entry.path().display(), "skipping non-UTF-8 path");
            continue;
        };
        let relative = path.strip_prefix(root).unwrap_or(path);
        if patterns
            .iter()
            .any(|p| p.matches_path(relative.as_std_path()))
        {
            tracing::debug!(manifest = %path, "loading manifest");
            manifests.push(from_path(path)?);
        }
    }
    Ok(manifests)
}
