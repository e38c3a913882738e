// src/discovery.rs
//! File discovery for the CLI: walks a root, prunes dependency and VCS
//! directories, and loads every file with a recognizable dialect.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::dialect::Dialect;
use crate::error::{RefactorError, Result};
use crate::types::SourceUnit;

pub const PRUNE_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "dist",
    "build",
    "target",
    ".venv",
    "venv",
    ".tox",
    ".cache",
    "coverage",
    "vendor",
    "third_party",
    "__pycache__",
];

fn should_prune(name: &str) -> bool {
    PRUNE_DIRS.contains(&name)
}

/// Walks `root` and returns every file whose extension maps to a dialect.
/// A `root` that is itself a file is returned as-is.
///
/// # Errors
///
/// Returns an error when the root does not exist.
pub fn discover(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(RefactorError::Other(format!(
            "path does not exist: {}",
            root.display()
        )));
    }
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !should_prune(&e.file_name().to_string_lossy()));

    let mut paths = Vec::new();
    for item in walker {
        let Ok(entry) = item else { continue };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if dialect_of(path).is_some() {
            paths.push(path.to_path_buf());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Reads the files into source units. Files that cannot be read are skipped;
/// the walk never aborts on a single bad file.
#[must_use]
pub fn load_units(paths: &[PathBuf]) -> Vec<SourceUnit> {
    paths
        .iter()
        .filter_map(|path| {
            let text = std::fs::read_to_string(path).ok()?;
            let dialect = dialect_of(path).unwrap_or_else(|| Dialect::sniff(&text));
            Some(SourceUnit::new(path.display().to_string(), dialect, text))
        })
        .collect()
}

fn dialect_of(path: &Path) -> Option<Dialect> {
    Dialect::from_ext(path.extension().and_then(|s| s.to_str()).unwrap_or(""))
}
