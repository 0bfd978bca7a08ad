//! Path validation
//!
//! Maps client-supplied names onto host paths below a root directory.

use std::path::{Path, PathBuf};

use crate::error::StorageError;

/// Returns the cleaned, slash-separated components of `name`.
///
/// `.` segments and empty segments are dropped and `..` pops the previous
/// component, never going above the root.
pub fn clean_components(name: &str) -> Vec<&str> {
    let mut components = Vec::new();
    for segment in name.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            other => components.push(other),
        }
    }
    components
}

/// Resolves `name` against `root`, refusing names that could address
/// anything outside of it.
pub fn resolve_under_root(root: &Path, name: &str) -> Result<PathBuf, StorageError> {
    if name.contains('\0') {
        return Err(StorageError::InvalidPath(name.escape_default().to_string()));
    }
    if std::path::MAIN_SEPARATOR != '/' && name.contains(std::path::MAIN_SEPARATOR) {
        return Err(StorageError::InvalidPath(name.to_string()));
    }

    let mut path = root.to_path_buf();
    for component in clean_components(name) {
        path.push(component);
    }
    Ok(path)
}
