//! Path normalization utilities for project-graph
//!
//! Two descriptor paths denote the same project when their absolute,
//! lexically normalized, case-insensitive forms are equal. The canonical
//! key produced here is the identity used by the loader's visited set and
//! by the load statistics; it is computed once per discovery and never
//! recomputed for an accepted project.

use std::path::{Component, Path, PathBuf};

/// Turn a path into an absolute, lexically normalized form.
///
/// Relative paths are joined to the current working directory. `.` segments
/// are dropped and `..` segments pop their parent where one exists. No
/// symlink resolution and no filesystem access takes place, so the result
/// is well defined for paths that do not (yet) exist.
pub fn absolutize(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // Popping past the root leaves the root in place.
                if !normalized.pop() {
                    normalized.push(component.as_os_str());
                }
            }
            _ => normalized.push(component.as_os_str()),
        }
    }
    normalized
}

/// Compute the case-insensitive canonical identity key for a project path.
pub fn canonical_key(path: &Path) -> String {
    absolutize(path).to_string_lossy().to_lowercase()
}

/// Resolve a reference target against the directory of the descriptor that
/// declared it. Absolute targets are used verbatim; relative targets are
/// joined to the declaring directory. Either way the result is normalized
/// to an absolute path.
pub fn resolve_reference(target: &str, declaring_directory: &Path) -> PathBuf {
    let raw = Path::new(target);
    if raw.is_absolute() {
        absolutize(raw)
    } else {
        absolutize(&declaring_directory.join(raw))
    }
}
