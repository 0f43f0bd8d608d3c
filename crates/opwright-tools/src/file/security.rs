//! Path validation for project-rooted file access

use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};
use tracing::warn;

/// Folders never included in project snapshots.
pub const SNAPSHOT_SKIP_DIRS: &[&str] = &[".git", "node_modules", "target", "dist", ".next"];

/// Resolve `path` against `root`, rejecting anything that escapes it.
///
/// Absolute paths are accepted only when they already lie under `root`.
/// The deepest existing part of the path is canonicalized, so a symlink
/// inside the project cannot lead outside it.
pub fn resolve_in_root(root: &Path, path: &str) -> Result<PathBuf> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("path must not be empty".to_string()));
    }
    if trimmed.contains('\0') {
        return Err(Error::InvalidInput("path contains a NUL byte".to_string()));
    }

    let candidate = Path::new(trimmed);
    let relative = if candidate.is_absolute() {
        candidate.strip_prefix(root).map_err(|_| {
            warn!(path = %trimmed, root = %root.display(), "Absolute path outside project");
            Error::PermissionDenied(format!("'{}' is outside the project", trimmed))
        })?
    } else {
        candidate
    };

    let mut resolved = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::Normal(part) => resolved.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                warn!(path = %trimmed, "Path traversal attempt detected");
                return Err(Error::PermissionDenied(
                    "Path traversal (..) is not allowed".to_string(),
                ));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::PermissionDenied(format!(
                    "'{}' is outside the project",
                    trimmed
                )));
            }
        }
    }
    ensure_inside_root(root, &resolved, trimmed)?;
    Ok(resolved)
}

fn ensure_inside_root(root: &Path, resolved: &Path, original: &str) -> Result<()> {
    // A missing root has nothing under it to follow.
    let Ok(canonical_root) = root.canonicalize() else {
        return Ok(());
    };

    let mut existing = resolved;
    while existing.symlink_metadata().is_err() {
        if existing == root {
            return Ok(());
        }
        match existing.parent() {
            Some(parent) => existing = parent,
            None => return Ok(()),
        }
    }

    let canonical = existing.canonicalize().map_err(|e| {
        warn!(path = %original, error = %e, "Failed to canonicalize path");
        Error::PermissionDenied(format!("Cannot resolve path '{}': {}", original, e))
    })?;
    if !canonical.starts_with(&canonical_root) {
        warn!(
            path = %original,
            resolved = %canonical.display(),
            "Symlink escape blocked: path resolves outside the project"
        );
        return Err(Error::PermissionDenied(format!(
            "'{}' resolves outside the project",
            original
        )));
    }
    Ok(())
}

/// Whether `resolved` is the project root itself
pub fn is_project_root(root: &Path, resolved: &Path) -> bool {
    resolved == root
}
