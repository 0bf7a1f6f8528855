//! Path containment.
//!
//! Every path derived from an origin (subtree names, archive entry names,
//! config file references) is joined onto a root through [`contained_join`].
//! Two checks apply:
//!
//! 1. Lexical: only normal segments and `.` are accepted. `..`, absolute
//!    paths and drive prefixes are rejected outright.
//! 2. Physical: the deepest existing ancestor of the joined path must
//!    canonicalize inside the canonical root, so a symlink planted in the
//!    destination cannot redirect a write.

use super::ResourceError;
use std::path::{Component, Path, PathBuf};

/// Rejects anything but a plain relative path.
///
/// # Errors
///
/// Returns [`ResourceError::Escape`] for `..`, root or prefix components.
pub fn validate_relative(rel: &Path, root: &Path) -> Result<(), ResourceError> {
    let ok = rel
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
    if ok {
        Ok(())
    } else {
        Err(ResourceError::escape(rel.display().to_string(), root))
    }
}

/// Joins `rel` onto `root`, refusing any result outside `root`.
///
/// `root` need not exist yet; when it does, symlinks along the existing
/// part of the joined path are resolved and checked.
///
/// # Errors
///
/// Returns [`ResourceError::Escape`] when the path leaves `root`, or
/// [`ResourceError::Io`] if canonicalization fails.
pub fn contained_join(root: &Path, rel: impl AsRef<Path>) -> Result<PathBuf, ResourceError> {
    let rel = rel.as_ref();
    validate_relative(rel, root)?;
    let joined = root.join(rel);

    if !root.exists() {
        return Ok(joined);
    }
    let canonical_root = root
        .canonicalize()
        .map_err(|e| ResourceError::io(root, e))?;

    let mut ancestor = joined.as_path();
    loop {
        if ancestor.exists() {
            let canonical_ancestor = ancestor
                .canonicalize()
                .map_err(|e| ResourceError::io(ancestor, e))?;
            if !canonical_ancestor.starts_with(&canonical_root) {
                return Err(ResourceError::escape(rel.display().to_string(), root));
            }
            return Ok(joined);
        }
        match ancestor.parent() {
            Some(p) if !p.as_os_str().is_empty() => ancestor = p,
            _ => return Ok(joined),
        }
    }
}
