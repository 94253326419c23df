//! Path hygiene for extraction and archive entry naming.
//!
//! Entry names come out of the archive untrusted: a crafted name like
//! `../../etc/passwd` must never cause a write outside the extraction root
//! (the classic zip-slip attack). All normalization here is purely lexical,
//! nothing touches the filesystem.

use std::path::{Component, Path, PathBuf};

use crate::error::BatchError;

/// Lexically normalizes a path: collapses `.` segments and resolves `..`
/// against preceding normal components. Leading `..` segments on a relative
/// path are kept, since there is nothing to pop them against.
pub fn clean_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                // Pop a normal component if we have one; a rooted path never
                // escapes above its root, while a relative one keeps the
                // leading `..`.
                let last_is_normal =
                    matches!(out.components().next_back(), Some(Component::Normal(_)));
                if last_is_normal {
                    out.pop();
                } else if !out.has_root() {
                    out.push(Component::ParentDir);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Returns true iff extracting an entry named `entry_name` under `root`
/// cannot escape `root`.
///
/// The joined path is cleaned lexically and must still be component-prefixed
/// by the cleaned root; the root itself (empty entry name) is safe. Entries
/// failing this check are skipped by the callers, not treated as errors.
pub fn is_safe(root: &Path, entry_name: &str) -> bool {
    let clean_root = clean_path(root);
    let candidate = clean_path(&root.join(entry_name));
    candidate.starts_with(&clean_root)
}

/// Lexically computes `path` relative to `base`, walking up with `..` where
/// the two diverge. Both inputs are cleaned first; no symlinks are resolved.
///
/// Used when archiving a symlink whose target is absolute: the recorded
/// target is made relative to the link's own directory, so the link still
/// resolves after the tree is extracted somewhere else.
pub fn relative_to(path: &Path, base: &Path) -> PathBuf {
    let path = clean_path(path);
    let base = clean_path(base);

    let mut path_iter = path.components();
    let mut base_iter = base.components();
    let mut out = PathBuf::new();

    loop {
        match (path_iter.clone().next(), base_iter.clone().next()) {
            (Some(p), Some(b)) if p == b => {
                path_iter.next();
                base_iter.next();
            }
            (_, None) => break,
            _ => {
                // Remaining base components each cost one step up.
                for _ in base_iter.by_ref() {
                    out.push(Component::ParentDir);
                }
                break;
            }
        }
    }
    for comp in path_iter {
        out.push(comp);
    }
    out
}

/// Builds the forward-slash archive name for `path` inside the tree rooted
/// at `root`.
pub fn archive_name(root: &Path, path: &Path) -> Result<String, BatchError> {
    let rel = path.strip_prefix(root).map_err(|_| BatchError::StripPrefix {
        prefix: root.to_path_buf(),
        path: path.to_path_buf(),
    })?;
    let mut name = String::new();
    for comp in rel.components() {
        if !name.is_empty() {
            name.push('/');
        }
        name.push_str(&comp.as_os_str().to_string_lossy());
    }
    Ok(name)
}

/// Absolute form of `path` without resolving symlinks: relative paths are
/// joined onto the current working directory, then cleaned lexically.
pub fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(clean_path(path))
    } else {
        Ok(clean_path(&std::env::current_dir()?.join(path)))
    }
}
