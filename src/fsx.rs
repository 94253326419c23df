//! Cross-platform filesystem wrapper.
//!
//! On Unix we transparently re-export std::fs and preserve POSIX permission
//! bits when archiving and extracting. On Windows permission bits and
//! symlink creation degrade gracefully: modes are not applied and symlink
//! entries are materialized as file symlinks where the platform allows it.
//!
//! The rest of the crate imports `crate::fsx::*` instead of touching
//! `std::fs` directly, keeping the call-sites identical across OSes.

use std::io;
use std::path::Path;

pub use std::fs::*;

#[cfg(not(target_os = "windows"))]
/// Set POSIX permission bits on Unix.
pub fn set_unix_permissions(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode & 0o7777))
}

#[cfg(target_os = "windows")]
/// No-op on Windows: POSIX permission bits are not preserved.
pub fn set_unix_permissions(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(not(target_os = "windows"))]
/// Full unix mode (file type + permission bits) of already-fetched metadata.
pub fn maybe_unix_mode(meta: &Metadata) -> Option<u32> {
    use std::os::unix::fs::MetadataExt;
    Some(meta.mode())
}

#[cfg(target_os = "windows")]
pub fn maybe_unix_mode(_meta: &Metadata) -> Option<u32> {
    None
}

#[cfg(not(target_os = "windows"))]
/// Create a symbolic link at `link` pointing to `target`.
pub fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(target_os = "windows")]
pub fn symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

/// Best-effort removal of every path produced by a failed batch operation,
/// newest first so directories empty out before their own removal.
///
/// Failures are logged and swallowed: rollback must never mask the error
/// that triggered it.
pub fn remove_outputs(paths: &[std::path::PathBuf]) {
    for path in paths.iter().rev() {
        let result = match symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => remove_dir(path),
            Ok(_) => remove_file(path),
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "rollback: could not remove output");
        }
    }
}

/// Best-effort removal of a single file, used to discard a partially
/// written archive or entry.
pub fn discard_file(path: &Path) {
    if let Err(e) = remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "rollback: could not remove file");
        }
    }
}
