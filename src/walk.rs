//! Recursive directory traversal with equal-weight progress shares.
//!
//! The walker enumerates one directory level at a time, hands each child to
//! a [`TreeVisitor`], and recurses into subdirectories with a
//! [`Scaled`](crate::progress::Scaled) sub-range of the caller's progress
//! sink. Every direct child (file, or subdirectory when recursive) gets an
//! equal share of the level's `[0, 1]` range, whatever its size.
//!
//! Cancellation travels up as `Ok(Flow::Cancel)`: it is a request honored
//! silently, not an error. Genuine enumeration or visitor failures abort
//! the walk immediately without touching the remaining siblings.

use std::path::{Path, PathBuf};

use crate::error::BatchError;
use crate::filter::FilterSet;
use crate::fsx;
use crate::progress::{Flow, ProgressSink, Scaled};

/// What the visitor did with a file it was offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    /// The file was processed; its progress share was consumed by the
    /// visitor's own reports.
    Done,
    /// The visitor declined the file; the walker ticks its progress slot so
    /// sibling indices stay consistent.
    Skipped,
    /// A progress report inside the visitor asked to stop.
    Cancelled,
}

/// Receives the entries discovered by [`walk`].
pub trait TreeVisitor {
    /// Called once per subdirectory, before the walker descends into it.
    fn enter_dir(&mut self, dir: &Path) -> Result<(), BatchError>;

    /// Called once per file. `progress` covers this file's share of the
    /// current level.
    fn visit_file(
        &mut self,
        file: &Path,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<Visit, BatchError>;
}

/// Walks `dir`, offering files (and, when `recursive`, subdirectory trees)
/// to `visitor` in name order.
pub fn walk(
    dir: &Path,
    recursive: bool,
    filters: &FilterSet,
    mut progress: Option<&mut dyn ProgressSink>,
    visitor: &mut dyn TreeVisitor,
) -> Result<Flow, BatchError> {
    let (subdirs, files) = enumerate(dir, filters)?;

    // Fixed once per level; zero children means nothing to report and no
    // division happens at all.
    let total = (files.len() + if recursive { subdirs.len() } else { 0 }) as f64;
    let mut count = 0usize;

    if recursive {
        for subdir in &subdirs {
            visitor.enter_dir(subdir)?;
            let lo = count as f64 / total;
            let hi = (count + 1) as f64 / total;
            let flow = match progress.as_mut() {
                Some(parent) => {
                    let mut share = Scaled::new(&mut **parent, lo, hi);
                    walk(subdir, recursive, filters, Some(&mut share), visitor)?
                }
                None => walk(subdir, recursive, filters, None, visitor)?,
            };
            if flow.is_cancel() {
                return Ok(Flow::Cancel);
            }
            count += 1;
        }
    }

    for file in &files {
        let lo = count as f64 / total;
        let hi = (count + 1) as f64 / total;
        let visit = match progress.as_mut() {
            Some(parent) => {
                let mut share = Scaled::new(&mut **parent, lo, hi);
                visitor.visit_file(file, Some(&mut share))?
            }
            None => visitor.visit_file(file, None)?,
        };
        match visit {
            Visit::Done => count += 1,
            Visit::Skipped => {
                count += 1;
                // Tick the declined slot so progress still advances past it.
                if crate::progress::report(&mut progress, count as f64 / total).is_cancel() {
                    return Ok(Flow::Cancel);
                }
            }
            Visit::Cancelled => return Ok(Flow::Cancel),
        }
    }

    Ok(Flow::Continue)
}

/// Immediate children of `dir` matching `filters`, split into
/// subdirectories and files, each name-sorted. Symlinks always count as
/// files (they are archived as link records, never followed).
fn enumerate(dir: &Path, filters: &FilterSet) -> Result<(Vec<PathBuf>, Vec<PathBuf>), BatchError> {
    let entries = fsx::read_dir(dir).map_err(|e| BatchError::Walk { source: e, dir: dir.to_path_buf() })?;

    let mut subdirs = Vec::new();
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| BatchError::Walk { source: e, dir: dir.to_path_buf() })?;
        let file_type = entry
            .file_type()
            .map_err(|e| BatchError::Walk { source: e, dir: dir.to_path_buf() })?;
        let name = entry.file_name();
        let name = name.to_string_lossy();

        if file_type.is_dir() {
            if filters.admits_dir(&name) {
                subdirs.push(entry.path());
            }
        } else if filters.admits_file(&name, file_type.is_symlink()) {
            files.push(entry.path());
        }
    }
    subdirs.sort();
    files.sort();
    Ok((subdirs, files))
}
