//! Batch extraction and listing entry points.
//!
//! Every extraction keeps a pending-output list of the paths it has created
//! so far; on any failure or cancellation all of them are removed
//! (best-effort, newest first) before the error surfaces, so callers never
//! see a half-extracted tree next to an error. Entry names that would
//! escape the destination root are skipped silently, with their progress
//! slot still ticked.
//!
//! The `*_with` variants operate on an already-open [`Archive`] over any
//! seekable reader; the plain variants open a filesystem path and are
//! otherwise identical.

use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use crate::archive::{Archive, EntrySelector};
use crate::entry::read_entry;
use crate::error::BatchError;
use crate::progress::{BoolSink, Flow, ProgressSink, Scaled};
use crate::{fsx, paths};

/// Extracts the named entry to `dest_path`, returning the absolute path it
/// was written to.
pub fn extract_file(
    archive_path: &Path,
    entry_name: &str,
    dest_path: &Path,
    progress: Option<&mut dyn FnMut(f64) -> bool>,
) -> Result<PathBuf, BatchError> {
    let mut archive = Archive::open_path(archive_path)?;
    extract_file_with(&mut archive, entry_name, dest_path, progress)
}

/// [`extract_file`] over an already-open archive.
pub fn extract_file_with<R: Read + Seek>(
    archive: &mut Archive<R>,
    entry_name: &str,
    dest_path: &Path,
    progress: Option<&mut dyn FnMut(f64) -> bool>,
) -> Result<PathBuf, BatchError> {
    tracing::debug!(entry = entry_name, dest = %dest_path.display(), "extract_file");
    let mut sink = progress.map(BoolSink::new);
    let sink_ref = sink.as_mut().map(|s| s as &mut dyn ProgressSink);
    let dest = paths::absolute(dest_path).map_err(|e| BatchError::io(e, dest_path))?;

    match read_entry(archive, EntrySelector::Name(entry_name), &dest, sink_ref)? {
        Flow::Continue => Ok(dest),
        Flow::Cancel => Err(BatchError::Cancelled),
    }
}

/// Extracts the named entries under `dest_dir`, in list order, returning
/// the absolute paths produced. Fails (and rolls back everything already
/// extracted) on the first error or cancellation.
pub fn extract_files<S: AsRef<str>>(
    archive_path: &Path,
    entry_names: &[S],
    dest_dir: &Path,
    progress: Option<&mut dyn FnMut(f64) -> bool>,
) -> Result<Vec<PathBuf>, BatchError> {
    let mut archive = Archive::open_path(archive_path)?;
    extract_files_with(&mut archive, entry_names, dest_dir, progress)
}

/// [`extract_files`] over an already-open archive.
pub fn extract_files_with<R: Read + Seek, S: AsRef<str>>(
    archive: &mut Archive<R>,
    entry_names: &[S],
    dest_dir: &Path,
    progress: Option<&mut dyn FnMut(f64) -> bool>,
) -> Result<Vec<PathBuf>, BatchError> {
    tracing::debug!(count = entry_names.len(), dest = %dest_dir.display(), "extract_files");
    let mut sink = progress.map(BoolSink::new);
    let mut sink_ref = sink.as_mut().map(|s| s as &mut dyn ProgressSink);

    let names: Vec<&str> = entry_names.iter().map(|n| n.as_ref()).collect();
    extract_batch(archive, &names, dest_dir, &mut sink_ref, |_index, name| {
        EntrySelector::Name(name)
    })
}

/// Extracts the whole archive under `dest_dir`, returning the absolute
/// paths produced in on-disk entry order.
pub fn extract_dir(
    archive_path: &Path,
    dest_dir: &Path,
    progress: Option<&mut dyn FnMut(f64) -> bool>,
) -> Result<Vec<PathBuf>, BatchError> {
    let mut archive = Archive::open_path(archive_path)?;
    extract_dir_with(&mut archive, dest_dir, progress)
}

/// [`extract_dir`] over an already-open archive.
pub fn extract_dir_with<R: Read + Seek>(
    archive: &mut Archive<R>,
    dest_dir: &Path,
    progress: Option<&mut dyn FnMut(f64) -> bool>,
) -> Result<Vec<PathBuf>, BatchError> {
    tracing::debug!(dest = %dest_dir.display(), "extract_dir");
    let mut sink = progress.map(BoolSink::new);
    let mut sink_ref = sink.as_mut().map(|s| s as &mut dyn ProgressSink);

    let names = archive.entry_names()?;
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    extract_batch(archive, &names, dest_dir, &mut sink_ref, |index, _name| {
        EntrySelector::Index(index)
    })
}

/// Lists entry names in on-disk order. Produces no filesystem output, so
/// there is nothing to roll back.
pub fn list_entries(archive_path: &Path) -> Result<Vec<String>, BatchError> {
    let mut archive = Archive::open_path(archive_path)?;
    list_entries_with(&mut archive)
}

/// [`list_entries`] over an already-open archive.
pub fn list_entries_with<R: Read + Seek>(
    archive: &mut Archive<R>,
) -> Result<Vec<String>, BatchError> {
    archive.entry_names()
}

/// Shared extraction loop: safety-check each name, give it an equal share
/// of the progress range, collect produced paths, roll back on any exit
/// that isn't full success.
fn extract_batch<'n, R: Read + Seek>(
    archive: &mut Archive<R>,
    names: &[&'n str],
    dest_dir: &Path,
    sink_ref: &mut Option<&mut dyn ProgressSink>,
    select: impl Fn(usize, &'n str) -> EntrySelector<'n>,
) -> Result<Vec<PathBuf>, BatchError> {
    let total = names.len() as f64;
    let mut extracted: Vec<PathBuf> = Vec::new();

    for (index, &name) in names.iter().enumerate() {
        if !paths::is_safe(dest_dir, name) {
            tracing::warn!(entry = name, "skipping entry that escapes the extraction root");
            // The slot still ticks so progress keeps advancing past it.
            let tick = (index + 1) as f64 / total;
            if crate::progress::report(sink_ref, tick).is_cancel() {
                fsx::remove_outputs(&extracted);
                return Err(BatchError::Cancelled);
            }
            continue;
        }

        let dest = dest_dir.join(name);
        let dest = match paths::absolute(&dest) {
            Ok(p) => p,
            Err(e) => {
                fsx::remove_outputs(&extracted);
                return Err(BatchError::io(e, dest));
            }
        };

        let result = match sink_ref.as_mut() {
            Some(parent) => {
                let lo = index as f64 / total;
                let hi = (index + 1) as f64 / total;
                let mut share = Scaled::new(&mut **parent, lo, hi);
                read_entry(archive, select(index, name), &dest, Some(&mut share))
            }
            None => read_entry(archive, select(index, name), &dest, None),
        };
        match result {
            Ok(Flow::Continue) => extracted.push(dest),
            Ok(Flow::Cancel) => {
                fsx::remove_outputs(&extracted);
                return Err(BatchError::Cancelled);
            }
            Err(e) => {
                fsx::remove_outputs(&extracted);
                return Err(e);
            }
        }
    }

    Ok(extracted)
}
