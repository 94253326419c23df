//! Batch compression entry points.
//!
//! Each operation owns the archive lifecycle: open in `Create` mode
//! (building the archive path's parent directories first), feed entries
//! through the transcriber, finalize. There is no partial-archive recovery:
//! any failure or cancellation deletes the half-written archive before the
//! error is returned, so a failed compression leaves nothing behind.

use std::path::{Path, PathBuf};

use crate::archive::{Archive, Mode};
use crate::entry::{write_dir_entry, write_entry};
use crate::error::BatchError;
use crate::filter::FilterSet;
use crate::progress::{BoolSink, Flow, ProgressSink, Scaled};
use crate::walk::{walk, TreeVisitor, Visit};
use crate::{fsx, paths};

/// Compresses a single file into a fresh archive, stored under its base
/// name.
pub fn compress_file(
    dest_archive: &Path,
    source_file: &Path,
    progress: Option<&mut dyn FnMut(f64) -> bool>,
) -> Result<(), BatchError> {
    tracing::debug!(archive = %dest_archive.display(), source = %source_file.display(), "compress_file");
    let dest_name = source_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| BatchError::StripPrefix {
            prefix: source_file.to_path_buf(),
            path: source_file.to_path_buf(),
        })?;
    let mut sink = progress.map(BoolSink::new);
    let mut sink_ref = sink.as_mut().map(|s| s as &mut dyn ProgressSink);

    run_create(dest_archive, |archive| {
        write_entry(archive, source_file, &dest_name, sink_ref.take())
    })
}

/// Compresses an explicit list of files into a fresh archive, each stored
/// under its base name, in list order. A missing source fails the whole
/// batch.
pub fn compress_files<P: AsRef<Path>>(
    dest_archive: &Path,
    source_files: &[P],
    progress: Option<&mut dyn FnMut(f64) -> bool>,
) -> Result<(), BatchError> {
    tracing::debug!(archive = %dest_archive.display(), count = source_files.len(), "compress_files");
    let mut sink = progress.map(BoolSink::new);
    let mut sink_ref = sink.as_mut().map(|s| s as &mut dyn ProgressSink);
    let total = source_files.len() as f64;

    run_create(dest_archive, |archive| {
        for (index, source) in source_files.iter().enumerate() {
            let source = source.as_ref();
            let dest_name = source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .ok_or_else(|| BatchError::StripPrefix {
                    prefix: source.to_path_buf(),
                    path: source.to_path_buf(),
                })?;
            let flow = match sink_ref.as_mut() {
                Some(parent) => {
                    let lo = index as f64 / total;
                    let hi = (index + 1) as f64 / total;
                    let mut share = Scaled::new(&mut **parent, lo, hi);
                    write_entry(archive, source, &dest_name, Some(&mut share))?
                }
                None => write_entry(archive, source, &dest_name, None)?,
            };
            if flow.is_cancel() {
                return Ok(Flow::Cancel);
            }
        }
        Ok(Flow::Continue)
    })
}

/// Compresses a directory tree into a fresh archive.
///
/// Entry names are relative to `source_dir`; subdirectories get `name/`
/// marker entries. Progress weights every direct child of a level equally,
/// so it is not linear in bytes when file sizes differ. If the archive is
/// being created inside its own source tree it is skipped rather than
/// archived into itself.
pub fn compress_dir(
    dest_archive: &Path,
    source_dir: &Path,
    recursive: bool,
    filters: FilterSet,
    progress: Option<&mut dyn FnMut(f64) -> bool>,
) -> Result<(), BatchError> {
    tracing::debug!(archive = %dest_archive.display(), dir = %source_dir.display(), recursive, "compress_dir");
    let mut sink = progress.map(BoolSink::new);
    let mut sink_ref = sink.as_mut().map(|s| s as &mut dyn ProgressSink);
    let own_path = paths::absolute(dest_archive).ok();

    run_create(dest_archive, |archive| {
        let mut visitor = DirCompressor { archive, origin: source_dir, own_path };
        walk(source_dir, recursive, &filters, sink_ref.take(), &mut visitor)
    })
}

/// Opens a fresh archive at `dest`, runs `build`, finalizes. Every exit
/// except full success removes the destination file.
fn run_create(
    dest: &Path,
    build: impl FnOnce(&mut Archive) -> Result<Flow, BatchError>,
) -> Result<(), BatchError> {
    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fsx::create_dir_all(parent).map_err(|e| BatchError::io(e, parent))?;
        }
    }
    let mut archive = Archive::open_for_write(dest, Mode::Create)?;
    match build(&mut archive) {
        Ok(Flow::Continue) => {}
        Ok(Flow::Cancel) => {
            drop(archive);
            fsx::discard_file(dest);
            return Err(BatchError::Cancelled);
        }
        Err(e) => {
            drop(archive);
            fsx::discard_file(dest);
            return Err(e);
        }
    }
    if let Err(e) = archive.finalize() {
        fsx::discard_file(dest);
        return Err(e);
    }
    Ok(())
}

struct DirCompressor<'a> {
    archive: &'a mut Archive,
    origin: &'a Path,
    /// Absolute path of the archive being produced, so it never swallows
    /// itself when it lives inside the source tree.
    own_path: Option<PathBuf>,
}

impl TreeVisitor for DirCompressor<'_> {
    fn enter_dir(&mut self, dir: &Path) -> Result<(), BatchError> {
        let name = format!("{}/", paths::archive_name(self.origin, dir)?);
        write_dir_entry(self.archive, dir, &name)
    }

    fn visit_file(
        &mut self,
        file: &Path,
        progress: Option<&mut dyn ProgressSink>,
    ) -> Result<Visit, BatchError> {
        if let Some(own) = &self.own_path {
            if paths::absolute(file).map(|p| &p == own).unwrap_or(false) {
                return Ok(Visit::Skipped);
            }
        }
        let name = paths::archive_name(self.origin, file)?;
        match write_entry(self.archive, file, &name, progress)? {
            Flow::Continue => Ok(Visit::Done),
            Flow::Cancel => Ok(Visit::Cancelled),
        }
    }
}
