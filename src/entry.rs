//! Transcribes one filesystem object to or from one archive entry.
//!
//! Regular files stream through [`copy_data`]; directories become
//! zero-length `name/` marker entries; symlinks are recorded as entries
//! whose payload is the target path, relative to the link's own directory.
//! Permission bits travel along where the platform records them.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::archive::{Archive, EntryMeta, EntrySelector};
use crate::copy::copy_data;
use crate::error::BatchError;
use crate::progress::{Flow, ProgressSink};
use crate::{fsx, paths};

/// Writes the filesystem object at `source` into the archive as `dest_name`.
///
/// Requires a write-capable archive mode. Symlinks are never followed: the
/// entry payload becomes the (relativized) target path and the progress
/// sink receives a single `1.0` report.
pub fn write_entry(
    archive: &mut Archive,
    source: &Path,
    dest_name: &str,
    mut progress: Option<&mut dyn ProgressSink>,
) -> Result<Flow, BatchError> {
    let meta = fsx::symlink_metadata(source).map_err(|e| BatchError::io(e, source))?;

    if meta.file_type().is_symlink() {
        let target = fsx::read_link(source).map_err(|e| BatchError::io(e, source))?;
        let target = if target.is_absolute() {
            paths::relative_to(&target, source.parent().unwrap_or_else(|| Path::new("")))
        } else {
            target
        };
        archive.add_symlink_entry(
            dest_name,
            &target.to_string_lossy(),
            fsx::maybe_unix_mode(&meta),
        )?;
        if crate::progress::report(&mut progress, 1.0).is_cancel() {
            return Ok(Flow::Cancel);
        }
        return Ok(Flow::Continue);
    }

    let mut input = File::open(source).map_err(|e| BatchError::io(e, source))?;
    let sink = archive.start_entry(dest_name, fsx::maybe_unix_mode(&meta))?;
    copy_data(&mut input, sink, meta.len(), progress)
}

/// Writes a zero-length directory-marker entry for `dir` named `dest_name`.
pub fn write_dir_entry(
    archive: &mut Archive,
    dir: &Path,
    dest_name: &str,
) -> Result<(), BatchError> {
    let mode = fsx::symlink_metadata(dir).ok().as_ref().and_then(fsx::maybe_unix_mode);
    archive.add_dir_entry(dest_name, mode)
}

/// Extracts the selected entry to `dest`.
///
/// Requires `Unzip` mode. Parent directories are created as needed;
/// directory-marker entries create the directory itself and apply recorded
/// permissions; symlink entries are materialized as filesystem symlinks. On
/// any failure or cancellation mid-stream the partially written destination
/// file is removed before returning, so a failed entry never leaves debris
/// for the batch-level rollback to miss.
pub fn read_entry<R: Read + std::io::Seek>(
    archive: &mut Archive<R>,
    selector: EntrySelector<'_>,
    dest: &Path,
    mut progress: Option<&mut dyn ProgressSink>,
) -> Result<Flow, BatchError> {
    let mut entry = archive.open_entry(selector)?;
    let meta = EntryMeta::of(&entry);

    if meta.is_dir {
        fsx::create_dir_all(dest).map_err(|e| BatchError::io(e, dest))?;
        if let Some(mode) = meta.mode.filter(|m| *m != 0) {
            fsx::set_unix_permissions(dest, mode).map_err(|e| BatchError::io(e, dest))?;
        }
        // Marker entries have no payload; the slot still completes.
        if crate::progress::report(&mut progress, 1.0).is_cancel() {
            return Ok(Flow::Cancel);
        }
        return Ok(Flow::Continue);
    }

    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            fsx::create_dir_all(parent).map_err(|e| BatchError::io(e, parent))?;
        }
    }

    if meta.is_symlink {
        let mut payload = Vec::with_capacity(meta.size as usize);
        entry.read_to_end(&mut payload).map_err(|e| BatchError::io(e, dest))?;
        let target = String::from_utf8_lossy(&payload).into_owned();
        fsx::symlink(Path::new(&target), dest).map_err(|e| BatchError::io(e, dest))?;
        if crate::progress::report(&mut progress, 1.0).is_cancel() {
            fsx::discard_file(dest);
            return Ok(Flow::Cancel);
        }
        return Ok(Flow::Continue);
    }

    let mut output = File::create(dest).map_err(|e| BatchError::io(e, dest))?;
    let flow = match copy_data(&mut entry, &mut output, meta.size, progress) {
        Ok(flow) => flow,
        Err(e) => {
            drop(output);
            fsx::discard_file(dest);
            return Err(e);
        }
    };
    drop(output);
    if flow.is_cancel() {
        fsx::discard_file(dest);
        return Ok(Flow::Cancel);
    }

    if let Some(mode) = meta.mode.filter(|m| *m != 0) {
        fsx::set_unix_permissions(dest, mode).map_err(|e| BatchError::io(e, dest))?;
    }
    Ok(Flow::Continue)
}
