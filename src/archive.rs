//! Mode-enforcing wrapper around the zip codec.
//!
//! The batch layer never drives `zip` directly; everything goes through an
//! [`Archive`] handle that knows which mode it was opened in and rejects
//! operations that don't fit. A handle is opened at the start of one
//! top-level batch operation and finalized exactly once at its end.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, Write};
use std::path::Path;

use zip::read::{ZipArchive, ZipFile};
use zip::result::ZipError;
use zip::write::{FileOptions, ZipWriter};

use crate::error::BatchError;

/// The mode an archive handle was opened in.
///
/// `Create`, `Append` and `Add` are write-capable; `Unzip` is read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Create a fresh archive, truncating anything at the destination path.
    Create,
    /// Open an existing archive and add entries after the existing ones.
    Append,
    /// Alias mode for adding to an existing archive; behaves like `Append`
    /// but is kept as its own mode so callers can tell the intents apart.
    Add,
    /// Open an existing archive for reading.
    Unzip,
}

impl Mode {
    pub fn is_writable(self) -> bool {
        !matches!(self, Mode::Unzip)
    }
}

/// Metadata of one archive member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMeta {
    /// Archive-relative name, forward-slash separated. A trailing `/` marks
    /// a directory entry.
    pub name: String,
    /// True for directory-marker entries.
    pub is_dir: bool,
    /// True for entries recorded as symbolic links; their payload is the
    /// link target path.
    pub is_symlink: bool,
    /// Recorded unix mode, if any.
    pub mode: Option<u32>,
    /// Uncompressed payload size in bytes.
    pub size: u64,
}

impl EntryMeta {
    pub(crate) fn of(file: &ZipFile<'_>) -> Self {
        let mode = file.unix_mode();
        Self {
            name: file.name().to_string(),
            is_dir: file.is_dir(),
            is_symlink: mode.map_or(false, |m| m & 0o170000 == 0o120000),
            mode,
            size: file.size(),
        }
    }
}

/// Picks one entry of an open archive.
#[derive(Debug, Clone, Copy)]
pub enum EntrySelector<'a> {
    /// The entry with this exact archive name.
    Name(&'a str),
    /// The entry at this position in on-disk order.
    Index(usize),
}

enum Inner<R: Read + Seek> {
    // Option so finalize() can consume the writer; write handles are always
    // file-backed, read handles accept any seekable stream.
    Writer(Option<ZipWriter<File>>),
    Reader(ZipArchive<R>),
}

/// An open archive in exactly one [`Mode`].
pub struct Archive<R: Read + Seek = File> {
    mode: Mode,
    inner: Inner<R>,
}

impl<R: Read + Seek> std::fmt::Debug for Archive<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("mode", &self.mode)
            .field(
                "inner",
                match &self.inner {
                    Inner::Writer(_) => &"Writer",
                    Inner::Reader(_) => &"Reader",
                },
            )
            .finish()
    }
}

impl Archive<File> {
    /// Opens `path` in the given write-capable mode. `Create` truncates;
    /// `Append`/`Add` extend an existing archive.
    pub fn open_for_write(path: &Path, mode: Mode) -> Result<Self, BatchError> {
        let inner = match mode {
            Mode::Create => {
                let file = File::create(path).map_err(|e| BatchError::io(e, path))?;
                Inner::Writer(Some(ZipWriter::new(file)))
            }
            Mode::Append | Mode::Add => {
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .open(path)
                    .map_err(|e| BatchError::io(e, path))?;
                Inner::Writer(Some(ZipWriter::new_append(file)?))
            }
            Mode::Unzip => {
                return Err(BatchError::InvalidMode { expected: "a write-capable", actual: mode })
            }
        };
        Ok(Self { mode, inner })
    }

    /// Opens `path` for reading.
    pub fn open_path(path: &Path) -> Result<Self, BatchError> {
        let file = File::open(path).map_err(|e| BatchError::io(e, path))?;
        Self::from_reader(file)
    }
}

impl<R: Read + Seek> Archive<R> {
    /// Opens an already-open seekable stream for reading.
    pub fn from_reader(reader: R) -> Result<Self, BatchError> {
        let archive = ZipArchive::new(reader)?;
        Ok(Self { mode: Mode::Unzip, inner: Inner::Reader(archive) })
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn writer(&mut self) -> Result<&mut ZipWriter<File>, BatchError> {
        match &mut self.inner {
            Inner::Writer(Some(w)) => Ok(w),
            Inner::Writer(None) => {
                Err(BatchError::Codec(ZipError::InvalidArchive("archive already finalized")))
            }
            Inner::Reader(_) => {
                Err(BatchError::InvalidMode { expected: "a write-capable", actual: self.mode })
            }
        }
    }

    fn reader(&mut self) -> Result<&mut ZipArchive<R>, BatchError> {
        match &mut self.inner {
            Inner::Reader(a) => Ok(a),
            Inner::Writer(_) => {
                Err(BatchError::InvalidMode { expected: "Unzip", actual: self.mode })
            }
        }
    }

    /// Starts a regular file entry and returns the sink its payload is
    /// streamed into. The entry is finalized by the next `start_*`/`add_*`
    /// call or by [`Archive::finalize`].
    pub fn start_entry(
        &mut self,
        name: &str,
        unix_mode: Option<u32>,
    ) -> Result<&mut dyn Write, BatchError> {
        let writer = self.writer()?;
        writer.start_file(name, options_with_mode(unix_mode))?;
        Ok(writer)
    }

    /// Adds a zero-length directory-marker entry (`name/`).
    pub fn add_dir_entry(&mut self, name: &str, unix_mode: Option<u32>) -> Result<(), BatchError> {
        let writer = self.writer()?;
        writer.add_directory(name, options_with_mode(unix_mode))?;
        Ok(())
    }

    /// Adds a symlink entry whose payload is the raw target path. A symlink
    /// is just a byte array here; no specialized codec is involved.
    pub fn add_symlink_entry(
        &mut self,
        name: &str,
        target: &str,
        unix_mode: Option<u32>,
    ) -> Result<(), BatchError> {
        let writer = self.writer()?;
        writer.add_symlink(name, target, options_with_mode(unix_mode))?;
        Ok(())
    }

    /// Opens one entry for reading.
    pub fn open_entry(&mut self, selector: EntrySelector<'_>) -> Result<ZipFile<'_>, BatchError> {
        if self.mode != Mode::Unzip {
            return Err(BatchError::InvalidMode { expected: "Unzip", actual: self.mode });
        }
        let reader = self.reader()?;
        let file = match selector {
            EntrySelector::Name(name) => reader.by_name(name)?,
            EntrySelector::Index(index) => reader.by_index(index)?,
        };
        Ok(file)
    }

    pub fn entry_count(&mut self) -> Result<usize, BatchError> {
        Ok(self.reader()?.len())
    }

    /// Entry names in on-disk (central directory) order.
    pub fn entry_names(&mut self) -> Result<Vec<String>, BatchError> {
        let reader = self.reader()?;
        let mut names = Vec::with_capacity(reader.len());
        for index in 0..reader.len() {
            names.push(reader.by_index(index)?.name().to_string());
        }
        Ok(names)
    }

    /// Finalizes the archive. For write modes this writes the central
    /// directory; calling it again is a no-op. Read handles have nothing to
    /// flush.
    pub fn finalize(&mut self) -> Result<(), BatchError> {
        if let Inner::Writer(writer) = &mut self.inner {
            if let Some(mut w) = writer.take() {
                w.finish()?;
            }
        }
        Ok(())
    }
}

fn options_with_mode(unix_mode: Option<u32>) -> FileOptions {
    match unix_mode {
        Some(mode) => FileOptions::default().unix_permissions(mode),
        None => FileOptions::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_ops_rejected_in_unzip_mode() {
        // A reader over an empty zip (just the end-of-central-directory
        // record) is enough to exercise the mode checks.
        let empty_zip: &[u8] = &[
            0x50, 0x4b, 0x05, 0x06, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
        ];
        let mut archive = Archive::from_reader(std::io::Cursor::new(empty_zip)).unwrap();
        assert_eq!(archive.mode(), Mode::Unzip);
        assert!(matches!(
            archive.add_dir_entry("d/", None),
            Err(BatchError::InvalidMode { .. })
        ));
        assert_eq!(archive.entry_count().unwrap(), 0);
    }

    #[test]
    fn unzip_is_not_a_write_mode() {
        assert!(Mode::Create.is_writable());
        assert!(Mode::Append.is_writable());
        assert!(Mode::Add.is_writable());
        assert!(!Mode::Unzip.is_writable());
    }
}
