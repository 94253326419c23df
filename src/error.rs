use std::io;
use std::path::PathBuf;

use crate::archive::Mode;

/// The primary error type for all operations in the `zipbatch` crate.
#[derive(Debug)]
pub enum BatchError {
    /// The archive handle is in the wrong mode for the requested operation,
    /// e.g. trying to add an entry to an archive opened for reading.
    InvalidMode { expected: &'static str, actual: Mode },

    /// An I/O error occurred, typically while reading or writing a file.
    /// Includes the path where the error happened.
    Io { source: io::Error, path: PathBuf },

    /// An error occurred when trying to strip a prefix from a file path.
    StripPrefix { prefix: PathBuf, path: PathBuf },

    /// The underlying zip codec reported an error while adding, reading or
    /// finalizing an entry.
    Codec(zip::result::ZipError),

    /// The destination stream stopped accepting bytes before the copy was
    /// complete.
    ShortWrite,

    /// A progress callback requested cancellation of a top-level operation.
    /// Anything the operation had already produced has been rolled back.
    Cancelled,

    /// A directory could not be enumerated during tree traversal.
    Walk { source: io::Error, dir: PathBuf },
}

impl std::fmt::Display for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchError::InvalidMode { expected, actual } => {
                write!(f, "archive is open in {:?} mode, but {} mode is required", actual, expected)
            }
            BatchError::Io { source, path } => write!(f, "I/O error on path '{}': {}", path.display(), source),
            BatchError::StripPrefix { prefix, path } => {
                write!(f, "Could not strip prefix '{}' from path '{}'", prefix.display(), path.display())
            }
            BatchError::Codec(e) => write!(f, "Archive codec error: {}", e),
            BatchError::ShortWrite => write!(f, "Destination stream accepted no more bytes (short write)"),
            BatchError::Cancelled => write!(f, "Operation cancelled via progress callback"),
            BatchError::Walk { source, dir } => {
                write!(f, "Could not enumerate directory '{}': {}", dir.display(), source)
            }
        }
    }
}

impl std::error::Error for BatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchError::Io { source, .. } => Some(source),
            BatchError::Codec(e) => Some(e),
            BatchError::Walk { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<zip::result::ZipError> for BatchError {
    fn from(err: zip::result::ZipError) -> Self {
        BatchError::Codec(err)
    }
}

// Generic IO error conversion that doesn't carry a path
impl From<io::Error> for BatchError {
    fn from(err: io::Error) -> Self {
        BatchError::Io { source: err, path: PathBuf::new() }
    }
}

impl BatchError {
    /// Attach a path to a bare I/O error.
    pub(crate) fn io(source: io::Error, path: impl Into<PathBuf>) -> Self {
        BatchError::Io { source, path: path.into() }
    }
}
