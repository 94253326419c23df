//! # zipbatch Core Library
//!
//! Batch archiving and extraction over whole directory trees: "zip this
//! folder" / "unzip this archive" semantics without driving the underlying
//! codec entry by entry.
//!
//! Every operation reports fractional progress through an optional callback
//! and can be cancelled mid-flight by returning `true` from it. Failed or
//! cancelled operations roll back whatever they had already produced: a
//! failed compression leaves no archive file, a failed extraction removes
//! every path it had written. Extraction refuses entry names that would
//! escape the destination root (zip-slip), skipping them silently.
//!
//! ## Key Modules
//!
//! - [`compress`]: Pack a file, a file list or a directory tree into an archive.
//! - [`extract`]: Unpack an archive (or a subset of it) and list its entries.
//! - [`archive`]: The mode-enforcing handle over the zip codec.
//! - [`walk`]: Recursive directory traversal with equal-weight progress shares.
//! - [`progress`]: Progress scaling and cancellation plumbing.
//! - [`paths`]: Lexical path hygiene, including the zip-slip guard.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! let mut on_progress = |fraction: f64| {
//!     println!("{:.0}%", fraction * 100.0);
//!     false // return true to cancel
//! };
//! zipbatch::compress_dir(
//!     Path::new("backup.zip"),
//!     Path::new("photos/"),
//!     true,
//!     zipbatch::FilterSet::default(),
//!     Some(&mut on_progress),
//! )?;
//! let produced = zipbatch::extract_dir(Path::new("backup.zip"), Path::new("restored/"), None)?;
//! println!("restored {} entries", produced.len());
//! # Ok::<(), zipbatch::BatchError>(())
//! ```

pub mod archive;
pub mod compress;
pub mod copy;
pub mod entry;
pub mod error;
pub mod extract;
pub mod filter;
pub mod paths;
pub mod progress;
pub mod walk;

// Cross-platform filesystem wrapper
pub mod fsx;

pub use archive::{Archive, EntryMeta, EntrySelector, Mode};
pub use compress::{compress_dir, compress_file, compress_files};
pub use error::BatchError;
pub use extract::{
    extract_dir, extract_dir_with, extract_file, extract_file_with, extract_files,
    extract_files_with, list_entries, list_entries_with,
};
pub use filter::FilterSet;
pub use progress::{Flow, ProgressSink, Scaled};
