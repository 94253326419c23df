//! Chunked byte copying with periodic progress reports.
//!
//! The foundational primitive for both the compress and extract paths: one
//! readable stream in, one writable stream out, a progress report roughly
//! every 400 KiB, and a cancellation check piggybacked on every report.

use std::io::{ErrorKind, Read, Write};

use crate::error::BatchError;
use crate::progress::{Flow, ProgressSink};

/// Read granularity.
const CHUNK_SIZE: usize = 4096;

/// Bytes between two progress reports.
const REPORT_INTERVAL: u64 = 400 * 1024;

/// Copies `src` to `dst` until end-of-stream.
///
/// `total` is the expected uncompressed size, used only as the progress
/// denominator; when it is zero the intermediate fractions stay at zero and
/// only the final report reaches `1.0`. Each chunk is written in full before
/// the next read; a sink that stops accepting bytes is a hard
/// [`BatchError::ShortWrite`].
///
/// Returns `Ok(Flow::Cancel)` as soon as a report is answered with a
/// cancellation request. The final `1.0` report is made unconditionally once
/// the stream is exhausted, and its answer is honored too, so a copy can be
/// "complete but cancelled" -- the caller decides what that means for the
/// surrounding batch.
pub fn copy_data<R: Read + ?Sized, W: Write + ?Sized>(
    src: &mut R,
    dst: &mut W,
    total: u64,
    mut progress: Option<&mut dyn ProgressSink>,
) -> Result<Flow, BatchError> {
    let mut buf = [0u8; CHUNK_SIZE];
    let mut read_total: u64 = 0;
    let mut since_report: u64 = 0;

    loop {
        let n = match src.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        dst.write_all(&buf[..n]).map_err(|e| {
            if e.kind() == ErrorKind::WriteZero {
                BatchError::ShortWrite
            } else {
                e.into()
            }
        })?;

        read_total += n as u64;
        since_report += n as u64;
        if since_report > REPORT_INTERVAL {
            since_report = 0;
            let fraction = if total > 0 { read_total as f64 / total as f64 } else { 0.0 };
            if crate::progress::report(&mut progress, fraction).is_cancel() {
                return Ok(Flow::Cancel);
            }
        }
    }

    if crate::progress::report(&mut progress, 1.0).is_cancel() {
        return Ok(Flow::Cancel);
    }
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::BoolSink;
    use std::io::Cursor;

    #[test]
    fn copies_all_bytes_and_finishes_at_one() {
        let data = vec![7u8; 1024 * 1024];
        let mut src = Cursor::new(data.clone());
        let mut dst = Vec::new();
        let mut seen = Vec::new();
        let mut cb = |f: f64| {
            seen.push(f);
            false
        };
        let mut sink = BoolSink::new(&mut cb);
        let flow = copy_data(&mut src, &mut dst, data.len() as u64, Some(&mut sink)).unwrap();
        assert_eq!(flow, Flow::Continue);
        assert_eq!(dst, data);
        assert!(seen.len() >= 2, "expected interval reports plus the final 1.0");
        assert_eq!(*seen.last().unwrap(), 1.0);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn cancel_stops_mid_copy() {
        let data = vec![0u8; 2 * 1024 * 1024];
        let mut src = Cursor::new(data);
        let mut dst = Vec::new();
        let mut cb = |_f: f64| true;
        let mut sink = BoolSink::new(&mut cb);
        let flow = copy_data(&mut src, &mut dst, 2 * 1024 * 1024, Some(&mut sink)).unwrap();
        assert_eq!(flow, Flow::Cancel);
        assert!(dst.len() < 2 * 1024 * 1024);
    }

    #[test]
    fn final_report_cancel_is_still_cancel() {
        // Source smaller than the report interval: the only report is the
        // final 1.0, and cancelling there must still surface as Cancel even
        // though every byte was transferred.
        let data = vec![1u8; 100];
        let mut src = Cursor::new(data.clone());
        let mut dst = Vec::new();
        let mut cb = |f: f64| f >= 1.0;
        let mut sink = BoolSink::new(&mut cb);
        let flow = copy_data(&mut src, &mut dst, 100, Some(&mut sink)).unwrap();
        assert_eq!(flow, Flow::Cancel);
        assert_eq!(dst, data);
    }

    #[test]
    fn empty_source_reports_only_the_final_one() {
        let mut src = Cursor::new(Vec::<u8>::new());
        let mut dst = Vec::new();
        let mut seen = Vec::new();
        let mut cb = |f: f64| {
            seen.push(f);
            false
        };
        let mut sink = BoolSink::new(&mut cb);
        copy_data(&mut src, &mut dst, 0, Some(&mut sink)).unwrap();
        assert_eq!(seen, vec![1.0]);
    }

    #[test]
    fn no_progress_sink_is_fine() {
        let mut src = Cursor::new(vec![3u8; 5000]);
        let mut dst = Vec::new();
        let flow = copy_data(&mut src, &mut dst, 5000, None).unwrap();
        assert_eq!(flow, Flow::Continue);
        assert_eq!(dst.len(), 5000);
    }
}
