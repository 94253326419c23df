//! Path-safety, cancellation and rollback behavior of the batch operations.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::tempdir;

use zipbatch::{
    compress_dir, compress_files, extract_dir, extract_files, Archive, BatchError, FilterSet, Mode,
};

// ---------- helpers ----------

fn write_text(path: &Path, text: &str) {
    File::create(path).unwrap().write_all(text.as_bytes()).unwrap();
}

/// Builds an archive by driving the codec directly, so tests can smuggle in
/// entry names the compressor would never produce.
fn craft_archive(path: &Path, entries: &[(&str, &str)]) {
    let file = File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    for (name, contents) in entries {
        writer
            .start_file(*name, zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap();
}

// ---------- zip-slip ----------

#[test]
fn traversal_entry_is_skipped_not_extracted() {
    let sandbox = tempdir().unwrap();
    let arch = sandbox.path().join("evil.zip");
    craft_archive(&arch, &[("good.txt", "ok"), ("../../evil.txt", "pwned")]);

    // Nest the extraction root two levels down so the traversal would land
    // inside the sandbox if it were honored.
    let root = sandbox.path().join("deep/out");
    fs::create_dir_all(&root).unwrap();

    let produced = extract_dir(&arch, &root, None).unwrap();
    assert_eq!(produced.len(), 1);
    assert!(produced[0].ends_with("good.txt"));
    assert_eq!(fs::read_to_string(root.join("good.txt")).unwrap(), "ok");
    assert!(!sandbox.path().join("evil.txt").exists());
    assert!(!sandbox.path().join("deep/evil.txt").exists());
}

#[test]
fn absolute_entry_name_is_skipped() {
    let sandbox = tempdir().unwrap();
    let arch = sandbox.path().join("abs.zip");
    craft_archive(&arch, &[("/etc/zipbatch_abs_test", "nope"), ("ok.txt", "ok")]);

    let root = sandbox.path().join("out");
    fs::create_dir_all(&root).unwrap();
    let produced = extract_dir(&arch, &root, None).unwrap();
    assert_eq!(produced.len(), 1);
    assert!(!Path::new("/etc/zipbatch_abs_test").exists());
}

#[test]
fn skipped_unsafe_entry_still_ticks_progress() {
    let sandbox = tempdir().unwrap();
    let arch = sandbox.path().join("tick.zip");
    craft_archive(&arch, &[("../escape.txt", "x"), ("kept.txt", "x")]);

    let root = sandbox.path().join("deep/out");
    fs::create_dir_all(&root).unwrap();
    let mut seen = Vec::new();
    let mut cb = |f: f64| {
        seen.push(f);
        false
    };
    extract_dir(&arch, &root, Some(&mut cb)).unwrap();
    // The unsafe slot ticks 0.5, the real entry finishes at 1.0.
    assert_eq!(seen, vec![0.5, 1.0]);
}

#[test]
fn unsafe_list_entries_are_skipped_in_named_extraction() {
    let sandbox = tempdir().unwrap();
    let arch = sandbox.path().join("named.zip");
    craft_archive(&arch, &[("../escape.txt", "x"), ("kept.txt", "keep")]);

    let root = sandbox.path().join("deep/out");
    fs::create_dir_all(&root).unwrap();
    let produced = extract_files(&arch, &["../escape.txt", "kept.txt"], &root, None).unwrap();
    assert_eq!(produced.len(), 1);
    assert!(root.join("kept.txt").exists());
    assert!(!sandbox.path().join("deep/escape.txt").exists());
}

// ---------- cancellation ----------

#[test]
fn cancelled_extraction_rolls_back_everything() {
    let src = tempdir().unwrap();
    for name in ["a.txt", "b.txt", "c.txt"] {
        write_text(&src.path().join(name), name);
    }
    let arch_dir = tempdir().unwrap();
    let arch = arch_dir.path().join("cancel.zip");
    compress_dir(&arch, src.path(), true, FilterSet::default(), None).unwrap();

    let out = tempdir().unwrap();
    // Let the first entry through, cancel while the second reports.
    let mut cb = |f: f64| f > 0.4;
    let err = extract_files(&arch, &["a.txt", "b.txt", "c.txt"], out.path(), Some(&mut cb))
        .unwrap_err();
    assert!(matches!(err, BatchError::Cancelled));
    for name in ["a.txt", "b.txt", "c.txt"] {
        assert!(!out.path().join(name).exists(), "{name} survived the rollback");
    }
}

#[test]
fn cancelled_compression_leaves_no_archive() {
    let src = tempdir().unwrap();
    for name in ["a.txt", "b.txt"] {
        write_text(&src.path().join(name), name);
    }
    let arch_dir = tempdir().unwrap();
    let arch = arch_dir.path().join("cancel.zip");

    let mut cb = |_f: f64| true;
    let err = compress_dir(&arch, src.path(), true, FilterSet::default(), Some(&mut cb))
        .unwrap_err();
    assert!(matches!(err, BatchError::Cancelled));
    assert!(!arch.exists());
}

// ---------- failure rollback ----------

#[test]
fn missing_source_fails_and_leaves_no_partial_archive() {
    let src = tempdir().unwrap();
    write_text(&src.path().join("real.txt"), "real");

    let arch_dir = tempdir().unwrap();
    let arch = arch_dir.path().join("partial.zip");
    let sources = vec![src.path().join("real.txt"), src.path().join("ghost.txt")];

    let err = compress_files(&arch, &sources, None).unwrap_err();
    assert!(matches!(err, BatchError::Io { .. }));
    assert!(!arch.exists(), "failed compression left an archive behind");
}

#[test]
fn failed_entry_rolls_back_earlier_extractions() {
    let sandbox = tempdir().unwrap();
    let arch = sandbox.path().join("fail.zip");
    craft_archive(&arch, &[("a.txt", "a"), ("b.txt", "b")]);

    let out = sandbox.path().join("out");
    // Occupying b.txt with a directory makes its File::create fail after
    // a.txt has already been extracted.
    fs::create_dir_all(out.join("b.txt")).unwrap();

    let err = extract_dir(&arch, &out, None).unwrap_err();
    assert!(matches!(err, BatchError::Io { .. }));
    assert!(!out.join("a.txt").exists(), "a.txt survived the rollback");
}

// ---------- mode enforcement ----------

#[test]
fn read_operations_require_unzip_mode() {
    let sandbox = tempdir().unwrap();
    let arch = sandbox.path().join("mode.zip");
    let mut archive = Archive::open_for_write(&arch, Mode::Create).unwrap();
    let err = archive.entry_names().unwrap_err();
    assert!(matches!(err, BatchError::InvalidMode { .. }));
}

#[test]
fn unzip_is_rejected_as_a_write_mode() {
    let sandbox = tempdir().unwrap();
    let arch = sandbox.path().join("mode2.zip");
    let err = Archive::open_for_write(&arch, Mode::Unzip).unwrap_err();
    assert!(matches!(err, BatchError::InvalidMode { .. }));
}

#[test]
fn append_mode_extends_an_existing_archive() {
    let src = tempdir().unwrap();
    write_text(&src.path().join("first.txt"), "1");
    write_text(&src.path().join("second.txt"), "2");

    let arch_dir = tempdir().unwrap();
    let arch = arch_dir.path().join("append.zip");
    compress_files(&arch, &[src.path().join("first.txt")], None).unwrap();

    let mut archive = Archive::open_for_write(&arch, Mode::Append).unwrap();
    zipbatch::entry::write_entry(&mut archive, &src.path().join("second.txt"), "second.txt", None)
        .unwrap();
    archive.finalize().unwrap();

    assert_eq!(
        zipbatch::list_entries(&arch).unwrap(),
        vec!["first.txt".to_string(), "second.txt".to_string()]
    );
}
