mod common;

use pretty_assertions::assert_eq;
use tempfile::tempdir;
use ytxcodec::prelude::*;

use common::{build_ytx, two_by_two, write_fixture};

#[test]
fn test_compare_path_normalizes_both_sides() {
    let doc = YtxDocument::new("C:\\data\\file.ytx").unwrap();
    assert!(doc.compare_path("C:/data/file.ytx"));
    assert!(doc.compare_path("  \"C:\\data\\file.ytx\"  "));
    assert!(!doc.compare_path("C:/data/other.ytx"));
}

#[test]
fn test_load_edit_save_cycle() {
    let dir = tempdir().unwrap();
    let path = write_fixture(dir.path(), "menu.ytx", &two_by_two());

    let mut doc = YtxDocument::open(&path, YtxOptions::default()).unwrap();
    assert!(doc.is_valid());
    assert_eq!(doc.name(), "menu.ytx");
    assert_eq!(doc.raw_bytes(), two_by_two().as_slice());

    doc.remove_entry(0x21, 0x2).unwrap();
    let report = doc.save_changes().unwrap();

    assert_eq!(report.path, dir.path().join("menu.ytx.out"));
    let written = std::fs::read(&report.path).unwrap();
    assert_eq!(
        written,
        build_ytx(&[
            (0x1, &[(0x10, "Hello"), (0x11, "World!")]),
            (0x2, &[(0x20, "Caf\u{e9}")]),
        ])
    );
    assert_eq!(report.bytes_written, written.len());

    // Source untouched, backup holds the original bytes
    assert_eq!(std::fs::read(&path).unwrap(), two_by_two());
    assert_eq!(
        std::fs::read(dir.path().join("menu.ytx.bak")).unwrap(),
        two_by_two()
    );
}

#[test]
fn test_mutation_errors_surface_without_changes() {
    let dir = tempdir().unwrap();
    let path = write_fixture(dir.path(), "menu.ytx", &two_by_two());
    let mut doc = YtxDocument::open(&path, YtxOptions::new().with_create_backup(false)).unwrap();

    assert!(matches!(
        doc.add_entry("hello", 0x10, 0x1),
        Err(Error::DuplicateEntryId { .. })
    ));
    assert!(matches!(
        doc.add_entry("hello", 0x10, 0x9),
        Err(Error::InvalidSection(0x9))
    ));
    assert!(matches!(
        doc.remove_entry(0x99, 0x2),
        Err(Error::EntryNotFound { .. })
    ));

    let mut pristine = parse_ytx_bytes(&two_by_two()).unwrap();
    serialize_ytx(&mut pristine).unwrap();
    doc.reassemble().unwrap();
    assert_eq!(doc.file(), &pristine);
}

#[test]
fn test_failed_save_is_reported_and_edits_kept() {
    let dir = tempdir().unwrap();
    let path = write_fixture(dir.path(), "menu.ytx", &two_by_two());
    let target = dir.path().join("missing-dir").join("out.ytx");

    let options = YtxOptions::new()
        .with_create_backup(false)
        .with_output(OutputTarget::Path(target.clone()));
    let mut doc = YtxDocument::open(&path, options).unwrap();
    doc.add_entry("kept", 0x12, 0x1).unwrap();

    assert!(matches!(doc.save_changes(), Err(Error::Io(_))));
    assert!(!target.exists());
    assert_eq!(doc.file().entry(0x12, 0x1).unwrap().text, "kept");
    assert!(doc.is_valid());
}

#[test]
fn test_in_place_save_reloads() {
    let dir = tempdir().unwrap();
    let path = write_fixture(dir.path(), "menu.ytx", &two_by_two());

    let options = YtxOptions::new().with_output(OutputTarget::InPlace);
    let mut doc = YtxDocument::open(&path, options.clone()).unwrap();
    doc.set_entry_text(0x11, 0x1, "Everyone!").unwrap();
    doc.save_changes().unwrap();

    let reloaded = YtxDocument::open(&path, options).unwrap();
    assert_eq!(reloaded.file().entry(0x11, 0x1).unwrap().text, "Everyone!");
    assert_eq!(reloaded.file().entry(0x10, 0x1).unwrap().text, "Hello");
    assert_eq!(
        std::fs::read(dir.path().join("menu.ytx.bak")).unwrap(),
        two_by_two()
    );
}

#[test]
fn test_background_load_and_save() {
    let dir = tempdir().unwrap();
    let path = write_fixture(dir.path(), "menu.ytx", &two_by_two());

    let options = YtxOptions::new().with_create_backup(false);
    let mut doc = spawn_load(path.clone(), options).unwrap().wait().unwrap();
    doc.add_entry("async", 0x22, 0x2).unwrap();

    let SaveOutcome { document, result } = spawn_save(doc).unwrap().wait().unwrap();
    let report = result.unwrap();
    assert_eq!(document.sections()[1].entry_count(), 3);

    let saved = read_ytx(&report.path).unwrap();
    assert_eq!(saved.entry(0x22, 0x2).unwrap().text, "async");
}

#[test]
fn test_background_save_failure_returns_document() {
    let dir = tempdir().unwrap();
    let path = write_fixture(dir.path(), "menu.ytx", &two_by_two());
    let options = YtxOptions::new()
        .with_create_backup(false)
        .with_output(OutputTarget::Path(dir.path().join("nope").join("x.ytx")));

    let mut doc = YtxDocument::open(&path, options).unwrap();
    doc.add_entry("unsaved", 0x12, 0x1).unwrap();

    let outcome = spawn_save(doc).unwrap().wait().unwrap();
    assert!(outcome.result.is_err());
    assert_eq!(
        outcome.document.file().entry(0x12, 0x1).unwrap().text,
        "unsaved"
    );
}

#[test]
fn test_batch_stats_over_directory() {
    let dir = tempdir().unwrap();
    std::fs::create_dir(dir.path().join("sub")).unwrap();
    write_fixture(dir.path(), "a.ytx", &two_by_two());
    write_fixture(&dir.path().join("sub"), "b.ytx", &build_ytx(&[(0x5, &[(0x1, "")])]));

    let files = find_ytx_files(dir.path());
    assert_eq!(files.len(), 2);

    let batch = collect_stats(&files, |_, _, _| {});
    assert!(batch.failures.is_empty());
    let total = batch.total();
    assert_eq!(total.sections, 3);
    assert_eq!(total.entries, 5);
    assert_eq!(total.empty_entries, 1);
}

#[test]
fn test_save_reports_lossy_text() {
    let dir = tempdir().unwrap();
    let mut bytes = two_by_two();
    // First code unit of "Hello" becomes a lone high surrogate
    bytes[0x50..0x52].copy_from_slice(&[0xD8, 0x00]);
    let path = write_fixture(dir.path(), "menu.ytx", &bytes);

    let mut doc = YtxDocument::open(&path, YtxOptions::new().with_create_backup(false)).unwrap();
    assert_eq!(doc.file().entry(0x10, 0x1).unwrap().text, "\u{FFFD}ello");

    let report = doc.save_changes().unwrap();
    assert_eq!(
        report.warnings,
        vec![Warning::LossyText {
            section: 0x1,
            entry: 0x10
        }]
    );

    doc.set_entry_text(0x10, 0x1, "Hello").unwrap();
    assert!(doc.save_changes().unwrap().warnings.is_empty());
}

