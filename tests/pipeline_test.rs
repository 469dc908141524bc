mod common;

use spellguard::engine::native::NativeEngine;
use spellguard::scan::pipeline::BatchState;
use spellguard::{Config, Error, Pipeline};
use std::fs;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tempfile::TempDir;

fn engine(support: &TempDir) -> NativeEngine {
    let config = Config {
        dictionary: Some(common::dictionary(support.path())),
        ..Default::default()
    };
    NativeEngine::new(&config)
}

#[test]
fn test_nested_folders_are_scanned_in_order() {
    let docs = TempDir::new().unwrap();
    let support = TempDir::new().unwrap();
    fs::create_dir(docs.path().join("sub")).unwrap();
    common::write_docx(docs.path(), "b.docx", &["teh fox"]);
    common::write_docx(&docs.path().join("sub"), "a.docx", &["the dgo"]);
    fs::write(docs.path().join("~$b.docx"), b"lock").unwrap();

    let mut service = engine(&support);
    let extensions = spellguard::config::default_extensions();
    let mut pipeline = Pipeline::new(&mut service, &extensions);
    let mut seen = Vec::new();
    let report = pipeline
        .run(docs.path(), |p| seen.push((p.current, p.total)))
        .unwrap();

    assert_eq!(pipeline.state(), BatchState::Done);
    assert_eq!(seen, vec![(1, 2), (2, 2)]);
    assert!(report.failures.is_empty());
    let words: Vec<_> = report
        .records
        .iter()
        .map(|r| (r.document_file_name.as_str(), r.misspelled_text.as_str()))
        .collect();
    assert_eq!(words, vec![("b.docx", "teh"), ("a.docx", "dgo")]);
}

#[test]
fn test_legacy_doc_is_a_contained_failure() {
    let docs = TempDir::new().unwrap();
    let support = TempDir::new().unwrap();
    let mut legacy = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
    legacy.extend_from_slice(&[0; 504]);
    fs::write(docs.path().join("old.doc"), legacy).unwrap();
    common::write_docx(docs.path(), "new.docx", &["hello wrold"]);

    let mut service = engine(&support);
    let extensions = spellguard::config::default_extensions();
    let report = Pipeline::new(&mut service, &extensions)
        .run(docs.path(), |_| {})
        .unwrap();

    assert_eq!(report.files_processed, 2);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(report.failures[0].error, Error::DocumentOpen { .. }));
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].document_file_name, "new.docx");
}

#[test]
fn test_cancel_before_start_processes_nothing() {
    let docs = TempDir::new().unwrap();
    let support = TempDir::new().unwrap();
    common::write_docx(docs.path(), "a.docx", &["teh"]);

    let mut service = engine(&support);
    let extensions = spellguard::config::default_extensions();
    let report = Pipeline::new(&mut service, &extensions)
        .with_cancel(Arc::new(AtomicBool::new(true)))
        .run(docs.path(), |_| {})
        .unwrap();

    assert!(report.cancelled);
    assert_eq!(report.files_processed, 0);
    assert_eq!(report.files_total, 1);
}
