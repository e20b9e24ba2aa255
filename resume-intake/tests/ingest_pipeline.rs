use std::cell::Cell;
use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;

mod common;
use common::{init_test_logger, resume_lines, workspace_with_store, write_docx};

use resume_intake::error::{ErrorKind, IntakeError, Result};
use resume_intake::intelligence::FieldExtractor;
use resume_intake::models::{DocumentType, FileOutcome, FileStatus};
use resume_intake::processing::extractors::ExtractedContent;
use resume_intake::processing::{DocumentLoader, FileLoader};
use resume_intake::services::{IngestionOrchestrator, NullSink};
use resume_intake::store::StoreOptions;

/// Counts calls and returns a canned resume keyed on the file stem.
struct CountingLoader {
    calls: Cell<usize>,
}

impl DocumentLoader for CountingLoader {
    fn load(&self, path: &Path) -> Result<ExtractedContent> {
        self.calls.set(self.calls.get() + 1);
        let stem = path.file_stem().unwrap().to_string_lossy();
        let doc_type = DocumentType::from_path(path).unwrap();
        Ok(ExtractedContent::new(
            format!("Candidate Person\n{stem}@example.com\n"),
            doc_type,
        ))
    }
}

#[test]
fn test_directory_walk_only_loads_supported_files() {
    init_test_logger();
    let dir = tempfile::tempdir().unwrap();
    let inbox = dir.path().join("inbox");
    fs::create_dir_all(inbox.join("nested")).unwrap();
    for name in ["a.pdf", "b.PDF", "nested/c.pdf", "d.docx", "nested/e.docx", "notes.txt"] {
        fs::write(inbox.join(name), "x").unwrap();
    }

    let (workspace, store) = workspace_with_store(dir.path(), StoreOptions::default());
    let loader = CountingLoader {
        calls: Cell::new(0),
    };
    let mut orchestrator =
        IngestionOrchestrator::new(loader, FieldExtractor::default(), store, workspace);

    let mut statuses = Vec::new();
    let mut sink = |o: &FileOutcome| statuses.push((o.file.clone(), o.status.clone()));
    let report = orchestrator.run(&[inbox], &mut sink).unwrap();

    assert_eq!(report.total(), 6);
    assert_eq!(report.accepted(), 5);
    assert_eq!(report.failed(), 1);

    let (_, status) = statuses
        .iter()
        .find(|(file, _)| file == "notes.txt")
        .unwrap();
    assert!(matches!(
        status,
        FileStatus::Failed {
            kind: ErrorKind::UnsupportedFormat,
            ..
        }
    ));

    let store = orchestrator.into_store();
    assert_eq!(store.len(), 5);
    let serials: Vec<&str> = store.rows().iter().map(|r| r[0].as_str()).collect();
    assert_eq!(serials, vec!["1", "2", "3", "4", "5"]);
}

#[test]
fn test_corrupt_pdf_fails_and_batch_continues() {
    init_test_logger();
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.pdf");
    fs::write(&broken, b"%PDF-1.7\n1 0 obj\n<< /Length 999 >>\nstream\n").unwrap();
    let good = write_docx(
        &dir.path().join("zara.docx"),
        &resume_lines("Zara Ahmed", "zara.ahmed@example.com"),
    );

    let (workspace, store) = workspace_with_store(dir.path(), StoreOptions::default());
    let error_log = workspace.error_log();
    let mut orchestrator =
        IngestionOrchestrator::new(FileLoader::new(), FieldExtractor::default(), store, workspace);

    let report = orchestrator.run(&[broken, good], &mut NullSink).unwrap();

    assert_eq!(report.failed(), 1);
    assert_eq!(report.accepted(), 1);
    assert!(matches!(
        report.outcomes[0].status,
        FileStatus::Failed {
            kind: ErrorKind::ExtractionFailure,
            ..
        }
    ));

    let log = fs::read_to_string(error_log.path()).unwrap();
    assert!(log.contains("broken.pdf\tExtractionFailure\t"));
    assert!(!log.contains("zara.docx"));
}

#[test]
fn test_docx_end_to_end() {
    init_test_logger();
    let dir = tempfile::tempdir().unwrap();
    let cv = write_docx(
        &dir.path().join("Priya Resume.docx"),
        &resume_lines("Priya Sharma", "Priya.Sharma@Example.com"),
    );

    let (workspace, store) = workspace_with_store(dir.path(), StoreOptions::default());
    let resumes_dir = workspace.resumes_dir();
    let mut orchestrator =
        IngestionOrchestrator::new(FileLoader::new(), FieldExtractor::default(), store, workspace);

    let report = orchestrator.run(&[cv.clone()], &mut NullSink).unwrap();
    assert_eq!(report.accepted(), 1);

    let store = orchestrator.into_store();
    let columns = store.columns().to_vec();
    let row = &store.rows()[0];
    let cell = |name: &str| row[columns.iter().position(|c| c == name).unwrap()].clone();

    assert_eq!(cell("S.No."), "1");
    assert_eq!(cell("Name"), "Priya Sharma");
    assert_eq!(cell("Email"), "priya.sharma@example.com");
    assert_eq!(cell("Phone"), "+1 (555) 201-3344");
    assert_eq!(cell("OriginalFile"), "Priya Resume.docx");
    assert!(chrono::DateTime::parse_from_rfc3339(&cell("DateApplied")).is_ok());

    let archived = Path::new(&cell("ResumePath")).to_path_buf();
    assert_eq!(archived, resumes_dir.join("Priya Resume.docx"));
    assert_eq!(fs::read(&archived).unwrap(), fs::read(&cv).unwrap());
}

#[test]
fn test_duplicate_email_across_runs() {
    init_test_logger();
    let dir = tempfile::tempdir().unwrap();
    let first = write_docx(
        &dir.path().join("first.docx"),
        &resume_lines("Omar Khan", "omar@example.com"),
    );
    let second = write_docx(
        &dir.path().join("second.docx"),
        &resume_lines("Omar Khan", "OMAR@example.com"),
    );

    let (workspace, store) = workspace_with_store(dir.path(), StoreOptions::default());
    let mut orchestrator = IngestionOrchestrator::new(
        FileLoader::new(),
        FieldExtractor::default(),
        store,
        workspace.clone(),
    );
    orchestrator.run(&[first], &mut NullSink).unwrap();

    // Reopen from disk so the check runs against persisted rows.
    let (workspace, store) = workspace_with_store(dir.path(), StoreOptions::default());
    let mut orchestrator =
        IngestionOrchestrator::new(FileLoader::new(), FieldExtractor::default(), store, workspace);
    let report = orchestrator.run(&[second], &mut NullSink).unwrap();

    assert_eq!(report.rejected(), 1);
    let status = report.outcomes[0].status.to_string();
    assert!(status.contains("omar@example.com"), "{status}");
    assert_eq!(orchestrator.store().len(), 1);

    let archived: Vec<_> = fs::read_dir(dir.path().join("workspace/resumes"))
        .unwrap()
        .collect();
    assert_eq!(archived.len(), 1);
}

#[test]
fn test_unwritable_workbook_aborts_batch() {
    init_test_logger();
    let dir = tempfile::tempdir().unwrap();
    let a = write_docx(&dir.path().join("a.docx"), &resume_lines("Ann Lee", "ann@example.com"));
    let b = write_docx(&dir.path().join("b.docx"), &resume_lines("Ben Ng", "ben@example.com"));

    let (workspace, store) = workspace_with_store(dir.path(), StoreOptions::default());
    // A directory where the temp file should go makes every save fail.
    let mut tmp = store.path().as_os_str().to_owned();
    tmp.push(".tmp");
    fs::create_dir_all(&tmp).unwrap();

    let mut orchestrator =
        IngestionOrchestrator::new(FileLoader::new(), FieldExtractor::default(), store, workspace);
    let mut seen = 0;
    let mut sink = |_: &FileOutcome| seen += 1;
    let err = orchestrator.run(&[a, b], &mut sink).unwrap_err();

    assert!(matches!(err, IntakeError::WriteFailure(_)));
    assert_eq!(seen, 1);
    assert_eq!(orchestrator.store().len(), 0);
}
