use pretty_assertions::assert_eq;

mod common;
use common::{init_test_logger, resume_lines, workspace_with_store, write_docx};

use resume_intake::intelligence::FieldExtractor;
use resume_intake::processing::FileLoader;
use resume_intake::services::{IngestionOrchestrator, NullSink};
use resume_intake::store::{SpreadsheetStore, StoreOptions};

fn ingest_two(dir: &std::path::Path) -> SpreadsheetStore {
    let jane = write_docx(
        &dir.join("jane.docx"),
        &resume_lines("Jane Doe", "jane.doe@example.com"),
    );
    let ravi = write_docx(
        &dir.join("ravi.docx"),
        &resume_lines("Ravi Kumar", "ravi.kumar@example.org"),
    );

    let (workspace, store) = workspace_with_store(dir, StoreOptions::default());
    let mut orchestrator =
        IngestionOrchestrator::new(FileLoader::new(), FieldExtractor::default(), store, workspace);
    let report = orchestrator.run(&[jane, ravi], &mut NullSink).unwrap();
    assert_eq!(report.accepted(), 2);
    orchestrator.into_store()
}

#[test]
fn test_column_edits_survive_reopen() {
    init_test_logger();
    let dir = tempfile::tempdir().unwrap();
    let mut store = ingest_two(dir.path());

    store.add_column("Notes", Some(2)).unwrap();
    store.rename_column("phone", "Mobile").unwrap();
    store.move_column("S.No.", 10).unwrap();
    assert!(store.backup_path().exists());

    let reopened = SpreadsheetStore::open(store.path(), StoreOptions::default()).unwrap();
    assert_eq!(
        reopened.columns(),
        &[
            "Name",
            "Notes",
            "Email",
            "Mobile",
            "OriginalFile",
            "DateApplied",
            "ResumePath",
            "S.No."
        ]
    );

    let jane = &reopened.rows()[0];
    assert_eq!(jane[0], "Jane Doe");
    assert_eq!(jane[1], "");
    assert_eq!(jane[2], "jane.doe@example.com");
    assert_eq!(jane[3], "+1 (555) 201-3344");
    assert_eq!(jane[7], "1");

    // Serials continue from the row count after a reopen.
    assert_eq!(reopened.next_serial(), 3);
}

#[test]
fn test_filtered_projection_exports_to_csv() {
    init_test_logger();
    let dir = tempfile::tempdir().unwrap();
    let store = ingest_two(dir.path());

    let columns = vec!["Email".to_string(), "Name".to_string()];
    let view = store.view(Some("RAVI"), Some(columns.as_slice())).unwrap();
    assert_eq!(view.rows().len(), 1);

    let destination = dir.path().join("shortlist.csv");
    assert_eq!(store.export_visible(&view, &destination).unwrap(), 1);

    let mut reader = csv::Reader::from_path(&destination).unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(header, vec!["Email", "Name"]);

    let rows: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    assert_eq!(rows, vec![vec!["ravi.kumar@example.org", "Ravi Kumar"]]);
}

#[test]
fn test_unknown_projection_column_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let (_, store) = workspace_with_store(dir.path(), StoreOptions::default());
    let columns = vec!["Salary".to_string()];
    assert!(store.view(None, Some(columns.as_slice())).is_err());
}
