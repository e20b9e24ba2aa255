#![allow(dead_code)]

use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Once;

use resume_intake::store::{SpreadsheetStore, StoreOptions};
use resume_intake::workspace::Workspace;

static INIT: Once = Once::new();

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Fresh workspace under `dir` plus its default workbook.
pub fn workspace_with_store(dir: &Path, options: StoreOptions) -> (Workspace, SpreadsheetStore) {
    let workspace = Workspace::init(dir.join("workspace")).expect("Failed to init workspace");
    let store =
        SpreadsheetStore::open(workspace.default_workbook(), options).expect("Failed to open store");
    (workspace, store)
}

/// Packs one paragraph per line into a DOCX.
pub fn docx_bytes(lines: &[&str]) -> Vec<u8> {
    use docx_rs::*;

    let docx = lines.iter().fold(Docx::new(), |docx, line| {
        docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*line)))
    });
    let mut buffer = Cursor::new(Vec::new());
    docx.build().pack(&mut buffer).expect("Failed to pack DOCX");
    buffer.into_inner()
}

pub fn write_docx(path: &Path, lines: &[&str]) -> PathBuf {
    fs::write(path, docx_bytes(lines)).expect("Failed to write DOCX fixture");
    path.to_path_buf()
}

pub fn resume_lines<'a>(name: &'a str, email: &'a str) -> Vec<&'a str> {
    vec![
        name,
        email,
        "+1 (555) 201-3344",
        "Summary: backend engineer with 6+ years of experience",
        "Skills: Rust, Python, Docker, PostgreSQL",
    ]
}
