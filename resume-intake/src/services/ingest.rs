use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::error::{IntakeError, Result};
use crate::intelligence::FieldExtractor;
use crate::models::{
    AppendOutcome, BatchReport, CandidateRecord, DocumentType, FileOutcome, FileStatus,
};
use crate::processing::{display_name, DocumentLoader, FileLoader};
use crate::store::{SpreadsheetStore, StoreOptions};
use crate::workspace::{ErrorLog, Workspace};

/// Receives each file's outcome as soon as it is known.
pub trait OutcomeSink {
    fn on_outcome(&mut self, outcome: &FileOutcome);
}

impl<F> OutcomeSink for F
where
    F: FnMut(&FileOutcome),
{
    fn on_outcome(&mut self, outcome: &FileOutcome) {
        self(outcome)
    }
}

/// Discards outcomes.
pub struct NullSink;

impl OutcomeSink for NullSink {
    fn on_outcome(&mut self, _outcome: &FileOutcome) {}
}

/// Expands directories recursively. Hidden entries are skipped, results are
/// sorted by path, and explicit file arguments are kept as given.
pub fn collect_inputs(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        let walker = WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name()));

        for entry in walker {
            match entry {
                Ok(entry) if entry.file_type().is_file() => files.push(entry.into_path()),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Skipping unreadable directory entry"),
            }
        }
    }

    files.sort();
    files.dedup();
    files
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// Opens the workbook at `path`. A failure is recorded in the workspace error
/// log under the workbook's file name before it is returned.
pub fn open_workbook(
    workspace: &Workspace,
    path: &Path,
    options: StoreOptions,
) -> Result<SpreadsheetStore> {
    SpreadsheetStore::open(path, options).map_err(|e| {
        let error_log = workspace.error_log();
        if let Err(log_error) = error_log.append(&display_name(path), e.kind(), &e.reason()) {
            error!(
                log = %error_log.path().display(),
                error = %log_error,
                "Failed to write error log"
            );
        }
        error!(workbook = %path.display(), error = %e, "Cannot open workbook");
        e
    })
}

/// Runs load, extract and append for every file in a batch.
///
/// One file failing never stops the batch. A workbook that can no longer be
/// written does, since every later append would fail the same way.
pub struct IngestionOrchestrator<L = FileLoader> {
    loader: L,
    extractor: FieldExtractor,
    store: SpreadsheetStore,
    workspace: Workspace,
    error_log: ErrorLog,
}

impl<L: DocumentLoader> IngestionOrchestrator<L> {
    pub fn new(
        loader: L,
        extractor: FieldExtractor,
        store: SpreadsheetStore,
        workspace: Workspace,
    ) -> Self {
        let error_log = workspace.error_log();
        Self {
            loader,
            extractor,
            store,
            workspace,
            error_log,
        }
    }

    pub fn store(&self) -> &SpreadsheetStore {
        &self.store
    }

    pub fn into_store(self) -> SpreadsheetStore {
        self.store
    }

    /// Processes `inputs` (files and/or directories) in path order.
    pub fn run(&mut self, inputs: &[PathBuf], sink: &mut dyn OutcomeSink) -> Result<BatchReport> {
        let files = collect_inputs(inputs);
        info!(
            files = files.len(),
            workbook = %self.store.path().display(),
            "Starting ingestion batch"
        );

        let mut report = BatchReport::default();

        for path in &files {
            let file = display_name(path);

            let (status, fatal) = match self.process_file(path) {
                Ok(status) => (status, None),
                Err(e) => (FileStatus::failed(&e), Some(e)),
            };

            if let FileStatus::Failed { kind, reason } = &status {
                warn!(file = %file, kind = %kind, reason = %reason, "File failed");
                if let Err(e) = self.error_log.append(&file, *kind, reason) {
                    error!(
                        log = %self.error_log.path().display(),
                        error = %e,
                        "Failed to write error log"
                    );
                }
            }

            let outcome = FileOutcome { file, status };
            sink.on_outcome(&outcome);
            report.push(outcome);

            if let Some(e) = fatal {
                error!(error = %e, "Workbook unusable, aborting batch");
                return Err(e);
            }
        }

        info!(
            total = report.total(),
            accepted = report.accepted(),
            rejected = report.rejected(),
            failed = report.failed(),
            "Ingestion batch complete"
        );
        Ok(report)
    }

    /// Status for a single file. `Err` only for workbook-level failures.
    pub fn process_file(&mut self, path: &Path) -> Result<FileStatus> {
        match self.try_process(path) {
            Ok(status) => Ok(status),
            Err(e) if e.is_workbook_fatal() => Err(e),
            Err(e) => Ok(FileStatus::failed(&e)),
        }
    }

    fn try_process(&mut self, path: &Path) -> Result<FileStatus> {
        let file = display_name(path);

        if DocumentType::from_path(path).is_none() {
            return Err(IntakeError::UnsupportedFormat(format!(
                "{file} is not a .pdf or .docx file"
            )));
        }

        let content = self.loader.load(path)?;
        let fields = self.extractor.extract(&content.text);
        let now = Utc::now();

        if let Some(reason) = self.store.find_duplicate(&fields.emails, now) {
            info!(file = %file, reason = %reason, "Skipping duplicate candidate");
            return Ok(FileStatus::Rejected { reason });
        }

        let archived = self.workspace.archive_copy(path)?;
        let record = CandidateRecord::new(fields, file.clone(), now, archived.clone());

        match self.store.append(&record) {
            Ok(AppendOutcome::Accepted { serial }) => {
                debug!(file = %file, serial, "Candidate stored");
                Ok(FileStatus::Accepted { serial })
            }
            Ok(AppendOutcome::Rejected(reason)) => {
                discard_archive(&archived);
                Ok(FileStatus::Rejected { reason })
            }
            Err(e) => {
                discard_archive(&archived);
                Err(e)
            }
        }
    }
}

fn discard_archive(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "Failed to remove archived copy");
    }
}
