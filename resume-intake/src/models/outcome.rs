use serde::Serialize;

use crate::error::{ErrorKind, IntakeError};

/// Why a record was not written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// `email` matched row `serial` applied inside the duplicate window.
    DuplicateEmail { email: String, serial: Option<u64> },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateEmail { email, .. } => {
                write!(f, "duplicate email {email} within window")
            }
        }
    }
}

/// Result of `SpreadsheetStore::append`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AppendOutcome {
    Accepted { serial: u64 },
    Rejected(RejectReason),
}

/// Per-file status within an ingestion batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Accepted { serial: u64 },
    Rejected { reason: RejectReason },
    Failed { kind: ErrorKind, reason: String },
}

impl FileStatus {
    pub fn failed(error: &IntakeError) -> Self {
        Self::Failed {
            kind: error.kind(),
            reason: error.reason(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accepted { serial } => write!(f, "Added (S.No. {serial})"),
            Self::Rejected { reason } => write!(f, "Skipped: {reason}"),
            Self::Failed { kind, reason } => write!(f, "Failed [{kind}]: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileOutcome {
    /// File name as provided, without directories.
    pub file: String,
    pub status: FileStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn push(&mut self, outcome: FileOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn accepted(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Accepted { .. }))
    }

    pub fn rejected(&self) -> usize {
        self.count(|s| matches!(s, FileStatus::Rejected { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(FileStatus::is_failure)
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    fn count(&self, pred: impl Fn(&FileStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

impl std::fmt::Display for BatchReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Processed {} files: {} added, {} skipped, {} failed",
            self.total(),
            self.accepted(),
            self.rejected(),
            self.failed()
        )
    }
}
