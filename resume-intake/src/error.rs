use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Extraction failure: {0}")]
    ExtractionFailure(String),

    #[error("Workbook corrupt: {0}")]
    WorkbookCorrupt(String),

    #[error("Write failure: {0}")]
    WriteFailure(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Recognizer error: {0}")]
    Recognizer(String),

    #[error("Recognizer unavailable: {0}")]
    RecognizerUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Stable label for an error, used in batch outcomes and the error log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    UnsupportedFormat,
    ExtractionFailure,
    WorkbookCorrupt,
    WriteFailure,
    Validation,
    Config,
    Recognizer,
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::UnsupportedFormat => "UnsupportedFormat",
            Self::ExtractionFailure => "ExtractionFailure",
            Self::WorkbookCorrupt => "WorkbookCorrupt",
            Self::WriteFailure => "WriteFailure",
            Self::Validation => "Validation",
            Self::Config => "Config",
            Self::Recognizer => "Recognizer",
            Self::Io => "Io",
        };
        f.write_str(label)
    }
}

impl IntakeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IntakeError::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            IntakeError::ExtractionFailure(_) => ErrorKind::ExtractionFailure,
            IntakeError::WorkbookCorrupt(_) => ErrorKind::WorkbookCorrupt,
            IntakeError::WriteFailure(_) | IntakeError::Csv(_) => ErrorKind::WriteFailure,
            IntakeError::Validation(_) => ErrorKind::Validation,
            IntakeError::Config(_) | IntakeError::Json(_) => ErrorKind::Config,
            IntakeError::Recognizer(_) | IntakeError::RecognizerUnavailable(_) => {
                ErrorKind::Recognizer
            }
            IntakeError::Io(_) => ErrorKind::Io,
        }
    }

    /// Message without the variant prefix, for status lines and the error log.
    pub fn reason(&self) -> String {
        match self {
            IntakeError::UnsupportedFormat(msg)
            | IntakeError::ExtractionFailure(msg)
            | IntakeError::WorkbookCorrupt(msg)
            | IntakeError::WriteFailure(msg)
            | IntakeError::Validation(msg)
            | IntakeError::Config(msg)
            | IntakeError::Recognizer(msg)
            | IntakeError::RecognizerUnavailable(msg) => msg.clone(),
            IntakeError::Io(e) => e.to_string(),
            IntakeError::Json(e) => e.to_string(),
            IntakeError::Csv(e) => e.to_string(),
        }
    }

    /// Failures that make every later append pointless.
    pub fn is_workbook_fatal(&self) -> bool {
        matches!(
            self,
            IntakeError::WorkbookCorrupt(_) | IntakeError::WriteFailure(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, IntakeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(
            IntakeError::UnsupportedFormat("x.txt".into()).kind(),
            ErrorKind::UnsupportedFormat
        );
        assert_eq!(ErrorKind::ExtractionFailure.to_string(), "ExtractionFailure");
        let io = IntakeError::from(std::io::Error::new(std::io::ErrorKind::Other, "boom"));
        assert_eq!(io.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_reason_strips_prefix() {
        let err = IntakeError::ExtractionFailure("no extractable text".into());
        assert_eq!(err.reason(), "no extractable text");
        assert_eq!(err.to_string(), "Extraction failure: no extractable text");
    }

    #[test]
    fn test_workbook_fatal() {
        assert!(IntakeError::WriteFailure("locked".into()).is_workbook_fatal());
        assert!(!IntakeError::ExtractionFailure("bad".into()).is_workbook_fatal());
    }
}
