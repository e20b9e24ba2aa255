use std::fs;
use std::path::Path;

use crate::error::{IntakeError, Result};
use crate::models::DocumentType;
use crate::processing::extractors::{self, ExtractedContent};

/// Turns a resume file into plain text.
pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<ExtractedContent>;
}

/// Reads PDF and DOCX files from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl FileLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn extract_bytes(&self, bytes: &[u8], doc_type: DocumentType) -> Result<ExtractedContent> {
        let extracted = match doc_type {
            DocumentType::Pdf => extractors::PdfExtractor::extract(bytes)?,
            DocumentType::Docx => extractors::DocxExtractor::extract(bytes)?,
        };

        if extracted.text.trim().is_empty() {
            return Err(IntakeError::ExtractionFailure(
                "no extractable text (scanned or image-only document?)".to_string(),
            ));
        }

        Ok(extracted)
    }
}

impl DocumentLoader for FileLoader {
    fn load(&self, path: &Path) -> Result<ExtractedContent> {
        let doc_type = DocumentType::from_path(path).ok_or_else(|| {
            IntakeError::UnsupportedFormat(format!(
                "{} is not a .pdf or .docx file",
                display_name(path)
            ))
        })?;

        let bytes = fs::read(path).map_err(|e| {
            IntakeError::ExtractionFailure(format!("cannot read {}: {e}", display_name(path)))
        })?;

        let extracted = self.extract_bytes(&bytes, doc_type)?;
        tracing::debug!(
            file = %display_name(path),
            doc_type = %doc_type,
            words = extracted.word_count,
            "Document text extracted"
        );
        Ok(extracted)
    }
}

/// File name without directories, falling back to the full path.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "Jane Doe jane@example.com").unwrap();

        let err = FileLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, IntakeError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_missing_file_is_extraction_failure() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileLoader::new()
            .load(&dir.path().join("ghost.pdf"))
            .unwrap_err();
        assert!(matches!(err, IntakeError::ExtractionFailure(_)));
    }

    #[test]
    fn test_corrupt_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"this was never a pdf").unwrap();

        let err = FileLoader::new().load(&path).unwrap_err();
        assert!(matches!(err, IntakeError::ExtractionFailure(_)));
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name(Path::new("/tmp/in/Jane CV.pdf")), "Jane CV.pdf");
    }
}
