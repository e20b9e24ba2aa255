use std::panic::{self, AssertUnwindSafe};

use super::ExtractedContent;
use crate::error::{IntakeError, Result};
use crate::models::DocumentType;

pub struct PdfExtractor;

impl PdfExtractor {
    pub fn extract(bytes: &[u8]) -> Result<ExtractedContent> {
        if !infer::archive::is_pdf(bytes) {
            return Err(IntakeError::ExtractionFailure(
                "file is not a PDF document".to_string(),
            ));
        }

        // pdf-extract panics on some malformed streams instead of erroring.
        let extracted = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(bytes)
        }))
        .map_err(|_| IntakeError::ExtractionFailure("PDF parser aborted".to_string()))?;

        let text = extracted
            .map_err(|e| IntakeError::ExtractionFailure(format!("PDF extraction failed: {e}")))?;

        Ok(ExtractedContent::new(text, DocumentType::Pdf))
    }
}
