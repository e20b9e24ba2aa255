use crate::models::DocumentType;

#[derive(Debug)]
pub struct ExtractedContent {
    pub text: String,
    pub doc_type: DocumentType,
    pub word_count: usize,
}

impl ExtractedContent {
    pub fn new(text: String, doc_type: DocumentType) -> Self {
        let word_count = text.split_whitespace().count();
        Self {
            text,
            doc_type,
            word_count,
        }
    }
}

pub mod docx;
pub mod pdf;

pub use docx::DocxExtractor;
pub use pdf::PdfExtractor;
