use super::ExtractedContent;
use crate::error::{IntakeError, Result};
use crate::models::DocumentType;

pub struct DocxExtractor;

impl DocxExtractor {
    pub fn extract(bytes: &[u8]) -> Result<ExtractedContent> {
        if !infer::archive::is_zip(bytes) {
            return Err(IntakeError::ExtractionFailure(
                "file is not a DOCX package".to_string(),
            ));
        }

        let docx = docx_rs::read_docx(bytes)
            .map_err(|e| IntakeError::ExtractionFailure(format!("DOCX parse error: {e}")))?;

        let mut text = String::new();

        for child in &docx.document.children {
            let block = match child {
                docx_rs::DocumentChild::Paragraph(paragraph) => Self::paragraph_text(paragraph),
                docx_rs::DocumentChild::Table(table) => Self::table_text(table),
                _ => continue,
            };
            if block.trim().is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&block);
        }

        Ok(ExtractedContent::new(text, DocumentType::Docx))
    }

    fn paragraph_text(paragraph: &docx_rs::Paragraph) -> String {
        let mut content = String::new();
        Self::collect_children(&paragraph.children, &mut content);
        content
    }

    // Contact details are often wrapped in hyperlinks, so recurse into them.
    fn collect_children(children: &[docx_rs::ParagraphChild], out: &mut String) {
        for child in children {
            match child {
                docx_rs::ParagraphChild::Run(run) => Self::collect_run(run, out),
                docx_rs::ParagraphChild::Hyperlink(link) => {
                    Self::collect_children(&link.children, out)
                }
                _ => {}
            }
        }
    }

    fn collect_run(run: &docx_rs::Run, out: &mut String) {
        for run_child in &run.children {
            match run_child {
                docx_rs::RunChild::Text(text) => out.push_str(&text.text),
                docx_rs::RunChild::Tab(_) => out.push('\t'),
                docx_rs::RunChild::Break(_) => out.push('\n'),
                _ => {}
            }
        }
    }

    /// One line per row, cells joined by ` | `.
    fn table_text(table: &docx_rs::Table) -> String {
        let mut lines: Vec<String> = Vec::new();

        for table_child in &table.rows {
            let docx_rs::TableChild::TableRow(row) = table_child;
            let mut cells: Vec<String> = Vec::new();
            for row_child in &row.cells {
                let docx_rs::TableRowChild::TableCell(cell) = row_child;
                let mut cell_text = String::new();
                for cell_child in &cell.children {
                    if let docx_rs::TableCellContent::Paragraph(para) = cell_child {
                        let para_text = Self::paragraph_text(para);
                        if !cell_text.is_empty() && !para_text.is_empty() {
                            cell_text.push(' ');
                        }
                        cell_text.push_str(&para_text);
                    }
                }
                let cell_text = cell_text.trim();
                if !cell_text.is_empty() {
                    cells.push(cell_text.to_string());
                }
            }
            if !cells.is_empty() {
                lines.push(cells.join(" | "));
            }
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_plain_text() {
        let err = DocxExtractor::extract(b"Jane Doe\njane@example.com").unwrap_err();
        assert!(matches!(err, IntakeError::ExtractionFailure(_)));
    }
}
