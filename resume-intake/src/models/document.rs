use serde::{Deserialize, Serialize};
use std::path::Path;

/// Resume formats the loader understands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Pdf,
    Docx,
}

impl DocumentType {
    /// Case-insensitive extension match. `None` for anything else.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pdf => write!(f, "pdf"),
            Self::Docx => write!(f, "docx"),
        }
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().trim_start_matches('.') {
            "pdf" => Ok(Self::Pdf),
            "docx" => Ok(Self::Docx),
            _ => Err(format!("Unsupported document type: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_from_path_is_case_insensitive() {
        assert_eq!(
            DocumentType::from_path(&PathBuf::from("a/Jane.PDF")),
            Some(DocumentType::Pdf)
        );
        assert_eq!(
            DocumentType::from_path(&PathBuf::from("cv.docx")),
            Some(DocumentType::Docx)
        );
        assert_eq!(DocumentType::from_path(&PathBuf::from("notes.txt")), None);
        assert_eq!(DocumentType::from_path(&PathBuf::from("README")), None);
        assert_eq!(DocumentType::from_path(&PathBuf::from("old.doc")), None);
    }

    #[test]
    fn test_from_str() {
        assert_eq!(".pdf".parse::<DocumentType>(), Ok(DocumentType::Pdf));
        assert!("txt".parse::<DocumentType>().is_err());
    }
}
