use crate::error::{IntakeError, Result};

/// Header written into a new workbook when no other schema is configured.
pub const CANONICAL_COLUMNS: &[&str] = &[
    "S.No.",
    "Name",
    "Email",
    "Phone",
    "OriginalFile",
    "DateApplied",
    "ResumePath",
];

/// Columns the store knows how to fill. Anything else is a user column and is
/// left empty on append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Serial,
    Name,
    Email,
    Phone,
    Skills,
    Experience,
    OriginalFile,
    DateApplied,
    ResumePath,
}

impl ColumnKind {
    /// Case- and punctuation-insensitive: `s.no.`, `S No`, `Date Applied`.
    pub fn from_header(header: &str) -> Option<Self> {
        let key: String = header
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();

        match key.as_str() {
            "sno" | "serial" | "serialno" | "srno" => Some(Self::Serial),
            "name" | "fullname" | "candidatename" => Some(Self::Name),
            "email" | "emails" | "emailaddress" => Some(Self::Email),
            "phone" | "phones" | "phonenumber" | "mobile" => Some(Self::Phone),
            "skills" => Some(Self::Skills),
            "experience" | "yearsofexperience" => Some(Self::Experience),
            "originalfile" | "filename" => Some(Self::OriginalFile),
            "dateapplied" | "applieddate" => Some(Self::DateApplied),
            "resumepath" | "resumecopy" => Some(Self::ResumePath),
            _ => None,
        }
    }

    pub fn canonical_name(self) -> &'static str {
        match self {
            Self::Serial => "S.No.",
            Self::Name => "Name",
            Self::Email => "Email",
            Self::Phone => "Phone",
            Self::Skills => "Skills",
            Self::Experience => "Experience",
            Self::OriginalFile => "OriginalFile",
            Self::DateApplied => "DateApplied",
            Self::ResumePath => "ResumePath",
        }
    }
}

/// Ordered header row of the sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    columns: Vec<String>,
}

impl ColumnSchema {
    /// Fails unless an email column is present and names are unique.
    pub fn new(columns: Vec<String>) -> Result<Self> {
        let schema = Self { columns };
        schema.validate()?;
        Ok(schema)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Exact name match, ignoring ASCII case and surrounding whitespace.
    pub fn position(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.columns
            .iter()
            .position(|c| c.trim().eq_ignore_ascii_case(name))
    }

    /// First column of the given kind.
    pub fn index_of(&self, kind: ColumnKind) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| ColumnKind::from_header(c) == Some(kind))
    }

    pub fn kinds(&self) -> Vec<Option<ColumnKind>> {
        self.columns
            .iter()
            .map(|c| ColumnKind::from_header(c))
            .collect()
    }

    pub(crate) fn insert(&mut self, index: usize, name: String) -> Result<()> {
        let mut next = self.columns.clone();
        next.insert(index, name);
        Self::new(next).map(|s| *self = s)
    }

    pub(crate) fn remove(&mut self, index: usize) -> Result<String> {
        let mut next = self.columns.clone();
        let removed = next.remove(index);
        Self::new(next).map(|s| {
            *self = s;
            removed
        })
    }

    pub(crate) fn rename(&mut self, index: usize, name: String) -> Result<()> {
        let mut next = self.columns.clone();
        next[index] = name;
        Self::new(next).map(|s| *self = s)
    }

    pub(crate) fn relocate(&mut self, from: usize, to: usize) {
        let column = self.columns.remove(from);
        self.columns.insert(to, column);
    }

    fn validate(&self) -> Result<()> {
        if self.index_of(ColumnKind::Email).is_none() {
            return Err(IntakeError::Validation(
                "an Email column is required for duplicate detection".to_string(),
            ));
        }

        for (i, column) in self.columns.iter().enumerate() {
            let name = column.trim();
            if name.is_empty() {
                return Err(IntakeError::Validation(format!(
                    "column {} has an empty name",
                    i + 1
                )));
            }
            if self.columns[..i]
                .iter()
                .any(|c| c.trim().eq_ignore_ascii_case(name))
            {
                return Err(IntakeError::Validation(format!(
                    "duplicate column name '{name}'"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn canonical() -> ColumnSchema {
        ColumnSchema::new(CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect()).unwrap()
    }

    #[test]
    fn test_kind_aliases() {
        assert_eq!(ColumnKind::from_header("S.No."), Some(ColumnKind::Serial));
        assert_eq!(ColumnKind::from_header(" sno "), Some(ColumnKind::Serial));
        assert_eq!(ColumnKind::from_header("E-mail"), Some(ColumnKind::Email));
        assert_eq!(ColumnKind::from_header("Date Applied"), Some(ColumnKind::DateApplied));
        assert_eq!(ColumnKind::from_header("Notes"), None);
    }

    #[test]
    fn test_canonical_names_round_trip() {
        for column in CANONICAL_COLUMNS {
            let kind = ColumnKind::from_header(column).unwrap();
            assert_eq!(kind.canonical_name(), *column);
        }
    }

    #[test]
    fn test_requires_email() {
        let err = ColumnSchema::new(vec!["Name".into(), "Phone".into()]).unwrap_err();
        assert!(matches!(err, IntakeError::Validation(_)));
    }

    #[test]
    fn test_rejects_duplicate_and_empty_names() {
        assert!(ColumnSchema::new(vec!["Email".into(), "email".into()]).is_err());
        assert!(ColumnSchema::new(vec!["Email".into(), "  ".into()]).is_err());
    }

    #[test]
    fn test_position_and_index_of() {
        let schema = canonical();
        assert_eq!(schema.position("email"), Some(2));
        assert_eq!(schema.index_of(ColumnKind::DateApplied), Some(5));
        assert_eq!(schema.index_of(ColumnKind::Skills), None);
    }

    #[test]
    fn test_remove_email_refused_and_schema_unchanged() {
        let mut schema = canonical();
        assert!(schema.remove(2).is_err());
        assert_eq!(schema, canonical());
    }
}
