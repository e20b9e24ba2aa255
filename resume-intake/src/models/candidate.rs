use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Fields recovered from resume text alone. Absent fields are empty or `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFields {
    pub name: String,
    /// Unique (case-insensitive), in order of first appearance.
    pub emails: Vec<String>,
    /// Unique by digit sequence, in order of first appearance.
    pub phones: Vec<String>,
    /// Matched vocabulary keywords, in vocabulary order.
    pub skills: Vec<String>,
    pub experience_years: Option<f64>,
}

/// One processed resume, as appended to the workbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub name: String,
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub skills: Vec<String>,
    pub experience_years: Option<f64>,
    pub original_file_name: String,
    pub date_applied: DateTime<Utc>,
    pub resume_copy_path: PathBuf,
}

impl CandidateRecord {
    pub fn new(
        fields: ExtractedFields,
        original_file_name: impl Into<String>,
        date_applied: DateTime<Utc>,
        resume_copy_path: PathBuf,
    ) -> Self {
        Self {
            name: fields.name,
            emails: fields.emails,
            phones: fields.phones,
            skills: fields.skills,
            experience_years: fields.experience_years,
            original_file_name: original_file_name.into(),
            date_applied,
            resume_copy_path,
        }
    }

    /// `"3 years"`, `"2.5 years"`, or empty.
    pub fn experience_label(&self) -> String {
        format_experience(self.experience_years)
    }
}

pub fn format_experience(years: Option<f64>) -> String {
    match years {
        Some(y) if y.fract() == 0.0 => format!("{} years", y as i64),
        Some(y) => format!("{y} years"),
        None => String::new(),
    }
}
