use chrono::{Local, NaiveDate};

use super::contact::{extract_emails, extract_phones};
use super::experience::extract_experience;
use super::name::pick_name;
use super::skills::SkillVocabulary;
use crate::models::ExtractedFields;
use crate::ner::{HeuristicRecognizer, PersonRecognizer};

/// Turns resume text into [`ExtractedFields`]. Never fails: a field that
/// cannot be found is left empty.
pub struct FieldExtractor {
    vocabulary: SkillVocabulary,
    recognizer: Box<dyn PersonRecognizer>,
}

impl FieldExtractor {
    pub fn new(vocabulary: SkillVocabulary, recognizer: Box<dyn PersonRecognizer>) -> Self {
        Self {
            vocabulary,
            recognizer,
        }
    }

    pub fn vocabulary(&self) -> &SkillVocabulary {
        &self.vocabulary
    }

    pub fn recognizer_name(&self) -> &'static str {
        self.recognizer.name()
    }

    pub fn extract(&self, text: &str) -> ExtractedFields {
        self.extract_at(text, Local::now().date_naive())
    }

    /// As [`extract`](Self::extract), with "present" in date ranges resolved
    /// against `today`.
    pub fn extract_at(&self, text: &str, today: NaiveDate) -> ExtractedFields {
        let fields = ExtractedFields {
            name: pick_name(text, self.recognizer.as_ref()),
            emails: extract_emails(text),
            phones: extract_phones(text),
            skills: self.vocabulary.match_in(text),
            experience_years: extract_experience(text, today),
        };

        tracing::debug!(
            name = %fields.name,
            emails = fields.emails.len(),
            phones = fields.phones.len(),
            skills = fields.skills.len(),
            experience = ?fields.experience_years,
            "Extracted fields"
        );

        fields
    }
}

impl Default for FieldExtractor {
    fn default() -> Self {
        Self::new(SkillVocabulary::default(), Box::new(HeuristicRecognizer::new()))
    }
}
