//! Field extraction from plain resume text.

pub mod contact;
pub mod experience;
mod extractor;
mod name;
pub mod skills;

pub use extractor::FieldExtractor;
pub use name::{fallback_name, pick_name, NAME_SCAN_CHARS, MIN_NAME_CONFIDENCE};
pub use skills::SkillVocabulary;
