use once_cell::sync::Lazy;
use regex::Regex;

use super::{PersonRecognizer, PersonSpan};
use crate::error::Result;

const HEAD_LINES: usize = 15;
const LABELED_CONFIDENCE: f32 = 0.95;
const TOP_LINE_CONFIDENCE: f32 = 0.9;
const LINE_DECAY: f32 = 0.06;
const MIN_CONFIDENCE: f32 = 0.2;

static NAME_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(?:full\s+)?name\s*[:\-]\s*").unwrap());

/// Lowercased words that mark a heading or contact line, never a name.
const STOPWORDS: &[&str] = &[
    "resume",
    "curriculum",
    "vitae",
    "cv",
    "profile",
    "summary",
    "objective",
    "contact",
    "experience",
    "education",
    "skills",
    "address",
    "phone",
    "email",
    "mobile",
    "linkedin",
    "github",
    "references",
    "projects",
    "certifications",
    "street",
    "road",
    "avenue",
    "university",
    "college",
    "institute",
    "engineer",
    "developer",
    "manager",
    "analyst",
    "consultant",
    "designer",
    "intern",
];

/// Scores title-case lines near the top of the document. Earlier lines score
/// higher; an explicit `Name:` label scores highest.
#[derive(Debug, Clone, Default)]
pub struct HeuristicRecognizer;

impl HeuristicRecognizer {
    pub fn new() -> Self {
        Self
    }
}

impl PersonRecognizer for HeuristicRecognizer {
    fn recognize_person_entities(&self, text: &str) -> Result<Vec<PersonSpan>> {
        let mut spans = Vec::new();
        let mut offset = 0;
        let mut index = 0;

        for raw_line in text.split_inclusive('\n') {
            let line_start = offset;
            offset += raw_line.len();

            let line = raw_line.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() {
                continue;
            }
            if index >= HEAD_LINES {
                break;
            }

            let (candidate, labeled) = match NAME_LABEL_RE.find(line) {
                Some(label) => (&line[label.end()..], true),
                None => (line, false),
            };
            let trimmed = candidate.trim();

            if looks_like_name(trimmed) {
                let lead = candidate.len() - candidate.trim_start().len();
                let start = line_start + (line.len() - candidate.len()) + lead;
                let confidence = if labeled {
                    LABELED_CONFIDENCE
                } else {
                    let mut score = TOP_LINE_CONFIDENCE - LINE_DECAY * index as f32;
                    if is_all_caps(trimmed) {
                        score -= 0.05;
                    }
                    score.max(MIN_CONFIDENCE)
                };
                spans.push(PersonSpan::new(trimmed, start, confidence));
            }

            index += 1;
        }

        Ok(spans)
    }

    fn name(&self) -> &'static str {
        "heuristic"
    }
}

/// 2 to 4 capitalised alphabetic words, no digits, no `@`, no heading words.
pub fn looks_like_name(line: &str) -> bool {
    if line.contains('@') || line.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    if !(2..=4).contains(&words.len()) {
        return false;
    }

    words.iter().all(|word| {
        let bare = word.trim_end_matches([',', '.']);
        let mut chars = bare.chars();
        let starts_upper = chars.next().is_some_and(char::is_uppercase);
        let rest_ok = bare
            .chars()
            .all(|c| c.is_alphabetic() || matches!(c, '.' | '-' | '\''));
        starts_upper && rest_ok && !STOPWORDS.contains(&bare.to_lowercase().as_str())
    })
}

fn is_all_caps(line: &str) -> bool {
    line.chars()
        .filter(|c| c.is_alphabetic())
        .all(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_first_line_name() {
        let text = "Jane Q. Doe\njane@example.com\nSenior Data Engineer\n";
        let spans = HeuristicRecognizer.recognize_person_entities(text).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].text, "Jane Q. Doe");
        assert_eq!(spans[0].start, 0);
        assert!((spans[0].confidence - 0.9).abs() < f32::EPSILON);
    }

    #[test]
    fn test_labeled_name_beats_position() {
        let text = "Curriculum Vitae\n\nContact Details\nName: John Smith\n";
        let spans = HeuristicRecognizer.recognize_person_entities(text).unwrap();
        let best = spans
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
            .unwrap();
        assert_eq!(best.text, "John Smith");
        assert_eq!(&text[best.start..best.end], "John Smith");
        assert_eq!(best.confidence, LABELED_CONFIDENCE);
    }

    #[test]
    fn test_headings_and_contact_lines_skipped() {
        let text = "RESUME\nProfessional Summary\n+1 555 123 4567\nSoftware Engineer\n";
        let spans = HeuristicRecognizer.recognize_person_entities(text).unwrap();
        assert!(spans.is_empty());
    }

    #[test]
    fn test_confidence_decays_with_line_index() {
        let text = "Objective\nSkills\nMaria Garcia Lopez\n";
        let spans = HeuristicRecognizer.recognize_person_entities(text).unwrap();
        assert_eq!(spans.len(), 1);
        assert!(spans[0].confidence < TOP_LINE_CONFIDENCE);
        assert!(spans[0].confidence > 0.7);
    }

    #[test]
    fn test_looks_like_name() {
        assert!(looks_like_name("Anne-Marie O'Neil"));
        assert!(looks_like_name("JOHN SMITH"));
        assert!(!looks_like_name("John"));
        assert!(!looks_like_name("john smith"));
        assert!(!looks_like_name("John Smith 2020"));
        assert!(!looks_like_name("One Two Three Four Five"));
    }
}
