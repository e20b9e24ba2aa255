use crate::ner::{looks_like_name, PersonRecognizer, PersonSpan};

/// Only the head of the document is handed to the recognizer.
pub const NAME_SCAN_CHARS: usize = 2000;
pub const MIN_NAME_CONFIDENCE: f32 = 0.5;

/// Best candidate name, or empty.
///
/// The recognizer's highest-confidence span at or above
/// [`MIN_NAME_CONFIDENCE`] wins, earliest first on ties. Without one, the
/// first title-case line is used. A recognizer error counts as no entity.
pub fn pick_name(text: &str, recognizer: &dyn PersonRecognizer) -> String {
    let head = head_chars(text, NAME_SCAN_CHARS);

    let spans = match recognizer.recognize_person_entities(head) {
        Ok(spans) => spans,
        Err(e) => {
            tracing::warn!(
                recognizer = recognizer.name(),
                error = %e,
                "Name recognizer failed, using fallback"
            );
            Vec::new()
        }
    };

    let best = spans
        .into_iter()
        .filter(|s| s.confidence >= MIN_NAME_CONFIDENCE && !s.text.trim().is_empty())
        .fold(None, |best: Option<PersonSpan>, span| match best {
            Some(b) if b.confidence > span.confidence => Some(b),
            Some(b) if b.confidence == span.confidence && b.start <= span.start => Some(b),
            _ => Some(span),
        });

    match best {
        Some(span) => span.text.trim().to_string(),
        None => fallback_name(head),
    }
}

/// First line of 2 to 4 capitalised words with no digits or `@`.
pub fn fallback_name(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| looks_like_name(line))
        .map(String::from)
        .unwrap_or_default()
}

fn head_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
