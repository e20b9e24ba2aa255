//! Person-name recognition behind a narrow capability trait.
//!
//! [`HeuristicRecognizer`] works offline from the shape of the document head.
//! [`LlmRecognizer`] asks an OpenAI-compatible chat model. Both are built from
//! [`RecognizerConfig`](crate::config::RecognizerConfig) via
//! [`RecognizerProvider`].

mod api;
mod heuristic;
mod provider;

use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use api::RecognizerApiClient;
pub use heuristic::{looks_like_name, HeuristicRecognizer};
pub use provider::{LlmRecognizer, RecognizerProvider};

/// A candidate PERSON entity. `start`/`end` are byte offsets into the text
/// that was passed to the recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonSpan {
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub confidence: f32,
}

impl PersonSpan {
    pub fn new(text: impl Into<String>, start: usize, confidence: f32) -> Self {
        let text = text.into();
        let end = start + text.len();
        Self {
            text,
            start,
            end,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

pub trait PersonRecognizer: Send + Sync {
    /// Candidate spans in document order.
    fn recognize_person_entities(&self, text: &str) -> Result<Vec<PersonSpan>>;

    fn name(&self) -> &'static str;
}
