use tokio::runtime::{Builder, Runtime};

use super::{HeuristicRecognizer, PersonRecognizer, PersonSpan, RecognizerApiClient};
use crate::config::{LlmConfig, RecognizerBackend, RecognizerConfig};
use crate::error::{IntakeError, Result};

/// Blocking adapter over [`RecognizerApiClient`]. Owns a current-thread
/// runtime so the synchronous pipeline can call it directly.
pub struct LlmRecognizer {
    client: RecognizerApiClient,
    runtime: Runtime,
    max_chars: usize,
}

impl LlmRecognizer {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = RecognizerApiClient::new(config)?;
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                IntakeError::RecognizerUnavailable(format!("failed to start runtime: {e}"))
            })?;

        Ok(Self {
            client,
            runtime,
            max_chars: config.max_chars,
        })
    }
}

impl PersonRecognizer for LlmRecognizer {
    fn recognize_person_entities(&self, text: &str) -> Result<Vec<PersonSpan>> {
        let head = match text.char_indices().nth(self.max_chars) {
            Some((idx, _)) => &text[..idx],
            None => text,
        };
        self.runtime.block_on(self.client.recognize(head))
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

/// Selects the recognizer backend from configuration.
pub enum RecognizerProvider {
    Heuristic(HeuristicRecognizer),
    Llm(Box<LlmRecognizer>),
}

impl RecognizerProvider {
    /// An unusable LLM configuration falls back to the heuristic backend.
    pub fn from_config(config: &RecognizerConfig) -> Self {
        match config.backend {
            RecognizerBackend::Heuristic => Self::Heuristic(HeuristicRecognizer::new()),
            RecognizerBackend::Llm => {
                let llm = config.llm.clone().unwrap_or_default();
                match LlmRecognizer::new(&llm) {
                    Ok(recognizer) => {
                        tracing::info!(model = %llm.model, "Using LLM name recognizer");
                        Self::Llm(Box::new(recognizer))
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            "LLM name recognizer unavailable, falling back to heuristic"
                        );
                        Self::Heuristic(HeuristicRecognizer::new())
                    }
                }
            }
        }
    }

    pub fn into_boxed(self) -> Box<dyn PersonRecognizer> {
        match self {
            Self::Heuristic(r) => Box::new(r),
            Self::Llm(r) => r as Box<dyn PersonRecognizer>,
        }
    }
}

impl PersonRecognizer for RecognizerProvider {
    fn recognize_person_entities(&self, text: &str) -> Result<Vec<PersonSpan>> {
        match self {
            Self::Heuristic(r) => r.recognize_person_entities(text),
            Self::Llm(r) => r.recognize_person_entities(text),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Heuristic(r) => r.name(),
            Self::Llm(r) => r.name(),
        }
    }
}
