use std::time::Duration;

use serde_json::Value;

use async_openai::{
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
        CreateChatCompletionResponse,
    },
    Client,
};

use super::PersonSpan;
use crate::{
    config::{parse_llm_provider_model, LlmConfig},
    error::{IntakeError, Result},
};

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const OLLAMA_BASE_URL: &str = "http://localhost:11434/v1";
const LMSTUDIO_BASE_URL: &str = "http://localhost:1234/v1";

const SYSTEM_PROMPT: &str = "You extract the candidate's own full name from resume text. \
Respond with a JSON array only, no prose: [{\"text\": \"<name exactly as written>\", \"confidence\": <0.0-1.0>}]. \
Return [] when the text contains no person name. Do not invent names.";

#[derive(Debug, Clone)]
struct ApiConfig {
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout_secs: u64,
    max_retries: u32,
}

/// OpenAI-compatible chat client that asks for PERSON spans as JSON.
#[derive(Clone)]
pub struct RecognizerApiClient {
    client: Client<OpenAIConfig>,
    config: ApiConfig,
}

impl RecognizerApiClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_config = ApiConfig::from_llm_config(config);

        let (provider, _) = parse_llm_provider_model(&config.model);
        let needs_api_key = !matches!(
            provider.to_lowercase().as_str(),
            "ollama" | "local" | "lmstudio"
        );

        if needs_api_key && api_config.api_key.is_none() {
            return Err(IntakeError::RecognizerUnavailable(format!(
                "API key required for model {}",
                config.model
            )));
        }

        let openai_config = OpenAIConfig::new()
            .with_api_base(api_config.base_url.clone())
            .with_api_key(api_config.api_key.clone().unwrap_or_default());

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(api_config.timeout_secs))
            .build()
            .map_err(|error| {
                IntakeError::RecognizerUnavailable(format!(
                    "Failed to create recognizer HTTP client: {error}"
                ))
            })?;

        // Bound async-openai's internal retry on 5xx by our timeout.
        let backoff = backoff::ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(api_config.timeout_secs)),
            ..Default::default()
        };

        let client = Client::with_config(openai_config)
            .with_http_client(http_client)
            .with_backoff(backoff);

        Ok(Self {
            client,
            config: api_config,
        })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Asks the model for person names in `text` and keeps only those that
    /// occur verbatim in it.
    pub async fn recognize(&self, text: &str) -> Result<Vec<PersonSpan>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let mut last_error: Option<IntakeError> = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay_ms = 100 * 2_u64.pow(attempt - 1);
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }

            let request = self.build_request(text)?;

            match self.client.chat().create(request).await {
                Ok(response) => {
                    let content = Self::extract_content(response)?;
                    tracing::debug!(response_len = content.len(), "Recognizer response received");
                    return parse_person_spans(&content, text);
                }
                Err(error) => {
                    let retryable = Self::is_retryable(&error);
                    let mapped_error = Self::map_openai_error(error);

                    if retryable && attempt < self.config.max_retries {
                        tracing::debug!(attempt, error = %mapped_error, "Retrying recognizer call");
                        last_error = Some(mapped_error);
                        continue;
                    }

                    return Err(mapped_error);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            IntakeError::Recognizer("recognizer call failed after retries".to_string())
        }))
    }

    fn build_request(&self, text: &str) -> Result<CreateChatCompletionRequest> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(|error| {
                    IntakeError::Validation(format!("Invalid system prompt: {error}"))
                })?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(text)
                .build()
                .map_err(|error| IntakeError::Validation(format!("Invalid user prompt: {error}")))?
                .into(),
        ];

        let mut request = CreateChatCompletionRequestArgs::default();
        request
            .model(self.config.model.clone())
            .messages(messages)
            .temperature(0.0);

        request.build().map_err(|error| {
            IntakeError::Validation(format!("Invalid recognizer request: {error}"))
        })
    }

    fn extract_content(response: CreateChatCompletionResponse) -> Result<String> {
        let message = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| IntakeError::Recognizer("response contained no choices".to_string()))?
            .message
            .content
            .unwrap_or_default();

        if message.trim().is_empty() {
            return Err(IntakeError::Recognizer(
                "response contained empty content".to_string(),
            ));
        }

        Ok(message)
    }

    fn is_retryable(error: &OpenAIError) -> bool {
        match error {
            OpenAIError::ApiError(api_error) => {
                api_error.r#type.is_none() && api_error.code.is_none()
            }
            OpenAIError::Reqwest(reqwest_error) => reqwest_error
                .status()
                .map(|status| status.is_server_error())
                .unwrap_or(true),
            _ => false,
        }
    }

    /// Rejected credentials make the backend unavailable; anything else is a
    /// failed call.
    fn map_openai_error(error: OpenAIError) -> IntakeError {
        match error {
            OpenAIError::Reqwest(reqwest_error)
                if reqwest_error.status() == Some(reqwest::StatusCode::UNAUTHORIZED)
                    || reqwest_error.status() == Some(reqwest::StatusCode::FORBIDDEN) =>
            {
                IntakeError::RecognizerUnavailable(format!(
                    "authentication failed: {reqwest_error}"
                ))
            }
            OpenAIError::ApiError(api_error) if Self::is_auth_api_error(&api_error) => {
                IntakeError::RecognizerUnavailable(format!("authentication failed: {api_error}"))
            }
            OpenAIError::JSONDeserialize(err) => {
                IntakeError::Recognizer(format!("failed to parse response: {err}"))
            }
            other => IntakeError::Recognizer(other.to_string()),
        }
    }

    fn is_auth_api_error(api_error: &ApiError) -> bool {
        let message = api_error.message.to_lowercase();
        let code = api_error.code.as_deref().unwrap_or_default().to_lowercase();

        message.contains("unauthorized")
            || message.contains("invalid api key")
            || code.contains("invalid_api_key")
    }
}

impl ApiConfig {
    fn from_llm_config(config: &LlmConfig) -> Self {
        let (provider, model) = parse_llm_provider_model(&config.model);

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| default_base_url(provider).to_string());

        let normalized_model = if provider.eq_ignore_ascii_case("local") {
            config.model.clone()
        } else {
            model.to_string()
        };

        Self {
            base_url,
            api_key: config.api_key.clone(),
            model: normalized_model,
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
        }
    }
}

fn default_base_url(provider: &str) -> &'static str {
    match provider.to_lowercase().as_str() {
        "openrouter" => OPENROUTER_BASE_URL,
        "ollama" => OLLAMA_BASE_URL,
        "lmstudio" => LMSTUDIO_BASE_URL,
        _ => OPENAI_BASE_URL,
    }
}

/// Parses the model's reply into spans located in `source`.
///
/// Accepts a bare array, an object wrapping one under `entities`/`names`,
/// and replies wrapped in a markdown code fence. Entries whose text is not
/// found in `source` are dropped.
pub(crate) fn parse_person_spans(content: &str, source: &str) -> Result<Vec<PersonSpan>> {
    let json = strip_code_fence(content);
    let value: Value = serde_json::from_str(json).map_err(|e| {
        tracing::warn!(
            response_preview = %json.chars().take(100).collect::<String>(),
            error = %e,
            "Failed to parse recognizer response"
        );
        IntakeError::Recognizer(format!("failed to parse JSON response: {e}"))
    })?;

    let items = match &value {
        Value::Array(items) => items.as_slice(),
        Value::Object(map) => map
            .get("entities")
            .or_else(|| map.get("names"))
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
        _ => &[],
    };

    let mut spans = Vec::new();
    for item in items {
        let (text, confidence) = match item {
            Value::String(text) => (text.as_str(), 0.5),
            Value::Object(map) => {
                let Some(text) = map.get("text").and_then(Value::as_str) else {
                    continue;
                };
                let confidence = map
                    .get("confidence")
                    .and_then(Value::as_f64)
                    .unwrap_or(0.5) as f32;
                (text, confidence)
            }
            _ => continue,
        };

        let text = text.trim();
        if text.is_empty() {
            continue;
        }
        match source.find(text) {
            Some(start) => spans.push(PersonSpan::new(text, start, confidence)),
            None => tracing::debug!(name = %text, "Dropping recognizer span not present in text"),
        }
    }

    spans.sort_by_key(|span| span.start);
    Ok(spans)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn local_config() -> LlmConfig {
        LlmConfig {
            model: "ollama/llama3".to_string(),
            max_retries: 0,
            ..Default::default()
        }
    }

    fn api_error(value: serde_json::Value) -> OpenAIError {
        OpenAIError::ApiError(serde_json::from_value::<ApiError>(value).unwrap())
    }

    #[test]
    fn test_rejected_key_maps_to_unavailable() {
        let err = RecognizerApiClient::map_openai_error(api_error(serde_json::json!({
            "message": "Incorrect API key provided",
            "code": "invalid_api_key"
        })));
        assert!(matches!(err, IntakeError::RecognizerUnavailable(_)));
    }

    #[test]
    fn test_other_failures_map_to_recognizer_error() {
        let server = api_error(serde_json::json!({ "message": "upstream overloaded" }));
        assert!(RecognizerApiClient::is_retryable(&server));
        assert!(matches!(
            RecognizerApiClient::map_openai_error(server),
            IntakeError::Recognizer(_)
        ));

        let invalid = OpenAIError::InvalidArgument("temperature out of range".to_string());
        assert!(!RecognizerApiClient::is_retryable(&invalid));
        assert!(matches!(
            RecognizerApiClient::map_openai_error(invalid),
            IntakeError::Recognizer(_)
        ));
    }

    #[test]
    fn test_parse_array_response() {
        let source = "Jane Doe\nSenior engineer, reports to John Smith";
        let content = r#"[{"text": "Jane Doe", "confidence": 0.97}, {"text": "John Smith", "confidence": 0.4}]"#;

        let spans = parse_person_spans(content, source).unwrap();
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].text, "Jane Doe");
        assert_eq!(spans[0].start, 0);
        assert_eq!(spans[1].start, source.find("John Smith").unwrap());
    }

    #[test]
    fn test_parse_fenced_object_response() {
        let source = "Curriculum Vitae of Ravi Kumar";
        let content = "```json\n{\"entities\": [{\"text\": \"Ravi Kumar\", \"confidence\": 0.9}]}\n```";

        let spans = parse_person_spans(content, source).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(&source[spans[0].start..spans[0].end], "Ravi Kumar");
    }

    #[test]
    fn test_parse_drops_invented_names() {
        let source = "Experienced data analyst";
        let content = r#"[{"text": "Alex Johnson", "confidence": 0.99}]"#;
        assert!(parse_person_spans(content, source).unwrap().is_empty());
    }

    #[test]
    fn test_parse_empty_and_invalid() {
        assert!(parse_person_spans("[]", "text").unwrap().is_empty());
        assert!(parse_person_spans("I could not find a name.", "text").is_err());
    }

    #[test]
    fn test_api_key_required_for_hosted_provider() {
        let config = LlmConfig {
            model: "openai/gpt-4o-mini".to_string(),
            api_key: None,
            ..Default::default()
        };
        assert!(matches!(
            RecognizerApiClient::new(&config),
            Err(IntakeError::RecognizerUnavailable(_))
        ));
    }

    #[test]
    fn test_local_model_normalization() {
        let client = RecognizerApiClient::new(&local_config()).unwrap();
        assert_eq!(client.model(), "llama3");
        assert_eq!(client.config.base_url, OLLAMA_BASE_URL);
    }

    #[test]
    fn test_request_carries_system_prompt() {
        let client = RecognizerApiClient::new(&local_config()).unwrap();
        let request = client.build_request("Jane Doe").unwrap();
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.model, "llama3");
    }
}
