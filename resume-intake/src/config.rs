use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{IntakeError, Result};
use crate::store::CANONICAL_COLUMNS;

pub const CONFIG_FILE_NAME: &str = "config.json";
pub const DEFAULT_DUPLICATE_WINDOW_DAYS: u32 = 30;

/// Any of these creates the `recognizer.llm` section when it is missing.
const LLM_ENV_VARS: &[&str] = &[
    "LLM_MODEL",
    "LLM_API_KEY",
    "LLM_BASE_URL",
    "LLM_TIMEOUT",
    "LLM_MAX_RETRIES",
];

fn parse_env_or<T: FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

/// Persisted tool settings. Lives at `<workspace>/config.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Workbook rows are appended to. `None` means the workspace default.
    pub active_workbook: Option<PathBuf>,
    pub duplicate_check_enabled: bool,
    pub duplicate_window_days: u32,
    /// JSON array or newline-delimited keyword list.
    pub skills_path: Option<PathBuf>,
    /// Header written into newly created workbooks.
    pub default_columns: Vec<String>,
    pub recognizer: RecognizerConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognizerBackend {
    #[default]
    Heuristic,
    Llm,
}

impl FromStr for RecognizerBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "heuristic" | "local" => Ok(Self::Heuristic),
            "llm" => Ok(Self::Llm),
            other => Err(format!("unknown recognizer backend '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    pub backend: RecognizerBackend,
    pub llm: Option<LlmConfig>,
}

/// OpenAI-compatible chat model used by the LLM person recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// `provider/model`, e.g. `openai/gpt-4o-mini` or `ollama/llama3`
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    /// Only the head of the document is sent.
    pub max_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "openai/gpt-4o-mini".to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: 30,
            max_retries: 2,
            max_chars: 2000,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            active_workbook: None,
            duplicate_check_enabled: true,
            duplicate_window_days: DEFAULT_DUPLICATE_WINDOW_DAYS,
            skills_path: None,
            default_columns: CANONICAL_COLUMNS.iter().map(|c| c.to_string()).collect(),
            recognizer: RecognizerConfig::default(),
        }
    }
}

impl Config {
    /// Loads the persisted config. A missing or unreadable file is replaced
    /// with defaults, which are written back.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            tracing::info!(path = %path.display(), "Created default configuration");
            return Ok(config);
        }

        let loaded = fs::read_to_string(path)
            .map_err(IntakeError::from)
            .and_then(|raw| serde_json::from_str::<Config>(&raw).map_err(IntakeError::from));

        match loaded {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to load config, restoring defaults"
                );
                let config = Self::default();
                config.save(path)?;
                Ok(config)
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        fs::write(path, raw).map_err(|e| {
            IntakeError::WriteFailure(format!("cannot write config {}: {e}", path.display()))
        })
    }

    /// Applies process environment overrides on top of the persisted values.
    /// Overrides are runtime-only and never saved.
    pub fn with_env_overrides(mut self) -> Self {
        self.duplicate_window_days =
            parse_env_or("INTAKE_DUPLICATE_DAYS", self.duplicate_window_days);
        self.duplicate_check_enabled =
            parse_env_or("INTAKE_DUPLICATE_CHECK", self.duplicate_check_enabled);
        if let Some(path) = parse_env_opt::<PathBuf>("INTAKE_SKILLS_PATH") {
            self.skills_path = Some(path);
        }
        self.recognizer.backend = parse_env_or("INTAKE_NAME_BACKEND", self.recognizer.backend);

        if LLM_ENV_VARS.iter().any(|var| env::var_os(var).is_some()) {
            let llm = self.recognizer.llm.get_or_insert_with(LlmConfig::default);
            if let Ok(model) = env::var("LLM_MODEL") {
                llm.model = model;
            }
            if let Ok(key) = env::var("LLM_API_KEY") {
                llm.api_key = Some(key);
            }
            if let Ok(url) = env::var("LLM_BASE_URL") {
                llm.base_url = Some(url);
            }
            llm.timeout_secs = parse_env_or("LLM_TIMEOUT", llm.timeout_secs);
            llm.max_retries = parse_env_or("LLM_MAX_RETRIES", llm.max_retries);
        }
        self
    }

    /// Sets a single key from its textual form, as used by `config set`.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |e: &dyn std::fmt::Display| {
            IntakeError::Config(format!("invalid value '{value}' for {key}: {e}"))
        };

        match key {
            "active_workbook" => self.active_workbook = Some(PathBuf::from(value)),
            "duplicate_check_enabled" => {
                self.duplicate_check_enabled = value.parse::<bool>().map_err(|e| invalid(&e))?
            }
            "duplicate_window_days" => {
                self.duplicate_window_days = value.parse::<u32>().map_err(|e| invalid(&e))?
            }
            "skills_path" => {
                self.skills_path = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                }
            }
            "recognizer.backend" => {
                self.recognizer.backend = value
                    .parse::<RecognizerBackend>()
                    .map_err(|e| invalid(&e))?
            }
            "recognizer.llm.model" => {
                self.recognizer
                    .llm
                    .get_or_insert_with(LlmConfig::default)
                    .model = value.to_string()
            }
            "recognizer.llm.base_url" => {
                self.recognizer
                    .llm
                    .get_or_insert_with(LlmConfig::default)
                    .base_url = Some(value.to_string())
            }
            other => {
                return Err(IntakeError::Config(format!("unknown config key '{other}'")));
            }
        }
        Ok(())
    }
}

/// Known LLM providers that expose OpenAI-compatible APIs
pub const KNOWN_LLM_PROVIDERS: &[&str] = &["openai", "openrouter", "ollama", "lmstudio"];

/// Parse an LLM model name into (provider, model) tuple.
pub fn parse_llm_provider_model(model: &str) -> (&str, &str) {
    if let Some((prefix, rest)) = model.split_once('/') {
        let prefix_lower = prefix.to_lowercase();
        if KNOWN_LLM_PROVIDERS.contains(&prefix_lower.as_str()) {
            return (prefix, rest);
        }
    }
    ("local", model)
}
