use std::fs;
use std::path::Path;

use regex::Regex;

use crate::error::{IntakeError, Result};

/// Used when no keyword list is configured or the configured one is unusable.
pub const DEFAULT_SKILLS: &[&str] = &["python", "excel", "sql", "java", "aws", "linux", "docker"];

/// Flat, ordered skill vocabulary with one compiled matcher per keyword.
#[derive(Debug, Clone)]
pub struct SkillVocabulary {
    entries: Vec<(String, Regex)>,
}

impl SkillVocabulary {
    pub fn from_keywords<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entries: Vec<(String, Regex)> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if keyword.is_empty() || entries.iter().any(|(k, _)| *k == keyword) {
                continue;
            }
            // Keywords like "c++" or ".net" end in non-word chars, so `\b`
            // would never match there. Use explicit non-word lookaround
            // substitutes instead.
            let pattern = format!(r"(?i)(?:^|[^\w]){}(?:$|[^\w])", regex::escape(&keyword));
            match Regex::new(&pattern) {
                Ok(re) => entries.push((keyword, re)),
                Err(e) => tracing::warn!(keyword = %keyword, error = %e, "Skipping skill keyword"),
            }
        }
        Self { entries }
    }

    /// Reads a keyword list: a JSON array of strings, or one keyword per
    /// line (`#` comments allowed).
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            IntakeError::Config(format!("cannot read skills list {}: {e}", path.display()))
        })?;

        let trimmed = raw.trim_start();
        let keywords: Vec<String> = if trimmed.starts_with('[') {
            serde_json::from_str(trimmed).map_err(|e| {
                IntakeError::Config(format!("invalid skills list {}: {e}", path.display()))
            })?
        } else {
            raw.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty() && !l.starts_with('#'))
                .map(String::from)
                .collect()
        };

        let vocabulary = Self::from_keywords(keywords);
        if vocabulary.is_empty() {
            return Err(IntakeError::Config(format!(
                "skills list {} contains no keywords",
                path.display()
            )));
        }
        Ok(vocabulary)
    }

    /// Loads from `path` when given, falling back to [`DEFAULT_SKILLS`].
    pub fn load(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::from_file(path).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Using default skills list");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Keywords present in `text`, in vocabulary order.
    pub fn match_in(&self, text: &str) -> Vec<String> {
        self.entries
            .iter()
            .filter(|(_, re)| re.is_match(text))
            .map(|(keyword, _)| keyword.clone())
            .collect()
    }

    pub fn keywords(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SkillVocabulary {
    fn default() -> Self {
        Self::from_keywords(DEFAULT_SKILLS)
    }
}
