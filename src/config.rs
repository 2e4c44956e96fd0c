// Environment-driven configuration.
//
// `from_env` reads the process environment (after `.env` has been loaded by
// the binary); `from_lookup` holds the actual parsing so it can be tested
// with a plain map.

use crate::core::moderation::{ModerationEngine, PatternError, PatternTable};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

const DEFAULT_MODEL: &str = "deepseek/deepseek-chat-v3.1:free";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly, supportive assistant for young writers. \
Keep answers short, kind and age-appropriate.";
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_HISTORY: usize = 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: `{value}`")]
    InvalidValue { key: &'static str, value: String },

    #[error("failed to read {path}: {source}")]
    PatternFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Patterns(#[from] PatternError),
}

#[derive(Debug, Clone)]
pub struct AiSettings {
    pub api_key: String,
    pub model: String,
    pub system_prompt: String,
    pub temperature: f32,
    pub max_history: usize,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub extra_blocked_words: Vec<String>,
    pub patterns_file: Option<PathBuf>,
    pub log_db_path: Option<String>,
    /// `None` when no API key is set: chat is screened but never answered.
    pub ai: Option<AiSettings>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let extra_blocked_words = non_empty("MODERATION_EXTRA_BLOCKED_WORDS")
            .map(|list| {
                list.split(',')
                    .map(|w| w.trim().to_lowercase())
                    .filter(|w| !w.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let ai = match non_empty("OPENROUTER_API_KEY") {
            Some(api_key) => {
                let system_prompt = match non_empty("OPENROUTER_SYSTEM_PROMPT_FILE") {
                    Some(path) => std::fs::read_to_string(&path).unwrap_or_else(|e| {
                        tracing::warn!("Failed to read system prompt file at {}: {}", path, e);
                        DEFAULT_SYSTEM_PROMPT.to_string()
                    }),
                    None => non_empty("OPENROUTER_SYSTEM_PROMPT")
                        .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
                };

                Some(AiSettings {
                    api_key,
                    model: non_empty("OPENROUTER_MODEL")
                        .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                    system_prompt,
                    temperature: parse_or(
                        "OPENROUTER_TEMPERATURE",
                        non_empty("OPENROUTER_TEMPERATURE"),
                        DEFAULT_TEMPERATURE,
                    )?,
                    max_history: parse_or(
                        "OPENROUTER_MAX_HISTORY",
                        non_empty("OPENROUTER_MAX_HISTORY"),
                        DEFAULT_MAX_HISTORY,
                    )?,
                })
            }
            None => None,
        };

        Ok(Self {
            extra_blocked_words,
            patterns_file: non_empty("MODERATION_PATTERNS_FILE").map(PathBuf::from),
            log_db_path: non_empty("MODERATION_LOG_DB"),
            ai,
        })
    }

    /// The built-in tables plus whatever the configuration adds.
    pub fn pattern_table(&self) -> Result<PatternTable, ConfigError> {
        let mut table = PatternTable::builtin();

        if let Some(path) = &self.patterns_file {
            let json = std::fs::read_to_string(path).map_err(|source| ConfigError::PatternFile {
                path: path.clone(),
                source,
            })?;
            table.merge(PatternTable::from_json(&json)?);
        }

        table.merge(PatternTable {
            blocked_words: self.extra_blocked_words.clone(),
            ..Default::default()
        });

        Ok(table)
    }

    pub fn build_engine(&self) -> Result<ModerationEngine, ConfigError> {
        Ok(ModerationEngine::from_table(&self.pattern_table()?)?)
    }
}

fn parse_or<T: FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::moderation::Category;
    use std::collections::HashMap;
    use std::io::Write;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]).unwrap();
        assert!(config.extra_blocked_words.is_empty());
        assert!(config.patterns_file.is_none());
        assert!(config.log_db_path.is_none());
        assert!(config.ai.is_none());
    }

    #[test]
    fn test_ai_settings() {
        let config = config(&[
            ("OPENROUTER_API_KEY", "secret"),
            ("OPENROUTER_TEMPERATURE", "0.2"),
            ("OPENROUTER_SYSTEM_PROMPT", "Be brief."),
        ])
        .unwrap();

        let ai = config.ai.unwrap();
        assert_eq!(ai.api_key, "secret");
        assert_eq!(ai.model, DEFAULT_MODEL);
        assert_eq!(ai.system_prompt, "Be brief.");
        assert_eq!(ai.temperature, 0.2);
        assert_eq!(ai.max_history, DEFAULT_MAX_HISTORY);
    }

    #[test]
    fn test_malformed_number_is_an_error() {
        let err = config(&[
            ("OPENROUTER_API_KEY", "secret"),
            ("OPENROUTER_MAX_HISTORY", "lots"),
        ])
        .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "OPENROUTER_MAX_HISTORY",
                ..
            }
        ));
    }

    #[test]
    fn test_extra_blocked_words() {
        let config = config(&[("MODERATION_EXTRA_BLOCKED_WORDS", " Frick, ,heck ")]).unwrap();
        assert_eq!(config.extra_blocked_words, vec!["frick", "heck"]);

        let engine = config.build_engine().unwrap();
        assert!(engine.moderate_content("what the heck").has_category(Category::Profanity));
    }

    #[test]
    fn test_patterns_file_is_merged() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "patterns": {{ "dangerous": ["\\bskip(?:ping)? school\\b"] }} }}"#
        )
        .unwrap();

        let path = file.path().to_string_lossy().to_string();
        let config = config(&[("MODERATION_PATTERNS_FILE", path.as_str())]).unwrap();
        let engine = config.build_engine().unwrap();

        let result = engine.moderate_content("let's skip school tomorrow");
        assert_eq!(result.blocked_categories, vec![Category::Dangerous]);
    }

    #[test]
    fn test_missing_patterns_file() {
        let config = config(&[("MODERATION_PATTERNS_FILE", "/nonexistent/patterns.json")]).unwrap();
        assert!(matches!(
            config.build_engine(),
            Err(ConfigError::PatternFile { .. })
        ));
    }
}
