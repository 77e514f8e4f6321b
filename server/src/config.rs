use crate::error::{ConfigError, Result as AppResult};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

pub const LANGUAGE_PLACEHOLDER: &str = "{lang}";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSourceType {
    File,
    Http,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub source_type: ContentSourceType,
    /// Path template; `{lang}` is replaced by the language tag.
    pub file_path: Option<String>,
    /// URL template; `{lang}` is replaced by the language tag.
    pub http_url: Option<String>,
    pub default_language: String,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            source_type: ContentSourceType::File,
            file_path: Some(format!("content/questions.{LANGUAGE_PLACEHOLDER}.json")),
            http_url: None,
            default_language: "en".to_string(),
        }
    }
}

/// What a draw does once every item of the active pool has been seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustionPolicy {
    /// Report the pool as exhausted and disable drawing.
    #[default]
    HardStop,
    /// Forget the exhausted partition's history and draw again.
    Recycle,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub round_duration_seconds: u32,
    pub max_draw_attempts: usize,
    pub default_difficulty: String,
    pub exhaustion_policy: ExhaustionPolicy,
    pub command_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            round_duration_seconds: 30,
            max_draw_attempts: 250,
            default_difficulty: "easy".to_string(),
            exhaustion_policy: ExhaustionPolicy::HardStop,
            command_buffer: 32,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl AppSettings {
    fn validate(self) -> Result<Self, ConfigError> {
        if self.session.max_draw_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "session.max_draw_attempts must be at least 1".to_string(),
            ));
        }
        if self.session.command_buffer == 0 {
            return Err(ConfigError::InvalidValue(
                "session.command_buffer must be at least 1".to_string(),
            ));
        }
        if self.content.default_language.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "content.default_language must not be empty".to_string(),
            ));
        }
        Ok(self)
    }
}

pub fn load_settings() -> AppResult<AppSettings> {
    let builder = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(
            Environment::with_prefix("BRAIN_BATTLE")
                .separator("__")
                .try_parsing(true),
        );

    let settings = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_settings: AppSettings = settings
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    Ok(app_settings.validate()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_round_rules() {
        let settings = AppSettings::default();
        assert_eq!(settings.session.round_duration_seconds, 30);
        assert_eq!(settings.session.max_draw_attempts, 250);
        assert_eq!(settings.session.default_difficulty, "easy");
        assert_eq!(settings.session.exhaustion_policy, ExhaustionPolicy::HardStop);
        assert_eq!(settings.content.source_type, ContentSourceType::File);
        assert_eq!(settings.content.default_language, "en");
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut settings = AppSettings::default();
        settings.session.max_draw_attempts = 0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_exhaustion_policy_deserializes_snake_case() {
        let policy: ExhaustionPolicy = serde_json::from_str("\"recycle\"").unwrap();
        assert_eq!(policy, ExhaustionPolicy::Recycle);
        let policy: ExhaustionPolicy = serde_json::from_str("\"hard_stop\"").unwrap();
        assert_eq!(policy, ExhaustionPolicy::HardStop);
    }

    #[test]
    fn test_partial_settings_fill_in_defaults() {
        let settings = Config::builder()
            .set_default("content.source_type", "http")
            .unwrap()
            .set_default("content.http_url", "https://example.com/{lang}.json")
            .unwrap()
            .set_default("content.default_language", "de")
            .unwrap()
            .build()
            .unwrap();
        let parsed: AppSettings = settings.try_deserialize().unwrap();
        assert_eq!(parsed.content.source_type, ContentSourceType::Http);
        assert_eq!(parsed.content.default_language, "de");
        assert_eq!(parsed.session.round_duration_seconds, 30);
    }
}
