//! Multi-tier TOML configuration for Memoria.
//!
//! Reads configuration from multiple sources with precedence:
//! CLI flags > env vars > global config file > defaults

use memoria_session::MemoryConfig;
use memoria_types::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The default OpenAI-compatible API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.openai.com";

/// The default model to use.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// The default max tokens for a reply.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// The default sampling temperature for replies.
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// The default HTTP request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The default number of retries on transient provider errors.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// The default behavior prompt seeded into every session.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful, friendly assistant with a good memory. \
Use the conversation history and any summaries of earlier conversation to give consistent, \
context-aware answers. If you do not know something, say so.";

/// Resolved configuration for a Memoria session.
#[derive(Debug, Clone)]
pub struct MemoriaConfig {
    pub api_key: String,
    pub model: String,
    pub api_base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub system_prompt: String,
    pub memory: MemoryConfig,
    pub config_dir: PathBuf,
}

/// Settings that can be read from a TOML config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub memory: MemorySettings,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

/// Memory limits section of the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemorySettings {
    pub capacity: Option<usize>,
    pub summary_threshold: Option<usize>,
    pub recent_count: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSettings {
    pub system_prompt: Option<String>,
}

/// CLI overrides that take highest precedence.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    pub system_prompt: Option<String>,
}

impl MemoriaConfig {
    /// Load configuration from all sources, applying precedence rules.
    ///
    /// Precedence (highest to lowest):
    /// 1. CLI flags
    /// 2. Environment variables
    /// 3. Global config (~/.memoria/config.toml)
    /// 4. Defaults
    pub fn load(overrides: CliOverrides) -> Result<Self, ConfigError> {
        let config_dir = config_dir();
        let settings = load_settings_file(&config_dir.join("config.toml"));
        Self::resolve(overrides, settings, config_dir, |key| std::env::var(key).ok())
    }

    /// Merge already-read sources. `env` looks up an environment variable.
    pub fn resolve(
        overrides: CliOverrides,
        settings: SettingsFile,
        config_dir: PathBuf,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        // Resolve API key: CLI > env > config file
        let api_key = overrides
            .api_key
            .or_else(|| env("OPENAI_API_KEY"))
            .or(settings.api.api_key)
            .ok_or_else(|| ConfigError::MissingKey {
                key: "api_key (set OPENAI_API_KEY or add to ~/.memoria/config.toml)".into(),
            })?;

        let model = overrides
            .model
            .or_else(|| env("MEMORIA_MODEL"))
            .or(settings.api.model)
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let api_base_url = env("MEMORIA_API_BASE_URL")
            .or(settings.api.base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let max_tokens = overrides
            .max_tokens
            .or(settings.api.max_tokens)
            .unwrap_or(DEFAULT_MAX_TOKENS);

        let temperature = settings.api.temperature.unwrap_or(DEFAULT_TEMPERATURE);
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidValue {
                key: "api.temperature".into(),
                message: format!("{temperature} is outside 0.0..=2.0"),
            });
        }

        let system_prompt = overrides
            .system_prompt
            .or(settings.session.system_prompt)
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        let defaults = MemoryConfig::default();
        let memory = MemoryConfig {
            capacity: settings.memory.capacity.unwrap_or(defaults.capacity),
            summary_threshold: settings
                .memory
                .summary_threshold
                .unwrap_or(defaults.summary_threshold),
            recent_count: settings.memory.recent_count.unwrap_or(defaults.recent_count),
        };
        validate_memory(&memory)?;

        Ok(MemoriaConfig {
            api_key,
            model,
            api_base_url,
            max_tokens,
            temperature,
            timeout_secs: settings.api.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            max_retries: settings.api.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            system_prompt,
            memory,
            config_dir,
        })
    }
}

/// Reject limits that would make compaction meaningless.
fn validate_memory(memory: &MemoryConfig) -> Result<(), ConfigError> {
    if memory.capacity == 0 {
        return Err(ConfigError::InvalidValue {
            key: "memory.capacity".into(),
            message: "must be at least 1".into(),
        });
    }
    if memory.summary_threshold < 2 || memory.summary_threshold >= memory.capacity {
        return Err(ConfigError::InvalidValue {
            key: "memory.summary_threshold".into(),
            message: format!(
                "must be at least 2 and below capacity ({}), got {}",
                memory.capacity, memory.summary_threshold
            ),
        });
    }
    Ok(())
}

/// Get the Memoria config directory path (~/.memoria/).
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("MEMORIA_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".memoria")
}

/// Load and parse a TOML settings file, returning defaults on any error.
pub fn load_settings_file(path: &Path) -> SettingsFile {
    match std::fs::read_to_string(path) {
        Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse {}: {}", path.display(), e);
            SettingsFile::default()
        }),
        Err(_) => SettingsFile::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn with_key() -> CliOverrides {
        CliOverrides {
            api_key: Some("sk-test".into()),
            ..CliOverrides::default()
        }
    }

    #[test]
    fn test_default_settings() {
        let settings = SettingsFile::default();
        assert!(settings.api.api_key.is_none());
        assert!(settings.memory.capacity.is_none());
    }

    #[test]
    fn test_settings_toml_parse() {
        let toml_str = r#"
[api]
model = "gpt-4o-mini"
max_tokens = 512

[memory]
capacity = 80
summary_threshold = 30

[session]
system_prompt = "You are a pirate."
"#;
        let settings: SettingsFile = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.api.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(settings.api.max_tokens, Some(512));
        assert_eq!(settings.memory.capacity, Some(80));
        assert_eq!(settings.memory.summary_threshold, Some(30));
        assert!(settings.memory.recent_count.is_none());
        assert_eq!(
            settings.session.system_prompt.as_deref(),
            Some("You are a pirate.")
        );
    }

    #[test]
    fn test_resolve_defaults() {
        let config =
            MemoriaConfig::resolve(with_key(), SettingsFile::default(), PathBuf::from("/tmp"), no_env)
                .unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.max_tokens, 1000);
        assert_eq!(config.memory, MemoryConfig::default());
        assert_eq!(config.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn test_missing_api_key() {
        let result = MemoriaConfig::resolve(
            CliOverrides::default(),
            SettingsFile::default(),
            PathBuf::from("/tmp"),
            no_env,
        );
        assert!(matches!(result, Err(ConfigError::MissingKey { .. })));
    }

    #[test]
    fn test_precedence_cli_over_env_over_file() {
        let mut settings = SettingsFile::default();
        settings.api.api_key = Some("file-key".into());
        settings.api.model = Some("file-model".into());

        let env = |key: &str| match key {
            "OPENAI_API_KEY" => Some("env-key".to_string()),
            "MEMORIA_MODEL" => Some("env-model".to_string()),
            _ => None,
        };

        let config = MemoriaConfig::resolve(
            CliOverrides {
                model: Some("cli-model".into()),
                ..CliOverrides::default()
            },
            settings,
            PathBuf::from("/tmp"),
            env,
        )
        .unwrap();

        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.model, "cli-model");
    }

    #[test]
    fn test_threshold_must_be_below_capacity() {
        let mut settings = SettingsFile::default();
        settings.memory.capacity = Some(10);
        settings.memory.summary_threshold = Some(10);
        let result = MemoriaConfig::resolve(with_key(), settings, PathBuf::from("/tmp"), no_env);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "memory.summary_threshold"
        ));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let mut settings = SettingsFile::default();
        settings.memory.capacity = Some(0);
        let result = MemoriaConfig::resolve(with_key(), settings, PathBuf::from("/tmp"), no_env);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "memory.capacity"
        ));
    }

    #[test]
    fn test_temperature_out_of_range() {
        let mut settings = SettingsFile::default();
        settings.api.temperature = Some(3.5);
        let result = MemoriaConfig::resolve(with_key(), settings, PathBuf::from("/tmp"), no_env);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_unparsable_file_falls_back_to_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[memory\ncapacity = ").unwrap();
        let settings = load_settings_file(&path);
        assert!(settings.memory.capacity.is_none());
    }

    #[test]
    fn test_missing_file_is_default() {
        let settings = load_settings_file(Path::new("/nonexistent/memoria/config.toml"));
        assert!(settings.api.model.is_none());
    }

    #[test]
    fn test_settings_file_read_from_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[memory]\nrecent_count = 4\n").unwrap();
        let settings = load_settings_file(&path);
        assert_eq!(settings.memory.recent_count, Some(4));
    }
}
