//! Configuration loading and validation for Loopy.
//!
//! Loads configuration from `~/.loopy/config.toml` (or
//! `~/.config/loopy/config.toml`) with environment variable overrides.
//! Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use loopy_core::{LoopSettings, ModelErrorPolicy};

const CONFIG_FILE_NAME: &str = "config.toml";

/// The root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub agent: AgentSection,

    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Which model to talk to and how to reach it.
#[derive(Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Provider kind: anthropic, openai, google, groq, mistral, openrouter, ollama, custom
    #[serde(default = "default_provider")]
    pub provider: String,

    #[serde(default = "default_model")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Required for `custom`; overrides the well-known URL otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

fn default_provider() -> String {
    "anthropic".into()
}
fn default_model() -> String {
    "claude-sonnet-4-20250514".into()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            name: default_model(),
            api_key: None,
            base_url: None,
        }
    }
}

impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("provider", &self.provider)
            .field("name", &self.name)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSection {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Keep the session alive and wait for more input after each turn
    #[serde(default = "default_true")]
    pub interactive: bool,

    /// Prepend the harness prompt (read self.md / memories.md first)
    #[serde(default)]
    pub harness_prompt: bool,

    #[serde(default = "default_backoff_ms")]
    pub rate_limit_backoff_ms: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,

    #[serde(default)]
    pub on_model_error: ModelErrorPolicy,
}

fn default_max_iterations() -> u32 {
    10
}
fn default_temperature() -> f32 {
    0.7
}
fn default_true() -> bool {
    true
}
fn default_backoff_ms() -> u64 {
    2000
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            system_prompt: None,
            temperature: default_temperature(),
            max_tokens: None,
            interactive: true,
            harness_prompt: false,
            rate_limit_backoff_ms: default_backoff_ms(),
            request_timeout_secs: None,
            on_model_error: ModelErrorPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Names of the external tools to register
    #[serde(default = "default_enabled_tools")]
    pub enabled: Vec<String>,

    /// Upper bound on a single tool execution
    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub shell: ShellConfig,
}

fn default_enabled_tools() -> Vec<String> {
    ["shell", "read_file", "write_file", "list_dir"]
        .into_iter()
        .map(String::from)
        .collect()
}
fn default_tool_timeout() -> u64 {
    60
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled_tools(),
            timeout_secs: default_tool_timeout(),
            shell: ShellConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShellConfig {
    /// If non-empty, only these base commands may run
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_commands: Vec<String>,
}

impl AppConfig {
    /// Load configuration from the first config file found, then apply
    /// environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::load_from(&path)?,
            None => {
                tracing::info!("No config file found, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Candidate config locations, in lookup order.
    pub fn config_paths() -> Vec<PathBuf> {
        let home = dirs_home();
        vec![
            home.join(".loopy").join(CONFIG_FILE_NAME),
            home.join(".config").join("loopy").join(CONFIG_FILE_NAME),
        ]
    }

    fn find_config_file() -> Option<PathBuf> {
        Self::config_paths().into_iter().find(|p| p.exists())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".loopy")
    }

    /// Apply `LOOPY_*` overrides and the provider's API key variable.
    ///
    /// `lookup` is injected so tests don't have to touch the process env.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(provider) = lookup("LOOPY_PROVIDER") {
            self.model.provider = provider;
        }
        if let Some(model) = lookup("LOOPY_MODEL") {
            self.model.name = model;
        }
        if let Some(max) = lookup("LOOPY_MAX_ITERATIONS") {
            match max.parse() {
                Ok(max) => self.agent.max_iterations = max,
                Err(_) => tracing::warn!(value = %max, "Ignoring invalid LOOPY_MAX_ITERATIONS"),
            }
        }
        if self.model.api_key.is_none()
            && let Some(var) = api_key_env(&self.model.provider)
        {
            self.model.api_key = lookup(var).filter(|k| !k.is_empty());
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.agent.temperature) {
            return Err(ConfigError::ValidationError(
                "agent.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        if api_key_env(&self.model.provider).is_none() {
            return Err(ConfigError::ValidationError(format!(
                "unknown model.provider '{}'",
                self.model.provider
            )));
        }

        if self.model.provider == "custom" && self.model.base_url.is_none() {
            return Err(ConfigError::ValidationError(
                "model.base_url is required for the custom provider".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.model.api_key.is_some()
    }

    /// The loop settings this configuration describes.
    ///
    /// `system_prompt` is passed in because the caller may combine the
    /// configured prompt with the harness prompt.
    pub fn loop_settings(&self, system_prompt: Option<String>) -> LoopSettings {
        LoopSettings {
            model: self.model.name.clone(),
            temperature: self.agent.temperature,
            max_tokens: self.agent.max_tokens,
            max_iterations: self.agent.max_iterations,
            system_prompt,
            rate_limit_backoff: Duration::from_millis(self.agent.rate_limit_backoff_ms),
            request_timeout: self.agent.request_timeout_secs.map(Duration::from_secs),
            on_model_error: self.agent.on_model_error,
        }
    }

    /// Generate a default config TOML string (for `onboard`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Environment variable holding the API key for a provider kind.
///
/// `None` means the provider kind is unknown.
pub fn api_key_env(provider: &str) -> Option<&'static str> {
    let var = match provider {
        "anthropic" => "ANTHROPIC_API_KEY",
        "openai" => "OPENAI_API_KEY",
        "google" => "GOOGLE_GENERATIVE_AI_API_KEY",
        "groq" => "GROQ_API_KEY",
        "mistral" => "MISTRAL_API_KEY",
        "openrouter" => "OPENROUTER_API_KEY",
        "ollama" => "OLLAMA_API_KEY",
        "custom" => "CUSTOM_API_KEY",
        _ => return None,
    };
    Some(var)
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model.provider, "anthropic");
        assert_eq!(config.agent.max_iterations, 10);
        assert!(config.agent.interactive);
        assert_eq!(
            config.tools.enabled,
            vec!["shell", "read_file", "write_file", "list_dir"]
        );
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.model.provider, config.model.provider);
        assert_eq!(parsed.agent.max_iterations, config.agent.max_iterations);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let toml_str = r#"
[model]
provider = "groq"
name = "llama-3.3-70b-versatile"

[agent]
max_iterations = 4
on_model_error = "end_turn"

[tools]
enabled = ["read_file"]

[tools.shell]
allowed_commands = ["ls", "git"]
"#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model.provider, "groq");
        assert_eq!(config.agent.max_iterations, 4);
        assert_eq!(config.agent.on_model_error, ModelErrorPolicy::EndTurn);
        assert!((config.agent.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.tools.enabled, vec!["read_file"]);
        assert_eq!(config.tools.shell.allowed_commands, vec!["ls", "git"]);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.agent.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_iterations_rejected() {
        let mut config = AppConfig::default();
        config.agent.max_iterations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn custom_provider_requires_base_url() {
        let mut config = AppConfig::default();
        config.model.provider = "custom".into();
        assert!(config.validate().is_err());
        config.model.base_url = Some("http://localhost:9000/v1".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_provider_rejected() {
        let mut config = AppConfig::default();
        config.model.provider = "acme".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(env(&[
            ("LOOPY_PROVIDER", "openai"),
            ("LOOPY_MODEL", "gpt-4o"),
            ("LOOPY_MAX_ITERATIONS", "3"),
            ("OPENAI_API_KEY", "sk-test"),
            ("ANTHROPIC_API_KEY", "sk-ant"),
        ]));
        assert_eq!(config.model.provider, "openai");
        assert_eq!(config.model.name, "gpt-4o");
        assert_eq!(config.agent.max_iterations, 3);
        assert_eq!(config.model.api_key.as_deref(), Some("sk-test"));
    }

    #[test]
    fn explicit_api_key_wins_over_env() {
        let mut config = AppConfig::default();
        config.model.api_key = Some("from-file".into());
        config.apply_env_overrides(env(&[("ANTHROPIC_API_KEY", "from-env")]));
        assert_eq!(config.model.api_key.as_deref(), Some("from-file"));
    }

    #[test]
    fn bad_max_iterations_env_is_ignored() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(env(&[("LOOPY_MAX_ITERATIONS", "lots")]));
        assert_eq!(config.agent.max_iterations, 10);
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.model.provider, "anthropic");
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent]\nmax_iterations = 7\n").unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.agent.max_iterations, 7);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent\nmax_iterations = ").unwrap();
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn loop_settings_mirror_config() {
        let mut config = AppConfig::default();
        config.agent.request_timeout_secs = Some(30);
        let settings = config.loop_settings(Some("be brief".into()));
        assert_eq!(settings.model, config.model.name);
        assert_eq!(settings.max_iterations, 10);
        assert_eq!(settings.rate_limit_backoff, Duration::from_millis(2000));
        assert_eq!(settings.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(settings.system_prompt.as_deref(), Some("be brief"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut config = AppConfig::default();
        config.model.api_key = Some("sk-secret".into());
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("sk-secret"));
        assert!(dbg.contains("REDACTED"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("anthropic"));
        assert!(toml_str.contains("max_iterations"));
    }
}
