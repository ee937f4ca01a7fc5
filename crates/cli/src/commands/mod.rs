//! Subcommand implementations and the setup they share.

pub mod ask;
pub mod models;
pub mod onboard;
pub mod run;
pub mod tools;

use std::time::Duration;

use loopy_config::AppConfig;
use loopy_core::panel::PanelStore;
use loopy_core::tool::ToolRegistry;

/// Command-line overrides applied on top of the loaded configuration.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub max_iterations: Option<u32>,
}

impl Overrides {
    /// Apply to `config`. Switching provider without naming a model picks
    /// that provider's default model.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(provider) = &self.provider
            && *provider != config.model.provider
        {
            config.model.provider = provider.clone();
            config.model.api_key = None;
            if let Some(model) = loopy_providers::default_model_for(provider) {
                config.model.name = model.to_string();
            }
        }
        if let Some(model) = &self.model {
            config.model.name = model.clone();
        }
        if let Some(max) = self.max_iterations {
            config.agent.max_iterations = max;
        }
    }
}

/// Load the configuration, apply overrides and validate the result.
pub fn load_config(overrides: &Overrides) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    overrides.apply(&mut config);
    // A provider switch drops the configured key, so look it up again.
    if config.model.api_key.is_none()
        && let Some(var) = loopy_config::api_key_env(&config.model.provider)
    {
        config.model.api_key = std::env::var(var).ok().filter(|k| !k.is_empty());
    }
    config.validate()?;
    Ok(config)
}

/// External tools from config plus the status tools bound to `store`.
pub fn build_tools(config: &AppConfig, store: &PanelStore) -> ToolRegistry {
    let mut registry = loopy_tools::registry_for(
        &config.tools.enabled,
        &config.tools.shell.allowed_commands,
    )
    .with_timeout(Duration::from_secs(config.tools.timeout_secs));
    registry.merge(loopy_tools::status_tools(store));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_switch_picks_default_model() {
        let mut config = AppConfig::default();
        config.model.api_key = Some("sk-ant".into());
        Overrides {
            provider: Some("openai".into()),
            ..Default::default()
        }
        .apply(&mut config);

        assert_eq!(config.model.provider, "openai");
        assert_eq!(config.model.name, "gpt-4o");
        assert!(config.model.api_key.is_none());
    }

    #[test]
    fn explicit_model_wins() {
        let mut config = AppConfig::default();
        Overrides {
            provider: Some("groq".into()),
            model: Some("mixtral".into()),
            max_iterations: Some(3),
        }
        .apply(&mut config);

        assert_eq!(config.model.name, "mixtral");
        assert_eq!(config.agent.max_iterations, 3);
    }

    #[test]
    fn same_provider_keeps_key() {
        let mut config = AppConfig::default();
        config.model.api_key = Some("sk-ant".into());
        Overrides {
            provider: Some("anthropic".into()),
            ..Default::default()
        }
        .apply(&mut config);
        assert_eq!(config.model.api_key.as_deref(), Some("sk-ant"));
    }

    #[test]
    fn tools_include_status_tools() {
        let mut config = AppConfig::default();
        config.tools.enabled = vec!["read_file".into(), "list_dir".into()];
        let registry = build_tools(&config, &PanelStore::new());
        assert_eq!(
            registry.list(),
            vec![
                "read_file",
                "list_dir",
                "update_memory",
                "update_goals",
                "update_self"
            ]
        );
    }
}
