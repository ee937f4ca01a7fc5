//! Provider selection driven by configuration.
//!
//! Every supported provider kind is reached through the OpenAI-compatible
//! adapter; the kind only decides the base URL, the API key source and the
//! default model.

use std::sync::Arc;

use loopy_config::AppConfig;
use loopy_core::error::ProviderError;
use loopy_core::provider::ModelProvider;
use tracing::info;

use crate::openai_compat::OpenAiCompatProvider;

/// Build the provider described by `config.model`.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn ModelProvider>, ProviderError> {
    let kind = config.model.provider.as_str();

    let base_url = match config.model.base_url.clone() {
        Some(url) => url,
        None => default_base_url(kind).ok_or_else(|| {
            ProviderError::NotConfigured(format!("no base URL known for provider '{kind}'"))
        })?,
    };

    let api_key = match (&config.model.api_key, requires_api_key(kind)) {
        (Some(key), _) => key.clone(),
        (None, false) => String::new(),
        (None, true) => {
            let var = loopy_config::api_key_env(kind).unwrap_or("API key");
            return Err(ProviderError::NotConfigured(format!(
                "no API key for provider '{kind}' (set {var} or model.api_key)"
            )));
        }
    };

    info!(provider = kind, base_url = %base_url, model = %config.model.name, "Using provider");

    Ok(Arc::new(OpenAiCompatProvider::new(kind, base_url, api_key)))
}

/// Well-known OpenAI-compatible endpoints per provider kind.
pub fn default_base_url(provider: &str) -> Option<String> {
    let url = match provider {
        "anthropic" => "https://api.anthropic.com/v1",
        "openai" => "https://api.openai.com/v1",
        "google" => "https://generativelanguage.googleapis.com/v1beta/openai",
        "groq" => "https://api.groq.com/openai/v1",
        "mistral" => "https://api.mistral.ai/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        _ => return None,
    };
    Some(url.into())
}

/// The model used when a provider kind is picked without naming a model.
pub fn default_model_for(provider: &str) -> Option<&'static str> {
    let model = match provider {
        "anthropic" => "claude-sonnet-4-20250514",
        "openai" => "gpt-4o",
        "google" => "gemini-2.0-flash",
        "groq" => "llama-3.3-70b-versatile",
        "mistral" => "mistral-large-latest",
        "openrouter" => "anthropic/claude-sonnet-4",
        "ollama" => "llama3.2",
        _ => return None,
    };
    Some(model)
}

// Local and self-hosted servers usually run without auth.
fn requires_api_key(provider: &str) -> bool {
    !matches!(provider, "ollama" | "custom")
}
