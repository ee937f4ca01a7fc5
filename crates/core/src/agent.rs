//! Agent loop settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What the loop does after a model call fails with a non-transient error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelErrorPolicy {
    /// Emit `error` and end the whole session.
    #[default]
    Abort,
    /// Emit `error` and, in interactive mode, wait for the next input.
    EndTurn,
}

/// Everything the loop needs besides the provider, tools and queue.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,

    /// Model calls allowed per turn before the loop gives up.
    pub max_iterations: u32,

    pub system_prompt: Option<String>,

    /// Fixed wait before retrying a rate-limited model call.
    pub rate_limit_backoff: Duration,

    /// Upper bound on a single model call.
    pub request_timeout: Option<Duration>,

    pub on_model_error: ModelErrorPolicy,
}

impl LoopSettings {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: 0.7,
            max_tokens: None,
            max_iterations: 10,
            system_prompt: None,
            rate_limit_backoff: Duration::from_millis(2000),
            request_timeout: None,
            on_model_error: ModelErrorPolicy::Abort,
        }
    }
}
