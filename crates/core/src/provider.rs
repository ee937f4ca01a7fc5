//! ModelProvider trait: the abstraction over LLM backends.
//!
//! A provider knows how to send a conversation plus the available tool
//! schemas to a model and get back either text, tool calls, or both.
//! Vendor specifics live in `loopy-providers`; the loop only sees this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::Message;
use crate::tool::ToolCall;

/// Configuration for a provider request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "gpt-4o", "claude-sonnet-4-20250514")
    pub model: String,

    /// The full conversation history, system prompt first when present
    pub messages: Vec<Message>,

    /// Temperature (0.0 = deterministic, 2.0 = most random)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Available tools the model can call
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

fn default_temperature() -> f32 {
    0.7
}

/// A tool definition sent to the model so it knows what it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// A complete (non-streaming) response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated assistant message; `content` may be empty and
    /// `tool_calls` may be empty, but not usually both.
    pub message: Message,

    /// Token usage statistics
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    pub model: String,
}

impl ProviderResponse {
    /// The response text, if the model produced any.
    pub fn text(&self) -> Option<&str> {
        let text = self.message.content.as_str();
        (!text.trim().is_empty()).then_some(text)
    }

    pub fn tool_calls(&self) -> &[ToolCall] {
        &self.message.tool_calls
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A single chunk in a streaming response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Partial content delta
    #[serde(default)]
    pub content: Option<String>,

    /// Completed tool calls (typically only in the final chunk)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Whether this is the final chunk
    #[serde(default)]
    pub done: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// The model capability consumed by the agent loop.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai", "groq").
    fn name(&self) -> &str;

    /// Send a request and get a complete response.
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Send a request and get a stream of response chunks.
    ///
    /// Default implementation calls `complete()` and wraps the result as a single chunk.
    async fn stream(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<StreamChunk, ProviderError>>,
        ProviderError,
    > {
        let response = self.complete(request).await?;
        let (tx, rx) = tokio::sync::mpsc::channel(1);
        let _ = tx
            .send(Ok(StreamChunk {
                content: Some(response.message.content),
                tool_calls: response.message.tool_calls,
                done: true,
                usage: response.usage,
            }))
            .await;
        Ok(rx)
    }

    /// List available models for this provider.
    async fn list_models(&self) -> std::result::Result<Vec<String>, ProviderError> {
        Ok(Vec::new())
    }

    /// Health check: can we reach the provider?
    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider;

    #[async_trait]
    impl ModelProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            let call = ToolCall::new("call_1", "shell", serde_json::json!({"command": "ls"}));
            Ok(ProviderResponse {
                message: Message::assistant_with_tools("Listing", vec![call]),
                usage: None,
                model: "fixed-model".into(),
            })
        }
    }

    fn request() -> ProviderRequest {
        ProviderRequest {
            model: "fixed-model".into(),
            messages: vec![Message::user("hi")],
            temperature: default_temperature(),
            max_tokens: None,
            tools: vec![],
        }
    }

    #[test]
    fn blank_text_is_treated_as_absent() {
        let response = ProviderResponse {
            message: Message::assistant("  \n"),
            usage: None,
            model: "m".into(),
        };
        assert!(response.text().is_none());
        assert!(response.tool_calls().is_empty());
    }

    #[tokio::test]
    async fn default_stream_wraps_complete() {
        let mut rx = FixedProvider.stream(request()).await.unwrap();
        let chunk = rx.recv().await.unwrap().unwrap();
        assert!(chunk.done);
        assert_eq!(chunk.content.as_deref(), Some("Listing"));
        assert_eq!(chunk.tool_calls.len(), 1);
        assert_eq!(chunk.tool_calls[0].name, "shell");
        assert!(rx.recv().await.is_none());
    }

    #[test]
    fn request_omits_empty_tools() {
        let json = serde_json::to_string(&request()).unwrap();
        assert!(!json.contains("\"tools\""));
        assert!(json.contains("fixed-model"));
    }
}
