//! Shared test helpers for loop and projector tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use loopy_core::error::{ProviderError, ToolError};
use loopy_core::message::Message;
use loopy_core::provider::{ModelProvider, ProviderRequest, ProviderResponse, Usage};
use loopy_core::tool::{Tool, ToolCall};

/// A mock provider that returns a sequence of scripted results.
///
/// Each call to `complete` pops the next entry and records the request.
/// Once the script runs out every call fails with an `ApiError`.
pub struct SequentialMockProvider {
    script: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl SequentialMockProvider {
    pub fn new(script: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Create a provider that replies with text only.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(make_text_response(t))).collect())
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelProvider for SequentialMockProvider {
    fn name(&self) -> &str {
        "sequential_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ProviderError::ApiError {
                    status_code: 500,
                    message: "SequentialMockProvider: script exhausted".into(),
                })
            })
    }
}

/// A provider that requests the same tool on every call.
pub struct AlwaysToolProvider {
    pub tool: String,
}

#[async_trait]
impl ModelProvider for AlwaysToolProvider {
    fn name(&self) -> &str {
        "always_tool"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        Ok(make_tool_call_response(
            vec![make_tool_call(&self.tool, serde_json::json!({}))],
            "",
        ))
    }
}

/// Create a simple text response (no tool calls).
pub fn make_text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// Create a response with tool calls and optional text.
pub fn make_tool_call_response(tool_calls: Vec<ToolCall>, text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant_with_tools(text, tool_calls),
        usage: None,
        model: "mock-model".into(),
    }
}

/// Helper to create a tool call whose id is derived from the tool name.
pub fn make_tool_call(name: &str, args: serde_json::Value) -> ToolCall {
    ToolCall::new(format!("call_{name}"), name, args)
}

/// A tool that echoes its arguments back.
pub struct EchoTool {
    pub name: &'static str,
}

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Echo the arguments"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object"})
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        Ok(arguments)
    }
}

/// A tool that always fails.
pub struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "fail"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object"})
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        Err(ToolError::failed("fail", "disk on fire"))
    }
}

/// A tool that panics.
pub struct PanickingTool;

#[async_trait]
impl Tool for PanickingTool {
    fn name(&self) -> &str {
        "explode"
    }

    fn description(&self) -> &str {
        "Panics"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object"})
    }

    async fn execute(&self, _arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        panic!("boom");
    }
}
