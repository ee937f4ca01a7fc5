//! Tool trait, registry, and the isolated tool executor.
//!
//! Tools are what give the agent the ability to act: run shell commands,
//! read and write files, or update its own panel state. The registry keeps
//! them in insertion order; the executor turns every possible failure of a
//! tool (error, panic, timeout, unknown name) into a [`ToolOutcome::Failure`]
//! so nothing a tool does can abort the loop.

use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// A model-requested tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the model's tool_call.id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// What a tool call produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ToolOutcome {
    Success { result: serde_json::Value },
    Failure { error: String },
}

impl ToolOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Render the outcome as the content of a `tool` message for the model.
    pub fn to_message_content(&self) -> String {
        match self {
            Self::Success {
                result: serde_json::Value::String(s),
            } => s.clone(),
            Self::Success { result } => result.to_string(),
            Self::Failure { error } => format!("Error: {error}"),
        }
    }
}

/// The result of one tool call, as produced by the executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Name of the tool that was called
    pub name: String,

    pub outcome: ToolOutcome,
}

/// The core Tool trait.
///
/// Implementations return their result as JSON; any `Err` is reported back
/// to the model as a failed tool result rather than propagated.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool (e.g., "shell", "read_file").
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// JSON Schema describing this tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Execute the tool with the given arguments.
    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<serde_json::Value, ToolError>;

    /// Convert this tool into a ToolDefinition for sending to the model.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Deserialize tool arguments into a typed struct.
///
/// This is the argument-schema check for built-in tools: a payload that does
/// not match the struct becomes [`ToolError::InvalidArguments`].
pub fn parse_arguments<T: serde::de::DeserializeOwned>(
    arguments: serde_json::Value,
) -> std::result::Result<T, ToolError> {
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments(e.to_string()))
}

/// A name-unique, insertion-ordered collection of tools.
///
/// `list()` order carries no priority meaning; it only keeps schemas stable
/// between requests.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
    order: Vec<String>,
    timeout: Option<Duration>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
            timeout: None,
        }
    }

    /// Bound every tool execution by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Register a tool. Replaces any existing tool with the same name,
    /// keeping its original position.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), tool).is_none() {
            self.order.push(name);
        }
    }

    /// Move every tool of `other` into this registry.
    pub fn merge(&mut self, mut other: ToolRegistry) {
        for name in std::mem::take(&mut other.order) {
            if let Some(tool) = other.tools.remove(&name) {
                self.register(tool);
            }
        }
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Remove a tool; returns whether it was present.
    pub fn remove(&mut self, name: &str) -> bool {
        if self.tools.remove(name).is_some() {
            self.order.retain(|n| n != name);
            true
        } else {
            false
        }
    }

    /// Registered tool names, in insertion order.
    pub fn list(&self) -> Vec<&str> {
        self.order.iter().map(|s| s.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// All tool definitions, in insertion order (for sending to the model).
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.to_definition())
            .collect()
    }

    /// Execute a tool call in isolation.
    ///
    /// Never fails: a missing tool, an `Err`, a panic or an elapsed timeout
    /// all come back as [`ToolOutcome::Failure`].
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        let outcome = match self.run(call).await {
            Ok(result) => ToolOutcome::Success { result },
            Err(e) => {
                warn!(tool = %call.name, call_id = %call.id, error = %e, "Tool call failed");
                ToolOutcome::Failure {
                    error: e.to_string(),
                }
            }
        };
        ToolResult {
            call_id: call.id.clone(),
            name: call.name.clone(),
            outcome,
        }
    }

    async fn run(&self, call: &ToolCall) -> std::result::Result<serde_json::Value, ToolError> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;

        debug!(tool = %call.name, call_id = %call.id, "Executing tool");

        let fut = AssertUnwindSafe(tool.execute(call.arguments.clone())).catch_unwind();
        let caught = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| ToolError::Timeout {
                    tool_name: call.name.clone(),
                    timeout_secs: limit.as_secs(),
                })?,
            None => fut.await,
        };

        caught.unwrap_or_else(|payload| {
            Err(ToolError::Panicked {
                tool_name: call.name.clone(),
                message: panic_message(payload.as_ref()),
            })
        })
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".into()
    }
}
