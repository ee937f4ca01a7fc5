//! Loop events: the observable steps of the agent loop.
//!
//! Each event carries a timestamp and exactly one typed payload:
//! - `thinking`   : a model request is about to be issued
//! - `text`       : the model produced text
//! - `tool_call`  : a tool is about to be executed
//! - `tool_result`: that tool finished (successfully or not)
//! - `done`       : the turn finished, or the iteration cap was hit
//! - `error`      : a model call failed

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tool::{ToolCall, ToolOutcome, ToolResult};

/// One step emitted by the loop, consumed exactly once by the event sink.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopEvent {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: LoopEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoopEventKind {
    Thinking {
        iteration: u32,
    },

    Text {
        content: String,
    },

    ToolCall {
        id: String,
        name: String,
        arguments: serde_json::Value,
    },

    ToolResult {
        id: String,
        name: String,
        outcome: ToolOutcome,
    },

    Done {
        iterations: u32,
        #[serde(default)]
        max_reached: bool,
    },

    Error {
        message: String,
        iteration: u32,
        #[serde(default)]
        rate_limited: bool,
    },
}

impl LoopEvent {
    pub fn new(kind: LoopEventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
        }
    }

    pub fn thinking(iteration: u32) -> Self {
        Self::new(LoopEventKind::Thinking { iteration })
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::new(LoopEventKind::Text {
            content: content.into(),
        })
    }

    pub fn tool_call(call: &ToolCall) -> Self {
        Self::new(LoopEventKind::ToolCall {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments: call.arguments.clone(),
        })
    }

    pub fn tool_result(result: &ToolResult) -> Self {
        Self::new(LoopEventKind::ToolResult {
            id: result.call_id.clone(),
            name: result.name.clone(),
            outcome: result.outcome.clone(),
        })
    }

    pub fn done(iterations: u32, max_reached: bool) -> Self {
        Self::new(LoopEventKind::Done {
            iterations,
            max_reached,
        })
    }

    pub fn error(message: impl Into<String>, iteration: u32, rate_limited: bool) -> Self {
        Self::new(LoopEventKind::Error {
            message: message.into(),
            iteration,
            rate_limited,
        })
    }

    /// Tag name of this event (`thinking`, `text`, ...).
    pub fn event_type(&self) -> &'static str {
        match self.kind {
            LoopEventKind::Thinking { .. } => "thinking",
            LoopEventKind::Text { .. } => "text",
            LoopEventKind::ToolCall { .. } => "tool_call",
            LoopEventKind::ToolResult { .. } => "tool_result",
            LoopEventKind::Done { .. } => "done",
            LoopEventKind::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serialization_flattens_tag() {
        let event = LoopEvent::text("Hello");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["content"], "Hello");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn tool_result_event_carries_outcome() {
        let result = ToolResult {
            call_id: "call_1".into(),
            name: "ls".into(),
            outcome: ToolOutcome::Failure {
                error: "nope".into(),
            },
        };
        let json = serde_json::to_value(LoopEvent::tool_result(&result)).unwrap();
        assert_eq!(json["type"], "tool_result");
        assert_eq!(json["id"], "call_1");
        assert_eq!(json["outcome"]["status"], "failure");
    }

    #[test]
    fn done_deserializes_without_max_reached() {
        let json = r#"{"timestamp":"2024-01-01T00:00:00Z","type":"done","iterations":3}"#;
        let event: LoopEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            event.kind,
            LoopEventKind::Done {
                iterations: 3,
                max_reached: false
            }
        );
    }

    #[test]
    fn event_type_names() {
        let call = ToolCall::new("a", "b", serde_json::Value::Null);
        let cases = [
            (LoopEvent::thinking(1), "thinking"),
            (LoopEvent::text("x"), "text"),
            (LoopEvent::tool_call(&call), "tool_call"),
            (LoopEvent::done(1, false), "done"),
            (LoopEvent::error("x", 1, false), "error"),
        ];
        for (event, name) in cases {
            assert_eq!(event.event_type(), name);
        }
    }
}
