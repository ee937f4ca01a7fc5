//! Status tools: the agent's way of editing its own panel.
//!
//! Each tool holds a [`PanelStore`] handle and dispatches one command per
//! call. Arguments are checked by deserializing into typed structs.

use async_trait::async_trait;
use loopy_core::error::ToolError;
use loopy_core::panel::{Goal, PanelCommand, PanelStore};
use loopy_core::tool::{Tool, ToolRegistry, parse_arguments};
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Deserialize)]
struct UpdateMemoryArgs {
    item: String,
}

#[derive(Debug, Deserialize)]
struct UpdateGoalsArgs {
    goals: Vec<Goal>,
}

#[derive(Debug, Deserialize)]
struct UpdateSelfArgs {
    identity: String,
}

/// Append an item to the agent's memory.
pub struct UpdateMemoryTool {
    store: PanelStore,
}

impl UpdateMemoryTool {
    pub fn new(store: PanelStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for UpdateMemoryTool {
    fn name(&self) -> &str {
        "update_memory"
    }

    fn description(&self) -> &str {
        "Remember a fact for the rest of the session by appending it to your memory"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "item": {
                    "type": "string",
                    "description": "The fact to remember"
                }
            },
            "required": ["item"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: UpdateMemoryArgs = parse_arguments(arguments)?;
        debug!(item = %args.item, "Appending to memory");
        self.store.dispatch(PanelCommand::AppendMemory(args.item.clone()));
        Ok(serde_json::json!({"success": true, "item": args.item}))
    }
}

/// Replace the agent's goal list.
pub struct UpdateGoalsTool {
    store: PanelStore,
}

impl UpdateGoalsTool {
    pub fn new(store: PanelStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for UpdateGoalsTool {
    fn name(&self) -> &str {
        "update_goals"
    }

    fn description(&self) -> &str {
        "Replace your current goals with the given list"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "goals": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": {"type": "string"},
                            "text": {"type": "string"},
                            "completed": {"type": "boolean"}
                        },
                        "required": ["id", "text", "completed"]
                    },
                    "description": "The complete new goal list"
                }
            },
            "required": ["goals"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: UpdateGoalsArgs = parse_arguments(arguments)?;
        let count = args.goals.len();
        debug!(count, "Replacing goals");
        self.store.dispatch(PanelCommand::ReplaceGoals(args.goals));
        Ok(serde_json::json!({"success": true, "count": count}))
    }
}

/// Replace the agent's self description.
pub struct UpdateSelfTool {
    store: PanelStore,
}

impl UpdateSelfTool {
    pub fn new(store: PanelStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for UpdateSelfTool {
    fn name(&self) -> &str {
        "update_self"
    }

    fn description(&self) -> &str {
        "Rewrite your description of who you are"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "identity": {
                    "type": "string",
                    "description": "The new self description"
                }
            },
            "required": ["identity"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: UpdateSelfArgs = parse_arguments(arguments)?;
        self.store.dispatch(PanelCommand::ReplaceSelf(args.identity.clone()));
        Ok(serde_json::json!({"success": true, "identity": args.identity}))
    }
}

/// A registry holding the three status tools, all bound to `store`.
pub fn status_tools(store: &PanelStore) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(UpdateMemoryTool::new(store.clone())));
    registry.register(Box::new(UpdateGoalsTool::new(store.clone())));
    registry.register(Box::new(UpdateSelfTool::new(store.clone())));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;
    use loopy_core::tool::ToolCall;

    #[test]
    fn registry_contents() {
        let registry = status_tools(&PanelStore::new());
        assert_eq!(registry.list(), vec!["update_memory", "update_goals", "update_self"]);
    }

    #[tokio::test]
    async fn memory_appends() {
        let store = PanelStore::new();
        let tool = UpdateMemoryTool::new(store.clone());

        let result = tool
            .execute(serde_json::json!({"item": "user prefers tabs"}))
            .await
            .unwrap();
        tool.execute(serde_json::json!({"item": "repo uses nix"}))
            .await
            .unwrap();

        assert_eq!(result, serde_json::json!({"success": true, "item": "user prefers tabs"}));
        assert_eq!(store.snapshot().memory, vec!["user prefers tabs", "repo uses nix"]);
    }

    #[tokio::test]
    async fn goals_are_replaced_wholesale() {
        let store = PanelStore::new();
        let tool = UpdateGoalsTool::new(store.clone());

        tool.execute(serde_json::json!({"goals": [
            {"id": "1", "text": "read code", "completed": false},
            {"id": "2", "text": "write tests", "completed": false}
        ]}))
        .await
        .unwrap();

        let result = tool
            .execute(serde_json::json!({"goals": [
                {"id": "1", "text": "read code", "completed": true}
            ]}))
            .await
            .unwrap();

        assert_eq!(result["count"], 1);
        let goals = store.snapshot().goals;
        assert_eq!(goals.len(), 1);
        assert!(goals[0].completed);
    }

    #[tokio::test]
    async fn self_is_replaced() {
        let store = PanelStore::new();
        let tool = UpdateSelfTool::new(store.clone());
        tool.execute(serde_json::json!({"identity": "a careful reviewer"}))
            .await
            .unwrap();
        assert_eq!(store.snapshot().self_description, "a careful reviewer");
    }

    #[tokio::test]
    async fn malformed_goals_fail_without_state_change() {
        let store = PanelStore::new();
        let registry = status_tools(&store);

        let call = ToolCall::new(
            "call_1",
            "update_goals",
            serde_json::json!({"goals": [{"id": "1", "text": "missing completed"}]}),
        );
        let result = registry.execute(&call).await;

        assert!(!result.outcome.is_success());
        assert!(store.snapshot().goals.is_empty());
    }
}
