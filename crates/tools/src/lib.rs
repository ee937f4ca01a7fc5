//! Built-in tool implementations for Loopy.
//!
//! Tools give the agent the ability to interact with the world: run shell
//! commands and read, write or list files. The status tools let the agent
//! edit its own memory, goals and self description.

pub mod file;
pub mod shell;
pub mod status;

use loopy_core::tool::{Tool, ToolRegistry};
use tracing::warn;

pub use file::{ListDirTool, ReadFileTool, WriteFileTool};
pub use shell::ShellTool;
pub use status::{UpdateGoalsTool, UpdateMemoryTool, UpdateSelfTool, status_tools};

/// Names accepted by [`registry_for`].
pub const BUILTIN_TOOLS: &[&str] = &["shell", "read_file", "write_file", "list_dir"];

/// Create a registry holding the enabled built-in tools, in the given order.
///
/// Unknown names are skipped with a warning. `allowed_commands` is the shell
/// allowlist; empty allows everything.
pub fn registry_for(enabled: &[String], allowed_commands: &[String]) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    for name in enabled {
        let tool: Box<dyn Tool> = match name.as_str() {
            "shell" => Box::new(ShellTool::new(allowed_commands.to_vec())),
            "read_file" => Box::new(ReadFileTool),
            "write_file" => Box::new(WriteFileTool),
            "list_dir" => Box::new(ListDirTool),
            other => {
                warn!(tool = other, "Unknown tool in configuration, skipping");
                continue;
            }
        };
        registry.register(tool);
    }
    registry
}

/// Create a registry with every built-in tool and no shell allowlist.
pub fn default_registry() -> ToolRegistry {
    let all: Vec<String> = BUILTIN_TOOLS.iter().map(|s| s.to_string()).collect();
    registry_for(&all, &[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_all_builtins() {
        let registry = default_registry();
        assert_eq!(registry.list(), BUILTIN_TOOLS.to_vec());
    }

    #[test]
    fn registry_for_respects_order_and_skips_unknown() {
        let enabled = vec!["list_dir".to_string(), "teleport".into(), "shell".into()];
        let registry = registry_for(&enabled, &["ls".into()]);
        assert_eq!(registry.list(), vec!["list_dir", "shell"]);
        assert!(!registry.has("teleport"));
    }

    #[test]
    fn status_tools_merge_into_external_registry() {
        let store = loopy_core::PanelStore::new();
        let mut registry = registry_for(&["read_file".into()], &[]);
        registry.merge(status_tools(&store));
        assert_eq!(registry.len(), 4);
        let names: Vec<String> = registry.definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["read_file", "update_memory", "update_goals", "update_self"]);
    }
}
