//! Shell tool: execute system commands.
//!
//! Supports command allowlisting and a per-call timeout.
//!
//! The allowlist only looks at the first word of the command line, and the
//! line is handed to `sh -c` as is, so `ls; rm -rf x` passes an `ls`
//! allowlist. Treat it as advisory, not as a sandbox.

use std::time::Duration;

use async_trait::async_trait;
use loopy_core::error::ToolError;
use loopy_core::tool::{Tool, parse_arguments};
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Per-stream cap on captured output.
const MAX_OUTPUT_BYTES: usize = 1024 * 1024;

const TRUNCATION_MARKER: &str = "\n[output truncated]";

#[derive(Debug, Deserialize)]
struct ShellArgs {
    command: String,
    /// Milliseconds
    #[serde(default = "default_timeout_ms")]
    timeout: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Execute shell commands with an optional allowlist.
pub struct ShellTool {
    /// If non-empty, only these first words are allowed. Advisory only.
    allowed_commands: Vec<String>,
    description: String,
}

impl ShellTool {
    pub fn new(allowed_commands: Vec<String>) -> Self {
        let description = if allowed_commands.is_empty() {
            "Execute a shell command and return stdout, stderr and the exit code. \
             Use with caution: any command can run."
                .to_string()
        } else {
            format!(
                "Execute a shell command and return stdout, stderr and the exit code. \
                 Allowed commands: {}",
                allowed_commands.join(", ")
            )
        };
        Self {
            allowed_commands,
            description,
        }
    }

    fn base_command(command: &str) -> &str {
        command.split_whitespace().next().unwrap_or("")
    }

    fn is_command_allowed(&self, command: &str) -> bool {
        if self.allowed_commands.is_empty() {
            return true;
        }
        let base = Self::base_command(command);
        self.allowed_commands.iter().any(|a| a == base)
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        "shell"
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "The shell command to execute"
                },
                "timeout": {
                    "type": "integer",
                    "description": "Timeout in milliseconds (default 30000)"
                }
            },
            "required": ["command"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: ShellArgs = parse_arguments(arguments)?;

        if !self.is_command_allowed(&args.command) {
            return Err(ToolError::PermissionDenied {
                tool_name: "shell".into(),
                reason: format!("Command not allowed: {}", Self::base_command(&args.command)),
            });
        }

        debug!(command = %args.command, timeout_ms = args.timeout, "Executing shell command");

        let mut command = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", &args.command]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", &args.command]);
            c
        };
        command.kill_on_drop(true);

        let output = tokio::time::timeout(Duration::from_millis(args.timeout), command.output())
            .await
            .map_err(|_| ToolError::Timeout {
                tool_name: "shell".into(),
                timeout_secs: args.timeout / 1000,
            })?
            .map_err(|e| ToolError::failed("shell", e.to_string()))?;

        let exit_code = output.status.code().unwrap_or(-1);
        let success = output.status.success();
        if !success {
            warn!(command = %args.command, exit_code, "Command failed");
        }

        Ok(serde_json::json!({
            "stdout": capped_output(&output.stdout),
            "stderr": capped_output(&output.stderr),
            "exit_code": exit_code,
            "success": success,
        }))
    }
}

/// Decode captured output, keeping at most [`MAX_OUTPUT_BYTES`].
fn capped_output(bytes: &[u8]) -> String {
    if bytes.len() <= MAX_OUTPUT_BYTES {
        return String::from_utf8_lossy(bytes).into_owned();
    }
    let mut text = String::from_utf8_lossy(&bytes[..MAX_OUTPUT_BYTES]).into_owned();
    text.push_str(TRUNCATION_MARKER);
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowlist_check() {
        let tool = ShellTool::new(vec!["ls".into(), "cat".into(), "git".into()]);
        assert!(tool.is_command_allowed("ls -la"));
        assert!(tool.is_command_allowed("cat file.txt"));
        assert!(tool.is_command_allowed("git status"));
        assert!(!tool.is_command_allowed("rm -rf /"));
        assert!(!tool.is_command_allowed("sudo something"));
        assert!(tool.description().contains("ls, cat, git"));
    }

    #[test]
    fn empty_allowlist_allows_all() {
        let tool = ShellTool::new(vec![]);
        assert!(tool.is_command_allowed("anything goes"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn execute_echo() {
        let tool = ShellTool::new(vec![]);
        let result = tool
            .execute(serde_json::json!({"command": "echo hello"}))
            .await
            .unwrap();
        assert_eq!(result["success"], true);
        assert_eq!(result["exit_code"], 0);
        assert_eq!(result["stdout"], "hello\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_reported_not_raised() {
        let tool = ShellTool::new(vec![]);
        let result = tool
            .execute(serde_json::json!({"command": "echo oops >&2; exit 3"}))
            .await
            .unwrap();
        assert_eq!(result["success"], false);
        assert_eq!(result["exit_code"], 3);
        assert_eq!(result["stderr"], "oops\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn slow_command_times_out() {
        let tool = ShellTool::new(vec![]);
        let result = tool
            .execute(serde_json::json!({"command": "sleep 5", "timeout": 50}))
            .await;
        assert!(matches!(result, Err(ToolError::Timeout { .. })));
    }

    #[tokio::test]
    async fn blocked_command() {
        let tool = ShellTool::new(vec!["ls".into()]);
        let result = tool
            .execute(serde_json::json!({"command": "rm -rf /"}))
            .await;
        assert!(matches!(result, Err(ToolError::PermissionDenied { .. })));
    }

    #[tokio::test]
    async fn missing_command_is_invalid() {
        let tool = ShellTool::new(vec![]);
        let result = tool.execute(serde_json::json!({})).await;
        assert!(matches!(result, Err(ToolError::InvalidArguments(_))));
    }

    #[test]
    fn small_output_is_untouched() {
        assert_eq!(capped_output(b"hello\n"), "hello\n");
        assert_eq!(capped_output(b""), "");
    }

    #[test]
    fn large_output_is_capped() {
        let bytes = vec![b'a'; MAX_OUTPUT_BYTES + 10];
        let text = capped_output(&bytes);
        assert!(text.ends_with(TRUNCATION_MARKER));
        assert_eq!(text.len(), MAX_OUTPUT_BYTES + TRUNCATION_MARKER.len());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn noisy_command_output_is_capped() {
        let tool = ShellTool::new(vec![]);
        let result = tool
            .execute(serde_json::json!({
                "command": "head -c 2000000 /dev/zero | tr '\\0' x",
                "timeout": 10000
            }))
            .await
            .unwrap();
        let stdout = result["stdout"].as_str().unwrap();
        assert!(stdout.ends_with(TRUNCATION_MARKER));
        assert!(stdout.len() < 2_000_000);
    }

    #[test]
    fn allowlist_checks_only_the_first_word() {
        let tool = ShellTool::new(vec!["ls".into()]);
        assert!(tool.is_command_allowed("ls; echo chained"));
        assert!(!tool.is_command_allowed("echo ls"));
    }
}
