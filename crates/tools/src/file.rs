//! File system tools: read, write and list.

use std::path::Path;

use async_trait::async_trait;
use loopy_core::error::ToolError;
use loopy_core::tool::{Tool, parse_arguments};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct ReadFileArgs {
    path: String,
    #[serde(default)]
    line_ranges: Vec<(usize, usize)>,
}

#[derive(Debug, Deserialize)]
struct WriteFileArgs {
    path: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ListDirArgs {
    path: String,
}

#[derive(Debug, Serialize)]
struct DirEntry {
    name: String,
    is_directory: bool,
    path: String,
}

/// Keep only the 1-based, inclusive `ranges` of `content`.
///
/// Ranges are concatenated in the order given; out-of-bounds ends are clamped.
fn select_lines(content: &str, ranges: &[(usize, usize)]) -> String {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut selected = Vec::new();
    for &(start, end) in ranges {
        let start = start.max(1);
        let end = end.min(lines.len());
        for line in start..=end {
            selected.push(lines[line - 1]);
        }
    }
    selected.join("\n")
}

/// Read a file, optionally restricted to line ranges.
pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file, optionally with line ranges"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to read"
                },
                "line_ranges": {
                    "type": "array",
                    "items": {
                        "type": "array",
                        "items": {"type": "integer"},
                        "minItems": 2,
                        "maxItems": 2
                    },
                    "description": "Line ranges to read, 1-based and inclusive (e.g., [[1, 10], [20, 30]])"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: ReadFileArgs = parse_arguments(arguments)?;

        if !tokio::fs::try_exists(&args.path).await.unwrap_or(false) {
            return Err(ToolError::failed("read_file", "File not found"));
        }

        let mut content = tokio::fs::read_to_string(&args.path)
            .await
            .map_err(|e| ToolError::failed("read_file", e.to_string()))?;

        if !args.line_ranges.is_empty() {
            content = select_lines(&content, &args.line_ranges);
        }

        debug!(path = %args.path, bytes = content.len(), "Read file");

        Ok(serde_json::json!({
            "size": content.len(),
            "content": content,
            "path": args.path,
        }))
    }
}

/// Write (create or overwrite) a file.
pub struct WriteFileTool;

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file (creates or overwrites)"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The file path to write"
                },
                "content": {
                    "type": "string",
                    "description": "The content to write"
                }
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: WriteFileArgs = parse_arguments(arguments)?;

        if let Some(parent) = Path::new(&args.path).parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ToolError::failed("write_file", e.to_string()))?;
        }

        tokio::fs::write(&args.path, &args.content)
            .await
            .map_err(|e| ToolError::failed("write_file", e.to_string()))?;

        debug!(path = %args.path, bytes = args.content.len(), "Wrote file");

        Ok(serde_json::json!({
            "path": args.path,
            "bytes_written": args.content.len(),
        }))
    }
}

/// List the entries of a directory, sorted by name.
pub struct ListDirTool;

#[async_trait]
impl Tool for ListDirTool {
    fn name(&self) -> &str {
        "list_dir"
    }

    fn description(&self) -> &str {
        "List files and directories in a path"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "The directory path to list"
                }
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<serde_json::Value, ToolError> {
        let args: ListDirArgs = parse_arguments(arguments)?;

        let mut dir = tokio::fs::read_dir(&args.path)
            .await
            .map_err(|e| ToolError::failed("list_dir", e.to_string()))?;

        let mut entries = Vec::new();
        while let Some(entry) = dir
            .next_entry()
            .await
            .map_err(|e| ToolError::failed("list_dir", e.to_string()))?
        {
            let is_directory = entry
                .file_type()
                .await
                .map(|t| t.is_dir())
                .unwrap_or(false);
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_directory,
                path: entry.path().to_string_lossy().into_owned(),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(serde_json::json!({
            "path": args.path,
            "count": entries.len(),
            "entries": entries,
        }))
    }
}
