//! Filesystem tools: list, read, and write inside the working directory.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{required_str, Tool, ToolError};
use crate::sandbox::WorkingRoot;

/// Maximum characters returned by `get_file_content` before truncation.
pub const MAX_READ_CHARS: usize = 10_000;

/// List directory entries with sizes.
pub struct ListFiles;

#[async_trait]
impl Tool for ListFiles {
    fn name(&self) -> &str {
        "get_files_info"
    }

    fn description(&self) -> &str {
        "List the contents of a directory relative to the working directory, one entry per line with its size in bytes and whether it is a directory."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "directory": {
                    "type": "string",
                    "description": "Directory to list, relative to the working directory. Defaults to the working directory itself."
                }
            }
        })
    }

    async fn execute(&self, args: &Value, root: &WorkingRoot) -> Result<String, ToolError> {
        let directory = args["directory"].as_str().unwrap_or(".");
        let resolved = root.resolve(directory)?;

        let meta = tokio::fs::metadata(&resolved)
            .await
            .map_err(|_| ToolError::NotADirectory(resolved.display().to_string()))?;
        if !meta.is_dir() {
            return Err(ToolError::NotADirectory(resolved.display().to_string()));
        }

        let mut entries = Vec::new();
        let mut reader = tokio::fs::read_dir(&resolved).await?;
        while let Some(entry) = reader.next_entry().await? {
            let meta = entry.metadata().await?;
            entries.push((
                entry.file_name().to_string_lossy().into_owned(),
                meta.len(),
                meta.is_dir(),
            ));
        }
        // Deterministic output regardless of readdir order.
        entries.sort();

        let lines: Vec<String> = entries
            .into_iter()
            .map(|(name, size, is_dir)| {
                format!("- {name}: file_size={size} bytes, is_dir={is_dir}")
            })
            .collect();
        Ok(lines.join("\n"))
    }
}

/// Read a file's content, truncated at [`MAX_READ_CHARS`].
pub struct ReadFile;

#[async_trait]
impl Tool for ReadFile {
    fn name(&self) -> &str {
        "get_file_content"
    }

    fn description(&self) -> &str {
        "Read the content of a file relative to the working directory. Output longer than 10000 characters is truncated with a marker."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "File to read, relative to the working directory"
                }
            },
            "required": ["file_path"]
        })
    }

    async fn execute(&self, args: &Value, root: &WorkingRoot) -> Result<String, ToolError> {
        let file_path = required_str(args, "file_path")?;
        let resolved = root.resolve(file_path)?;

        let meta = tokio::fs::metadata(&resolved)
            .await
            .map_err(|_| ToolError::NotFound(resolved.display().to_string()))?;
        if !meta.is_file() {
            return Err(ToolError::NotFound(resolved.display().to_string()));
        }

        let content = tokio::fs::read_to_string(&resolved).await?;
        if content.chars().count() > MAX_READ_CHARS {
            let truncated: String = content.chars().take(MAX_READ_CHARS).collect();
            return Ok(format!(
                "{truncated}\n[...File \"{}\" truncated at {MAX_READ_CHARS} characters]",
                resolved.display()
            ));
        }
        Ok(content)
    }
}

/// Create or overwrite a file, creating parent directories as needed.
pub struct WriteFile;

#[async_trait]
impl Tool for WriteFile {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file relative to the working directory, creating parent directories as needed and overwriting any existing content."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "file_path": {
                    "type": "string",
                    "description": "File to write, relative to the working directory"
                },
                "content": {
                    "type": "string",
                    "description": "Full content to write to the file"
                }
            },
            "required": ["file_path", "content"]
        })
    }

    async fn execute(&self, args: &Value, root: &WorkingRoot) -> Result<String, ToolError> {
        let file_path = required_str(args, "file_path")?;
        let content = required_str(args, "content")?;
        let resolved = root.resolve(file_path)?;

        if let Some(parent) = resolved.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&resolved, content).await?;

        Ok(format!(
            "Successfully wrote to \"{}\" ({} characters written)",
            resolved.display(),
            content.chars().count()
        ))
    }
}
