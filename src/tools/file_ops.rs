//! File tools: list a directory and read a file inside the workspace root

use super::{Tool, ToolResult};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Component, Path, PathBuf};

/// Join `relative` onto `root`, refusing absolute paths and `..` escapes
fn resolve_path(root: &Path, relative: &str) -> Result<PathBuf> {
    let mut resolved = root.to_path_buf();
    let mut depth = 0usize;

    for component in Path::new(relative).components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    bail!("path '{}' escapes the workspace root", relative);
                }
                resolved.pop();
                depth -= 1;
            }
            Component::RootDir | Component::Prefix(_) => {
                bail!("path '{}' must be relative to the workspace root", relative);
            }
        }
    }

    Ok(resolved)
}

/// Tool for listing directory entries
pub struct ListFilesTool;

#[async_trait]
impl Tool for ListFilesTool {
    fn name(&self) -> &str {
        "list_files"
    }

    fn description(&self) -> &str {
        "List files in the current workspace or a specific directory. Use this to discover file structure."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "dirPath": {
                    "type": "string",
                    "description": "Relative path to list files from. Defaults to root ('.')."
                }
            }
        })
    }

    async fn execute(&self, root: &Path, params: Value) -> Result<ToolResult> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Params {
            dir_path: Option<String>,
        }

        let params: Params = serde_json::from_value(params)?;
        let dir_path = params
            .dir_path
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| ".".to_string());
        let target = resolve_path(root, &dir_path)?;

        let mut read_dir = tokio::fs::read_dir(&target)
            .await
            .with_context(|| format!("cannot list '{}'", dir_path))?;

        let mut names = Vec::new();
        while let Some(entry) = read_dir.next_entry().await? {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();

        Ok(ToolResult::success(names.join("\n")))
    }
}

/// Tool for reading file contents
pub struct ReadFileTool;

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file. Use this to inspect code."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "filePath": {
                    "type": "string",
                    "description": "Relative path of the file to read"
                }
            },
            "required": ["filePath"]
        })
    }

    async fn execute(&self, root: &Path, params: Value) -> Result<ToolResult> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Params {
            file_path: String,
        }

        let params: Params = serde_json::from_value(params)?;
        let target = resolve_path(root, &params.file_path)?;

        // Lossy so a stray binary byte does not fail the whole call
        let bytes = tokio::fs::read(&target)
            .await
            .with_context(|| format!("cannot read '{}'", params.file_path))?;

        Ok(ToolResult::success(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    }
}
