//! Workspace tools the model can call
//!
//! Both tools are read-only and scoped to the first workspace root. Dispatch
//! never fails: every problem comes back as a string the model can read.

mod file_ops;

pub use file_ops::{ListFilesTool, ReadFileTool};

use crate::llm::ToolDefinition;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Appended to tool output that hit the size cap
pub const TRUNCATION_MARKER: &str = "\n... (truncated)";

/// Result of executing a tool
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub success: bool,
    pub output: String,
}

impl ToolResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output: message.into(),
        }
    }
}

/// Trait for agent tools
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool name
    fn name(&self) -> &str;

    /// Get the tool description
    fn description(&self) -> &str;

    /// Get the JSON schema for parameters
    fn parameters(&self) -> Value;

    /// Execute the tool inside `root`
    async fn execute(&self, root: &Path, params: Value) -> Result<ToolResult>;

    /// Convert to LLM tool definition
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

/// Shared handle to the directory the editor has open
///
/// The editor reports its workspace after the server has started, so the
/// handle is created empty and filled in later.
#[derive(Debug, Clone, Default)]
pub struct WorkspaceRoot {
    inner: Arc<RwLock<Option<PathBuf>>>,
}

impl WorkspaceRoot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        let root = Self::new();
        root.set(path);
        root
    }

    pub fn set(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        tracing::info!("Workspace root set to {}", path.display());
        let mut guard = self.inner.write().unwrap_or_else(|e| e.into_inner());
        *guard = Some(path);
    }

    pub fn get(&self) -> Option<PathBuf> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

/// Cut `output` to at most `max_chars` characters, marking the cut
pub fn truncate_output(output: &str, max_chars: usize) -> String {
    match output.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &output[..byte_idx], TRUNCATION_MARKER),
        None => output.to_string(),
    }
}

/// Registry of available tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    root: WorkspaceRoot,
    max_output_chars: usize,
}

impl ToolRegistry {
    pub fn new(root: WorkspaceRoot, max_output_chars: usize) -> Self {
        Self {
            tools: HashMap::new(),
            root,
            max_output_chars,
        }
    }

    /// Registry with `list_files` and `read_file`
    pub fn with_defaults(root: WorkspaceRoot, max_output_chars: usize) -> Self {
        let mut registry = Self::new(root, max_output_chars);
        registry.register(Arc::new(ListFilesTool));
        registry.register(Arc::new(ReadFileTool));
        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn workspace_root(&self) -> &WorkspaceRoot {
        &self.root
    }

    /// Tool definitions, ordered by name
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<ToolDefinition> =
            self.tools.values().map(|t| t.to_definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Run a tool call exactly as the model sent it
    ///
    /// `raw_args` is the JSON string from the model; an empty string means
    /// no arguments.
    pub async fn dispatch(&self, name: &str, raw_args: &str) -> String {
        let Some(tool) = self.tools.get(name) else {
            tracing::warn!("Model requested unknown tool {}", name);
            return "Unknown tool".to_string();
        };

        let params: Value = if raw_args.trim().is_empty() {
            Value::Object(Default::default())
        } else {
            match serde_json::from_str(raw_args) {
                Ok(v) => v,
                Err(e) => return format!("Error: invalid arguments for {}: {}", name, e),
            }
        };

        let Some(root) = self.root.get() else {
            return "No workspace open.".to_string();
        };

        tracing::debug!(tool = name, args = %params, "Executing tool");

        let output = match tool.execute(&root, params).await {
            Ok(result) => {
                if !result.success {
                    tracing::debug!(tool = name, "Tool reported failure");
                }
                result.output
            }
            Err(e) => format!("Error executing tool {}: {}", name, e),
        };

        truncate_output(&output, self.max_output_chars)
    }
}
