//! Sandboxed tool set and dispatcher.
//!
//! Each tool implements the [`Tool`] trait and is registered in a
//! [`ToolRegistry`]. The registry is the single dispatch boundary: it looks
//! up the requested tool, validates arguments, and converts every failure
//! into a [`ToolResult::Failure`] so nothing below it can crash the agent
//! loop.

mod files;
mod run;

pub use files::{ListFiles, ReadFile, WriteFile, MAX_READ_CHARS};
pub use run::{RunScript, SCRIPT_TIMEOUT};

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::sandbox::{SandboxError, WorkingRoot};

/// Everything that can go wrong inside a tool invocation.
///
/// All variants are recoverable: the dispatcher flattens them into a
/// `Failure` result for the model to react to. Nothing here aborts the run.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Confinement(#[from] SandboxError),

    #[error("File not found or is not a regular file: \"{0}\"")]
    NotFound(String),

    #[error("\"{0}\" is not a directory")]
    NotADirectory(String),

    #[error("\"{0}\" is not a Python file")]
    WrongFileType(String),

    #[error("Failed to parse arguments: {0}")]
    ArgumentParse(String),

    #[error("Unknown function: {0}")]
    UnknownTool(String),

    #[error("Missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("Execution timed out after {} seconds", .0.as_secs())]
    Timeout(Duration),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The outcome of exactly one tool invocation, reported back to the model
/// as part of the conversation transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolResult {
    Success(String),
    Failure(String),
}

impl ToolResult {
    pub fn text(&self) -> &str {
        match self {
            ToolResult::Success(s) | ToolResult::Failure(s) => s,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, ToolResult::Failure(_))
    }
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    /// Structured argument object, or a JSON-encoded string of one (some
    /// providers serialize twice); parsed at the dispatch boundary.
    pub arguments: Value,
}

/// Static manifest entry sent to the model, Gemini function-declaration
/// shape.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A single agent tool.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;

    /// JSON schema for the tool's parameters.
    fn parameters_schema(&self) -> Value;

    /// Run the tool. `args` is always a validated JSON object and `root` is
    /// the sandbox boundary; tools never read a working directory from
    /// `args`, so the model cannot widen the sandbox.
    async fn execute(&self, args: &Value, root: &WorkingRoot) -> Result<String, ToolError>;
}

/// Registry of all available tools.
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    /// Create a registry with the built-in tool set.
    pub fn new() -> Self {
        Self {
            tools: vec![
                Box::new(ListFiles),
                Box::new(ReadFile),
                Box::new(WriteFile),
                Box::new(RunScript::default()),
            ],
        }
    }

    /// Create a registry from an explicit tool list.
    pub fn with_tools(tools: Vec<Box<dyn Tool>>) -> Self {
        Self { tools }
    }

    fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// The tool manifest declared to the model.
    pub fn function_declarations(&self) -> Vec<FunctionDeclaration> {
        self.tools
            .iter()
            .map(|t| FunctionDeclaration {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect()
    }

    /// Short `name: description` list for the system prompt.
    pub fn descriptions(&self) -> Vec<(String, String)> {
        self.tools
            .iter()
            .map(|t| (t.name().to_string(), t.description().to_string()))
            .collect()
    }

    /// Execute one requested tool call.
    ///
    /// Never panics and never returns an error: unknown names, argument
    /// problems, and every `ToolError` are folded into
    /// [`ToolResult::Failure`].
    pub async fn dispatch(&self, request: &ToolCallRequest, root: &WorkingRoot) -> ToolResult {
        tracing::info!("Calling function: {}", request.name);
        tracing::debug!(arguments = %request.arguments, "function arguments");

        let Some(tool) = self.get(&request.name) else {
            return ToolResult::Failure(format!(
                "Error: {}",
                ToolError::UnknownTool(request.name.clone())
            ));
        };

        let args = match structured_arguments(&request.arguments) {
            Ok(args) => args,
            Err(e) => return ToolResult::Failure(format!("Error: {e}")),
        };

        match tool.execute(&args, root).await {
            Ok(output) => ToolResult::Success(output),
            Err(e) => ToolResult::Failure(format!("Error: {e}")),
        }
    }
}

/// Normalize the raw argument payload into a JSON object.
///
/// Providers sometimes hand arguments over as a JSON-encoded string; parse
/// it here once so tools only ever see structured input.
fn structured_arguments(raw: &Value) -> Result<Value, ToolError> {
    match raw {
        Value::Null => Ok(json!({})),
        Value::String(s) => {
            serde_json::from_str(s).map_err(|e| ToolError::ArgumentParse(e.to_string()))
        }
        Value::Object(_) => Ok(raw.clone()),
        other => Err(ToolError::ArgumentParse(format!(
            "expected an object, got: {other}"
        ))),
    }
}

/// Fetch a required string argument.
pub(crate) fn required_str<'a>(
    args: &'a Value,
    key: &'static str,
) -> Result<&'a str, ToolError> {
    args[key].as_str().ok_or(ToolError::MissingArgument(key))
}
