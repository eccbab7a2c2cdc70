use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::outcome::ToolOutcome;

/// Describes a tool's interface as handed to the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique tool name (e.g., "search_posts")
    pub name: String,
    /// Human-readable description shown to the host
    pub description: String,
    /// JSON Schema describing the expected arguments, passed through untouched
    pub parameters: Value,
    /// Whether the host should require an explicit opt-in before exposing the tool
    #[serde(default)]
    pub optional: bool,
}

/// The primary extension point: every tool handed to a host implements this trait.
///
/// Execution never fails at the type level. Transport problems and
/// application errors alike come back as a failure-shaped [`ToolOutcome`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the tool's definition (name, description, parameter schema).
    fn definition(&self) -> ToolDefinition;

    /// Execute the tool with the given JSON arguments.
    async fn execute(&self, args: Value) -> ToolOutcome;
}

impl fmt::Display for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.description)
    }
}

/// Simple echo tool for testing purposes.
#[cfg(test)]
pub struct EchoTool;

#[cfg(test)]
#[async_trait]
impl Tool for EchoTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "echo".to_string(),
            description: "Echoes back the input message. For testing.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "message": {
                        "type": "string",
                        "description": "The message to echo back"
                    }
                },
                "required": ["message"]
            }),
            optional: false,
        }
    }

    async fn execute(&self, args: Value) -> ToolOutcome {
        match args.get("message").and_then(|v| v.as_str()) {
            Some(message) => ToolOutcome::success(Value::String(message.to_string())),
            None => ToolOutcome::failure("invalid_input", "missing 'message' field"),
        }
    }
}
