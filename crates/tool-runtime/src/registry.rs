use crate::outcome::ToolOutcome;
use crate::tool::{Tool, ToolDefinition};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Anything that accepts tool registrations.
///
/// The plugin host implements this; the bridge only ever hands tools over
/// and never dispatches them itself.
pub trait ToolHost: Send {
    fn register_tool(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError>;
}

/// Manages available tools, their schemas, and lookup.
/// Thread-safe via Arc wrapping of individual tools.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a tool. Returns error if name already registered.
    pub fn register(&mut self, tool: impl Tool + 'static) -> Result<(), RegistryError> {
        self.register_tool(Arc::new(tool))
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Run a registered tool. Returns `None` when no tool has that name.
    pub async fn execute(&self, name: &str, args: Value) -> Option<ToolOutcome> {
        let tool = self.get(name)?;
        Some(tool.execute(args).await)
    }

    /// List all registered tool definitions, sorted by name.
    pub fn list(&self) -> Vec<ToolDefinition> {
        let mut defs: Vec<_> = self.tools.values().map(|t| t.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl ToolHost for ToolRegistry {
    fn register_tool(&mut self, tool: Arc<dyn Tool>) -> Result<(), RegistryError> {
        let def = tool.definition();
        if self.tools.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName(def.name));
        }
        self.tools.insert(def.name, tool);
        Ok(())
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Tool with name '{0}' is already registered")]
    DuplicateName(String),
}
