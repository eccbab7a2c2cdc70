//! Bridge between the sidecar and a tool host.
//!
//! Enumerates the sidecar's tools, runs each through the filter pipeline and
//! registers the survivors with the host. Every registered tool funnels its
//! execution through `tools/call` and the result interpreter.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use toolbridge_tool_runtime::{Tool, ToolDefinition, ToolHost, ToolOutcome};
use tracing::{debug, info, warn};

use crate::catalog::{CapabilityMeta, ToolCategory};
use crate::client::McpClient;
use crate::config::BridgeConfig;
use crate::error::McpError;
use crate::filter::{BridgeFilterConfig, FilterDecision};
use crate::interpret::{interpret, outcome_for_error};
use crate::types::RemoteTool;

/// A sidecar tool as seen by the host.
pub struct BridgedTool {
    definition: ToolDefinition,
    remote_name: String,
    client: Arc<McpClient>,
}

impl BridgedTool {
    pub fn new(remote: RemoteTool, meta: Option<CapabilityMeta>, client: Arc<McpClient>) -> Self {
        let definition = ToolDefinition {
            name: remote.name.clone(),
            description: tagged_description(remote.description.as_deref(), meta.as_ref()),
            parameters: remote.input_schema,
            optional: meta.is_some_and(|m| m.is_mutation_class() || m.requires_policy_check),
        };
        Self {
            definition,
            remote_name: remote.name,
            client,
        }
    }
}

#[async_trait]
impl Tool for BridgedTool {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, args: Value) -> ToolOutcome {
        let args = if args.is_null() {
            Value::Object(Default::default())
        } else {
            args
        };

        match self.client.call_tool(&self.remote_name, args).await {
            Ok(result) => {
                let outcome = interpret(&result);
                if let Some(code) = outcome.error_code() {
                    debug!(tool = %self.remote_name, code, "tool call failed");
                }
                outcome
            }
            Err(e) => {
                warn!(tool = %self.remote_name, error = %e, "tool call did not complete");
                outcome_for_error(&e)
            }
        }
    }
}

/// Prefix the description with a bracketed category tag.
///
/// `[read]`, `[mutation, policy-gated]`, `[unknown]` for uncataloged tools.
pub fn tagged_description(description: Option<&str>, meta: Option<&CapabilityMeta>) -> String {
    let tag = match meta {
        Some(meta) if meta.requires_policy_check => format!("[{}, policy-gated]", meta.category),
        Some(meta) => format!("[{}]", meta.category),
        None => "[unknown]".to_string(),
    };
    match description.map(str::trim).filter(|d| !d.is_empty()) {
        Some(description) => format!("{tag} {description}"),
        None => tag,
    }
}

/// Filter `tools` and register the survivors with `host`.
///
/// Returns how many were registered. Tools the host refuses (e.g. a name
/// clash with a local tool) are skipped with a warning.
pub fn register_tools(
    tools: Vec<RemoteTool>,
    filter: &BridgeFilterConfig,
    client: &Arc<McpClient>,
    host: &mut dyn ToolHost,
) -> usize {
    let discovered = tools.len();
    let mut registered = 0;

    for remote in tools {
        let meta = match filter.evaluate(&remote.name) {
            FilterDecision::Allow { meta } => meta,
            FilterDecision::Reject(reason) => {
                debug!(tool = %remote.name, reason = %reason, "tool filtered out");
                continue;
            }
        };

        let name = remote.name.clone();
        let category = meta.map(|m| m.category);
        let tool = BridgedTool::new(remote, meta, Arc::clone(client));
        match host.register_tool(Arc::new(tool)) {
            Ok(()) => {
                let category = category.as_ref().map_or("unknown", ToolCategory::as_str);
                debug!(tool = %name, category, "registered tool");
                registered += 1;
            }
            Err(e) => warn!(tool = %name, error = %e, "host rejected tool"),
        }
    }

    info!(discovered, registered, "Bridge registration complete");
    registered
}

/// Enumerate the sidecar's tools and register the permitted ones.
///
/// A failed enumeration is an error, never a silent zero.
pub async fn bridge_tools(
    client: &Arc<McpClient>,
    filter: &BridgeFilterConfig,
    host: &mut dyn ToolHost,
) -> Result<usize, McpError> {
    let tools = client.list_tools().await?;
    info!(count = tools.len(), "Tool discovery complete");
    Ok(register_tools(tools, filter, client, host))
}

/// A running bridge: the sidecar connection plus how many tools it exposed.
pub struct ToolBridge {
    client: Arc<McpClient>,
    registered: usize,
}

impl ToolBridge {
    /// Start the sidecar, handshake, enumerate and register.
    ///
    /// If enumeration fails the sidecar is stopped and the error returned.
    pub async fn start(config: &BridgeConfig, host: &mut dyn ToolHost) -> Result<Self, McpError> {
        let client = Arc::new(McpClient::start(&config.sidecar).await?);
        Self::attach(client, &config.filter, host).await
    }

    /// Bridge an already-connected client.
    pub async fn attach(
        client: Arc<McpClient>,
        filter: &BridgeFilterConfig,
        host: &mut dyn ToolHost,
    ) -> Result<Self, McpError> {
        match bridge_tools(&client, filter, host).await {
            Ok(registered) => Ok(Self { client, registered }),
            Err(e) => {
                client.stop().await;
                Err(e)
            }
        }
    }

    /// Number of tools handed to the host.
    pub fn registered(&self) -> usize {
        self.registered
    }

    pub fn client(&self) -> &Arc<McpClient> {
        &self.client
    }

    pub async fn stop(&self) {
        self.client.stop().await;
    }
}
