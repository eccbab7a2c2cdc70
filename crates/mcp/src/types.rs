//! JSON-RPC 2.0 and MCP protocol types.
//!
//! Wire format for talking to a tool sidecar: newline-delimited JSON-RPC
//! 2.0 over the child's stdin/stdout.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ── JSON-RPC 2.0 Base Types ─────────────────────────────────────────

/// A JSON-RPC 2.0 request message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: RpcId,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// JSON-RPC "internal error", used for error objects we cannot read.
pub const INTERNAL_ERROR: i64 = -32603;

impl JsonRpcError {
    /// Read an error object, degrading to [`INTERNAL_ERROR`] with the raw
    /// JSON as message when it lacks an integer `code` or a string `message`.
    pub fn from_raw(raw: Value) -> Self {
        match serde_json::from_value::<JsonRpcError>(raw.clone()) {
            Ok(err) => err,
            Err(_) => JsonRpcError {
                code: INTERNAL_ERROR,
                message: format!("malformed error response: {raw}"),
                data: Some(raw),
            },
        }
    }
}

/// A JSON-RPC 2.0 notification (no id, no response expected).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC request ID. Can be a number or a string per the spec.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RpcId {
    Number(i64),
    String(String),
}

impl RpcId {
    /// The numeric correlation key, if this id could have come from us.
    ///
    /// Outbound ids are always numbers, but some peers echo them back as
    /// strings.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            RpcId::Number(n) => u64::try_from(*n).ok(),
            RpcId::String(s) => s.parse().ok(),
        }
    }
}

/// Any line received from the sidecar, before classification.
///
/// Every field is optional so that one permissive parse covers responses,
/// notifications and peer requests alike.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub id: Option<RpcId>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub result: Option<Value>,
    /// Kept raw so a malformed error object still resolves its request.
    #[serde(default)]
    pub error: Option<Value>,
}

/// An inbound message after classification.
#[derive(Debug, Clone)]
pub enum Incoming {
    /// Reply to one of our requests.
    Response {
        id: RpcId,
        outcome: Result<Value, JsonRpcError>,
    },
    /// Fire-and-forget message from the peer.
    Notification(JsonRpcNotification),
    /// The peer asking us to do something. Not supported by this client.
    Request { id: RpcId, method: String },
}

impl IncomingMessage {
    /// Sort a parsed line into response, notification or peer request.
    ///
    /// Returns `None` for objects that carry neither an id nor a method.
    pub fn classify(self) -> Option<Incoming> {
        match (self.id, self.method) {
            (Some(id), Some(method)) => Some(Incoming::Request { id, method }),
            (None, Some(method)) => Some(Incoming::Notification(JsonRpcNotification {
                jsonrpc: JSONRPC_VERSION.to_string(),
                method,
                params: self.params,
            })),
            (Some(id), None) => {
                let outcome = match self.error {
                    Some(raw) => Err(JsonRpcError::from_raw(raw)),
                    None => Ok(self.result.unwrap_or(Value::Null)),
                };
                Some(Incoming::Response { id, outcome })
            }
            (None, None) => None,
        }
    }
}

// ── MCP Initialize ──────────────────────────────────────────────────

/// Parameters for the `initialize` MCP method.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    pub capabilities: ClientCapabilities,
    pub client_info: ClientInfo,
}

/// Client capabilities advertised during initialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roots: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sampling: Option<Value>,
}

/// Information about the connecting client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Result returned from the `initialize` method.
///
/// Parsed leniently: a sidecar that answers with a bare `{}` still
/// completes the handshake.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    #[serde(default)]
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: ServerCapabilities,
    #[serde(default)]
    pub server_info: ServerInfo,
}

/// Server capabilities advertised during initialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

/// Tools capability descriptor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    #[serde(default)]
    pub list_changed: bool,
}

/// Information about the MCP server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

// ── MCP tools/list ──────────────────────────────────────────────────

/// Result of `tools/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListToolsResult {
    pub tools: Vec<RemoteTool>,
}

/// A capability advertised by the sidecar.
///
/// The input schema is an opaque blob handed to the host as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTool {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "empty_object_schema")]
    pub input_schema: Value,
}

fn empty_object_schema() -> Value {
    serde_json::json!({"type": "object", "properties": {}})
}

// ── MCP tools/call ──────────────────────────────────────────────────

/// Parameters for `tools/call`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Result of `tools/call`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolResult {
    #[serde(default)]
    pub content: Vec<ToolContent>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl CallToolResult {
    /// Text of the first text block, if any.
    pub fn primary_text(&self) -> Option<&str> {
        self.content.iter().find_map(|c| match c {
            ToolContent::Text { text } => Some(text.as_str()),
            ToolContent::Other => None,
        })
    }

    /// All text blocks joined by newlines.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .filter_map(|c| match c {
                ToolContent::Text { text } => Some(text.as_str()),
                ToolContent::Other => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Content block within a tool call result.
///
/// Only text blocks are interpreted; images, resources and anything newer
/// collapse into `Other`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolContent {
    Text {
        #[serde(default)]
        text: String,
    },
    #[serde(other)]
    Other,
}

// ── Helpers ─────────────────────────────────────────────────────────

impl JsonRpcRequest {
    /// Create a new JSON-RPC 2.0 request.
    pub fn new(id: RpcId, method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            method: method.into(),
            params,
        }
    }
}

impl JsonRpcNotification {
    /// Create a new JSON-RPC 2.0 notification.
    pub fn new(method: impl Into<String>, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params,
        }
    }
}

// ── Protocol constants ──────────────────────────────────────────────

pub const JSONRPC_VERSION: &str = "2.0";

/// The MCP protocol version this crate implements.
pub const PROTOCOL_VERSION: &str = "2024-11-05";
