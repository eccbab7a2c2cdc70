//! Error types for the MCP crate.

use crate::types::JsonRpcError;

/// Errors that can occur during MCP operations.
#[derive(Debug, thiserror::Error)]
pub enum McpError {
    /// Failed to parse or serialize JSON.
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Transport I/O error (pipe write on a dead process, etc.).
    #[error("Transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The sidecar binary could not be launched.
    #[error("Failed to spawn sidecar '{program}': {reason}")]
    SpawnFailed { program: String, reason: String },

    /// The sidecar process exited; every request in flight is rejected with this.
    #[error("Sidecar process exited (code: {})", fmt_exit_code(.code))]
    ProcessExited { code: Option<i32> },

    /// The remote side answered with a JSON-RPC error object.
    #[error("Remote error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// A response arrived but did not have the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The client was stopped or never started.
    #[error("Sidecar is not running")]
    NotRunning,
}

impl McpError {
    /// Whether this error means the sidecar is gone for good.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            McpError::ProcessExited { .. } | McpError::NotRunning | McpError::SpawnFailed { .. }
        )
    }
}

impl From<JsonRpcError> for McpError {
    fn from(err: JsonRpcError) -> Self {
        McpError::Rpc {
            code: err.code,
            message: err.message,
        }
    }
}

fn fmt_exit_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_exited_display() {
        assert_eq!(
            McpError::ProcessExited { code: Some(2) }.to_string(),
            "Sidecar process exited (code: 2)"
        );
        assert_eq!(
            McpError::ProcessExited { code: None }.to_string(),
            "Sidecar process exited (code: unknown)"
        );
    }

    #[test]
    fn test_rpc_error_conversion() {
        let err: McpError = JsonRpcError {
            code: -32601,
            message: "Method not found".into(),
            data: None,
        }
        .into();
        assert!(matches!(err, McpError::Rpc { code: -32601, .. }));
        assert!(!err.is_terminal());
    }
}
