//! Turns raw `tools/call` results into [`ToolOutcome`]s.
//!
//! Rules, first match wins:
//! 1. `isError` set by the transport: failure `transport_error`.
//! 2. No content or empty primary text: failure `empty_response`.
//! 3. Primary text is not JSON: success with the raw text.
//! 4. JSON object with a `success` key: unwrap the application envelope.
//! 5. Any other JSON: success with the parsed value.

use serde_json::{Map, Value};
use toolbridge_tool_runtime::{OutcomeMeta, ToolOutcome};
use tracing::debug;

use crate::error::McpError;
use crate::types::CallToolResult;

pub const TRANSPORT_ERROR: &str = "transport_error";
pub const EMPTY_RESPONSE: &str = "empty_response";
pub const UNKNOWN_ERROR: &str = "unknown_error";

/// Known application error codes and the guidance shown for each.
const GUIDANCE: &[(&str, &str)] = &[
    ("rate_limit_exceeded", "The platform rate limit was reached. Wait a few minutes before retrying."),
    ("auth_expired", "The account's authentication has expired. Re-authenticate the sidecar and try again."),
    ("auth_missing", "No account credentials are configured. Run the sidecar's authentication setup first."),
    ("permission_denied", "The account does not have permission to perform this action."),
    ("not_found", "The requested resource was not found. It may have been deleted or made private."),
    ("upstream_error", "The upstream platform API returned an error. Try again later."),
    ("llm_not_configured", "Content generation is not configured. Set up an LLM provider in the sidecar config."),
    ("llm_error", "Content generation failed. Try again, or check the LLM provider's status."),
    ("parse_error", "The sidecar could not parse a response from the upstream service."),
    ("config_invalid", "The sidecar configuration is invalid. Check the config file for errors."),
    ("config_missing", "The sidecar configuration file is missing. Create one before using this tool."),
    ("storage_error", "The sidecar's local storage failed. Check disk space and file permissions."),
    ("policy_blocked", "This action was blocked by the safety policy."),
    ("policy_requires_approval", "This action requires approval under the safety policy. Approve it before retrying."),
    ("policy_evaluation_failed", "The safety policy could not be evaluated, so the action was not performed."),
    ("safety_duplicate_content", "This content duplicates a recent post and was blocked."),
    ("safety_rate_limited", "The sidecar's own posting limit was reached. Wait before posting again."),
    ("safety_banned_content", "This content contains banned phrases and was blocked."),
];

/// Guidance sentence for a known error code.
pub fn guidance_for(code: &str) -> Option<&'static str> {
    GUIDANCE
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, template)| *template)
}

/// All error codes that have guidance.
pub fn known_error_codes() -> impl Iterator<Item = &'static str> {
    GUIDANCE.iter().map(|(code, _)| *code)
}

/// Build the user-facing message for an error code.
///
/// Known codes get their guidance template, with the server's message
/// appended in parentheses when it says something the template does not.
/// Unknown codes return the server's message unchanged.
pub fn format_error_message(code: &str, server_message: &str) -> String {
    let Some(template) = guidance_for(code) else {
        return server_message.to_string();
    };

    if server_message.trim().is_empty() || server_message == template || server_message == code {
        template.to_string()
    } else {
        format!("{template} ({server_message})")
    }
}

/// Classify a raw tool-call result.
pub fn interpret(result: &CallToolResult) -> ToolOutcome {
    if result.is_error {
        let text = result.joined_text();
        let message = if text.trim().is_empty() {
            "The sidecar reported an error without details.".to_string()
        } else {
            text
        };
        return ToolOutcome::failure(TRANSPORT_ERROR, message);
    }

    let text = match result.primary_text() {
        Some(text) if !text.trim().is_empty() => text,
        _ => {
            return ToolOutcome::failure(EMPTY_RESPONSE, "The tool returned an empty response.");
        }
    };

    let parsed: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => return ToolOutcome::success(Value::String(text.to_string())),
    };

    match parsed {
        Value::Object(envelope) if envelope.contains_key("success") => unwrap_envelope(envelope),
        other => ToolOutcome::success(other),
    }
}

/// Read the application envelope `{success, data?, error?, meta?}` leniently.
///
/// Anything but a literal `success: true` is a failure, however malformed
/// the rest of the envelope is.
fn unwrap_envelope(mut envelope: Map<String, Value>) -> ToolOutcome {
    if envelope.get("success") == Some(&Value::Bool(true)) {
        let data = envelope.remove("data").unwrap_or(Value::Null);
        let meta = envelope.remove("meta").and_then(OutcomeMeta::from_value_lossy);
        return ToolOutcome::success_with_meta(data, meta);
    }

    let (code, server_message, retryable) = match envelope.remove("error") {
        Some(Value::Object(error)) => (
            error
                .get("code")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
            error.get("message").and_then(message_text),
            error.get("retryable").and_then(Value::as_bool),
        ),
        Some(other) => (None, message_text(&other), None),
        None => (None, None, None),
    };

    let code = code.unwrap_or_else(|| {
        debug!("failure envelope without a string error code");
        UNKNOWN_ERROR.to_string()
    });
    let server_message = server_message
        .unwrap_or_else(|| "The tool reported a failure without details.".to_string());

    ToolOutcome::failure(code.clone(), format_error_message(&code, &server_message))
        .with_retryable(retryable)
}

/// Human text for an error or message field of any JSON type.
fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Outcome for a call that never produced a result (process gone, remote
/// JSON-RPC error, malformed response).
pub fn outcome_for_error(err: &McpError) -> ToolOutcome {
    let retryable = match err {
        McpError::Rpc { .. } | McpError::Transport(_) => None,
        _ if err.is_terminal() => Some(false),
        _ => None,
    };
    ToolOutcome::failure(TRANSPORT_ERROR, err.to_string()).with_retryable(retryable)
}
