//! Integration tests against real child processes.
//!
//! Each sidecar is a small `/bin/sh` script that speaks just enough
//! newline-delimited JSON-RPC for the scenario under test.

#![cfg(unix)]

use std::time::{Duration, Instant};

use serde_json::json;

use toolbridge_mcp::interpret::TRANSPORT_ERROR;
use toolbridge_mcp::{BridgeConfig, McpClient, McpError, SidecarConfig, ToolBridge};
use toolbridge_tool_runtime::ToolRegistry;

/// Answers `initialize`, `tools/list` and `tools/call`. A call to the tool
/// named `crash` makes the process exit with code 7; `last_words` replies
/// and then exits with code 0.
const SCRIPTED_SIDECAR: &str = r##"
reply() { printf '{"jsonrpc":"2.0","id":%s,"result":%s}\n' "$1" "$2"; }
while IFS= read -r line; do
  id=$(printf '%s\n' "$line" | sed -n 's/.*"id":\([0-9][0-9]*\).*/\1/p')
  case "$line" in
    *'"method":"initialize"'*)
      reply "$id" '{"protocolVersion":"2024-11-05","capabilities":{"tools":{}},"serverInfo":{"name":"sh-sidecar","version":"0.0.1"}}' ;;
    *'"method":"tools/list"'*)
      reply "$id" '{"tools":[{"name":"get_timeline","description":"Home timeline","inputSchema":{"type":"object"}},{"name":"create_post","inputSchema":{"type":"object"}}]}' ;;
    *'"name":"crash"'*)
      exit 7 ;;
    *'"name":"last_words"'*)
      reply "$id" '{"content":[{"type":"text","text":"bye"}]}'
      exit 0 ;;
    *'"method":"tools/call"'*)
      reply "$id" "{\"content\":[{\"type\":\"text\",\"text\":\"host=$TOOL_BRIDGE_HOST\"}]}" ;;
  esac
done
"##;

fn sh_sidecar(script: &str) -> SidecarConfig {
    let mut config = SidecarConfig::new("/bin/sh");
    config.args = vec!["-c".into(), script.into()];
    config.shutdown_timeout_secs = 1;
    config
}

#[tokio::test]
async fn test_spawn_failure_is_reported() {
    let config = SidecarConfig::new("/definitely/not/a/sidecar");
    match McpClient::start(&config).await {
        Err(McpError::SpawnFailed { program, .. }) => {
            assert_eq!(program, "/definitely/not/a/sidecar");
        }
        Err(other) => panic!("expected SpawnFailed, got {other:?}"),
        Ok(_) => panic!("spawning a missing binary succeeded"),
    }
}

#[tokio::test]
async fn test_exit_before_handshake_carries_exit_code() {
    let config = sh_sidecar("read line; exit 3");
    match McpClient::start(&config).await {
        Err(McpError::ProcessExited { code }) => assert_eq!(code, Some(3)),
        Err(other) => panic!("expected ProcessExited, got {other:?}"),
        Ok(_) => panic!("handshake succeeded against a sidecar that exits"),
    }
}

#[tokio::test]
async fn test_handshake_list_and_call() {
    let mut config = sh_sidecar(SCRIPTED_SIDECAR);
    config.client_name = "integration-host".into();

    let client = McpClient::start(&config).await.unwrap();
    let info = client.server_info().unwrap();
    assert_eq!(info.server_info.name, "sh-sidecar");
    assert!(client.is_running().await);

    let tools = client.list_tools().await.unwrap();
    let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["get_timeline", "create_post"]);

    // The host marker reaches the child's environment.
    let result = client
        .call_tool("get_timeline", json!({"limit": 1}))
        .await
        .unwrap();
    assert_eq!(result.primary_text(), Some("host=integration-host"));

    client.stop().await;
    assert!(!client.is_running().await);
    assert_eq!(client.pending_count().await, 0);
}

#[tokio::test]
async fn test_bridge_registers_and_survives_sidecar_crash() {
    let config = BridgeConfig {
        sidecar: sh_sidecar(SCRIPTED_SIDECAR),
        ..Default::default()
    };
    let mut registry = ToolRegistry::new();

    let bridge = ToolBridge::start(&config, &mut registry).await.unwrap();
    // create_post is mutation-class and mutations are off by default.
    assert_eq!(bridge.registered(), 1);
    assert!(registry.get("create_post").is_none());

    let outcome = registry
        .execute("get_timeline", json!({}))
        .await
        .unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.data(), Some(&json!("host=tool-bridge")));

    let err = bridge
        .client()
        .call_tool("crash", json!({}))
        .await
        .unwrap_err();
    assert!(matches!(err, McpError::ProcessExited { code: Some(7) }));
    assert_eq!(bridge.client().exit_code().await, Some(Some(7)));

    let outcome = registry
        .execute("get_timeline", json!({}))
        .await
        .unwrap();
    assert_eq!(outcome.error_code(), Some(TRANSPORT_ERROR));
    assert!(outcome.error_message().unwrap().contains("code: 7"));

    bridge.stop().await;
}

#[tokio::test]
async fn test_reply_written_just_before_exit_is_delivered() {
    let client = McpClient::start(&sh_sidecar(SCRIPTED_SIDECAR)).await.unwrap();

    let result = client.call_tool("last_words", json!({})).await.unwrap();
    assert_eq!(result.primary_text(), Some("bye"));

    // The exit itself is still observed.
    let deadline = Instant::now() + Duration::from_secs(5);
    while client.is_running().await {
        assert!(Instant::now() < deadline, "sidecar exit never observed");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(client.exit_code().await, Some(Some(0)));
    client.stop().await;
}

#[tokio::test]
async fn test_stop_force_kills_a_sidecar_that_ignores_sigterm() {
    let script = format!("trap '' TERM\n{SCRIPTED_SIDECAR}");
    let client = McpClient::start(&sh_sidecar(&script)).await.unwrap();

    let started = Instant::now();
    client.stop().await;
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(900), "stopped after {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "stopped after {elapsed:?}");
    assert!(!client.is_running().await);

    // Second stop is a no-op.
    let again = Instant::now();
    client.stop().await;
    assert!(again.elapsed() < Duration::from_millis(500));

    let err = client.list_tools().await.unwrap_err();
    assert!(matches!(err, McpError::ProcessExited { .. }));
}
