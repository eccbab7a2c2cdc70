//! MCP client over a sidecar's stdio.
//!
//! Owns one child process. A background reader task dispatches responses to
//! waiting callers by request id, so any number of requests may be in flight
//! and their replies may arrive in any order. A supervisor task owns the
//! `Child`; when the process exits for any reason it rejects everything still
//! pending with `ProcessExited`.
//!
//! There is no per-request timeout. Callers that need bounded latency wrap
//! `request` themselves.

use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{broadcast, oneshot, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::SidecarConfig;
use crate::error::McpError;
use crate::pending::PendingRequests;
use crate::transport::{FrameReader, FrameWriter};
use crate::types::*;

const NOTIFICATION_BUFFER: usize = 64;

/// How long an exited sidecar's remaining stdout may take to drain before
/// pending requests are rejected.
const STDOUT_DRAIN: Duration = Duration::from_millis(500);

/// Handle on the supervisor task that owns the child process.
struct ProcessHandle {
    pid: Option<u32>,
    shutdown_tx: oneshot::Sender<()>,
    supervisor: JoinHandle<()>,
}

/// A JSON-RPC client connected to a tool sidecar.
pub struct McpClient {
    pending: Arc<PendingRequests>,
    writer: Mutex<Option<FrameWriter>>,
    next_id: AtomicU64,
    notifications: broadcast::Sender<JsonRpcNotification>,
    reader_task: Mutex<Option<JoinHandle<()>>>,
    process: Mutex<Option<ProcessHandle>>,
    client_info: ClientInfo,
    server_info: Option<InitializeResult>,
}

impl McpClient {
    /// Spawn the sidecar, wire up its pipes and complete the MCP handshake.
    ///
    /// Does not return until the sidecar has answered `initialize`. Fails if
    /// the process cannot be spawned or exits before answering.
    pub async fn start(config: &SidecarConfig) -> Result<Self, McpError> {
        info!(program = %config.binary, "Spawning sidecar process");

        let mut cmd = Command::new(&config.binary);
        cmd.args(config.command_args())
            .envs(config.command_env())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| McpError::SpawnFailed {
            program: config.binary.clone(),
            reason: e.to_string(),
        })?;

        let stdin = child.stdin.take().ok_or_else(|| McpError::SpawnFailed {
            program: config.binary.clone(),
            reason: "failed to capture sidecar stdin".into(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| McpError::SpawnFailed {
            program: config.binary.clone(),
            reason: "failed to capture sidecar stdout".into(),
        })?;

        let pid = child.id();
        let pending = Arc::new(PendingRequests::new());
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (drained_tx, drained_rx) = oneshot::channel();
        let supervisor = tokio::spawn(supervise(
            child,
            shutdown_rx,
            drained_rx,
            Arc::clone(&pending),
            config.shutdown_timeout(),
        ));

        let mut client = Self::assemble(
            FrameReader::new(Box::new(BufReader::new(stdout))),
            FrameWriter::new(Box::new(stdin)),
            pending,
            ReaderEnd::SignalDrained(drained_tx),
        );
        *client.process.get_mut() = Some(ProcessHandle {
            pid,
            shutdown_tx,
            supervisor,
        });
        client.client_info = ClientInfo {
            name: config.client_name.clone(),
            version: Some(config.client_version.clone()),
        };

        if let Err(e) = client.handshake().await {
            warn!(error = %e, "sidecar handshake failed");
            client.stop().await;
            return Err(e);
        }
        Ok(client)
    }

    /// Drive the protocol over an arbitrary byte stream pair instead of a child process.
    ///
    /// No handshake is performed; call [`McpClient::handshake`] if the peer
    /// expects one. EOF on `reader` counts as the peer exiting with an
    /// unknown code. Must be called from within a tokio runtime.
    pub fn from_io<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self::assemble(
            FrameReader::new(Box::new(BufReader::new(reader))),
            FrameWriter::new(Box::new(writer)),
            Arc::new(PendingRequests::new()),
            ReaderEnd::ClosePending,
        )
    }

    /// Override the identity sent in `initialize`.
    pub fn with_client_info(mut self, info: ClientInfo) -> Self {
        self.client_info = info;
        self
    }

    fn assemble(
        frames: FrameReader,
        writer: FrameWriter,
        pending: Arc<PendingRequests>,
        on_end: ReaderEnd,
    ) -> Self {
        let (notifications, _) = broadcast::channel(NOTIFICATION_BUFFER);
        let reader_task = tokio::spawn(read_loop(
            frames,
            Arc::clone(&pending),
            notifications.clone(),
            on_end,
        ));

        Self {
            pending,
            writer: Mutex::new(Some(writer)),
            next_id: AtomicU64::new(1),
            notifications,
            reader_task: Mutex::new(Some(reader_task)),
            process: Mutex::new(None),
            client_info: ClientInfo {
                name: "tool-bridge".into(),
                version: Some(env!("CARGO_PKG_VERSION").into()),
            },
            server_info: None,
        }
    }

    /// Perform the MCP initialization handshake: `initialize`, then the
    /// `notifications/initialized` notification.
    pub async fn handshake(&mut self) -> Result<(), McpError> {
        let params = InitializeParams {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ClientCapabilities::default(),
            client_info: self.client_info.clone(),
        };

        let result = self
            .request("initialize", Some(serde_json::to_value(&params)?))
            .await?;

        let init: InitializeResult = serde_json::from_value(result).unwrap_or_else(|e| {
            warn!(error = %e, "Unrecognized initialize result, continuing");
            InitializeResult::default()
        });

        if !init.protocol_version.is_empty() && init.protocol_version != PROTOCOL_VERSION {
            // Lenient by design of the protocol: the server picks, we proceed.
            warn!(
                server = %init.protocol_version,
                client = PROTOCOL_VERSION,
                "Sidecar negotiated a different protocol version"
            );
        }

        self.notify("notifications/initialized", None).await?;

        info!(
            server = %init.server_info.name,
            version = init.server_info.version.as_deref().unwrap_or("unknown"),
            "Sidecar initialized"
        );
        self.server_info = Some(init);
        Ok(())
    }

    /// Send a JSON-RPC request and wait for the correlated response.
    ///
    /// Resolves with the raw `result` value, or fails with `Rpc` if the peer
    /// answered with an error object, or `ProcessExited` if the sidecar went
    /// away first.
    pub async fn request(&self, method: &str, params: Option<Value>) -> Result<Value, McpError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let rx = self.pending.register(id).await?;

        let request = JsonRpcRequest::new(RpcId::Number(id as i64), method, params);
        debug!(method = %method, id, "Sending request");

        if let Err(e) = self.write(&request).await {
            self.pending.forget(id).await;
            return Err(e);
        }

        match rx.await {
            Ok(result) => result,
            // Sender dropped without an answer: the table itself is gone.
            Err(_) => Err(McpError::NotRunning),
        }
    }

    /// Send a JSON-RPC notification (no response expected).
    pub async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), McpError> {
        let notification = JsonRpcNotification::new(method, params);
        debug!(method = %method, "Sending notification");
        self.write(&notification).await
    }

    async fn write<T: serde::Serialize>(&self, message: &T) -> Result<(), McpError> {
        let mut guard = self.writer.lock().await;
        let writer = guard.as_mut().ok_or(McpError::NotRunning)?;
        writer.send(message).await
    }

    /// Enumerate the sidecar's tools via `tools/list`.
    pub async fn list_tools(&self) -> Result<Vec<RemoteTool>, McpError> {
        let result = self.request("tools/list", None).await?;
        let list: ListToolsResult = serde_json::from_value(result)
            .map_err(|e| McpError::InvalidResponse(format!("tools/list: {e}")))?;
        Ok(list.tools)
    }

    /// Call a tool on the sidecar via `tools/call`.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<CallToolResult, McpError> {
        let params = CallToolParams {
            name: name.to_string(),
            arguments,
        };
        let result = self
            .request("tools/call", Some(serde_json::to_value(&params)?))
            .await?;
        serde_json::from_value(result)
            .map_err(|e| McpError::InvalidResponse(format!("tools/call {name}: {e}")))
    }

    /// Subscribe to notifications sent by the sidecar.
    pub fn subscribe_notifications(&self) -> broadcast::Receiver<JsonRpcNotification> {
        self.notifications.subscribe()
    }

    /// What the sidecar reported about itself during the handshake.
    pub fn server_info(&self) -> Option<&InitializeResult> {
        self.server_info.as_ref()
    }

    /// Number of requests still awaiting a response.
    pub async fn pending_count(&self) -> usize {
        self.pending.len().await
    }

    /// `false` once the sidecar has exited or the client was stopped.
    pub async fn is_running(&self) -> bool {
        self.pending.exit_state().await.is_none()
    }

    /// `Some(code)` after exit; the inner value is `None` when the code is unknown
    /// (killed by a signal, or an in-memory peer hung up).
    pub async fn exit_code(&self) -> Option<Option<i32>> {
        self.pending.exit_state().await
    }

    /// Shut the sidecar down. Idempotent and infallible.
    ///
    /// Stops reading, asks the process to terminate (SIGTERM on unix), waits
    /// up to the configured grace period for it to exit and force-kills it
    /// otherwise. Pending requests are rejected with `ProcessExited`.
    pub async fn stop(&self) {
        if let Some(handle) = self.reader_task.lock().await.take() {
            handle.abort();
        }

        let process = self.process.lock().await.take();
        match process {
            Some(process) => {
                info!(pid = ?process.pid, "Stopping sidecar process");
                // Err means the supervisor already finished: the process is gone.
                let _ = process.shutdown_tx.send(());
                if let Err(e) = process.supervisor.await {
                    warn!(error = %e, "sidecar supervisor task failed");
                    self.pending.close(None).await;
                }
            }
            None => {
                self.pending.close(None).await;
            }
        }

        if let Some(mut writer) = self.writer.lock().await.take() {
            if let Err(e) = writer.close().await {
                debug!(error = %e, "closing sidecar stdin failed");
            }
        }
    }
}

impl Drop for McpClient {
    fn drop(&mut self) {
        // Dropping the process handle drops `shutdown_tx`, which makes the
        // supervisor terminate the child on its own.
        if let Some(handle) = self.reader_task.get_mut().take() {
            handle.abort();
        }
    }
}

/// What the reader does once its input ends.
enum ReaderEnd {
    /// No process behind the stream: EOF means the peer is gone.
    ClosePending,
    /// A supervisor owns the process and closes the table; tell it that
    /// every line the sidecar wrote has been dispatched.
    SignalDrained(oneshot::Sender<()>),
}

/// Read inbound lines until EOF and route each message.
async fn read_loop(
    mut frames: FrameReader,
    pending: Arc<PendingRequests>,
    notifications: broadcast::Sender<JsonRpcNotification>,
    on_end: ReaderEnd,
) {
    loop {
        match frames.next_message().await {
            Ok(Some(message)) => dispatch(message, &pending, &notifications).await,
            Ok(None) => {
                debug!("sidecar output closed");
                break;
            }
            Err(e) => {
                warn!(error = %e, "reading from sidecar failed");
                break;
            }
        }
    }

    match on_end {
        ReaderEnd::ClosePending => {
            pending.close(None).await;
        }
        ReaderEnd::SignalDrained(tx) => {
            // The supervisor may already be gone after a stop().
            let _ = tx.send(());
        }
    }
}

async fn dispatch(
    message: IncomingMessage,
    pending: &PendingRequests,
    notifications: &broadcast::Sender<JsonRpcNotification>,
) {
    match message.classify() {
        Some(Incoming::Response { id, outcome }) => {
            let Some(key) = id.as_u64() else {
                warn!(id = ?id, "response with an id we never issued");
                return;
            };
            if !pending.resolve(key, outcome.map_err(McpError::from)).await {
                warn!(id = key, "response for unknown request id");
            }
        }
        Some(Incoming::Notification(notification)) => {
            debug!(method = %notification.method, "sidecar notification");
            // No subscribers is fine.
            let _ = notifications.send(notification);
        }
        Some(Incoming::Request { id, method }) => {
            debug!(id = ?id, method = %method, "ignoring request from sidecar");
        }
        None => debug!("ignoring message with neither id nor method"),
    }
}

enum Wake {
    Exited(std::io::Result<ExitStatus>),
    Shutdown,
}

/// Own the child until it exits, then reject everything still pending.
///
/// After an unprompted exit, replies the sidecar wrote just before exiting
/// may still sit in the stdout pipe; wait up to [`STDOUT_DRAIN`] for the
/// reader to dispatch them first. An aborted reader drops its sender, which
/// ends the wait at once.
async fn supervise(
    mut child: Child,
    shutdown_rx: oneshot::Receiver<()>,
    drained_rx: oneshot::Receiver<()>,
    pending: Arc<PendingRequests>,
    grace: Duration,
) {
    // A dropped sender counts as a shutdown request too.
    let wake = tokio::select! {
        status = child.wait() => Wake::Exited(status),
        _ = shutdown_rx => Wake::Shutdown,
    };

    let status = match wake {
        Wake::Exited(status) => {
            if tokio::time::timeout(STDOUT_DRAIN, drained_rx).await.is_err() {
                debug!("sidecar stdout still open after exit, not waiting further");
            }
            status
        }
        Wake::Shutdown => terminate(&mut child, grace).await,
    };

    let code = match status {
        Ok(status) => {
            info!(status = %status, "Sidecar process exited");
            status.code()
        }
        Err(e) => {
            warn!(error = %e, "failed to observe sidecar exit");
            None
        }
    };

    let rejected = pending.close(code).await;
    if rejected > 0 {
        warn!(rejected, code = ?code, "sidecar exited with requests in flight");
    }
}

/// Ask the child to exit, then force-kill it after `grace`.
async fn terminate(child: &mut Child, grace: Duration) -> std::io::Result<ExitStatus> {
    if let Some(status) = child.try_wait()? {
        return Ok(status);
    }

    request_termination(child).await;

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(status) => status,
        Err(_) => {
            warn!(grace = ?grace, "sidecar ignored termination request, force killing");
            child.kill().await?;
            child.wait().await
        }
    }
}

async fn request_termination(child: &mut Child) {
    // On Unix, send SIGTERM for graceful shutdown via the kill command.
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            match Command::new("kill")
                .args(["-TERM", &pid.to_string()])
                .status()
                .await
            {
                Ok(_) => {
                    debug!(pid, "sent SIGTERM to sidecar");
                    return;
                }
                Err(e) => warn!(pid, error = %e, "could not send SIGTERM"),
            }
        }
    }

    if let Err(e) = child.start_kill() {
        debug!(error = %e, "start_kill failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, DuplexStream, Lines, ReadHalf, WriteHalf};

    /// The far end of an in-memory connection, scripted by each test.
    struct Peer {
        lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
        writer: WriteHalf<DuplexStream>,
    }

    impl Peer {
        async fn recv(&mut self) -> Value {
            let line = self.lines.next_line().await.unwrap().unwrap();
            serde_json::from_str(&line).unwrap()
        }

        async fn send_raw(&mut self, line: &str) {
            self.writer.write_all(line.as_bytes()).await.unwrap();
            self.writer.write_all(b"\n").await.unwrap();
            self.writer.flush().await.unwrap();
        }

        async fn send(&mut self, message: Value) {
            self.send_raw(&message.to_string()).await;
        }

        async fn reply(&mut self, request: &Value, result: Value) {
            self.send(json!({"jsonrpc": "2.0", "id": request["id"], "result": result}))
                .await;
        }
    }

    fn connected() -> (McpClient, Peer) {
        let (client_end, peer_end) = tokio::io::duplex(64 * 1024);
        let (client_r, client_w) = tokio::io::split(client_end);
        let (peer_r, peer_w) = tokio::io::split(peer_end);
        let client = McpClient::from_io(client_r, client_w);
        let peer = Peer {
            lines: BufReader::new(peer_r).lines(),
            writer: peer_w,
        };
        (client, peer)
    }

    #[tokio::test]
    async fn test_request_frames_and_resolves() {
        let (client, mut peer) = connected();
        let call = tokio::spawn(async move {
            let result = client.request("tools/list", None).await;
            (client, result)
        });

        let req = peer.recv().await;
        assert_eq!(req["jsonrpc"], "2.0");
        assert_eq!(req["method"], "tools/list");
        assert!(req["id"].is_u64());
        assert!(req.get("params").is_none());
        peer.reply(&req, json!({"tools": []})).await;

        let (client, result) = call.await.unwrap();
        assert_eq!(result.unwrap(), json!({"tools": []}));
        assert_eq!(client.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_requests_resolve_by_id_not_arrival_order() {
        let (client, mut peer) = connected();
        let client = Arc::new(client);

        let first = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.request("echo", Some(json!({"n": 1}))).await })
        };
        let second = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.request("echo", Some(json!({"n": 2}))).await })
        };

        let a = peer.recv().await;
        let b = peer.recv().await;
        assert_ne!(a["id"], b["id"]);
        assert_eq!(client.pending_count().await, 2);

        // Answer in reverse order of arrival, echoing each request's own params.
        peer.reply(&b, b["params"].clone()).await;
        peer.reply(&a, a["params"].clone()).await;

        assert_eq!(first.await.unwrap().unwrap(), json!({"n": 1}));
        assert_eq!(second.await.unwrap().unwrap(), json!({"n": 2}));
        assert_eq!(client.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_noise_and_notifications_do_not_disturb_correlation() {
        let (client, mut peer) = connected();
        let mut notes = client.subscribe_notifications();
        let call = tokio::spawn(async move { client.request("ping", None).await });

        let req = peer.recv().await;
        peer.send_raw("INFO sidecar warming up").await;
        peer.send_raw("{not json").await;
        peer.send_raw("12345").await;
        peer.send(json!({"jsonrpc": "2.0", "method": "notifications/progress", "params": {"pct": 50}}))
            .await;
        peer.send(json!({"jsonrpc": "2.0", "id": 999_999, "result": "stray"}))
            .await;
        peer.send(json!({"jsonrpc": "2.0", "id": 77, "method": "roots/list"}))
            .await;
        peer.reply(&req, json!("pong")).await;

        assert_eq!(call.await.unwrap().unwrap(), json!("pong"));
        let note = notes.recv().await.unwrap();
        assert_eq!(note.method, "notifications/progress");
        assert_eq!(note.params, Some(json!({"pct": 50})));
    }

    #[tokio::test]
    async fn test_remote_error_rejects_with_code_and_message() {
        let (client, mut peer) = connected();
        let call = tokio::spawn(async move { client.request("tools/call", None).await });

        let req = peer.recv().await;
        peer.send(json!({
            "jsonrpc": "2.0",
            "id": req["id"],
            "error": {"code": -32602, "message": "unknown tool"}
        }))
        .await;

        match call.await.unwrap() {
            Err(McpError::Rpc { code, message }) => {
                assert_eq!(code, -32602);
                assert_eq!(message, "unknown tool");
            }
            other => panic!("expected Rpc error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_error_object_rejects_instead_of_hanging() {
        let (client, mut peer) = connected();
        let call = tokio::spawn(async move { client.request("tools/call", None).await });

        let req = peer.recv().await;
        peer.send(json!({"jsonrpc": "2.0", "id": req["id"], "error": {"code": -32603}}))
            .await;

        let result = tokio::time::timeout(Duration::from_secs(5), call)
            .await
            .expect("request left hanging")
            .unwrap();
        match result {
            Err(McpError::Rpc { code, message }) => {
                assert_eq!(code, crate::types::INTERNAL_ERROR);
                assert!(message.contains("malformed"));
            }
            other => panic!("expected Rpc error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_peer_exit_rejects_every_pending_request() {
        let (client, mut peer) = connected();
        let client = Arc::new(client);

        let mut calls = Vec::new();
        for n in 0..3 {
            let client = Arc::clone(&client);
            calls.push(tokio::spawn(async move {
                client.request("slow", Some(json!({"n": n}))).await
            }));
        }
        for _ in 0..3 {
            peer.recv().await;
        }
        assert_eq!(client.pending_count().await, 3);

        drop(peer);

        for result in futures::future::join_all(calls).await {
            assert!(matches!(
                result.unwrap(),
                Err(McpError::ProcessExited { code: None })
            ));
        }
        assert_eq!(client.pending_count().await, 0);
        assert!(!client.is_running().await);

        // New requests fail fast instead of hanging.
        let err = client.request("late", None).await.unwrap_err();
        assert!(matches!(err, McpError::ProcessExited { .. }));
    }

    #[tokio::test]
    async fn test_notify_never_registers_pending() {
        let (client, mut peer) = connected();
        client
            .notify("notifications/cancelled", Some(json!({"requestId": 1})))
            .await
            .unwrap();

        let msg = peer.recv().await;
        assert_eq!(msg["method"], "notifications/cancelled");
        assert!(msg.get("id").is_none());
        assert_eq!(client.pending_count().await, 0);
    }

    #[tokio::test]
    async fn test_handshake_sends_initialize_then_initialized() {
        let (client, mut peer) = connected();
        let mut client = client.with_client_info(ClientInfo {
            name: "test-host".into(),
            version: Some("9.9.9".into()),
        });

        let handshake = tokio::spawn(async move {
            let result = client.handshake().await;
            (client, result)
        });

        let init = peer.recv().await;
        assert_eq!(init["method"], "initialize");
        assert_eq!(init["params"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(init["params"]["clientInfo"]["name"], "test-host");
        assert!(init["params"]["capabilities"].is_object());
        peer.reply(
            &init,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {"tools": {"listChanged": false}},
                "serverInfo": {"name": "social-sidecar", "version": "2.1.0"}
            }),
        )
        .await;

        let initialized = peer.recv().await;
        assert_eq!(initialized["method"], "notifications/initialized");
        assert!(initialized.get("id").is_none());

        let (client, result) = handshake.await.unwrap();
        result.unwrap();
        let info = client.server_info().unwrap();
        assert_eq!(info.server_info.name, "social-sidecar");
    }

    #[tokio::test]
    async fn test_call_tool_parses_result() {
        let (client, mut peer) = connected();
        let call = tokio::spawn(async move {
            client
                .call_tool("search_posts", json!({"query": "rust"}))
                .await
        });

        let req = peer.recv().await;
        assert_eq!(req["method"], "tools/call");
        assert_eq!(req["params"], json!({"name": "search_posts", "arguments": {"query": "rust"}}));
        peer.reply(
            &req,
            json!({"content": [{"type": "text", "text": "{\"success\":true}"}]}),
        )
        .await;

        let result = call.await.unwrap().unwrap();
        assert!(!result.is_error);
        assert_eq!(result.primary_text(), Some("{\"success\":true}"));
    }

    #[tokio::test]
    async fn test_list_tools_rejects_malformed_result() {
        let (client, mut peer) = connected();
        let call = tokio::spawn(async move { client.list_tools().await });

        let req = peer.recv().await;
        peer.reply(&req, json!({"tools": "not a list"})).await;

        assert!(matches!(
            call.await.unwrap(),
            Err(McpError::InvalidResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_stop_is_idempotent_and_rejects_later_requests() {
        let (client, _peer) = connected();
        client.stop().await;
        client.stop().await;

        assert!(!client.is_running().await);
        let err = client.request("tools/list", None).await.unwrap_err();
        assert!(matches!(err, McpError::ProcessExited { code: None }));
        assert!(matches!(
            client.notify("x", None).await,
            Err(McpError::NotRunning)
        ));
    }
}
