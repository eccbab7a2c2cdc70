//! Correlation table for in-flight requests.
//!
//! One map, one lock. The table also remembers whether the sidecar has
//! exited, under the same lock, so a request can never be registered after
//! the table was drained and then wait forever.

use std::collections::HashMap;

use serde_json::Value;
use tokio::sync::{oneshot, Mutex};
use tracing::debug;

use crate::error::McpError;

/// Completion handle for one request.
pub type PendingReply = oneshot::Sender<Result<Value, McpError>>;

#[derive(Default)]
struct Table {
    entries: HashMap<u64, PendingReply>,
    /// Set once the process is gone. Carries the observed exit code.
    exited: Option<Option<i32>>,
}

#[derive(Default)]
pub struct PendingRequests {
    inner: Mutex<Table>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new in-flight request and return the receiver its caller awaits.
    ///
    /// Fails with `ProcessExited` if the table was already closed.
    pub async fn register(
        &self,
        id: u64,
    ) -> Result<oneshot::Receiver<Result<Value, McpError>>, McpError> {
        let mut table = self.inner.lock().await;
        if let Some(code) = table.exited {
            return Err(McpError::ProcessExited { code });
        }
        let (tx, rx) = oneshot::channel();
        table.entries.insert(id, tx);
        Ok(rx)
    }

    /// Complete the request with this id. Returns `false` if nobody was waiting.
    pub async fn resolve(&self, id: u64, result: Result<Value, McpError>) -> bool {
        let entry = self.inner.lock().await.entries.remove(&id);
        match entry {
            Some(tx) => {
                // The caller may have stopped awaiting; that is fine.
                let _ = tx.send(result);
                true
            }
            None => false,
        }
    }

    /// Drop the entry without completing it (used when the write itself failed).
    pub async fn forget(&self, id: u64) {
        self.inner.lock().await.entries.remove(&id);
    }

    /// Reject every pending request with `ProcessExited` and refuse new ones.
    ///
    /// Idempotent: the first exit code observed wins.
    pub async fn close(&self, code: Option<i32>) -> usize {
        let mut table = self.inner.lock().await;
        if table.exited.is_none() {
            table.exited = Some(code);
        }
        let code = table.exited.flatten();
        let drained: Vec<_> = table.entries.drain().collect();
        drop(table);

        let count = drained.len();
        for (id, tx) in drained {
            debug!(id, "rejecting pending request after process exit");
            let _ = tx.send(Err(McpError::ProcessExited { code }));
        }
        count
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// `Some(code)` once closed.
    pub async fn exit_state(&self) -> Option<Option<i32>> {
        self.inner.lock().await.exited
    }
}
