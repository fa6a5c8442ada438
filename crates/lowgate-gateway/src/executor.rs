//! Execution backend capability.
//!
//! [`ExecutionBackend`] is the boundary between the gateway and the
//! machinery that actually runs commands on workers. The gateway
//! supports both shapes the contract allows: a synchronous
//! [`run`](ExecutionBackend::run) that waits for a result, and an
//! asynchronous [`submit`](ExecutionBackend::submit) /
//! [`poll`](ExecutionBackend::poll) pair.
//!
//! [`EchoExecutor`] is the in-process implementation used by tests and
//! demos: it answers the `test.*` functions a real worker fleet would.

use async_trait::async_trait;
use lowgate_types::LowStateCommand;
use parking_lot::RwLock;
use serde_json::json;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Error from the execution backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    /// The requested function is not available on this backend.
    #[error("function not available: {0}")]
    UnknownFunction(String),

    /// The handle does not correspond to a submitted command.
    #[error("unknown execution handle")]
    UnknownHandle,

    /// The backend itself failed. Opaque summary only.
    #[error("execution backend error: {0}")]
    Backend(String),
}

/// Handle to an asynchronously submitted command.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExecHandle(String);

impl ExecHandle {
    /// Creates a fresh random handle.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The handle value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ExecHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of polling an asynchronous submission.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecPoll {
    /// The result is in.
    Ready(serde_json::Value),
    /// Still executing; poll again later.
    Pending,
}

/// Capability: execute a validated, authorized command.
///
/// The gateway never calls this while holding a store lock — a backend
/// may suspend for an arbitrary network round-trip.
#[async_trait]
pub trait ExecutionBackend: Send + Sync {
    /// Executes a command and waits for its result.
    async fn run(&self, command: &LowStateCommand) -> Result<serde_json::Value, ExecError>;

    /// Submits a command for asynchronous execution.
    async fn submit(&self, command: &LowStateCommand) -> Result<ExecHandle, ExecError>;

    /// Polls a previously submitted command.
    async fn poll(&self, handle: &ExecHandle) -> Result<ExecPoll, ExecError>;
}

/// In-process backend answering the `test.*` function family.
///
/// | Function | Reply |
/// |----------|-------|
/// | `test.ping` | `true` |
/// | `test.arg` | echoes `{args, kwargs}` |
/// | `test.sleep` | sleeps `args[0]` milliseconds, then `true` |
/// | anything else | [`ExecError::UnknownFunction`] |
///
/// Local clients get the reply keyed per matched minion
/// (`{"web-01": <reply>, ...}`); runner and wheel functions run on the
/// master and answer with the bare reply.
///
/// # Example
///
/// ```
/// use lowgate_gateway::{EchoExecutor, ExecutionBackend};
/// use lowgate_types::{ClientKind, LowStateCommand};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let backend = EchoExecutor::with_minions(["web-01", "db-01"]);
/// let cmd = LowStateCommand::new(ClientKind::Local, "test.ping").with_target("web-*");
/// let result = backend.run(&cmd).await.unwrap();
/// assert_eq!(result, serde_json::json!({"web-01": true}));
/// # });
/// ```
pub struct EchoExecutor {
    minions: Vec<String>,
    submitted: RwLock<HashMap<ExecHandle, LowStateCommand>>,
}

impl EchoExecutor {
    /// Creates a backend with a default two-minion fleet.
    #[must_use]
    pub fn new() -> Self {
        Self::with_minions(["minion-1", "minion-2"])
    }

    /// Creates a backend answering for the named minions.
    #[must_use]
    pub fn with_minions<I, S>(minions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            minions: minions.into_iter().map(Into::into).collect(),
            submitted: RwLock::new(HashMap::new()),
        }
    }

    /// Minions whose name matches the command target.
    fn matched_minions(&self, command: &LowStateCommand) -> Vec<&str> {
        let Some(target) = command.target.as_deref() else {
            return Vec::new();
        };
        // Same glob semantics as the grant layer.
        let Ok(pattern) = glob::Pattern::new(target) else {
            return Vec::new();
        };
        self.minions
            .iter()
            .map(String::as_str)
            .filter(|m| pattern.matches(m))
            .collect()
    }

    async fn execute(&self, command: &LowStateCommand) -> Result<serde_json::Value, ExecError> {
        let reply = match command.function.as_str() {
            "test.ping" => json!(true),
            "test.arg" => json!({
                "args": command.args,
                "kwargs": command.kwargs,
            }),
            "test.sleep" => {
                let millis = command
                    .args
                    .first()
                    .and_then(serde_json::Value::as_u64)
                    .unwrap_or(0);
                tokio::time::sleep(std::time::Duration::from_millis(millis)).await;
                json!(true)
            }
            other => return Err(ExecError::UnknownFunction(other.to_string())),
        };

        // Local results are keyed by minion; runner and wheel functions
        // run on the master and answer with the bare reply.
        if command.client.uses_target() {
            let replies: serde_json::Map<String, serde_json::Value> = self
                .matched_minions(command)
                .into_iter()
                .map(|m| (m.to_string(), reply.clone()))
                .collect();
            Ok(serde_json::Value::Object(replies))
        } else {
            Ok(reply)
        }
    }
}

impl Default for EchoExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ExecutionBackend for EchoExecutor {
    async fn run(&self, command: &LowStateCommand) -> Result<serde_json::Value, ExecError> {
        self.execute(command).await
    }

    async fn submit(&self, command: &LowStateCommand) -> Result<ExecHandle, ExecError> {
        // Unknown functions are rejected at submission, not at poll.
        if !matches!(
            command.function.as_str(),
            "test.ping" | "test.arg" | "test.sleep"
        ) {
            return Err(ExecError::UnknownFunction(command.function.clone()));
        }
        let handle = ExecHandle::new();
        self.submitted.write().insert(handle.clone(), command.redacted());
        Ok(handle)
    }

    async fn poll(&self, handle: &ExecHandle) -> Result<ExecPoll, ExecError> {
        let command = {
            let submitted = self.submitted.read();
            submitted.get(handle).cloned()
        };
        match command {
            Some(command) => {
                let result = self.execute(&command).await?;
                self.submitted.write().remove(handle);
                Ok(ExecPoll::Ready(result))
            }
            None => Err(ExecError::UnknownHandle),
        }
    }
}
