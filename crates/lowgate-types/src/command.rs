//! The low-state command: one requested operation.
//!
//! A [`LowStateCommand`] is the canonical description of one operation a
//! caller wants executed: which client interface, which function, which
//! targets, which arguments, and how the caller authenticates.
//!
//! # Auth Source Resolution
//!
//! The authorization source is an explicit tagged union, resolved by the
//! transport layer *before* the command enters the gateway:
//!
//! ```text
//! token field present        → AuthSource::Token     (even if empty!)
//! credentials present        → AuthSource::Credentials
//! both present               → AuthSource::Token     (token wins)
//! neither present            → AuthSource::None
//! ```
//!
//! An empty token is an authentication attempt that fails; it never
//! falls back to credentials. A tagged union also rules out
//! field-aliasing tricks: a differently-cased `token` key can never
//! select a different auth path.

use crate::{Credentials, Token};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Client interface a command is addressed to.
///
/// The client kind determines targeting semantics and which grant
/// family authorizes the call:
///
/// | Kind | Targets minions? | Grant family |
/// |------|------------------|--------------|
/// | `Local` / `LocalAsync` | yes | `local` |
/// | `Runner` / `RunnerAsync` | no | `runner` |
/// | `Wheel` / `WheelAsync` | no | `wheel` |
///
/// Async variants submit the job and return without waiting; they are
/// authorized exactly like their synchronous family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientKind {
    /// Execute on matched targets, wait for results.
    Local,
    /// Execute on matched targets, return a job id immediately.
    LocalAsync,
    /// Execute a runner function on the master, wait for the result.
    Runner,
    /// Runner function, return a job id immediately.
    RunnerAsync,
    /// Execute a wheel (admin) function, wait for the result.
    Wheel,
    /// Wheel function, return a job id immediately.
    WheelAsync,
}

impl ClientKind {
    /// Returns the synchronous family this kind is authorized as.
    ///
    /// Grants are written against the family (`local`, `runner`,
    /// `wheel`); the async flavor never changes what a caller may do.
    #[must_use]
    pub fn family(&self) -> ClientKind {
        match self {
            Self::Local | Self::LocalAsync => Self::Local,
            Self::Runner | Self::RunnerAsync => Self::Runner,
            Self::Wheel | Self::WheelAsync => Self::Wheel,
        }
    }

    /// Returns `true` if this kind addresses a set of targets.
    ///
    /// Only the `Local` family matches against minion targets; runner
    /// and wheel functions run on the master itself.
    #[must_use]
    pub fn uses_target(&self) -> bool {
        matches!(self.family(), Self::Local)
    }

    /// Returns `true` for the fire-and-forget variants.
    #[must_use]
    pub fn is_async(&self) -> bool {
        matches!(self, Self::LocalAsync | Self::RunnerAsync | Self::WheelAsync)
    }

    /// Wire name of this client kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::LocalAsync => "local_async",
            Self::Runner => "runner",
            Self::RunnerAsync => "runner_async",
            Self::Wheel => "wheel",
            Self::WheelAsync => "wheel_async",
        }
    }
}

impl std::fmt::Display for ClientKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a request authenticates.
///
/// Exactly one source is carried per command. The transport resolves
/// whatever field soup it received into this union before the gateway
/// ever sees the request, so there is no precedence logic downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum AuthSource {
    /// Bearer token from a prior login.
    Token(Token),
    /// Raw credentials for an implicit login.
    Credentials(Credentials),
    /// No auth material supplied.
    None,
}

impl AuthSource {
    /// Returns `true` if no auth material is present.
    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// One requested operation.
///
/// # Example
///
/// ```
/// use lowgate_types::{ClientKind, LowStateCommand};
///
/// let cmd = LowStateCommand::new(ClientKind::Local, "test.ping")
///     .with_target("*")
///     .with_arg(serde_json::json!(1234));
///
/// assert_eq!(cmd.function, "test.ping");
/// assert_eq!(cmd.target.as_deref(), Some("*"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowStateCommand {
    /// Client interface to dispatch through.
    pub client: ClientKind,
    /// Function to invoke (e.g. `test.ping`).
    pub function: String,
    /// Target expression; required for target-using clients.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target: Option<String>,
    /// Positional arguments.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub args: Vec<serde_json::Value>,
    /// Keyword arguments. BTreeMap keeps serialized output stable.
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub kwargs: BTreeMap<String, serde_json::Value>,
    /// Authorization source for this request.
    #[serde(default = "default_auth_source")]
    pub auth: AuthSource,
}

fn default_auth_source() -> AuthSource {
    AuthSource::None
}

impl LowStateCommand {
    /// Creates a command with no target, args, or auth material.
    #[must_use]
    pub fn new(client: ClientKind, function: impl Into<String>) -> Self {
        Self {
            client,
            function: function.into(),
            target: None,
            args: Vec::new(),
            kwargs: BTreeMap::new(),
            auth: AuthSource::None,
        }
    }

    /// Sets the target expression.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Appends a positional argument.
    #[must_use]
    pub fn with_arg(mut self, arg: serde_json::Value) -> Self {
        self.args.push(arg);
        self
    }

    /// Inserts a keyword argument.
    #[must_use]
    pub fn with_kwarg(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.kwargs.insert(key.into(), value);
        self
    }

    /// Sets a bearer token as the auth source.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<Token>) -> Self {
        self.auth = AuthSource::Token(token.into());
        self
    }

    /// Sets raw credentials as the auth source.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.auth = AuthSource::Credentials(credentials);
        self
    }

    /// Returns a copy with all auth material stripped.
    ///
    /// Job records cache the command they executed; the cached copy must
    /// never contain a usable token or password.
    #[must_use]
    pub fn redacted(&self) -> Self {
        Self {
            auth: AuthSource::None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_collapses_async_variants() {
        assert_eq!(ClientKind::LocalAsync.family(), ClientKind::Local);
        assert_eq!(ClientKind::RunnerAsync.family(), ClientKind::Runner);
        assert_eq!(ClientKind::WheelAsync.family(), ClientKind::Wheel);
        assert_eq!(ClientKind::Local.family(), ClientKind::Local);
    }

    #[test]
    fn only_local_family_uses_targets() {
        assert!(ClientKind::Local.uses_target());
        assert!(ClientKind::LocalAsync.uses_target());
        assert!(!ClientKind::Runner.uses_target());
        assert!(!ClientKind::Wheel.uses_target());
        assert!(!ClientKind::WheelAsync.uses_target());
    }

    #[test]
    fn async_detection() {
        assert!(ClientKind::LocalAsync.is_async());
        assert!(!ClientKind::Local.is_async());
    }

    #[test]
    fn redacted_strips_auth_only() {
        let cmd = LowStateCommand::new(ClientKind::Local, "test.ping")
            .with_target("*")
            .with_token("secret");

        let redacted = cmd.redacted();
        assert_eq!(redacted.auth, AuthSource::None);
        assert_eq!(redacted.function, "test.ping");
        assert_eq!(redacted.target.as_deref(), Some("*"));
        // Source command untouched
        assert!(matches!(cmd.auth, AuthSource::Token(_)));
    }

    #[test]
    fn empty_token_stays_a_token() {
        let cmd = LowStateCommand::new(ClientKind::Local, "test.ping").with_token("");
        match &cmd.auth {
            AuthSource::Token(t) => assert!(t.is_empty()),
            other => panic!("expected token source, got {other:?}"),
        }
    }

    #[test]
    fn client_kind_wire_names() {
        let json = serde_json::to_string(&ClientKind::LocalAsync).unwrap();
        assert_eq!(json, "\"local_async\"");
        let back: ClientKind = serde_json::from_str("\"runner\"").unwrap();
        assert_eq!(back, ClientKind::Runner);
    }

    #[test]
    fn command_serde_roundtrip_keeps_kwargs_order() {
        let cmd = LowStateCommand::new(ClientKind::Runner, "test.arg")
            .with_arg(serde_json::json!(1234))
            .with_kwarg("ext_source", serde_json::json!("redis"));

        let json = serde_json::to_string(&cmd).unwrap();
        let back: LowStateCommand = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cmd);
    }
}
