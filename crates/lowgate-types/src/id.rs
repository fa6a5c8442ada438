//! Identifier types for lowgate.
//!
//! [`JobId`] is UUID-based so concurrent submissions can never collide.
//! [`Token`] is an opaque string carrier — the gateway's token store is
//! the only component that gives a token value meaning.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a dispatched job.
///
/// Jobs are created when an authorized command is submitted to the
/// execution backend and live in the job cache until evicted.
///
/// # UUID Strategy
///
/// Job ids are UUID v4 (random). Uniqueness holds under concurrent
/// submission without any coordination; ordering of jobs comes from the
/// cache's insertion order, not from the id.
///
/// # Example
///
/// ```
/// use lowgate_types::JobId;
///
/// let a = JobId::new();
/// let b = JobId::new();
/// assert_ne!(a, b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Creates a new random job id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque session token.
///
/// A bearer credential mapping to exactly one server-held session. The
/// value is meaningful only to the token store that issued it; every
/// other component treats it as an opaque string.
///
/// # Security
///
/// - `Debug` output is redacted — tokens must never reach logs
/// - No structure is attached to the value: an empty string, a
///   path-looking string, and random garbage are all just unknown tokens
///
/// # Example
///
/// ```
/// use lowgate_types::Token;
///
/// let token = Token::new("0123abcd");
/// assert_eq!(token.as_str(), "0123abcd");
/// assert_eq!(format!("{token:?}"), "Token([REDACTED])");
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    /// Wraps a raw token string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw token value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the token value is the empty string.
    ///
    /// An empty token is still a token — it is an authentication attempt
    /// that will fail, never a fallback to some other auth source.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Token([REDACTED])")
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
