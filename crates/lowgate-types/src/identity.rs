//! Identity and credential types.
//!
//! [`Identity`] is the *output* of successful credential verification;
//! [`Credentials`] is the *input*. The two never mix: an identity is
//! immutable proof of who authenticated, a credential record is raw
//! secret material that must be redacted everywhere.
//!
//! # Design Rationale
//!
//! Identity lives in `lowgate-types` (not `lowgate-auth`) because job
//! records reference the submitting identity without needing any
//! permission logic. Permission checking (grants, sessions) stays in
//! the auth layer.

use serde::{Deserialize, Serialize};

/// Verified principal produced by an external auth backend.
///
/// Immutable once created. Sessions and jobs reference identities by
/// value; nothing mutates an identity after verification.
///
/// # Example
///
/// ```
/// use lowgate_types::Identity;
///
/// let ident = Identity::new("saltdev", "auto");
/// assert_eq!(ident.user(), "saltdev");
/// assert_eq!(ident.backend(), "auto");
/// assert!(ident.acting_as().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Principal name as verified by the backend.
    user: String,
    /// Name of the auth backend that verified this identity.
    backend: String,
    /// Optional scoping attribute: the principal this identity acts on
    /// behalf of (impersonation-style delegation).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    acting_as: Option<String>,
}

impl Identity {
    /// Creates an identity verified by the named backend.
    #[must_use]
    pub fn new(user: impl Into<String>, backend: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            backend: backend.into(),
            acting_as: None,
        }
    }

    /// Creates an identity acting on behalf of another principal.
    #[must_use]
    pub fn acting_for(
        user: impl Into<String>,
        backend: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            backend: backend.into(),
            acting_as: Some(target.into()),
        }
    }

    /// The verified principal name.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// The backend that performed verification.
    #[must_use]
    pub fn backend(&self) -> &str {
        &self.backend
    }

    /// The principal this identity acts on behalf of, if any.
    #[must_use]
    pub fn acting_as(&self) -> Option<&str> {
        self.acting_as.as_deref()
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.acting_as {
            Some(target) => write!(f, "{}@{} (as {})", self.user, self.backend, target),
            None => write!(f, "{}@{}", self.user, self.backend),
        }
    }
}

/// Raw credentials submitted for verification.
///
/// # Security
///
/// - `Debug` output redacts the password
/// - Credentials are stripped from commands before they are cached as
///   job records — see `LowStateCommand::redacted`
///
/// # Example
///
/// ```
/// use lowgate_types::Credentials;
///
/// let creds = Credentials::new("saltdev", "saltdev", "auto");
/// let debug = format!("{creds:?}");
/// assert!(!debug.contains("saltdev\", password: \"saltdev"));
/// assert!(debug.contains("REDACTED"));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Claimed principal name.
    pub username: String,
    /// Secret to verify.
    pub password: String,
    /// Backend to verify against ("auto", "pam", ...).
    pub backend: String,
}

impl Credentials {
    /// Creates a credential record for the named backend.
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        backend: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            backend: backend.into(),
        }
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("backend", &self.backend)
            .finish()
    }
}
