//! Built-in external auth backends.
//!
//! Concrete implementations of the [`ExternalAuth`] capability, selected
//! by name at configuration time. Real deployments plug in their own
//! (LDAP, PAM, ...); these two cover development and testing:
//!
//! - [`AutoAuth`] — accepts any non-empty username/password pair and
//!   hands out a configured grant set
//! - [`StaticAuth`] — fixed user/password/grant table
//!
//! Both compute the grant set fresh on every call: nothing accumulates
//! across logins, which is what keeps repeated logins from growing a
//! session's permissions.

use async_trait::async_trait;
use lowgate_auth::{AuthError, ExternalAuth, OpPattern, Verified};
use lowgate_types::{Credentials, Identity};
use std::collections::HashMap;

/// Accepts any non-empty credentials; grants come from configuration.
///
/// # Example
///
/// ```
/// use lowgate_auth::{ExternalAuth, OpPattern};
/// use lowgate_gateway::AutoAuth;
/// use lowgate_types::{ClientKind, Credentials};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let backend = AutoAuth::new(vec![OpPattern::new(ClientKind::Local, "test.*")]);
///
/// let ok = backend.verify(&Credentials::new("saltdev", "saltdev", "auto")).await;
/// assert!(ok.is_ok());
///
/// let bad = backend.verify(&Credentials::new("", "", "auto")).await;
/// assert!(bad.is_err());
/// # });
/// ```
pub struct AutoAuth {
    /// Grants for users without a per-user entry.
    default_grants: Vec<OpPattern>,
    /// Per-user grant overrides.
    per_user: HashMap<String, Vec<OpPattern>>,
}

impl AutoAuth {
    /// Creates the backend with a default grant set for every user.
    #[must_use]
    pub fn new(default_grants: Vec<OpPattern>) -> Self {
        Self {
            default_grants,
            per_user: HashMap::new(),
        }
    }

    /// Overrides the grant set for one user.
    #[must_use]
    pub fn with_user_grants(mut self, user: impl Into<String>, grants: Vec<OpPattern>) -> Self {
        self.per_user.insert(user.into(), grants);
        self
    }
}

#[async_trait]
impl ExternalAuth for AutoAuth {
    async fn verify(&self, credentials: &Credentials) -> Result<Verified, AuthError> {
        if credentials.username.is_empty() || credentials.password.is_empty() {
            tracing::warn!(backend = "auto", "login rejected: empty credential field");
            return Err(AuthError::BadCredentials);
        }
        let granted = self
            .per_user
            .get(&credentials.username)
            .unwrap_or(&self.default_grants)
            .clone();
        Ok(Verified {
            identity: Identity::new(&credentials.username, "auto"),
            granted,
        })
    }
}

/// Fixed user table: password check plus a per-user grant set.
///
/// # Example
///
/// ```
/// use lowgate_auth::{ExternalAuth, OpPattern};
/// use lowgate_gateway::StaticAuth;
/// use lowgate_types::{ClientKind, Credentials};
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let backend = StaticAuth::new()
///     .with_user("alice", "hunter2", vec![OpPattern::allow_all(ClientKind::Local)]);
///
/// assert!(backend.verify(&Credentials::new("alice", "hunter2", "static")).await.is_ok());
/// assert!(backend.verify(&Credentials::new("alice", "wrong", "static")).await.is_err());
/// # });
/// ```
#[derive(Default)]
pub struct StaticAuth {
    users: HashMap<String, (String, Vec<OpPattern>)>,
}

impl StaticAuth {
    /// Creates an empty user table (denies everyone).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a user with a password and grant set.
    #[must_use]
    pub fn with_user(
        mut self,
        user: impl Into<String>,
        password: impl Into<String>,
        grants: Vec<OpPattern>,
    ) -> Self {
        self.users.insert(user.into(), (password.into(), grants));
        self
    }
}

#[async_trait]
impl ExternalAuth for StaticAuth {
    async fn verify(&self, credentials: &Credentials) -> Result<Verified, AuthError> {
        match self.users.get(&credentials.username) {
            Some((password, grants)) if *password == credentials.password => Ok(Verified {
                identity: Identity::new(&credentials.username, "static"),
                granted: grants.clone(),
            }),
            Some(_) => {
                tracing::warn!(
                    backend = "static",
                    user = %credentials.username,
                    "login rejected: wrong password"
                );
                Err(AuthError::BadCredentials)
            }
            None => {
                tracing::warn!(
                    backend = "static",
                    user = %credentials.username,
                    "login rejected: unknown user"
                );
                Err(AuthError::BadCredentials)
            }
        }
    }
}
