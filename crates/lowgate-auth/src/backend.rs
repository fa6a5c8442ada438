//! External authentication capability.
//!
//! [`ExternalAuth`] is the boundary between the gateway and whatever
//! actually verifies credentials — a password file, LDAP, PAM, or a
//! test double. Implementations live in `lowgate-gateway` (and in
//! downstream deployments); this crate only defines the contract.
//!
//! # Contract
//!
//! Given credentials, a backend either returns the verified identity
//! *and the complete grant set for that identity*, or it denies. The
//! grant set is computed fresh on every call and passed through to the
//! session unchanged — backends must not accumulate state across calls
//! for the same identity.

use crate::{AuthError, OpPattern};
use async_trait::async_trait;
use lowgate_types::{Credentials, Identity};

/// Successful verification: who, and what they may do.
#[derive(Debug, Clone, PartialEq)]
pub struct Verified {
    /// The verified identity.
    pub identity: Identity,
    /// The complete grant set for this identity, computed now.
    pub granted: Vec<OpPattern>,
}

/// Pluggable credential verifier.
///
/// Backends are selected by name at configuration time (the request's
/// `backend` field), never swapped at runtime.
///
/// # Errors
///
/// Implementations return [`AuthError::BadCredentials`] for any denial.
/// Internal failure detail (unreachable directory, IO error) belongs in
/// a `tracing` event at the implementation site, not in the error.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use lowgate_auth::{AuthError, ExternalAuth, OpPattern, Verified};
/// use lowgate_types::{ClientKind, Credentials, Identity};
///
/// struct AcceptEveryone;
///
/// #[async_trait]
/// impl ExternalAuth for AcceptEveryone {
///     async fn verify(&self, credentials: &Credentials) -> Result<Verified, AuthError> {
///         Ok(Verified {
///             identity: Identity::new(&credentials.username, "test"),
///             granted: vec![OpPattern::allow_all(ClientKind::Local)],
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait ExternalAuth: Send + Sync {
    /// Verifies credentials, returning the identity and its grant set.
    async fn verify(&self, credentials: &Credentials) -> Result<Verified, AuthError>;
}
