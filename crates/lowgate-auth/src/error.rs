//! Authentication and authorization error taxonomy.
//!
//! Internally the variants are distinct so operators can tell a bad
//! token from an unreachable backend in the logs. Externally they all
//! collapse into one opaque unauthorized response — callers learn
//! nothing about *why* access was denied.

use thiserror::Error;

/// Error raised by token validation, login, or permission checking.
///
/// # Uniform Surface
///
/// The gateway maps every variant to the same caller-visible rejection.
/// Use [`layer`](Self::layer) for internal logging and metrics only.
///
/// # Example
///
/// ```
/// use lowgate_auth::AuthError;
///
/// let err = AuthError::InvalidToken;
/// assert_eq!(err.layer(), "token");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Token is unknown, expired, or malformed.
    #[error("invalid token")]
    InvalidToken,

    /// External backend denied the credentials, or could not be reached.
    ///
    /// The backend failure reason is logged at the call site, never
    /// carried in this variant — it must not leak to callers.
    #[error("bad credentials")]
    BadCredentials,

    /// Authenticated, but no grant covers the requested operation.
    #[error("operation not permitted")]
    Forbidden,

    /// Auth backend call exceeded its bounded wait.
    ///
    /// Surfaces like [`BadCredentials`](Self::BadCredentials);
    /// distinguished only for logs and metrics.
    #[error("auth backend timed out")]
    BackendTimeout,
}

impl AuthError {
    /// Returns the layer that produced the error, for structured logs.
    #[must_use]
    pub fn layer(&self) -> &'static str {
        match self {
            Self::InvalidToken => "token",
            Self::BadCredentials => "credentials",
            Self::Forbidden => "permission",
            Self::BackendTimeout => "backend",
        }
    }
}
