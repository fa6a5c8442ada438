//! Auth orchestration: login, authenticate, logout.
//!
//! [`AuthResolver`] sits between the gateway and the auth machinery. It
//! owns the backend registry (name → [`ExternalAuth`] impl, fixed at
//! startup) and drives the token store: a login verifies credentials
//! against the named backend and mints a session; authentication of a
//! request resolves its [`AuthSource`] to a live session.
//!
//! # Failure Uniformity
//!
//! Every login failure — wrong password, unknown backend, unreachable
//! backend, timeout — surfaces as [`AuthError::BadCredentials`]. The
//! distinct causes are logged here with `tracing` for operators and go
//! no further.

use crate::TokenStore;
use lowgate_auth::{AuthError, ExternalAuth, Session};
use lowgate_types::{AuthSource, Credentials, Token};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Login/validate/logout orchestrator.
///
/// # Example
///
/// ```
/// use lowgate_auth::OpPattern;
/// use lowgate_gateway::{AuthResolver, AutoAuth, TokenStore};
/// use lowgate_types::{ClientKind, Credentials};
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let store = Arc::new(TokenStore::new());
/// let resolver = AuthResolver::new(store, chrono::Duration::hours(12), Duration::from_secs(5))
///     .with_backend("auto", Arc::new(AutoAuth::new(vec![
///         OpPattern::new(ClientKind::Local, "test.*"),
///     ])));
///
/// let session = resolver.login(&Credentials::new("saltdev", "saltdev", "auto")).await.unwrap();
/// assert!(!session.granted().is_empty());
/// # });
/// ```
pub struct AuthResolver {
    store: Arc<TokenStore>,
    backends: HashMap<String, Arc<dyn ExternalAuth>>,
    token_ttl: chrono::Duration,
    backend_timeout: Duration,
}

impl AuthResolver {
    /// Creates a resolver with no backends registered.
    #[must_use]
    pub fn new(store: Arc<TokenStore>, token_ttl: chrono::Duration, backend_timeout: Duration) -> Self {
        Self {
            store,
            backends: HashMap::new(),
            token_ttl,
            backend_timeout,
        }
    }

    /// Registers an auth backend under a name.
    ///
    /// The registry is fixed at startup; there is no runtime swap.
    #[must_use]
    pub fn with_backend(mut self, name: impl Into<String>, backend: Arc<dyn ExternalAuth>) -> Self {
        self.backends.insert(name.into(), backend);
        self
    }

    /// The token store this resolver drives.
    #[must_use]
    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Verifies credentials and mints a session.
    ///
    /// The backend's grant set is passed to the store unchanged — no
    /// merging with any prior session for the same identity.
    ///
    /// # Errors
    ///
    /// [`AuthError::BadCredentials`] for every failure mode; the
    /// specific cause is logged, not returned.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session, AuthError> {
        let Some(backend) = self.backends.get(&credentials.backend) else {
            tracing::warn!(
                backend = %credentials.backend,
                "login rejected: no such auth backend"
            );
            return Err(AuthError::BadCredentials);
        };

        let verified = match tokio::time::timeout(self.backend_timeout, backend.verify(credentials))
            .await
        {
            Ok(Ok(verified)) => verified,
            Ok(Err(err)) => {
                tracing::warn!(
                    backend = %credentials.backend,
                    layer = err.layer(),
                    "login rejected by backend"
                );
                return Err(AuthError::BadCredentials);
            }
            Err(_elapsed) => {
                tracing::warn!(
                    backend = %credentials.backend,
                    timeout_ms = self.backend_timeout.as_millis() as u64,
                    "login failed: auth backend timed out"
                );
                return Err(AuthError::BadCredentials);
            }
        };

        let token = self
            .store
            .create(verified.identity, verified.granted, self.token_ttl);
        let session = self.store.validate(&token)?;
        tracing::debug!(
            user = %session.identity().user(),
            backend = %session.identity().backend(),
            grants = session.granted().len(),
            "login succeeded"
        );
        Ok(session)
    }

    /// Resolves a request's auth source to a live session.
    ///
    /// - `Token` delegates to the store — an empty token is an
    ///   authentication attempt that fails, never a credential fallback
    /// - `Credentials` performs an implicit login
    /// - `None` is denied
    pub async fn authenticate(&self, source: &AuthSource) -> Result<Session, AuthError> {
        match source {
            AuthSource::Token(token) => self.store.validate(token),
            AuthSource::Credentials(credentials) => self.login(credentials).await,
            AuthSource::None => Err(AuthError::InvalidToken),
        }
    }

    /// Destroys the session for a token.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidToken`] for an unknown (or already revoked)
    /// token.
    pub fn logout(&self, token: &Token) -> Result<(), AuthError> {
        self.store.revoke(token)?;
        tracing::debug!("session revoked by logout");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AutoAuth;
    use async_trait::async_trait;
    use lowgate_auth::{OpPattern, Verified};
    use lowgate_types::{ClientKind, Identity};

    fn resolver_with_auto() -> AuthResolver {
        let store = Arc::new(TokenStore::new());
        AuthResolver::new(store, chrono::Duration::hours(12), Duration::from_millis(200))
            .with_backend(
                "auto",
                Arc::new(AutoAuth::new(vec![OpPattern::new(ClientKind::Local, "test.*")])),
            )
    }

    #[tokio::test]
    async fn login_mints_a_validatable_session() {
        let resolver = resolver_with_auto();
        let session = resolver
            .login(&Credentials::new("saltdev", "saltdev", "auto"))
            .await
            .unwrap();

        let validated = resolver.store().validate(session.token()).unwrap();
        assert_eq!(validated, session);
    }

    #[tokio::test]
    async fn unknown_backend_is_bad_credentials() {
        let resolver = resolver_with_auto();
        let err = resolver
            .login(&Credentials::new("saltdev", "saltdev", "ldap"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::BadCredentials);
    }

    #[tokio::test]
    async fn backend_denial_is_bad_credentials() {
        let resolver = resolver_with_auto();
        let err = resolver
            .login(&Credentials::new("", "", "auto"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::BadCredentials);
    }

    #[tokio::test]
    async fn hung_backend_times_out_as_bad_credentials() {
        struct HungBackend;

        #[async_trait]
        impl lowgate_auth::ExternalAuth for HungBackend {
            async fn verify(&self, _credentials: &Credentials) -> Result<Verified, AuthError> {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Verified {
                    identity: Identity::new("ghost", "hung"),
                    granted: vec![],
                })
            }
        }

        let store = Arc::new(TokenStore::new());
        let resolver = AuthResolver::new(store, chrono::Duration::hours(1), Duration::from_millis(20))
            .with_backend("hung", Arc::new(HungBackend));

        let err = resolver
            .login(&Credentials::new("user", "pw", "hung"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::BadCredentials);
        // Nothing was stored for the failed login.
        assert!(resolver.store().is_empty());
    }

    #[tokio::test]
    async fn repeated_logins_do_not_grow_grants() {
        let resolver = resolver_with_auto();
        let creds = Credentials::new("saltdev", "saltdev", "auto");

        let first = resolver.login(&creds).await.unwrap();
        let baseline = first.granted().to_vec();

        for _ in 0..4 {
            let session = resolver.login(&creds).await.unwrap();
            assert_eq!(session.granted(), baseline.as_slice());
        }
    }

    #[tokio::test]
    async fn authenticate_token_source() {
        let resolver = resolver_with_auto();
        let session = resolver
            .login(&Credentials::new("saltdev", "saltdev", "auto"))
            .await
            .unwrap();

        let via_token = resolver
            .authenticate(&AuthSource::Token(session.token().clone()))
            .await
            .unwrap();
        assert_eq!(via_token, session);
    }

    #[tokio::test]
    async fn authenticate_empty_token_fails_without_fallback() {
        let resolver = resolver_with_auto();
        let err = resolver
            .authenticate(&AuthSource::Token(Token::new("")))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::InvalidToken);
    }

    #[tokio::test]
    async fn authenticate_credentials_source_logs_in() {
        let resolver = resolver_with_auto();
        let session = resolver
            .authenticate(&AuthSource::Credentials(Credentials::new(
                "saltdev", "saltdev", "auto",
            )))
            .await
            .unwrap();
        assert_eq!(session.identity().user(), "saltdev");
    }

    #[tokio::test]
    async fn authenticate_none_is_denied() {
        let resolver = resolver_with_auto();
        assert_eq!(
            resolver.authenticate(&AuthSource::None).await.unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[tokio::test]
    async fn logout_then_validate_fails() {
        let resolver = resolver_with_auto();
        let session = resolver
            .login(&Credentials::new("saltdev", "saltdev", "auto"))
            .await
            .unwrap();

        resolver.logout(session.token()).unwrap();
        assert!(resolver.store().validate(session.token()).is_err());
        // Second logout is an error, not a no-op.
        assert!(resolver.logout(session.token()).is_err());
    }
}
