//! Session: a token bound to an identity and a fixed grant set.
//!
//! A [`Session`] is created once at login and never mutated. The grant
//! set is whatever the external backend returned for the identity at
//! that moment — it does not grow on later calls, and repeated logins
//! by the same unchanged identity produce sessions with identical grant
//! sets (the anti-leak invariant).

use crate::OpPattern;
use chrono::{DateTime, Duration, Utc};
use lowgate_types::{Identity, Token};
use serde::{Deserialize, Serialize};

/// Server-held record binding a token to an identity and its grants.
///
/// # Immutability
///
/// Sessions have no mutating methods. Expiry is a property of the
/// stored `expires_at` instant, checked against a caller-supplied
/// `now` — the session itself never changes.
///
/// # Why No Default?
///
/// A session requires a real token and a verified identity. There is
/// no sensible default; always construct through [`Session::new`]
/// (in practice, through the gateway's token store).
///
/// # Example
///
/// ```
/// use chrono::{Duration, Utc};
/// use lowgate_auth::{OpPattern, Session};
/// use lowgate_types::{ClientKind, Identity, Token};
///
/// let session = Session::new(
///     Token::new("abc"),
///     Identity::new("saltdev", "auto"),
///     vec![OpPattern::new(ClientKind::Local, "test.*")],
///     Duration::hours(12),
/// );
///
/// assert!(!session.is_expired(Utc::now()));
/// assert_eq!(session.granted().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// The token this session answers to.
    token: Token,
    /// Verified identity that logged in.
    identity: Identity,
    /// Grant set computed at login; immutable for the session lifetime.
    granted: Vec<OpPattern>,
    /// When the session was created.
    created_at: DateTime<Utc>,
    /// When the session stops validating.
    expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session expiring `ttl` from now.
    #[must_use]
    pub fn new(token: Token, identity: Identity, granted: Vec<OpPattern>, ttl: Duration) -> Self {
        let created_at = Utc::now();
        Self {
            token,
            identity,
            granted,
            created_at,
            expires_at: created_at + ttl,
        }
    }

    /// The session's token.
    #[must_use]
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// The identity that owns the session.
    #[must_use]
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The grant set fixed at login.
    #[must_use]
    pub fn granted(&self) -> &[OpPattern] {
        &self.granted
    }

    /// Creation instant.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Expiry instant.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns `true` if the session is expired at `now`.
    ///
    /// Expiry is monotonic: once this returns `true` for some `now`, it
    /// returns `true` for every later instant.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}
