//! Process-wide session token store.
//!
//! [`TokenStore`] owns the session lifecycle: it mints tokens, maps
//! them to sessions, and destroys them on logout, expiry, or sweep.
//! It is the only component that gives a token value meaning.
//!
//! # Token Material
//!
//! Tokens are 32 random bytes from the operating system CSPRNG,
//! hex-encoded (256 bits of entropy — enumeration is infeasible).
//! The value carries no structure: lookups are exact, case-sensitive
//! string equality, so an empty token, a path-looking token, and a
//! truncated token are all just unknown keys.
//!
//! # Concurrency
//!
//! State lives behind one `parking_lot::RwLock`. Validation takes the
//! read lock; create/revoke/sweep take the write lock. A `validate`
//! racing a `revoke` on the same token observes either the pre- or
//! post-revoke map — the lock rules out torn reads.

use chrono::{Duration, Utc};
use lowgate_auth::{AuthError, OpPattern, Session};
use lowgate_types::{Identity, Token};
use parking_lot::RwLock;
use rand::rngs::OsRng;
use rand::RngCore;
use std::collections::HashMap;

/// Concurrent map from opaque token to session.
///
/// Construct one at startup and share it via `Arc`; the gateway and
/// resolver take it by reference, never through ambient globals.
///
/// # Example
///
/// ```
/// use chrono::{Duration, Utc};
/// use lowgate_gateway::TokenStore;
/// use lowgate_types::Identity;
///
/// let store = TokenStore::new();
/// let token = store.create(Identity::new("alice", "auto"), vec![], Duration::hours(12));
///
/// let session = store.validate(&token).unwrap();
/// assert_eq!(session.identity().user(), "alice");
///
/// store.revoke(&token).unwrap();
/// assert!(store.validate(&token).is_err());
/// ```
#[derive(Debug, Default)]
pub struct TokenStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl TokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a token and stores a session for it.
    ///
    /// The grant set is stored exactly as given — computed once by the
    /// caller at login time, immutable afterwards. Two concurrent
    /// `create` calls never collide on a token: insertion happens under
    /// the write lock and regenerates on the (cosmically unlikely)
    /// duplicate.
    pub fn create(&self, identity: Identity, granted: Vec<OpPattern>, ttl: Duration) -> Token {
        let mut sessions = self.sessions.write();
        let token = loop {
            let candidate = generate_token();
            if !sessions.contains_key(candidate.as_str()) {
                break candidate;
            }
        };
        let session = Session::new(token.clone(), identity, granted, ttl);
        sessions.insert(token.as_str().to_string(), session);
        token
    }

    /// Looks up a live session by token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] if the token is unknown or
    /// the session has expired. An expired session is evicted as a side
    /// effect, so expiry is monotonic: once invalid, forever invalid.
    pub fn validate(&self, token: &Token) -> Result<Session, AuthError> {
        let now = Utc::now();
        {
            let sessions = self.sessions.read();
            match sessions.get(token.as_str()) {
                Some(session) if !session.is_expired(now) => return Ok(session.clone()),
                Some(_) => {} // expired; evict below
                None => return Err(AuthError::InvalidToken),
            }
        }
        // Expired: take the write lock and evict. Re-check under the
        // lock in case a revoke got there first.
        let mut sessions = self.sessions.write();
        if let Some(session) = sessions.get(token.as_str()) {
            if session.is_expired(now) {
                sessions.remove(token.as_str());
                tracing::debug!(layer = "token", "expired session evicted on access");
            }
        }
        Err(AuthError::InvalidToken)
    }

    /// Destroys the session for a token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] if the token is unknown —
    /// including a token that was already revoked. Revocation is not
    /// idempotent by contract.
    pub fn revoke(&self, token: &Token) -> Result<(), AuthError> {
        let mut sessions = self.sessions.write();
        match sessions.remove(token.as_str()) {
            Some(_) => Ok(()),
            None => Err(AuthError::InvalidToken),
        }
    }

    /// Removes all expired sessions, returning how many were evicted.
    ///
    /// Safe to call from a background task; unrelated `validate` calls
    /// only contend for the duration of the map walk.
    pub fn sweep(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!(evicted, "token sweep evicted expired sessions");
        }
        evicted
    }

    /// Number of live (possibly expired, not yet swept) sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    /// Returns `true` if no sessions are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

/// 32 bytes from the OS CSPRNG, hex-encoded.
fn generate_token() -> Token {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    Token::new(hex::encode(bytes))
}
