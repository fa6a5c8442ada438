//! Permission primitives for lowgate.
//!
//! This crate defines the permission model shared by the gateway: what a
//! grant looks like, how a session binds a token to an identity and a
//! fixed grant set, and the capability trait external auth backends
//! implement.
//!
//! # Permission Model
//!
//! ```text
//! Authorized = ∃ grant ∈ session.granted : grant matches command
//! ```
//!
//! | Piece | Type | Decides |
//! |-------|------|---------|
//! | [`OpPattern`] | Data | Which (client, function, target) tuples a grant covers |
//! | [`PermissionModel`] | Pure logic | allow/deny for one command against one grant set |
//! | [`Session`] | Data | Who holds the grants, until when |
//! | [`ExternalAuth`] | Trait | Where grants come from at login time |
//!
//! # Crate Architecture
//!
//! ```text
//! lowgate-types  (Identity, LowStateCommand)
//!     ↑
//! lowgate-auth   (OpPattern, PermissionModel, Session, ExternalAuth)  ◄── THIS CRATE
//!     ↑
//! lowgate-gateway  (TokenStore, AuthResolver, DispatchGateway — the impls)
//! ```
//!
//! # Design Principles
//!
//! - **Trait definitions here, implementations in consumers** — concrete
//!   auth backends live in `lowgate-gateway`
//! - **Deny wins** — no matching grant means deny, never an error
//! - **Grants are fixed at login** — a session's grant set is computed
//!   once by the backend and is immutable for the session's lifetime

pub mod backend;
pub mod error;
pub mod model;
pub mod pattern;
pub mod session;

pub use backend::{ExternalAuth, Verified};
pub use error::AuthError;
pub use model::{Decision, PermissionModel};
pub use pattern::{ArgConstraint, OpPattern};
pub use session::Session;

// Re-export the types this crate's API is written in terms of.
pub use lowgate_types::{AuthSource, ClientKind, Credentials, Identity, LowStateCommand, Token};
