//! Core data types for the lowgate dispatch gateway.
//!
//! This crate is the leaf of the workspace dependency graph. It defines
//! the vocabulary shared by every other crate and contains no permission
//! logic, no storage, and no I/O.
//!
//! # Crate Architecture
//!
//! ```text
//! lowgate-types  (IDs, Identity, LowStateCommand)  ◄── THIS CRATE
//!     ↑
//! lowgate-auth  (OpPattern, PermissionModel, Session, ExternalAuth)
//!     ↑
//! lowgate-gateway  (TokenStore, AuthResolver, JobCache, DispatchGateway)
//! ```
//!
//! # Modules
//!
//! - [`id`]: [`JobId`] and the opaque session [`Token`]
//! - [`identity`]: [`Identity`] (verified principal) and raw [`Credentials`]
//! - [`command`]: [`LowStateCommand`], [`ClientKind`], [`AuthSource`]
//!
//! # Design Principles
//!
//! - **Identity is not permission** — `Identity` says who acted;
//!   what they may do lives in `lowgate-auth` grants
//! - **Secrets never Debug** — `Token` and `Credentials` redact their
//!   sensitive fields in `Debug` output
//! - **Explicit auth source** — a request carries a tagged
//!   [`AuthSource`], never an ambiguous bag of optional fields

pub mod command;
pub mod id;
pub mod identity;

pub use command::{AuthSource, ClientKind, LowStateCommand};
pub use id::{JobId, Token};
pub use identity::{Credentials, Identity};
