//! lowgate gateway — the runtime layer.
//!
//! This crate turns the permission primitives from `lowgate-auth` into a
//! working gateway: a concurrent token store, a login/validate
//! orchestrator, a bounded job cache, and the per-request dispatch state
//! machine that ties them together.
//!
//! # Crate Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Transport (external)                     │
//! │   HTTP routing, body decoding — not this crate's problem  │
//! └──────────────────────────────────────────────────────────┘
//!                            ↓ DispatchRequest
//! ┌──────────────────────────────────────────────────────────┐
//! │              DispatchGateway  (gateway.rs)                │
//! │   Received → Authenticating → Authorizing → Dispatched    │
//! ├──────────────────────────────────────────────────────────┤
//! │  AuthResolver (resolver.rs)   PermissionModel (pure)      │
//! │       │                                                   │
//! │  TokenStore (token_store.rs)  JobCache (job_cache.rs)     │
//! └──────────────────────────────────────────────────────────┘
//!          ↓ ExternalAuth                ↓ ExecutionBackend
//! ┌────────────────────┐      ┌──────────────────────────────┐
//! │  auth backends      │      │  execution backend            │
//! │  (backends.rs)      │      │  (executor.rs)                │
//! └────────────────────┘      └──────────────────────────────┘
//! ```
//!
//! # Concurrency Contract
//!
//! The token store and job cache are shared mutable state behind
//! `parking_lot::RwLock`. Guards are scoped tightly and never held
//! across an `.await` — dispatch records a job, releases the lock, then
//! waits on the backend, and only re-locks to write the result.
//!
//! # Modules
//!
//! - [`config`]: [`GatewayConfig`], per-category bypass policy
//! - [`token_store`]: [`TokenStore`] — token lifecycle
//! - [`resolver`]: [`AuthResolver`] — login / authenticate / logout
//! - [`job_cache`]: [`JobCache`], [`Job`], [`JobStatus`]
//! - [`executor`]: [`ExecutionBackend`] trait and [`EchoExecutor`]
//! - [`backends`]: built-in [`ExternalAuth`](lowgate_auth::ExternalAuth) impls
//! - [`gateway`]: [`DispatchGateway`] — the entry point

pub mod backends;
pub mod config;
pub mod executor;
pub mod gateway;
pub mod job_cache;
pub mod resolver;
pub mod token_store;

pub use backends::{AutoAuth, StaticAuth};
pub use config::{CategoryPolicy, GatewayConfig};
pub use executor::{EchoExecutor, ExecError, ExecHandle, ExecPoll, ExecutionBackend};
pub use gateway::{DispatchGateway, DispatchRequest, DispatchResponse, GatewayError, LoginResponse};
pub use job_cache::{Job, JobCache, JobError, JobFilter, JobStatus};
pub use resolver::AuthResolver;
pub use token_store::TokenStore;
