//! The dispatch gateway: authenticate, authorize, execute, record.
//!
//! [`DispatchGateway`] is the top-level entry point. Each request walks
//! a fixed state machine:
//!
//! ```text
//! Received ──► Authenticating ──► Authorizing ──► Dispatched ──► Completed
//!                   │                  │               │
//!                   ▼                  ▼               ▼
//!                Rejected           Rejected         Failed
//! ```
//!
//! Terminal states are final — a retry is a new request with a fresh
//! job id.
//!
//! # Uniform Rejection
//!
//! Bad token, bad credentials, and insufficient permission all surface
//! as the same [`GatewayError::Unauthorized`] with no detail. Which one
//! actually happened is visible only in the gateway's `tracing` output.
//!
//! # Auth Bypass
//!
//! A category configured with `requires_auth = false` skips
//! authentication: the request proceeds under a synthetic anonymous
//! identity that is fully permitted for that request. Bypass is decided
//! once per request from configuration alone — a missing or malformed
//! auth source on a protected category is a rejection, never a bypass.
//!
//! # Locks and Waits
//!
//! The gateway records the job, drops every lock, and only then awaits
//! the execution backend. A caller that disconnects mid-dispatch does
//! not cancel the job; it runs to its terminal state and stays
//! queryable.

use crate::{
    config::GatewayConfig,
    executor::{ExecError, ExecPoll, ExecutionBackend},
    job_cache::{Job, JobCache, JobError, JobFilter},
    resolver::AuthResolver,
};
use chrono::{DateTime, Utc};
use lowgate_auth::{Decision, OpPattern, PermissionModel, Session};
use lowgate_types::{ClientKind, Credentials, Identity, JobId, LowStateCommand, Token};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Runner functions gating the job-query surface.
///
/// Reading job history is itself an operation: a session needs a grant
/// covering these to call [`DispatchGateway::get_job`] /
/// [`DispatchGateway::list_jobs`].
pub const FN_JOB_LOOKUP: &str = "jobs.lookup_jid";
/// See [`FN_JOB_LOOKUP`].
pub const FN_JOB_LIST: &str = "jobs.list_jobs";

/// Interval between polls of an asynchronously submitted command.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Caller-visible gateway error.
///
/// Deliberately coarse: the unauthorized variant is constant-shape so
/// responses cannot be used to probe which identities, tokens, or
/// permissions exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Authentication or authorization failed. No further detail.
    #[error("unauthorized")]
    Unauthorized,

    /// The queried job does not exist (or was evicted).
    #[error("job not found")]
    JobNotFound,

    /// The execution backend failed or timed out.
    #[error("execution failed: {0}")]
    Execution(String),
}

/// One request to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchRequest {
    /// Operation category, matched against per-category policy
    /// ("run", "webhook", ...).
    pub category: String,
    /// The operation to perform.
    pub command: LowStateCommand,
}

impl DispatchRequest {
    /// Creates a request in the named category.
    #[must_use]
    pub fn new(category: impl Into<String>, command: LowStateCommand) -> Self {
        Self {
            category: category.into(),
            command,
        }
    }
}

/// Successful dispatch outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResponse {
    /// The recorded job.
    pub job_id: JobId,
    /// Result payload; `None` for async clients (poll the job instead).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<serde_json::Value>,
}

/// Successful login outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub token: Token,
    /// The grant set bound to the session.
    pub perms: Vec<OpPattern>,
    /// When the token stops validating.
    pub expires_at: DateTime<Utc>,
}

/// Top-level gateway tying resolver, permission model, job cache, and
/// execution backend together.
///
/// Construct one at startup with its collaborators injected; share via
/// `Arc`. There are no ambient globals anywhere in the stack.
///
/// # Example
///
/// ```
/// use lowgate_auth::OpPattern;
/// use lowgate_gateway::{
///     AuthResolver, AutoAuth, DispatchGateway, DispatchRequest, EchoExecutor, GatewayConfig,
///     TokenStore,
/// };
/// use lowgate_types::{ClientKind, Credentials, LowStateCommand};
/// use std::sync::Arc;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let config = GatewayConfig::default();
/// let store = Arc::new(TokenStore::new());
/// let resolver = AuthResolver::new(store, config.token_ttl(), config.auth_timeout())
///     .with_backend("auto", Arc::new(AutoAuth::new(vec![
///         OpPattern::new(ClientKind::Local, "test.*"),
///     ])));
/// let gateway = DispatchGateway::new(config, resolver, Arc::new(EchoExecutor::new()));
///
/// let login = gateway.login(&Credentials::new("saltdev", "saltdev", "auto")).await.unwrap();
/// let cmd = LowStateCommand::new(ClientKind::Local, "test.ping")
///     .with_target("*")
///     .with_token(login.token.clone());
/// let response = gateway.dispatch(DispatchRequest::new("run", cmd)).await.unwrap();
/// assert!(response.result.is_some());
/// # });
/// ```
pub struct DispatchGateway {
    config: GatewayConfig,
    resolver: AuthResolver,
    model: PermissionModel,
    jobs: Arc<JobCache>,
    executor: Arc<dyn ExecutionBackend>,
}

impl DispatchGateway {
    /// Creates a gateway; the job cache is sized from the config.
    #[must_use]
    pub fn new(
        config: GatewayConfig,
        resolver: AuthResolver,
        executor: Arc<dyn ExecutionBackend>,
    ) -> Self {
        let jobs = Arc::new(JobCache::new(config.job_capacity));
        Self {
            config,
            resolver,
            model: PermissionModel,
            jobs,
            executor,
        }
    }

    /// The job cache (for embedding applications and tests).
    #[must_use]
    pub fn jobs(&self) -> &Arc<JobCache> {
        &self.jobs
    }

    /// The auth resolver.
    #[must_use]
    pub fn resolver(&self) -> &AuthResolver {
        &self.resolver
    }

    /// Explicit login: verify credentials, mint a session.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Unauthorized`] on any failure.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, GatewayError> {
        let session = self
            .resolver
            .login(credentials)
            .await
            .map_err(|_| GatewayError::Unauthorized)?;
        Ok(LoginResponse {
            token: session.token().clone(),
            perms: session.granted().to_vec(),
            expires_at: session.expires_at(),
        })
    }

    /// Destroys the session for a token.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Unauthorized`] for an unknown token.
    pub fn logout(&self, token: &Token) -> Result<(), GatewayError> {
        self.resolver
            .logout(token)
            .map_err(|_| GatewayError::Unauthorized)
    }

    /// Runs one request through the full state machine.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Unauthorized`] from the authenticating or
    ///   authorizing states (indistinguishable by design)
    /// - [`GatewayError::Execution`] when the backend fails or times
    ///   out; the job record is marked `Failed`, never left pending
    pub async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchResponse, GatewayError> {
        // Received → Authenticating
        let session = self.authenticate_request(&request).await?;

        // Authenticating → Authorizing
        let decision = self.model.authorize(session.granted(), &request.command);
        match decision {
            Decision::Allow => {
                tracing::debug!(
                    user = %session.identity().user(),
                    function = %request.command.function,
                    client = %request.command.client,
                    "dispatch authorized"
                );
            }
            Decision::Deny => {
                tracing::warn!(
                    user = %session.identity().user(),
                    function = %request.command.function,
                    client = %request.command.client,
                    "dispatch denied: no matching grant"
                );
                return Err(GatewayError::Unauthorized);
            }
        }

        // Authorizing → Dispatched. The job is recorded (and the store
        // lock released) before any backend await.
        let job = self.jobs.submit(&request.command, session.identity().clone());

        if request.command.client.is_async() {
            self.dispatch_async(job.id, &request.command).await
        } else {
            self.dispatch_sync(job.id, &request.command).await
        }
    }

    /// Fetches one job. Requires a session with a grant covering
    /// [`FN_JOB_LOOKUP`].
    pub async fn get_job(
        &self,
        auth: &lowgate_types::AuthSource,
        id: &JobId,
    ) -> Result<Job, GatewayError> {
        self.authorize_job_query(auth, FN_JOB_LOOKUP).await?;
        self.jobs.get(id).map_err(|err| match err {
            JobError::UnknownJob(_) => GatewayError::JobNotFound,
            other => GatewayError::Execution(other.to_string()),
        })
    }

    /// Lists jobs in submission order. Requires a session with a grant
    /// covering [`FN_JOB_LIST`].
    pub async fn list_jobs(
        &self,
        auth: &lowgate_types::AuthSource,
        filter: Option<&JobFilter>,
    ) -> Result<Vec<Job>, GatewayError> {
        self.authorize_job_query(auth, FN_JOB_LIST).await?;
        Ok(self.jobs.list(filter))
    }

    /// Resolves the session for a request, honoring category bypass.
    async fn authenticate_request(&self, request: &DispatchRequest) -> Result<Session, GatewayError> {
        let policy = self.config.category(&request.category);
        if !policy.requires_auth {
            tracing::debug!(category = %request.category, "auth bypassed by category policy");
            return Ok(Self::anonymous_session(&request.category, self.config.token_ttl()));
        }
        self.resolver
            .authenticate(&request.command.auth)
            .await
            .map_err(|err| {
                tracing::warn!(
                    category = %request.category,
                    layer = err.layer(),
                    "request rejected during authentication"
                );
                GatewayError::Unauthorized
            })
    }

    /// Synthetic session for a bypassed category: anonymous, fully
    /// permitted for the single request it authenticates.
    fn anonymous_session(category: &str, ttl: chrono::Duration) -> Session {
        Session::new(
            Token::new(""),
            Identity::acting_for("anonymous", "bypass", category),
            vec![
                OpPattern::allow_all(ClientKind::Local),
                OpPattern::allow_all(ClientKind::Runner),
                OpPattern::allow_all(ClientKind::Wheel),
            ],
            ttl,
        )
    }

    /// Authenticates and authorizes a job-query call.
    async fn authorize_job_query(
        &self,
        auth: &lowgate_types::AuthSource,
        function: &str,
    ) -> Result<Session, GatewayError> {
        let session = self
            .resolver
            .authenticate(auth)
            .await
            .map_err(|_| GatewayError::Unauthorized)?;

        let probe = LowStateCommand::new(ClientKind::Runner, function);
        if !self.model.authorize(session.granted(), &probe).is_allow() {
            tracing::warn!(
                user = %session.identity().user(),
                function,
                "job query denied: no matching grant"
            );
            return Err(GatewayError::Unauthorized);
        }
        Ok(session)
    }

    /// Synchronous path: wait (bounded) for the result.
    async fn dispatch_sync(
        &self,
        job_id: JobId,
        command: &LowStateCommand,
    ) -> Result<DispatchResponse, GatewayError> {
        self.record(job_id, self.jobs.start(&job_id));

        match tokio::time::timeout(self.config.exec_timeout(), self.executor.run(command)).await {
            Ok(Ok(result)) => {
                self.record(job_id, self.jobs.complete(&job_id, result.clone()));
                Ok(DispatchResponse {
                    job_id,
                    result: Some(result),
                })
            }
            Ok(Err(err)) => {
                let summary = err.to_string();
                self.record(job_id, self.jobs.fail(&job_id, summary.clone()));
                Err(GatewayError::Execution(summary))
            }
            Err(_elapsed) => {
                let summary = "execution timed out".to_string();
                tracing::warn!(job = %job_id, "execution backend exceeded its bound");
                self.record(job_id, self.jobs.fail(&job_id, summary.clone()));
                Err(GatewayError::Execution(summary))
            }
        }
    }

    /// Asynchronous path: submit, then poll from a background task.
    async fn dispatch_async(
        &self,
        job_id: JobId,
        command: &LowStateCommand,
    ) -> Result<DispatchResponse, GatewayError> {
        let handle = match tokio::time::timeout(
            self.config.exec_timeout(),
            self.executor.submit(command),
        )
        .await
        {
            Ok(Ok(handle)) => handle,
            Ok(Err(err)) => {
                let summary = err.to_string();
                self.record(job_id, self.jobs.fail(&job_id, summary.clone()));
                return Err(GatewayError::Execution(summary));
            }
            Err(_elapsed) => {
                let summary = "execution timed out".to_string();
                self.record(job_id, self.jobs.fail(&job_id, summary.clone()));
                return Err(GatewayError::Execution(summary));
            }
        };

        self.record(job_id, self.jobs.start(&job_id));

        // The caller gets the job id now; the result lands in the cache
        // whenever the backend produces it. Caller disconnect does not
        // cancel this task.
        let jobs = Arc::clone(&self.jobs);
        let executor = Arc::clone(&self.executor);
        let deadline = tokio::time::Instant::now() + self.config.exec_timeout();
        tokio::spawn(async move {
            loop {
                match executor.poll(&handle).await {
                    Ok(ExecPoll::Ready(result)) => {
                        if let Err(err) = jobs.complete(&job_id, result) {
                            tracing::debug!(job = %job_id, %err, "late completion dropped");
                        }
                        break;
                    }
                    Ok(ExecPoll::Pending) => {
                        if tokio::time::Instant::now() >= deadline {
                            if let Err(err) = jobs.fail(&job_id, "execution timed out") {
                                tracing::debug!(job = %job_id, %err, "late timeout dropped");
                            }
                            break;
                        }
                        tokio::time::sleep(POLL_INTERVAL).await;
                    }
                    Err(ExecError::UnknownHandle) => {
                        // Backend forgot the handle; nothing more will come.
                        if let Err(err) = jobs.fail(&job_id, "execution handle lost") {
                            tracing::debug!(job = %job_id, %err, "late failure dropped");
                        }
                        break;
                    }
                    Err(err) => {
                        if let Err(err) = jobs.fail(&job_id, err.to_string()) {
                            tracing::debug!(job = %job_id, %err, "late failure dropped");
                        }
                        break;
                    }
                }
            }
        });

        Ok(DispatchResponse {
            job_id,
            result: None,
        })
    }

    /// Logs (rather than propagates) cache updates on evicted jobs.
    fn record(&self, job_id: JobId, outcome: Result<(), JobError>) {
        if let Err(err) = outcome {
            tracing::debug!(job = %job_id, %err, "job cache update skipped");
        }
    }
}
