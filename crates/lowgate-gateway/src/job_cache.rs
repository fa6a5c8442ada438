//! Bounded, append-only job cache.
//!
//! Every accepted dispatch becomes a [`Job`] here, from submission until
//! capacity eviction. Jobs are append-only: the record is created once,
//! its status walks a one-way state machine, and nothing else mutates.
//!
//! # Status State Machine
//!
//! ```text
//! Pending ──► Running ──► Complete
//!    │           │
//!    └───────────┴──────► Failed
//! ```
//!
//! Terminal states are final — an update on a completed or failed job is
//! rejected, never silently applied.
//!
//! # Retention
//!
//! FIFO by submission: once the configured capacity is exceeded, the
//! oldest job is evicted. Eviction happens under the same lock as
//! submission, so an in-flight `get` or `update` on a surviving job is
//! never disturbed.

use chrono::{DateTime, Utc};
use lowgate_types::{Identity, JobId, LowStateCommand};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;

/// Lifecycle state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Accepted, not yet handed to the backend.
    Pending,
    /// Handed to the backend, awaiting a result.
    Running,
    /// Finished with a result.
    Complete,
    /// Finished with an error (including timeouts).
    Failed,
}

impl JobStatus {
    /// Returns `true` for [`Complete`](Self::Complete) and
    /// [`Failed`](Self::Failed).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }

    /// Whether the state machine permits `self → next`.
    ///
    /// A job may jump straight from `Pending` to a terminal state (a
    /// backend that answers before anyone observes `Running`), but
    /// nothing leaves a terminal state.
    #[must_use]
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        match self {
            Self::Pending => matches!(next, Self::Running | Self::Complete | Self::Failed),
            Self::Running => matches!(next, Self::Complete | Self::Failed),
            Self::Complete | Self::Failed => false,
        }
    }

    /// Status name for structured logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }
}

/// The tracked record of one dispatched command.
///
/// The cached command copy is redacted — it carries no token and no
/// credentials, only the operation that was run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Unique job identifier.
    pub id: JobId,
    /// Identity that submitted the command.
    pub submitted_by: Identity,
    /// The command, with auth material stripped.
    pub command: LowStateCommand,
    /// Submission instant.
    pub submitted_at: DateTime<Utc>,
    /// Current lifecycle state.
    pub status: JobStatus,
    /// Result payload, present once complete.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub result: Option<serde_json::Value>,
    /// Opaque error summary, present once failed.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<String>,
}

/// Error from job cache operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// No job with this id — never existed, or already evicted.
    #[error("unknown job: {0}")]
    UnknownJob(JobId),

    /// The status state machine forbids the requested transition.
    #[error("job {id}: illegal transition {from} -> {to}")]
    InvalidTransition {
        /// Job the update targeted.
        id: JobId,
        /// Status the job is in.
        from: &'static str,
        /// Status the update asked for.
        to: &'static str,
    },
}

/// Filter for [`JobCache::list`]. Empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobFilter {
    /// Keep jobs whose function name contains this substring.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub function_contains: Option<String>,
    /// Keep jobs in this status.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<JobStatus>,
    /// Keep jobs submitted by this user.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub submitted_by: Option<String>,
}

impl JobFilter {
    fn matches(&self, job: &Job) -> bool {
        if let Some(fragment) = &self.function_contains {
            if !job.command.function.contains(fragment.as_str()) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if job.status != status {
                return false;
            }
        }
        if let Some(user) = &self.submitted_by {
            if job.submitted_by.user() != user {
                return false;
            }
        }
        true
    }
}

struct Inner {
    jobs: HashMap<JobId, Job>,
    /// Submission order, oldest first. Drives both eviction and listing.
    order: VecDeque<JobId>,
}

/// Concurrent, capacity-bounded store of job records.
///
/// # Example
///
/// ```
/// use lowgate_gateway::{JobCache, JobStatus};
/// use lowgate_types::{ClientKind, Identity, LowStateCommand};
///
/// let cache = JobCache::new(128);
/// let cmd = LowStateCommand::new(ClientKind::Local, "test.ping").with_target("*");
/// let job = cache.submit(&cmd, Identity::new("alice", "auto"));
///
/// cache.update(&job.id, JobStatus::Complete, Some(serde_json::json!({"m1": true}))).unwrap();
/// assert_eq!(cache.get(&job.id).unwrap().status, JobStatus::Complete);
/// ```
pub struct JobCache {
    inner: RwLock<Inner>,
    capacity: usize,
}

impl JobCache {
    /// Creates a cache retaining at most `capacity` jobs.
    ///
    /// A zero capacity is clamped to one — a gateway that can hold no
    /// job at all cannot answer any dispatch.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Inner {
                jobs: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
        }
    }

    /// Records a new `Pending` job for a command.
    ///
    /// The stored command copy is redacted. If the cache is at
    /// capacity, the oldest job is evicted in the same critical
    /// section.
    pub fn submit(&self, command: &LowStateCommand, submitted_by: Identity) -> Job {
        let job = Job {
            id: JobId::new(),
            submitted_by,
            command: command.redacted(),
            submitted_at: Utc::now(),
            status: JobStatus::Pending,
            result: None,
            error: None,
        };

        let mut inner = self.inner.write();
        while inner.order.len() >= self.capacity {
            if let Some(oldest) = inner.order.pop_front() {
                inner.jobs.remove(&oldest);
                tracing::debug!(job = %oldest, "job evicted by capacity bound");
            }
        }
        inner.order.push_back(job.id);
        inner.jobs.insert(job.id, job.clone());
        job
    }

    /// Applies a status transition, attaching a result payload.
    ///
    /// # Errors
    ///
    /// [`JobError::UnknownJob`] if the id is absent;
    /// [`JobError::InvalidTransition`] if the state machine forbids the
    /// move (in particular, any update on a terminal job).
    pub fn update(
        &self,
        id: &JobId,
        status: JobStatus,
        result: Option<serde_json::Value>,
    ) -> Result<(), JobError> {
        let mut inner = self.inner.write();
        let job = inner.jobs.get_mut(id).ok_or(JobError::UnknownJob(*id))?;
        if !job.status.can_transition_to(status) {
            return Err(JobError::InvalidTransition {
                id: *id,
                from: job.status.as_str(),
                to: status.as_str(),
            });
        }
        job.status = status;
        if result.is_some() {
            job.result = result;
        }
        Ok(())
    }

    /// Marks a job `Running`.
    pub fn start(&self, id: &JobId) -> Result<(), JobError> {
        self.update(id, JobStatus::Running, None)
    }

    /// Marks a job `Complete` with its result.
    pub fn complete(&self, id: &JobId, result: serde_json::Value) -> Result<(), JobError> {
        self.update(id, JobStatus::Complete, Some(result))
    }

    /// Marks a job `Failed` with an opaque error summary.
    pub fn fail(&self, id: &JobId, summary: impl Into<String>) -> Result<(), JobError> {
        let summary = summary.into();
        let mut inner = self.inner.write();
        let job = inner.jobs.get_mut(id).ok_or(JobError::UnknownJob(*id))?;
        if !job.status.can_transition_to(JobStatus::Failed) {
            return Err(JobError::InvalidTransition {
                id: *id,
                from: job.status.as_str(),
                to: JobStatus::Failed.as_str(),
            });
        }
        job.status = JobStatus::Failed;
        job.error = Some(summary);
        Ok(())
    }

    /// Fetches one job by id.
    ///
    /// # Errors
    ///
    /// [`JobError::UnknownJob`] for absent or evicted ids.
    pub fn get(&self, id: &JobId) -> Result<Job, JobError> {
        self.inner
            .read()
            .jobs
            .get(id)
            .cloned()
            .ok_or(JobError::UnknownJob(*id))
    }

    /// Lists jobs in submission order, oldest first.
    ///
    /// Every call re-reads current cache state — the returned `Vec` is
    /// the snapshot, the listing itself is restartable.
    #[must_use]
    pub fn list(&self, filter: Option<&JobFilter>) -> Vec<Job> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.jobs.get(id))
            .filter(|job| filter.map_or(true, |f| f.matches(job)))
            .cloned()
            .collect()
    }

    /// Number of retained jobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().order.len()
    }

    /// Returns `true` if no jobs are retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
