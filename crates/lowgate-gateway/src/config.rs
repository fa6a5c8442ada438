//! Gateway configuration.
//!
//! Constructed once at startup and passed by reference to the gateway —
//! never read from ambient globals. Persistence of configuration is the
//! embedding application's concern; this is the in-memory shape only.
//!
//! # Defaults
//!
//! | Setting | Default |
//! |---------|---------|
//! | Token TTL | 12 hours |
//! | Auth backend timeout | 5 s |
//! | Execution timeout | 30 s |
//! | Job cache capacity | 1024 |
//! | Category auth | required everywhere |

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Per-operation-category policy.
///
/// Categories name coarse request classes at the gateway boundary
/// ("run", "webhook", ...). The only policy today is whether the
/// category requires authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPolicy {
    /// Whether requests in this category must authenticate.
    ///
    /// Off is an explicit, named opt-in. A missing or malformed auth
    /// source never flips this — bypass is decided by configuration
    /// alone, once per request.
    pub requires_auth: bool,
}

impl Default for CategoryPolicy {
    fn default() -> Self {
        Self {
            requires_auth: true,
        }
    }
}

/// Configuration for a [`DispatchGateway`](crate::DispatchGateway).
///
/// # Example
///
/// ```
/// use lowgate_gateway::GatewayConfig;
///
/// let config = GatewayConfig::default().with_open_category("webhook");
///
/// assert!(!config.category("webhook").requires_auth);
/// assert!(config.category("run").requires_auth);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Per-category policies. Unlisted categories require auth.
    #[serde(default)]
    pub categories: HashMap<String, CategoryPolicy>,
    /// Session token lifetime, in seconds.
    pub token_ttl_secs: u64,
    /// Bounded wait for external auth backend calls, in milliseconds.
    pub auth_timeout_ms: u64,
    /// Bounded wait for execution backend calls, in milliseconds.
    pub exec_timeout_ms: u64,
    /// Maximum number of retained job records.
    pub job_capacity: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            categories: HashMap::new(),
            token_ttl_secs: 12 * 60 * 60,
            auth_timeout_ms: 5_000,
            exec_timeout_ms: 30_000,
            job_capacity: 1024,
        }
    }
}

impl GatewayConfig {
    /// Returns the policy for a category (auth required if unlisted).
    #[must_use]
    pub fn category(&self, name: &str) -> CategoryPolicy {
        self.categories.get(name).copied().unwrap_or_default()
    }

    /// Marks a category as not requiring authentication.
    #[must_use]
    pub fn with_open_category(mut self, name: impl Into<String>) -> Self {
        self.categories.insert(
            name.into(),
            CategoryPolicy {
                requires_auth: false,
            },
        );
        self
    }

    /// Sets the session token lifetime.
    #[must_use]
    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl_secs = ttl.as_secs();
        self
    }

    /// Sets the job cache capacity.
    #[must_use]
    pub fn with_job_capacity(mut self, capacity: usize) -> Self {
        self.job_capacity = capacity;
        self
    }

    /// Token TTL as a [`chrono::Duration`].
    ///
    /// Values beyond the representable range saturate to the maximum
    /// duration; a configured TTL can never come out negative.
    #[must_use]
    pub fn token_ttl(&self) -> chrono::Duration {
        i64::try_from(self.token_ttl_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or(chrono::Duration::MAX)
    }

    /// Auth backend timeout as a [`Duration`].
    #[must_use]
    pub fn auth_timeout(&self) -> Duration {
        Duration::from_millis(self.auth_timeout_ms)
    }

    /// Execution backend timeout as a [`Duration`].
    #[must_use]
    pub fn exec_timeout(&self) -> Duration {
        Duration::from_millis(self.exec_timeout_ms)
    }
}
