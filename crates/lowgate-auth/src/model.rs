//! The permission decision: pure, deny-by-default.
//!
//! [`PermissionModel`] answers exactly one question: given a fixed grant
//! set and one command, is the command allowed? It holds no state and
//! performs no I/O — identical inputs always yield identical decisions,
//! independent of call order. That purity is what makes the anti-leak
//! invariant testable: repeated logins produce sessions whose grant sets
//! decide identically.
//!
//! # Architecture
//!
//! ```text
//! Session.granted: Vec<OpPattern>   (fixed at login)
//!          │
//!          ▼
//! PermissionModel::authorize(granted, command) -> Decision
//!          │
//!          ▼
//! DispatchGateway  (logs the decision, enforces it)
//! ```

use crate::OpPattern;
use lowgate_types::LowStateCommand;

/// Outcome of a permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// At least one grant covers the command.
    Allow,
    /// No grant covers the command. The default.
    Deny,
}

impl Decision {
    /// Returns `true` for [`Decision::Allow`].
    #[must_use]
    pub fn is_allow(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Returns the decision as a string for structured logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

/// Pure allow/deny evaluator.
///
/// A zero-sized strategy object: constructing it is free and sharing it
/// is trivial. It exists as a type (rather than a free function) so the
/// gateway can hold it as an injected collaborator and tests can swap
/// in nothing — there is deliberately no trait here, because there is
/// exactly one correct semantics.
///
/// # Example
///
/// ```
/// use lowgate_auth::{Decision, OpPattern, PermissionModel};
/// use lowgate_types::{ClientKind, LowStateCommand};
///
/// let model = PermissionModel;
/// let granted = vec![OpPattern::new(ClientKind::Local, "test.*")];
///
/// let ping = LowStateCommand::new(ClientKind::Local, "test.ping").with_target("*");
/// assert_eq!(model.authorize(&granted, &ping), Decision::Allow);
///
/// // Empty grant set denies everything.
/// assert_eq!(model.authorize(&[], &ping), Decision::Deny);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionModel;

impl PermissionModel {
    /// Decides whether `command` is covered by `granted`.
    ///
    /// Deny is the default: the absence of a matching grant is a
    /// decision, not an error.
    #[must_use]
    pub fn authorize(&self, granted: &[OpPattern], command: &LowStateCommand) -> Decision {
        if granted.iter().any(|grant| grant.matches(command)) {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}
