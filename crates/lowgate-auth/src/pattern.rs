//! Operation patterns: the unit of permission grant.
//!
//! An [`OpPattern`] describes a set of commands an identity may invoke:
//! a client family, a function-name glob, an optional target glob, and
//! optional argument constraints. A session's grant set is a list of
//! these, fixed at login time.
//!
//! # Matching Rules
//!
//! - Client kinds match by *family*: a grant written for `local` also
//!   authorizes `local_async`
//! - Function and target matching is glob-based ([`glob::Pattern`]),
//!   case-sensitive, and anchored on the full name — `test.*` matches
//!   `test.ping` but `test` alone matches nothing else
//! - An invalid glob in a grant never matches anything (deny, not
//!   wildcard)

use lowgate_types::{ClientKind, LowStateCommand};
use serde::{Deserialize, Serialize};

/// Constraint on a command argument.
///
/// String values are matched as globs; non-string values must equal the
/// constraint's pattern when rendered as JSON. A missing argument never
/// satisfies a constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ArgConstraint {
    /// Constrains a positional argument by index.
    Positional {
        /// Zero-based argument index.
        index: usize,
        /// Glob pattern the value must match.
        pattern: String,
    },
    /// Constrains a keyword argument by name.
    Keyword {
        /// Keyword argument name.
        key: String,
        /// Glob pattern the value must match.
        pattern: String,
    },
}

impl ArgConstraint {
    /// Returns `true` if the command's argument satisfies the constraint.
    fn is_satisfied(&self, command: &LowStateCommand) -> bool {
        let (value, pattern) = match self {
            Self::Positional { index, pattern } => (command.args.get(*index), pattern.as_str()),
            Self::Keyword { key, pattern } => (command.kwargs.get(key), pattern.as_str()),
        };
        match value {
            Some(serde_json::Value::String(s)) => glob_match(pattern, s),
            Some(other) => other.to_string() == pattern,
            None => false,
        }
    }
}

/// A single permission grant.
///
/// # Example
///
/// ```
/// use lowgate_auth::OpPattern;
/// use lowgate_types::{ClientKind, LowStateCommand};
///
/// let grant = OpPattern::new(ClientKind::Local, "test.*").with_target("web-*");
///
/// let ping = LowStateCommand::new(ClientKind::Local, "test.ping").with_target("web-01");
/// assert!(grant.matches(&ping));
///
/// let other = LowStateCommand::new(ClientKind::Local, "test.ping").with_target("db-01");
/// assert!(!grant.matches(&other));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpPattern {
    /// Client family this grant covers.
    client: ClientKind,
    /// Function-name glob.
    function: String,
    /// Target glob; `None` covers any target.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    target: Option<String>,
    /// Constraints on arguments; all must hold.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    arg_constraints: Vec<ArgConstraint>,
}

impl OpPattern {
    /// Creates a grant for a client family and function glob.
    ///
    /// The kind is normalized to its family so a grant constructed with
    /// `LocalAsync` behaves identically to one constructed with `Local`.
    #[must_use]
    pub fn new(client: ClientKind, function: impl Into<String>) -> Self {
        Self {
            client: client.family(),
            function: function.into(),
            target: None,
            arg_constraints: Vec::new(),
        }
    }

    /// Grants every function of a client family on any target.
    #[must_use]
    pub fn allow_all(client: ClientKind) -> Self {
        Self::new(client, "*")
    }

    /// Restricts the grant to targets matching a glob.
    #[must_use]
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Adds an argument constraint; all constraints must hold.
    #[must_use]
    pub fn with_constraint(mut self, constraint: ArgConstraint) -> Self {
        self.arg_constraints.push(constraint);
        self
    }

    /// The client family this grant covers.
    #[must_use]
    pub fn client(&self) -> ClientKind {
        self.client
    }

    /// The function-name glob.
    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Returns `true` if this grant covers the command.
    ///
    /// All dimensions must hold: client family equality, function glob,
    /// target glob (for target-using clients), and every argument
    /// constraint.
    #[must_use]
    pub fn matches(&self, command: &LowStateCommand) -> bool {
        if self.client != command.client.family() {
            return false;
        }
        if !glob_match(&self.function, &command.function) {
            return false;
        }
        if command.client.uses_target() {
            if let Some(target_glob) = &self.target {
                match &command.target {
                    Some(target) => {
                        if !glob_match(target_glob, target) {
                            return false;
                        }
                    }
                    // A targeted grant cannot cover a command that
                    // names no target.
                    None => return false,
                }
            }
        }
        self.arg_constraints.iter().all(|c| c.is_satisfied(command))
    }
}

impl std::fmt::Display for OpPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.target {
            Some(target) => write!(f, "{}:{}@{}", self.client, self.function, target),
            None => write!(f, "{}:{}", self.client, self.function),
        }
    }
}

/// Case-sensitive, full-string glob match.
///
/// An invalid pattern matches nothing — a malformed grant must fail
/// closed, not open.
fn glob_match(pattern: &str, text: &str) -> bool {
    match glob::Pattern::new(pattern) {
        Ok(compiled) => compiled.matches(text),
        Err(_) => false,
    }
}
