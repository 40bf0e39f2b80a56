//! Actions emitted by a convergence pass.
//!
//! An `Action` is a single idempotent operation against the target system:
//! register a repository, import a signing key, or install a package. The
//! `ActionList` is the ordered output of one pass and the only thing handed
//! to an `ActionExecutor`.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ---------------------------------------------------------------------------
// ActionKind / Operation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Repository,
    Install,
    Gpgkey,
}

impl ActionKind {
    pub fn all() -> &'static [ActionKind] {
        &[ActionKind::Repository, ActionKind::Install, ActionKind::Gpgkey]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Repository => "repository",
            ActionKind::Install => "install",
            ActionKind::Gpgkey => "gpgkey",
        }
    }

    pub fn is_valid(s: &str) -> bool {
        Self::all().iter().any(|k| k.as_str() == s)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Add,
    Install,
}

impl Operation {
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Add => "add",
            Operation::Install => "install",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Action {
    pub kind: ActionKind,
    pub name: String,
    pub operation: Operation,
}

impl Action {
    pub fn add_repository(name: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Repository,
            name: name.into(),
            operation: Operation::Add,
        }
    }

    pub fn add_gpgkey(name: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Gpgkey,
            name: name.into(),
            operation: Operation::Add,
        }
    }

    pub fn install(name: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::Install,
            name: name.into(),
            operation: Operation::Install,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}] {}", self.kind, self.name, self.operation)
    }
}

// ---------------------------------------------------------------------------
// ActionList
// ---------------------------------------------------------------------------

/// Ordered actions for one pass.
///
/// Holds at most one `repository` action per repository name; later
/// duplicates are dropped on `push`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<Action>", into = "Vec<Action>")]
pub struct ActionList {
    actions: Vec<Action>,
    repositories: HashSet<String>,
}

impl ActionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `action`. Returns false if it was a duplicate repository
    /// activation and was dropped.
    pub fn push(&mut self, action: Action) -> bool {
        if action.kind == ActionKind::Repository
            && !self.repositories.insert(action.name.clone())
        {
            tracing::warn!(repository = %action.name, "duplicate repository action suppressed");
            return false;
        }
        self.actions.push(action);
        true
    }

    pub fn extend(&mut self, actions: impl IntoIterator<Item = Action>) {
        for action in actions {
            self.push(action);
        }
    }

    pub fn as_slice(&self) -> &[Action] {
        &self.actions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn count_kind(&self, kind: ActionKind) -> usize {
        self.actions.iter().filter(|a| a.kind == kind).count()
    }
}

impl From<Vec<Action>> for ActionList {
    fn from(actions: Vec<Action>) -> Self {
        let mut list = Self::new();
        list.extend(actions);
        list
    }
}

impl From<ActionList> for Vec<Action> {
    fn from(list: ActionList) -> Self {
        list.actions
    }
}

impl<'a> IntoIterator for &'a ActionList {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}
