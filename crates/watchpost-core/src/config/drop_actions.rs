//! Syscall event drop actions
//!
//! The configured list is folded through a small state machine that tracks
//! which side of the ignore/report split has been chosen:
//!
//! | state     | `ignore`   | `log`/`alert` | `exit` |
//! |-----------|------------|---------------|--------|
//! | Open      | Ignoring   | Reporting     | Open   |
//! | Reporting | Ignoring   | Reporting     | same   |
//! | Ignoring  | Ignoring   | conflict      | same   |
//!
//! `ignore` after `log`/`alert` is accepted and moves to `Ignoring`; only a
//! report action after `ignore` is rejected. Configurations in the field
//! depend on that ordering rule, so it is kept as is.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Response to the event source reporting dropped events
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DropAction {
    Ignore,
    Log,
    Alert,
    Exit,
}

impl DropAction {
    pub fn as_str(self) -> &'static str {
        match self {
            DropAction::Ignore => "ignore",
            DropAction::Log => "log",
            DropAction::Alert => "alert",
            DropAction::Exit => "exit",
        }
    }
}

impl fmt::Display for DropAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized drop action name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDropAction(pub String);

impl FromStr for DropAction {
    type Err = UnknownDropAction;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ignore" => Ok(DropAction::Ignore),
            "log" => Ok(DropAction::Log),
            "alert" => Ok(DropAction::Alert),
            "exit" => Ok(DropAction::Exit),
            other => Err(UnknownDropAction(other.to_string())),
        }
    }
}

/// Why a drop action list was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropActionError {
    Unknown(String),
    /// A report action (`log`/`alert`) followed `ignore`
    Conflict(DropAction),
}

/// Non-empty set of drop actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DropActions(BTreeSet<DropAction>);

impl DropActions {
    /// Build the set from configured names in order.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, DropActionError> {
        let mut builder = DropActionSetBuilder::default();
        for name in names {
            let action = name
                .as_ref()
                .parse::<DropAction>()
                .map_err(|UnknownDropAction(name)| DropActionError::Unknown(name))?;
            builder.push(action)?;
        }
        Ok(builder.finish())
    }

    pub fn contains(&self, action: DropAction) -> bool {
        self.0.contains(&action)
    }

    pub fn iter(&self) -> impl Iterator<Item = DropAction> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a built set
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for DropActions {
    fn default() -> Self {
        Self(BTreeSet::from([DropAction::Ignore]))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Exclusivity {
    #[default]
    Open,
    Reporting,
    Ignoring,
}

#[derive(Debug, Default)]
struct DropActionSetBuilder {
    state: Exclusivity,
    actions: BTreeSet<DropAction>,
}

impl DropActionSetBuilder {
    fn push(&mut self, action: DropAction) -> Result<(), DropActionError> {
        self.state = match (self.state, action) {
            (_, DropAction::Exit) => self.state,
            (_, DropAction::Ignore) => Exclusivity::Ignoring,
            (Exclusivity::Ignoring, DropAction::Log | DropAction::Alert) => {
                return Err(DropActionError::Conflict(action));
            }
            (_, DropAction::Log | DropAction::Alert) => Exclusivity::Reporting,
        };
        self.actions.insert(action);
        Ok(())
    }

    fn finish(self) -> DropActions {
        if self.actions.is_empty() {
            DropActions::default()
        } else {
            DropActions(self.actions)
        }
    }
}
