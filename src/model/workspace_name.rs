use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Words that address workspaces relatively in commands.
pub const RESERVED_NAMES: [&str; 4] = ["next", "prev", "focused", "visible"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkspaceNameError {
    #[error("workspace name must not be empty")]
    Empty,
    #[error("workspace name '{0}' must not contain whitespace")]
    Whitespace(String),
    #[error("workspace name '{0}' is reserved")]
    Reserved(String),
}

/// A validated workspace name.
///
/// Names made only of ASCII digits order numerically and before all other
/// names, which order lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkspaceName(String);

impl WorkspaceName {
    pub fn as_str(&self) -> &str { &self.0 }

    /// Numeric value of an all-digit name.
    pub fn number(&self) -> Option<u32> {
        if self.0.bytes().all(|b| b.is_ascii_digit()) {
            self.0.parse().ok()
        } else {
            None
        }
    }

    pub fn from_number(n: u32) -> WorkspaceName { WorkspaceName(n.to_string()) }
}

impl FromStr for WorkspaceName {
    type Err = WorkspaceNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(WorkspaceNameError::Empty);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(WorkspaceNameError::Whitespace(s.to_string()));
        }
        if RESERVED_NAMES.iter().any(|r| r.eq_ignore_ascii_case(s)) {
            return Err(WorkspaceNameError::Reserved(s.to_string()));
        }
        Ok(WorkspaceName(s.to_string()))
    }
}

impl TryFrom<String> for WorkspaceName {
    type Error = WorkspaceNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

impl From<WorkspaceName> for String {
    fn from(value: WorkspaceName) -> Self { value.0 }
}

impl fmt::Display for WorkspaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl Ord for WorkspaceName {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.number(), other.number()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for WorkspaceName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> WorkspaceName { s.parse().unwrap() }

    #[test]
    fn rejects_invalid_names() {
        assert_eq!("".parse::<WorkspaceName>(), Err(WorkspaceNameError::Empty));
        assert!(matches!(
            "a b".parse::<WorkspaceName>(),
            Err(WorkspaceNameError::Whitespace(_))
        ));
        assert!(matches!(
            "Next".parse::<WorkspaceName>(),
            Err(WorkspaceNameError::Reserved(_))
        ));
    }

    #[test]
    fn numeric_names_sort_first_and_numerically() {
        let mut names = vec![name("web"), name("10"), name("2"), name("chat"), name("1")];
        names.sort();
        let sorted: Vec<_> = names.iter().map(WorkspaceName::as_str).collect();
        assert_eq!(sorted, ["1", "2", "10", "chat", "web"]);
    }

    #[test]
    fn leading_zeros_still_differ() {
        assert_ne!(name("01"), name("1"));
        assert!(name("01") < name("1"));
        assert_eq!(name("007").number(), Some(7));
    }
}
