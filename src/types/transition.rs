//! Issue tracker values: issues, workflow transitions and accounts.

use serde::{Deserialize, Serialize};

use super::IssueKey;

/// A workflow transition offered by the tracker for one issue.
///
/// Transition lists are never cached: the set of offered transitions depends
/// on the issue's current status and must be fetched fresh on every attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub id: String,
    pub name: String,
}

impl Transition {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Transition {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Whether this transition leads to the "done" state.
    ///
    /// Matches "done" anywhere in the name, ignoring case, because workflow
    /// names vary between tracker configurations ("Done", "Mark as Done").
    pub fn is_done(&self) -> bool {
        self.name.to_lowercase().contains("done")
    }
}

/// Summary of an issue, as shown to an interactive user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub key: IssueKey,
    pub summary: String,
    pub status: String,
    pub assignee: Option<String>,
}

/// The tracker account an interactive request acts as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerUser {
    pub account_id: String,
    pub display_name: Option<String>,
}
