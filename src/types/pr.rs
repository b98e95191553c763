//! Pull request data as returned by the code host.

use serde::{Deserialize, Serialize};

use super::PrNumber;

/// The state of a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrState {
    Open,
    Closed,
}

/// The fields of an open pull request that the interactive paths need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestSummary {
    pub number: PrNumber,
    pub title: String,
    /// The source branch name.
    pub head_ref: String,
    /// Login of the pull request author.
    pub author: String,
    pub html_url: String,
    pub state: PrState,
}
