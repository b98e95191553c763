//! Finding the open pull request that implements an issue.

use thiserror::Error;
use tracing::debug;

use crate::github::{CodeHost, GitHubApiError};
use crate::tracker::{IssueTracker, TrackerError, UserAuthorization};
use crate::types::{Issue, IssueKey, PullRequestSummary};

use super::matcher::pr_matches_issue;

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("issue {0} not found")]
    IssueNotFound(IssueKey),

    #[error("issue tracker error: {0}")]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    CodeHost(#[from] GitHubApiError),
}

/// Fetches `key` as the acting user.
///
/// Callers run this before touching the code host so that a user who cannot
/// see the issue learns nothing about the repository's pull requests.
pub async fn fetch_issue<T>(
    tracker: &T,
    user: &UserAuthorization,
    key: &IssueKey,
) -> Result<Issue, LookupError>
where
    T: IssueTracker,
{
    tracker
        .get_issue(user, key)
        .await?
        .ok_or_else(|| LookupError::IssueNotFound(key.clone()))
}

/// Returns the first open pull request whose title or branch mentions `key`.
pub async fn find_pull_request<H>(
    host: &H,
    key: &IssueKey,
) -> Result<Option<PullRequestSummary>, LookupError>
where
    H: CodeHost,
{
    let pull_request = host
        .list_open_pull_requests()
        .await?
        .into_iter()
        .find(|pr| pr_matches_issue(&pr.title, &pr.head_ref, key));

    debug!(
        issue = %key,
        repo = %host.repo(),
        pr = ?pull_request.as_ref().map(|pr| pr.number),
        "Pull request lookup complete"
    );
    Ok(pull_request)
}
