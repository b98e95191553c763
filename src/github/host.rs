//! The code-host operations used by the interactive paths.
//!
//! These are plain pass-through calls. None of them touch the issue tracker:
//! an issue only moves when the merge webhook arrives.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::types::{PrNumber, PrState, PullRequestSummary, RepoId};

use crate::config::GitHubConfig;

use super::{GitHubApiError, OctocrabClient};

/// Page size for pull request listings.
const PER_PAGE: u8 = 100;

/// Upper bound on pages fetched for one listing.
const MAX_PAGES: u32 = 10;

/// Repository-scoped pull request operations.
pub trait CodeHost: Send + Sync {
    /// The repository this host acts on.
    fn repo(&self) -> &RepoId;

    fn list_open_pull_requests(
        &self,
    ) -> impl Future<Output = Result<Vec<PullRequestSummary>, GitHubApiError>> + Send;

    fn approve(&self, pr: PrNumber) -> impl Future<Output = Result<(), GitHubApiError>> + Send;

    fn merge(&self, pr: PrNumber) -> impl Future<Output = Result<(), GitHubApiError>> + Send;
}

/// Builds a [`CodeHost`] for one request from a freshly read token.
pub trait CodeHostConnector: Send + Sync {
    type Host: CodeHost;

    fn connect(&self, token: &str, repo: RepoId) -> Result<Self::Host, GitHubApiError>;
}

/// Connects to GitHub (or GitHub Enterprise) through octocrab.
#[derive(Debug, Clone)]
pub struct OctocrabConnector {
    config: GitHubConfig,
}

impl OctocrabConnector {
    pub fn new(config: GitHubConfig) -> Self {
        Self { config }
    }
}

impl CodeHostConnector for OctocrabConnector {
    type Host = OctocrabClient;

    fn connect(&self, token: &str, repo: RepoId) -> Result<OctocrabClient, GitHubApiError> {
        OctocrabClient::from_token(token, repo, &self.config)
    }
}

#[derive(Serialize)]
struct ReviewRequest {
    event: &'static str,
}

#[derive(Debug, Deserialize)]
struct MergeResponse {
    merged: bool,
    message: Option<String>,
}

impl CodeHost for OctocrabClient {
    fn repo(&self) -> &RepoId {
        OctocrabClient::repo(self)
    }

    async fn list_open_pull_requests(&self) -> Result<Vec<PullRequestSummary>, GitHubApiError> {
        let mut page = 1u32;
        let mut all_prs = Vec::new();

        loop {
            let items = self
                .inner()
                .pulls(self.owner(), self.repo_name())
                .list()
                .state(octocrab::params::State::Open)
                .per_page(PER_PAGE)
                .page(page)
                .send()
                .await
                .map_err(GitHubApiError::from_octocrab)?
                .items;

            let is_last_page = items.len() < usize::from(PER_PAGE);

            all_prs.extend(items.into_iter().map(|pull| PullRequestSummary {
                number: PrNumber(pull.number),
                title: pull.title.unwrap_or_default(),
                head_ref: pull.head.ref_field,
                author: pull.user.map(|u| u.login).unwrap_or_default(),
                html_url: pull.html_url.map(|u| u.to_string()).unwrap_or_default(),
                state: match pull.state {
                    Some(octocrab::models::IssueState::Closed) => PrState::Closed,
                    _ => PrState::Open,
                },
            }));

            if is_last_page || page >= MAX_PAGES {
                break;
            }
            page += 1;
        }

        debug!(repo = %self.repo(), count = all_prs.len(), "Listed open pull requests");
        Ok(all_prs)
    }

    async fn approve(&self, pr: PrNumber) -> Result<(), GitHubApiError> {
        let url = format!(
            "/repos/{}/{}/pulls/{}/reviews",
            self.owner(),
            self.repo_name(),
            pr.0
        );
        let request = ReviewRequest { event: "APPROVE" };

        let result: Result<serde_json::Value, _> = self.inner().post(&url, Some(&request)).await;
        result.map_err(GitHubApiError::from_octocrab)?;

        info!(repo = %self.repo(), pr = %pr, "Pull request approved");
        Ok(())
    }

    async fn merge(&self, pr: PrNumber) -> Result<(), GitHubApiError> {
        let url = format!(
            "/repos/{}/{}/pulls/{}/merge",
            self.owner(),
            self.repo_name(),
            pr.0
        );

        let result: Result<MergeResponse, _> = self.inner().put(&url, None::<&()>).await;
        let response = result.map_err(GitHubApiError::from_octocrab)?;

        if !response.merged {
            return Err(GitHubApiError::without_source(format!(
                "merge request returned merged=false: {}",
                response.message.as_deref().unwrap_or("unknown reason")
            )));
        }

        info!(repo = %self.repo(), pr = %pr, "Pull request merged");
        Ok(())
    }
}
