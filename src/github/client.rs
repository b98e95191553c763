//! Octocrab client wrapper scoped to a specific repository.
//!
//! This module provides `OctocrabClient`, which wraps an `Octocrab` instance
//! and scopes all operations to a specific repository. The interactive paths
//! always act on one repository named in the request path.

use std::time::Duration;

use octocrab::Octocrab;

use crate::config::GitHubConfig;
use crate::types::RepoId;

use super::GitHubApiError;

/// A GitHub API client scoped to a specific repository.
#[derive(Clone)]
pub struct OctocrabClient {
    /// The underlying octocrab client.
    client: Octocrab,

    /// The repository this client is scoped to.
    repo: RepoId,
}

impl OctocrabClient {
    /// Creates a new client scoped to the given repository.
    pub fn new(client: Octocrab, repo: RepoId) -> Self {
        Self { client, repo }
    }

    /// Creates a client from a GitHub token.
    ///
    /// The token is read by the caller for each request, so a client is cheap
    /// and short-lived: build one per request rather than storing it.
    pub fn from_token(
        token: impl Into<String>,
        repo: RepoId,
        config: &GitHubConfig,
    ) -> Result<Self, GitHubApiError> {
        let timeout = Some(Duration::from_secs(config.timeout_secs));
        let mut builder = Octocrab::builder()
            .personal_token(token.into())
            .set_connect_timeout(timeout)
            .set_read_timeout(timeout);

        if let Some(api_url) = &config.api_url {
            builder = builder.base_uri(api_url.as_str()).map_err(|e| {
                GitHubApiError::without_source(format!("invalid GitHub API URL: {}", e))
            })?;
        }

        let client = builder.build().map_err(GitHubApiError::from_octocrab)?;
        Ok(Self::new(client, repo))
    }

    /// Returns a reference to the underlying octocrab client.
    pub fn inner(&self) -> &Octocrab {
        &self.client
    }

    /// Returns the repository this client is scoped to.
    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    /// Returns the repository owner.
    pub fn owner(&self) -> &str {
        &self.repo.owner
    }

    /// Returns the repository name.
    pub fn repo_name(&self) -> &str {
        &self.repo.repo
    }
}

impl std::fmt::Debug for OctocrabClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OctocrabClient")
            .field("repo", &self.repo)
            .finish_non_exhaustive()
    }
}
