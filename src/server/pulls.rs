//! Interactive pull request endpoints.
//!
//! These back a UI embedded in the issue tracker. Every request carries the
//! acting user's `Authorization` header, which the tracker must accept
//! before anything else runs. The lookup then acts as that user; approve
//! and merge act with the stored GitHub token. None of them transition
//! issues.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use super::AppState;
use crate::correlation::{LookupError, fetch_issue, find_pull_request};
use crate::credentials::CredentialKey;
use crate::github::{CodeHost, CodeHostConnector, GitHubApiError};
use crate::tracker::{IssueTracker, TrackerError, UserAuthorization};
use crate::types::{
    InvalidIssueKey, Issue, IssueKey, PrNumber, PullRequestSummary, RepoId, TrackerUser,
};

/// Errors surfaced by the interactive endpoints as short messages.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("missing Authorization header")]
    MissingAuthorization,

    #[error("authorization rejected by the issue tracker")]
    Unauthorized,

    #[error("issue tracker error: {0}")]
    Tracker(TrackerError),

    #[error(transparent)]
    InvalidIssueKey(#[from] InvalidIssueKey),

    #[error("{0} is not provisioned")]
    NotProvisioned(CredentialKey),

    #[error("credential store unavailable")]
    CredentialStore,

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    CodeHost(#[from] GitHubApiError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MissingAuthorization | ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::InvalidIssueKey(_) => StatusCode::BAD_REQUEST,
            ApiError::NotProvisioned(_) | ApiError::CredentialStore => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Lookup(LookupError::IssueNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Tracker(e) | ApiError::Lookup(LookupError::Tracker(e)) => {
                match e.status_code() {
                    Some(401) => StatusCode::UNAUTHORIZED,
                    Some(403) => StatusCode::FORBIDDEN,
                    _ => StatusCode::BAD_GATEWAY,
                }
            }
            ApiError::Lookup(LookupError::CodeHost(_)) | ApiError::CodeHost(_) => {
                StatusCode::BAD_GATEWAY
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct LookupResponse {
    pub issue: Issue,
    pub pull_request: Option<PullRequestSummary>,
}

#[derive(Debug, Serialize)]
pub struct ActionResponse {
    pub pull_request: PrNumber,
    pub action: &'static str,
}

fn user_authorization(headers: &HeaderMap) -> Result<UserAuthorization, ApiError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| UserAuthorization::new(value.as_bytes()))
        .ok_or(ApiError::MissingAuthorization)
}

/// Resolves the caller's tracker account. Runs before any stored credential
/// is read.
pub(super) async fn authenticate<T, C>(
    app_state: &AppState<T, C>,
    headers: &HeaderMap,
) -> Result<TrackerUser, ApiError>
where
    T: IssueTracker,
    C: CodeHostConnector,
{
    let user = user_authorization(headers)?;
    app_state
        .tracker()
        .current_user(&user)
        .await
        .map_err(ApiError::Tracker)?
        .ok_or_else(|| {
            warn!("Issue tracker rejected caller authorization");
            ApiError::Unauthorized
        })
}

/// Connects to the code host with a freshly read GitHub token.
fn connect<T, C>(app_state: &AppState<T, C>, repo: RepoId) -> Result<C::Host, ApiError>
where
    T: IssueTracker,
    C: CodeHostConnector,
{
    let token = app_state
        .credentials()
        .get(CredentialKey::GitHubToken)
        .map_err(|e| {
            warn!(error = %e, "Failed to read GitHub token");
            ApiError::CredentialStore
        })?
        .ok_or(ApiError::NotProvisioned(CredentialKey::GitHubToken))?;
    let token = token
        .expose_str()
        .ok_or(ApiError::NotProvisioned(CredentialKey::GitHubToken))?;

    Ok(app_state.connector().connect(token, repo)?)
}

/// `GET /api/v1/repos/{owner}/{repo}/issues/{key}/pull-request`
///
/// The issue is fetched as the acting user, which also authenticates them,
/// before the GitHub token is read.
pub async fn lookup_handler<T, C>(
    State(app_state): State<AppState<T, C>>,
    Path((owner, repo, key)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Result<Json<LookupResponse>, ApiError>
where
    T: IssueTracker + 'static,
    C: CodeHostConnector + 'static,
{
    let user = user_authorization(&headers)?;
    let key = IssueKey::parse(&key)?;

    let issue = fetch_issue(app_state.tracker(), &user, &key).await?;
    let host = connect(&app_state, RepoId::new(owner, repo))?;
    let pull_request = find_pull_request(&host, &key).await?;

    Ok(Json(LookupResponse {
        issue,
        pull_request,
    }))
}

/// `POST /api/v1/repos/{owner}/{repo}/pulls/{number}/approve`
pub async fn approve_handler<T, C>(
    State(app_state): State<AppState<T, C>>,
    Path((owner, repo, number)): Path<(String, String, u64)>,
    headers: HeaderMap,
) -> Result<Json<ActionResponse>, ApiError>
where
    T: IssueTracker + 'static,
    C: CodeHostConnector + 'static,
{
    let account = authenticate(&app_state, &headers).await?;
    let pr = PrNumber(number);
    let host = connect(&app_state, RepoId::new(owner, repo))?;

    host.approve(pr).await.inspect_err(|e| {
        warn!(repo = %host.repo(), pr = %pr, error = %e, "Approve failed");
    })?;

    info!(repo = %host.repo(), pr = %pr, user = %account.account_id, "Approved via API");
    Ok(Json(ActionResponse {
        pull_request: pr,
        action: "approved",
    }))
}

/// `POST /api/v1/repos/{owner}/{repo}/pulls/{number}/merge`
///
/// The issue is not touched here; it moves when the merge webhook arrives.
pub async fn merge_handler<T, C>(
    State(app_state): State<AppState<T, C>>,
    Path((owner, repo, number)): Path<(String, String, u64)>,
    headers: HeaderMap,
) -> Result<Json<ActionResponse>, ApiError>
where
    T: IssueTracker + 'static,
    C: CodeHostConnector + 'static,
{
    let account = authenticate(&app_state, &headers).await?;
    let pr = PrNumber(number);
    let host = connect(&app_state, RepoId::new(owner, repo))?;

    host.merge(pr).await.inspect_err(|e| {
        warn!(repo = %host.repo(), pr = %pr, error = %e, "Merge failed");
    })?;

    info!(repo = %host.repo(), pr = %pr, user = %account.account_id, "Merged via API");
    Ok(Json(ActionResponse {
        pull_request: pr,
        action: "merged",
    }))
}
