//! Shared test utilities: recording fakes for the tracker and code host,
//! request signing helpers, and property-test generators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use proptest::prelude::*;

use crate::github::{CodeHost, CodeHostConnector, GitHubApiError};
use crate::tracker::{IssueTracker, TrackerError, UserAuthorization};
use crate::types::{
    Issue, IssueKey, PrNumber, PrState, PullRequestSummary, RepoId, TrackerUser, Transition,
};
use crate::webhooks::{compute_signature, format_signature_header};

pub fn arb_issue_key() -> impl Strategy<Value = IssueKey> {
    ("[A-Z][A-Z0-9_]{1,9}", 1u32..100_000)
        .prop_map(|(project, n)| IssueKey::parse(format!("{project}-{n}")).unwrap())
}

/// Signs `body` the way GitHub does, returning the header value.
pub fn sign(body: &[u8], secret: &[u8]) -> String {
    format_signature_header(&compute_signature(body, secret))
}

/// The only Authorization value [`FakeTracker`] accepts.
pub const USER_AUTHORIZATION: &str = "Bearer user-token";

pub fn user_auth() -> UserAuthorization {
    UserAuthorization::new(USER_AUTHORIZATION).unwrap()
}

pub fn pull_request(number: u64, title: &str, head_ref: &str) -> PullRequestSummary {
    PullRequestSummary {
        number: PrNumber(number),
        title: title.to_string(),
        head_ref: head_ref.to_string(),
        author: "octocat".to_string(),
        html_url: format!("https://github.com/octo/repo/pull/{number}"),
        state: PrState::Open,
    }
}

// ============================================================================
// Issue tracker
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerCall {
    ListTransitions(IssueKey),
    ExecuteTransition(IssueKey, String),
    GetIssue(IssueKey),
    CurrentUser,
}

#[derive(Debug, Default)]
struct TrackerState {
    done: bool,
    calls: Vec<TrackerCall>,
    executed: usize,
    last_user: Option<Vec<u8>>,
}

/// An in-memory tracker holding one workflow shared by every issue.
///
/// While in progress it offers "In Review" and "Done"; executing "Done"
/// moves it to done, after which only "Reopen" is offered. Clones share
/// their workflow and recorded calls.
#[derive(Debug, Clone)]
pub struct FakeTracker {
    state: Arc<Mutex<TrackerState>>,
    lookup_failure: Option<u16>,
    execute_failure: Option<u16>,
    has_issue: bool,
}

pub const DONE_TRANSITION_ID: &str = "31";

impl FakeTracker {
    fn with_done(done: bool) -> Self {
        FakeTracker {
            state: Arc::new(Mutex::new(TrackerState {
                done,
                ..TrackerState::default()
            })),
            lookup_failure: None,
            execute_failure: None,
            has_issue: true,
        }
    }

    pub fn in_progress() -> Self {
        Self::with_done(false)
    }

    pub fn done() -> Self {
        Self::with_done(true)
    }

    /// `list_transitions` and `get_issue` fail with `status`.
    pub fn failing_lookup(mut self, status: u16) -> Self {
        self.lookup_failure = Some(status);
        self
    }

    pub fn failing_execute(mut self, status: u16) -> Self {
        self.execute_failure = Some(status);
        self
    }

    /// `get_issue` answers "not found".
    pub fn without_issue(mut self) -> Self {
        self.has_issue = false;
        self
    }

    pub fn calls(&self) -> Vec<TrackerCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Number of transitions that were executed successfully.
    pub fn executed_count(&self) -> usize {
        self.state.lock().unwrap().executed
    }

    /// The Authorization header value last received as the acting user.
    pub fn last_user(&self) -> Option<Vec<u8>> {
        self.state.lock().unwrap().last_user.clone()
    }

    fn record(&self, call: TrackerCall) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl IssueTracker for FakeTracker {
    async fn list_transitions(&self, issue: &IssueKey) -> Result<Vec<Transition>, TrackerError> {
        self.record(TrackerCall::ListTransitions(issue.clone()));
        if let Some(status) = self.lookup_failure {
            return Err(TrackerError::status(status, "lookup failed"));
        }

        if self.state.lock().unwrap().done {
            Ok(vec![Transition::new("71", "Reopen")])
        } else {
            Ok(vec![
                Transition::new("21", "In Review"),
                Transition::new(DONE_TRANSITION_ID, "Done"),
            ])
        }
    }

    async fn execute_transition(
        &self,
        issue: &IssueKey,
        transition_id: &str,
    ) -> Result<(), TrackerError> {
        self.record(TrackerCall::ExecuteTransition(
            issue.clone(),
            transition_id.to_string(),
        ));
        if let Some(status) = self.execute_failure {
            return Err(TrackerError::status(status, "transition rejected"));
        }

        let mut state = self.state.lock().unwrap();
        state.executed += 1;
        if transition_id == DONE_TRANSITION_ID {
            state.done = true;
        }
        Ok(())
    }

    async fn get_issue(
        &self,
        user: &UserAuthorization,
        issue: &IssueKey,
    ) -> Result<Option<Issue>, TrackerError> {
        self.record(TrackerCall::GetIssue(issue.clone()));
        let mut state = self.state.lock().unwrap();
        state.last_user = Some(user.header_value().to_vec());
        if let Some(status) = self.lookup_failure {
            return Err(TrackerError::status(status, "lookup failed"));
        }
        if user.header_value() != USER_AUTHORIZATION.as_bytes() {
            return Err(TrackerError::status(401, "unauthorized"));
        }

        if !self.has_issue {
            return Ok(None);
        }
        Ok(Some(Issue {
            key: issue.clone(),
            summary: "Login fails for SSO users".to_string(),
            status: if state.done { "Done" } else { "In Progress" }.to_string(),
            assignee: Some("Alex Doe".to_string()),
        }))
    }

    async fn current_user(
        &self,
        user: &UserAuthorization,
    ) -> Result<Option<TrackerUser>, TrackerError> {
        self.record(TrackerCall::CurrentUser);
        self.state.lock().unwrap().last_user = Some(user.header_value().to_vec());

        if user.header_value() != USER_AUTHORIZATION.as_bytes() {
            return Ok(None);
        }
        Ok(Some(TrackerUser {
            account_id: "user-1".to_string(),
            display_name: Some("Alex Doe".to_string()),
        }))
    }
}

// ============================================================================
// Code host
// ============================================================================

#[derive(Debug, Default)]
struct HostState {
    list_count: AtomicUsize,
    approved: Mutex<Vec<PrNumber>>,
    merged: Mutex<Vec<PrNumber>>,
    connected: Mutex<Vec<(String, RepoId)>>,
}

/// An in-memory code host. Clones share their recorded calls, and the fake
/// doubles as its own connector.
#[derive(Debug, Clone)]
pub struct FakeCodeHost {
    repo: RepoId,
    pull_requests: Vec<PullRequestSummary>,
    failure: Option<u16>,
    state: Arc<HostState>,
}

impl FakeCodeHost {
    pub fn with_pull_requests(pull_requests: Vec<PullRequestSummary>) -> Self {
        FakeCodeHost {
            repo: RepoId::new("octo", "repo"),
            pull_requests,
            failure: None,
            state: Arc::default(),
        }
    }

    /// Every call fails with the given HTTP status.
    pub fn failing(status: u16) -> Self {
        FakeCodeHost {
            failure: Some(status),
            ..Self::with_pull_requests(Vec::new())
        }
    }

    pub fn list_count(&self) -> usize {
        self.state.list_count.load(Ordering::SeqCst)
    }

    pub fn approved(&self) -> Vec<PrNumber> {
        self.state.approved.lock().unwrap().clone()
    }

    pub fn merged(&self) -> Vec<PrNumber> {
        self.state.merged.lock().unwrap().clone()
    }

    /// The (token, repo) pairs hosts were connected with.
    pub fn connections(&self) -> Vec<(String, RepoId)> {
        self.state.connected.lock().unwrap().clone()
    }

    fn check(&self) -> Result<(), GitHubApiError> {
        match self.failure {
            Some(status) => Err(GitHubApiError {
                status_code: Some(status),
                message: "upstream failure".to_string(),
                source: None,
            }),
            None => Ok(()),
        }
    }
}

impl CodeHost for FakeCodeHost {
    fn repo(&self) -> &RepoId {
        &self.repo
    }

    async fn list_open_pull_requests(&self) -> Result<Vec<PullRequestSummary>, GitHubApiError> {
        self.state.list_count.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.pull_requests.clone())
    }

    async fn approve(&self, pr: PrNumber) -> Result<(), GitHubApiError> {
        self.check()?;
        self.state.approved.lock().unwrap().push(pr);
        Ok(())
    }

    async fn merge(&self, pr: PrNumber) -> Result<(), GitHubApiError> {
        self.check()?;
        self.state.merged.lock().unwrap().push(pr);
        Ok(())
    }
}

impl CodeHostConnector for FakeCodeHost {
    type Host = FakeCodeHost;

    fn connect(&self, token: &str, repo: RepoId) -> Result<FakeCodeHost, GitHubApiError> {
        self.state
            .connected
            .lock()
            .unwrap()
            .push((token.to_string(), repo.clone()));
        Ok(FakeCodeHost {
            repo,
            ..self.clone()
        })
    }
}
