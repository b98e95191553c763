//! Issue tracker access and the move-to-done orchestration.
//!
//! The tracker is used under two distinct principals:
//!
//! - the **service principal** (the bridge's own token, from the credential
//!   store) for reading and executing transitions on the webhook path;
//! - the **acting user** (an `Authorization` value supplied by the caller)
//!   for authenticating and validating issues on the interactive paths.
//!
//! [`IssueTracker`] keeps them apart in its signatures: only
//! [`IssueTracker::current_user`] and [`IssueTracker::get_issue`] take a
//! [`UserAuthorization`], and nothing on the webhook path has one to pass.

use std::fmt;
use std::future::Future;

use crate::credentials::Secret;
use crate::types::{Issue, IssueKey, TrackerUser, Transition};

mod error;
mod jira;
mod orchestrator;

pub use error::TrackerError;
pub use jira::JiraClient;
pub use orchestrator::{NoTransitionPolicy, TransitionError, TransitionOutcome, transition_to_done};

/// The `Authorization` header value of the user on whose behalf an
/// interactive request is made. Forwarded verbatim to the tracker.
#[derive(Clone, PartialEq, Eq)]
pub struct UserAuthorization(Secret);

impl UserAuthorization {
    /// Wraps a header value; `None` if it is blank.
    pub fn new(header_value: impl AsRef<[u8]>) -> Option<Self> {
        Secret::from_raw(header_value).map(UserAuthorization)
    }

    pub fn header_value(&self) -> &[u8] {
        self.0.expose()
    }
}

impl fmt::Debug for UserAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UserAuthorization").field(&self.0).finish()
    }
}

/// What the bridge needs from the issue tracker.
///
/// # Example (mock for testing)
///
/// ```ignore
/// struct AlreadyDone;
///
/// impl IssueTracker for AlreadyDone {
///     async fn list_transitions(&self, _: &IssueKey) -> Result<Vec<Transition>, TrackerError> {
///         Ok(vec![Transition::new("11", "Reopen")])
///     }
///     // ...
/// }
/// ```
pub trait IssueTracker: Send + Sync {
    /// Lists the transitions currently offered for `issue`, as the service
    /// principal.
    fn list_transitions(
        &self,
        issue: &IssueKey,
    ) -> impl Future<Output = Result<Vec<Transition>, TrackerError>> + Send;

    /// Executes one transition on `issue`, as the service principal.
    fn execute_transition(
        &self,
        issue: &IssueKey,
        transition_id: &str,
    ) -> impl Future<Output = Result<(), TrackerError>> + Send;

    /// Fetches an issue as the acting user. `Ok(None)` if it does not exist
    /// or is not visible to that user.
    fn get_issue(
        &self,
        user: &UserAuthorization,
        issue: &IssueKey,
    ) -> impl Future<Output = Result<Option<Issue>, TrackerError>> + Send;

    /// Resolves the account behind `user`. `Ok(None)` if the tracker does
    /// not accept the authorization.
    fn current_user(
        &self,
        user: &UserAuthorization,
    ) -> impl Future<Output = Result<Option<TrackerUser>, TrackerError>> + Send;
}
