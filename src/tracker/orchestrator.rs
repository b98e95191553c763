//! Moving an issue to its "done" state.
//!
//! The transition list is fetched fresh on every call: what the tracker
//! offers depends on the issue's current status, and the tracker is the only
//! serialization point when two merges race for the same issue. An issue that
//! is already done usually no longer offers a "done" transition, which is
//! what makes a repeated call safe.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::types::{IssueKey, Transition};

use super::{IssueTracker, TrackerError};

/// What to do when no offered transition leads to "done".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoTransitionPolicy {
    /// Treat it as already done: a successful no-op. Redelivered or racing
    /// webhooks for the same issue then succeed.
    #[default]
    Succeed,

    /// Treat it as a failure. Every redelivery of an already-processed merge
    /// then fails too.
    Fail,
}

/// A successful move-to-done attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The transition was executed.
    Applied(Transition),

    /// Nothing offered leads to "done"; nothing was executed.
    ///
    /// Only returned under [`NoTransitionPolicy::Succeed`].
    NoApplicableTransition,
}

/// A failed move-to-done attempt.
#[derive(Debug, Error)]
pub enum TransitionError {
    #[error("failed to list transitions for {issue}: {source}")]
    LookupFailed {
        issue: IssueKey,
        #[source]
        source: TrackerError,
    },

    #[error("transition {:?} failed for {issue}: {source}", transition.name)]
    ExecuteFailed {
        issue: IssueKey,
        transition: Transition,
        #[source]
        source: TrackerError,
    },

    /// Only returned under [`NoTransitionPolicy::Fail`].
    #[error("no \"Done\" transition available for {issue}")]
    NoApplicableTransition { issue: IssueKey, offered: Vec<String> },
}

impl TransitionError {
    pub fn issue(&self) -> &IssueKey {
        match self {
            TransitionError::LookupFailed { issue, .. }
            | TransitionError::ExecuteFailed { issue, .. }
            | TransitionError::NoApplicableTransition { issue, .. } => issue,
        }
    }
}

/// Picks the first offered transition whose name contains "done".
pub fn select_done_transition(transitions: &[Transition]) -> Option<&Transition> {
    transitions.iter().find(|t| t.is_done())
}

/// Moves `issue` to done, executing at most one transition.
///
/// There is no retry here: a failure is reported to the caller, and the
/// webhook sender's redelivery is the retry mechanism.
pub async fn transition_to_done<T: IssueTracker>(
    tracker: &T,
    issue: &IssueKey,
    policy: NoTransitionPolicy,
) -> Result<TransitionOutcome, TransitionError> {
    let transitions = tracker
        .list_transitions(issue)
        .await
        .map_err(|source| TransitionError::LookupFailed {
            issue: issue.clone(),
            source,
        })?;

    let Some(done) = select_done_transition(&transitions).cloned() else {
        let offered: Vec<String> = transitions.into_iter().map(|t| t.name).collect();
        return match policy {
            NoTransitionPolicy::Succeed => {
                info!(
                    issue = %issue,
                    ?offered,
                    "No done transition offered; treating issue as already done"
                );
                Ok(TransitionOutcome::NoApplicableTransition)
            }
            NoTransitionPolicy::Fail => {
                warn!(issue = %issue, ?offered, "No done transition offered");
                Err(TransitionError::NoApplicableTransition {
                    issue: issue.clone(),
                    offered,
                })
            }
        };
    };

    debug!(
        issue = %issue,
        transition_id = %done.id,
        transition = %done.name,
        "Selected done transition"
    );

    match tracker.execute_transition(issue, &done.id).await {
        Ok(()) => {
            info!(issue = %issue, transition = %done.name, "Issue transitioned");
            Ok(TransitionOutcome::Applied(done))
        }
        Err(source) => Err(TransitionError::ExecuteFailed {
            issue: issue.clone(),
            transition: done,
            source,
        }),
    }
}
