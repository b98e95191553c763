//! Core domain types for the merge bridge.
//!
//! All values here are request-scoped: nothing is cached across webhook
//! deliveries.

pub mod ids;
pub mod pr;
pub mod transition;

pub use ids::{InvalidIssueKey, IssueKey, PrNumber, RepoId};
pub use pr::{PrState, PullRequestSummary};
pub use transition::{Issue, TrackerUser, Transition};
