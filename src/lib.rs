//! Merge Bridge - moves Jira issues to done when their GitHub pull requests merge.
//!
//! The core is the webhook pipeline in [`server::webhook`]: verify the
//! delivery's signature, keep only merged pull requests, find the issue key
//! in the title or branch, and execute the issue's "done" transition. The
//! same crate serves a small interactive API for finding, approving and
//! merging the pull request behind an issue.

pub mod config;
pub mod correlation;
pub mod credentials;
pub mod github;
pub mod server;
pub mod tracker;
pub mod types;
pub mod webhooks;

#[cfg(test)]
mod test_utils;
