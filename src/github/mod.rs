//! GitHub API client for the interactive paths.
//!
//! The webhook path never calls GitHub: everything it needs arrives in the
//! delivery. This module backs the lookup, approve and merge endpoints.

mod client;
mod error;
mod host;

pub use client::OctocrabClient;
pub use error::GitHubApiError;
pub use host::{CodeHost, CodeHostConnector, OctocrabConnector};
