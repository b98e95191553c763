//! GitHub API error types.
//!
//! Errors from the code host only ever reach an interactive user, so the
//! important property is a short, readable message. The HTTP status is kept
//! for logs and for the message itself.

use std::fmt;
use thiserror::Error;

/// A GitHub API error.
#[derive(Debug, Error)]
pub struct GitHubApiError {
    /// The HTTP status code, if GitHub answered.
    pub status_code: Option<u16>,

    /// A human-readable description of the error.
    pub message: String,

    /// The underlying octocrab error, if available.
    #[source]
    pub source: Option<octocrab::Error>,
}

impl fmt::Display for GitHubApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "GitHub API error (HTTP {}): {}", code, self.message),
            None => write!(f, "GitHub API error: {}", self.message),
        }
    }
}

impl GitHubApiError {
    /// Creates an error without an octocrab source.
    pub fn without_source(message: impl Into<String>) -> Self {
        Self {
            status_code: None,
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an octocrab error, keeping GitHub's own message when it sent one.
    pub fn from_octocrab(err: octocrab::Error) -> Self {
        let (status_code, message) = match &err {
            octocrab::Error::GitHub { source, .. } => {
                (Some(source.status_code.as_u16()), source.message.clone())
            }
            other => (None, other.to_string()),
        };

        Self {
            status_code,
            message,
            source: Some(err),
        }
    }
}
