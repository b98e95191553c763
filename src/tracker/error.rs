//! Issue tracker error types.

use thiserror::Error;

use crate::credentials::{CredentialError, CredentialKey};

/// Upper bound on how much of an error response body is kept.
const MAX_BODY_LEN: usize = 512;

/// A failed call to the issue tracker.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The credential the call needs has not been provisioned.
    #[error("credential {0} is not provisioned")]
    MissingCredential(CredentialKey),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    /// The caller's `Authorization` value cannot be sent as an HTTP header.
    #[error("user authorization is not a valid header value")]
    InvalidUserAuthorization,

    /// Network failure, timeout, or an unbuildable request.
    #[error("tracker request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The tracker answered with a non-success status.
    #[error("tracker returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The tracker answered 2xx but the body was not what we expected.
    #[error("unexpected tracker response: {0}")]
    Decode(String),
}

impl TrackerError {
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        TrackerError::Status {
            status,
            body: truncate(body.into()),
        }
    }

    /// The HTTP status, if the tracker answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            TrackerError::Status { status, .. } => Some(*status),
            TrackerError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

fn truncate(mut body: String) -> String {
    if body.len() > MAX_BODY_LEN {
        let mut end = MAX_BODY_LEN;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push_str("...");
    }
    body
}
