//! Access to externally provisioned secrets.
//!
//! Secrets are owned by whoever provisions them (an operator, a secret
//! manager mounting files, a deployment's environment). The bridge only reads
//! them, and reads them again on every use: nothing here caches a value, so a
//! rotated webhook secret or token takes effect on the next request without a
//! restart.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

use thiserror::Error;

pub mod env;
pub mod file;

pub use env::{ENV_PREFIX, EnvCredentials};
pub use file::FileCredentials;

/// The secrets the bridge consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    /// Shared HMAC key for webhook signatures.
    WebhookSecret,
    /// Token for the tracker's service principal (app-driven transitions).
    JiraServiceToken,
    /// Token for GitHub API calls made on the interactive paths.
    GitHubToken,
}

impl CredentialKey {
    pub const ALL: [CredentialKey; 3] = [
        CredentialKey::WebhookSecret,
        CredentialKey::JiraServiceToken,
        CredentialKey::GitHubToken,
    ];

    /// Stable name used for environment variables and file names.
    pub fn name(self) -> &'static str {
        match self {
            CredentialKey::WebhookSecret => "webhook_secret",
            CredentialKey::JiraServiceToken => "jira_service_token",
            CredentialKey::GitHubToken => "github_token",
        }
    }
}

impl fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors reading a credential.
///
/// A credential that is simply not provisioned is `Ok(None)`, not an error.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("failed to read credential {key}: {source}")]
    Io {
        key: CredentialKey,
        #[source]
        source: std::io::Error,
    },

    #[error("credential {0} is not valid UTF-8")]
    NotUnicode(CredentialKey),
}

/// An opaque secret value.
///
/// `Debug` never prints the value, only its length.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Vec<u8>);

impl Secret {
    /// Wraps a raw value, trimming surrounding ASCII whitespace.
    ///
    /// Returns `None` if nothing is left, so that an empty file or an empty
    /// environment variable counts as "not provisioned".
    pub fn from_raw(raw: impl AsRef<[u8]>) -> Option<Self> {
        let trimmed = raw.as_ref().trim_ascii();
        if trimmed.is_empty() {
            None
        } else {
            Some(Secret(trimmed.to_vec()))
        }
    }

    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    /// The secret as text, for use in HTTP headers.
    pub fn expose_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED]; len={})", self.0.len())
    }
}

/// A read-only source of secrets.
///
/// Implementations must re-read their backing storage on every call.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: CredentialKey) -> Result<Option<Secret>, CredentialError>;

    /// Whether a credential is currently provisioned.
    fn is_provisioned(&self, key: CredentialKey) -> Result<bool, CredentialError> {
        Ok(self.get(key)?.is_some())
    }
}

/// An in-memory store whose values can be replaced at runtime.
///
/// Used when embedding the bridge with secrets fetched by the host
/// application, and in tests.
#[derive(Default)]
pub struct MemoryCredentials {
    values: RwLock<HashMap<CredentialKey, Secret>>,
}

impl MemoryCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(self, key: CredentialKey, value: impl AsRef<[u8]>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets (or clears, if `value` is blank) a credential.
    pub fn set(&self, key: CredentialKey, value: impl AsRef<[u8]>) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        match Secret::from_raw(value) {
            Some(secret) => {
                values.insert(key, secret);
            }
            None => {
                values.remove(&key);
            }
        }
    }

    pub fn clear(&self, key: CredentialKey) {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.remove(&key);
    }
}

impl CredentialStore for MemoryCredentials {
    fn get(&self, key: CredentialKey) -> Result<Option<Secret>, CredentialError> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(&key).cloned())
    }
}

impl fmt::Debug for MemoryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCredentials").finish_non_exhaustive()
    }
}
